mod inmemory;
mod postgres;

use boxoffice_domain::{StatusSwap, Ticket, TicketStatus, ID};
pub use inmemory::InMemoryTicketRepo;
pub(crate) use postgres::insert_ticket;
pub use postgres::PostgresTicketRepo;

#[async_trait::async_trait]
pub trait ITicketRepo: Send + Sync {
    async fn insert(&self, ticket: &Ticket) -> anyhow::Result<()>;
    async fn find(&self, ticket_id: &ID) -> Option<Ticket>;
    async fn find_many(&self, ticket_ids: &[ID]) -> anyhow::Result<Vec<Ticket>>;
    async fn find_by_event(&self, event_id: &ID) -> anyhow::Result<Vec<Ticket>>;
    /// Moves the `Ticket` to `swap.to` only if it still is in `swap.from`
    async fn swap_status(&self, swap: &StatusSwap<TicketStatus>, now: i64) -> anyhow::Result<bool>;
}
