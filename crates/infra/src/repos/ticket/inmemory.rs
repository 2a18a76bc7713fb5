use super::ITicketRepo;
use crate::repos::shared::inmemory_repo::*;
use boxoffice_domain::{StatusSwap, Ticket, TicketStatus, ID};
use std::sync::Mutex;

pub struct InMemoryTicketRepo {
    pub(crate) tickets: Mutex<Vec<Ticket>>,
}

impl InMemoryTicketRepo {
    pub fn new() -> Self {
        Self {
            tickets: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl ITicketRepo for InMemoryTicketRepo {
    async fn insert(&self, ticket: &Ticket) -> anyhow::Result<()> {
        insert(ticket, &self.tickets);
        Ok(())
    }

    async fn find(&self, ticket_id: &ID) -> Option<Ticket> {
        find(ticket_id, &self.tickets)
    }

    async fn find_many(&self, ticket_ids: &[ID]) -> anyhow::Result<Vec<Ticket>> {
        Ok(find_by(&self.tickets, |t| ticket_ids.contains(&t.id)))
    }

    async fn find_by_event(&self, event_id: &ID) -> anyhow::Result<Vec<Ticket>> {
        Ok(find_by(&self.tickets, |t| t.event_id == *event_id))
    }

    async fn swap_status(&self, swap: &StatusSwap<TicketStatus>, now: i64) -> anyhow::Result<bool> {
        let updated = update_many(
            &self.tickets,
            |t| t.id == swap.id && t.status == swap.from,
            |t| {
                t.status = swap.to;
                t.updated = now;
            },
        );
        Ok(updated > 0)
    }
}
