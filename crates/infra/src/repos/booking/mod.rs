mod inmemory;
mod postgres;

use boxoffice_domain::{Booking, ID};
pub use inmemory::InMemoryBookingRepo;
pub(crate) use postgres::{holding_statuses, BookingRaw};
pub use postgres::PostgresBookingRepo;

/// Read side of `Booking`s. All writes go through `ISagaRepo` so that a
/// `Booking` never changes without its `Reservation`s and `Transaction`.
#[async_trait::async_trait]
pub trait IBookingRepo: Send + Sync {
    async fn find(&self, booking_id: &ID) -> Option<Booking>;
    async fn find_by_transaction(&self, transaction_id: &ID) -> anyhow::Result<Vec<Booking>>;
    async fn find_pending_by_event(&self, event_id: &ID) -> anyhow::Result<Vec<Booking>>;
    /// Sum of `qty` over the `Booking`s of the `Ticket` that hold seats
    async fn reserved_seats(&self, ticket_id: &ID) -> anyhow::Result<i64>;
}
