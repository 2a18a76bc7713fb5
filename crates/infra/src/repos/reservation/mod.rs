mod inmemory;
mod postgres;

use boxoffice_domain::{Reservation, ID};
pub use inmemory::InMemoryReservationRepo;
pub(crate) use postgres::ReservationRaw;
pub use postgres::PostgresReservationRepo;

#[async_trait::async_trait]
pub trait IReservationRepo: Send + Sync {
    async fn find(&self, reservation_id: &ID) -> Option<Reservation>;
    async fn find_by_booking(&self, booking_id: &ID) -> anyhow::Result<Vec<Reservation>>;
}
