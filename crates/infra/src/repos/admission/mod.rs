mod inmemory;
mod postgres;

use boxoffice_domain::{Admission, ID};
pub use inmemory::InMemoryAdmissionRepo;
pub use postgres::PostgresAdmissionRepo;

/// Admissions are created by `ISagaRepo::admit` together with the
/// `Reservation` update
#[async_trait::async_trait]
pub trait IAdmissionRepo: Send + Sync {
    async fn find_by_reservation(&self, reservation_id: &ID) -> Option<Admission>;
}
