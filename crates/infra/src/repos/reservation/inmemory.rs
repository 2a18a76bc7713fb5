use super::IReservationRepo;
use crate::repos::shared::inmemory_repo::*;
use boxoffice_domain::{Reservation, ID};
use std::sync::Mutex;

pub struct InMemoryReservationRepo {
    pub(crate) reservations: Mutex<Vec<Reservation>>,
}

impl InMemoryReservationRepo {
    pub fn new() -> Self {
        Self {
            reservations: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IReservationRepo for InMemoryReservationRepo {
    async fn find(&self, reservation_id: &ID) -> Option<Reservation> {
        find(reservation_id, &self.reservations)
    }

    async fn find_by_booking(&self, booking_id: &ID) -> anyhow::Result<Vec<Reservation>> {
        Ok(find_by(&self.reservations, |r| r.booking_id == *booking_id))
    }
}
