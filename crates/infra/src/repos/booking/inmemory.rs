use super::IBookingRepo;
use crate::repos::shared::inmemory_repo::*;
use boxoffice_domain::{Booking, BookingStatus, ID};
use std::sync::Mutex;

pub struct InMemoryBookingRepo {
    pub(crate) bookings: Mutex<Vec<Booking>>,
}

impl InMemoryBookingRepo {
    pub fn new() -> Self {
        Self {
            bookings: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IBookingRepo for InMemoryBookingRepo {
    async fn find(&self, booking_id: &ID) -> Option<Booking> {
        find(booking_id, &self.bookings)
    }

    async fn find_by_transaction(&self, transaction_id: &ID) -> anyhow::Result<Vec<Booking>> {
        Ok(find_by(&self.bookings, |b| {
            b.transaction_id.as_ref() == Some(transaction_id)
        }))
    }

    async fn find_pending_by_event(&self, event_id: &ID) -> anyhow::Result<Vec<Booking>> {
        Ok(find_by(&self.bookings, |b| {
            b.event_id == *event_id && b.status == BookingStatus::Pending
        }))
    }

    async fn reserved_seats(&self, ticket_id: &ID) -> anyhow::Result<i64> {
        Ok(lock(&self.bookings)
            .iter()
            .filter(|b| b.ticket_id == *ticket_id && b.status.holds_seats())
            .map(|b| b.qty)
            .sum())
    }
}
