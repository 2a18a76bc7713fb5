use crate::booking::Booking;
use crate::ticket::Ticket;
use serde::{Deserialize, Serialize};

/// Seat counts of a `Ticket`. Never stored, always derived from the
/// `Booking`s that hold seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seats {
    pub limit: i64,
    pub reserved: i64,
    /// `None` when the ticket is unlimited
    pub free: Option<i64>,
}

impl Seats {
    pub fn new(limit: i64, reserved: i64) -> Self {
        let free = if limit == 0 {
            None
        } else {
            Some((limit - reserved).max(0))
        };
        Self {
            limit,
            reserved,
            free,
        }
    }

    pub fn for_ticket<'a>(ticket: &Ticket, bookings: impl IntoIterator<Item = &'a Booking>) -> Self {
        let reserved = bookings
            .into_iter()
            .filter(|b| b.ticket_id == ticket.id && b.status.holds_seats())
            .map(|b| b.qty)
            .sum();
        Self::new(ticket.limit, reserved)
    }

    pub fn can_fit(&self, qty: i64) -> bool {
        match self.free {
            None => true,
            Some(free) => qty <= free,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{BookingStatus, ID};

    fn booking(ticket: &Ticket, qty: i64, status: BookingStatus) -> Booking {
        Booking {
            id: Default::default(),
            event_id: ticket.event_id.clone(),
            ticket_id: ticket.id.clone(),
            user_id: Default::default(),
            org_id: Default::default(),
            qty,
            subtotal: qty * ticket.price,
            currency: ticket.currency.clone(),
            status,
            checkout_session_id: None,
            payment_intent_id: None,
            transaction_id: None,
            created: 0,
            updated: 0,
        }
    }

    #[test]
    fn counts_pending_and_completed_bookings() {
        let ticket = Ticket::new(ID::default(), "GA".into(), 100, "nok".into(), 10, 0);
        let other = Ticket::new(ID::default(), "VIP".into(), 100, "nok".into(), 10, 0);
        let bookings = vec![
            booking(&ticket, 2, BookingStatus::Pending),
            booking(&ticket, 3, BookingStatus::Completed),
            booking(&ticket, 4, BookingStatus::Canceled),
            booking(&ticket, 5, BookingStatus::Expired),
            booking(&other, 1, BookingStatus::Completed),
        ];

        let seats = Seats::for_ticket(&ticket, &bookings);
        assert_eq!(seats.reserved, 5);
        assert_eq!(seats.free, Some(5));
        assert!(seats.can_fit(5));
        assert!(!seats.can_fit(6));
    }

    #[test]
    fn zero_limit_is_unlimited() {
        let seats = Seats::new(0, 1_000);
        assert_eq!(seats.free, None);
        assert!(seats.can_fit(i64::MAX));
    }

    #[test]
    fn free_never_goes_negative() {
        assert_eq!(Seats::new(2, 3).free, Some(0));
    }
}
