use crate::shared::entity::{Entity, ID};
use crate::shared::status::Status;
use crate::status_strings;

/// One seat unit within a `Booking`
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: ID,
    pub booking_id: ID,
    pub ticket_id: ID,
    pub event_id: ID,
    pub user_id: ID,
    pub status: ReservationStatus,
    /// Seat hold expiry while pending. Set to the start of the `Event` once paid.
    pub valid_until: i64,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    Pending,
    Paid,
    Canceled,
    /// The ticket holder has been admitted
    Completed,
}

impl Status for ReservationStatus {
    const ENTITY: &'static str = "reservation";

    fn next(&self) -> &'static [Self] {
        use ReservationStatus::*;
        match self {
            Pending => &[Paid, Canceled],
            Paid => &[Completed, Canceled],
            Canceled | Completed => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Canceled => "canceled",
            Self::Completed => "completed",
        }
    }
}

status_strings!(
    ReservationStatus,
    [
        ReservationStatus::Pending,
        ReservationStatus::Paid,
        ReservationStatus::Canceled,
        ReservationStatus::Completed,
    ]
);

impl Entity for Reservation {
    fn id(&self) -> &ID {
        &self.id
    }
}
