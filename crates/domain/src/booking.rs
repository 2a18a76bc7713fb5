use crate::shared::entity::{Entity, ID};
use crate::shared::status::Status;
use crate::status_strings;

/// One checkout attempt for one `Ticket` by one user
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: ID,
    pub event_id: ID,
    pub ticket_id: ID,
    pub user_id: ID,
    pub org_id: ID,
    pub qty: i64,
    pub subtotal: i64,
    pub currency: String,
    pub status: BookingStatus,
    pub checkout_session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub transaction_id: Option<ID>,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Pending,
    Completed,
    Canceled,
    Expired,
}

impl BookingStatus {
    /// Bookings in these statuses hold seats in the ledger
    pub const HOLDING_SEATS: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Completed];

    pub fn holds_seats(&self) -> bool {
        Self::HOLDING_SEATS.contains(self)
    }
}

impl Status for BookingStatus {
    const ENTITY: &'static str = "booking";

    fn next(&self) -> &'static [Self] {
        use BookingStatus::*;
        match self {
            Pending => &[Completed, Canceled, Expired],
            Completed | Canceled | Expired => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
        }
    }
}

status_strings!(
    BookingStatus,
    [
        BookingStatus::Pending,
        BookingStatus::Completed,
        BookingStatus::Canceled,
        BookingStatus::Expired,
    ]
);

impl Booking {
    /// A `Booking` that was completed by a confirmed payment
    pub fn is_paid(&self) -> bool {
        self.status == BookingStatus::Completed && self.payment_intent_id.is_some()
    }
}

impl Entity for Booking {
    fn id(&self) -> &ID {
        &self.id
    }
}
