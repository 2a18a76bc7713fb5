use crate::shared::entity::{Entity, ID};
use crate::shared::status::{InvalidTransition, Status};
use crate::status_strings;

/// A priced, capacity limited class of admission for one `Event`
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: ID,
    pub event_id: ID,
    pub name: String,
    /// Price in the smallest currency unit
    pub price: i64,
    pub currency: String,
    /// Max number of seats. 0 means unlimited.
    pub limit: i64,
    pub status: TicketStatus,
    /// Opaque price reference at the payment provider
    pub price_ref: Option<String>,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    Draft,
    Open,
    Closed,
    Archived,
}

impl Status for TicketStatus {
    const ENTITY: &'static str = "ticket";

    fn next(&self) -> &'static [Self] {
        use TicketStatus::*;
        match self {
            Draft => &[Open, Archived],
            Open => &[Closed, Archived],
            Closed => &[Open, Archived],
            Archived => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Archived => "archived",
        }
    }
}

status_strings!(
    TicketStatus,
    [
        TicketStatus::Draft,
        TicketStatus::Open,
        TicketStatus::Closed,
        TicketStatus::Archived,
    ]
);

impl Ticket {
    pub fn new(
        event_id: ID,
        name: String,
        price: i64,
        currency: String,
        limit: i64,
        now: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            event_id,
            name,
            price,
            currency: currency.to_lowercase(),
            limit,
            status: TicketStatus::Draft,
            price_ref: None,
            created: now,
            updated: now,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.price >= 0 && self.limit >= 0 && self.currency.len() == 3 && !self.name.is_empty()
    }

    pub fn transition(&mut self, to: TicketStatus, now: i64) -> Result<TicketStatus, InvalidTransition> {
        let from = self.status;
        self.status = from.transition(to)?;
        self.updated = now;
        Ok(from)
    }
}

impl Entity for Ticket {
    fn id(&self) -> &ID {
        &self.id
    }
}
