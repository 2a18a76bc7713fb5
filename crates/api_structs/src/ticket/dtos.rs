use boxoffice_domain::{Ticket, TicketStatus, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TicketDTO {
    pub id: ID,
    pub event_id: ID,
    pub name: String,
    pub price: i64,
    pub currency: String,
    pub limit: i64,
    pub status: TicketStatus,
    pub price_ref: Option<String>,
    pub created: i64,
    pub updated: i64,
}

impl TicketDTO {
    pub fn new(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            event_id: ticket.event_id,
            name: ticket.name,
            price: ticket.price,
            currency: ticket.currency,
            limit: ticket.limit,
            status: ticket.status,
            price_ref: ticket.price_ref,
            created: ticket.created,
            updated: ticket.updated,
        }
    }
}
