use crate::dtos::TicketDTO;
use boxoffice_domain::{Seats, Ticket, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub ticket: TicketDTO,
}

impl TicketResponse {
    pub fn new(ticket: Ticket) -> Self {
        Self {
            ticket: TicketDTO::new(ticket),
        }
    }
}

#[derive(Deserialize)]
pub struct TicketPathParams {
    pub ticket_id: ID,
}

pub mod create_ticket {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub event_id: ID,
    }

    #[derive(Serialize, Deserialize, Clone, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub name: String,
        pub price: i64,
        pub currency: String,
        /// 0 means unlimited
        #[serde(default)]
        pub limit: i64,
        #[serde(default)]
        pub price_ref: Option<String>,
    }

    pub type APIResponse = TicketResponse;
}

pub mod publish_ticket {
    use super::*;

    pub type PathParams = TicketPathParams;
    pub type APIResponse = TicketResponse;
}

pub mod close_ticket {
    use super::*;

    pub type PathParams = TicketPathParams;
    pub type APIResponse = TicketResponse;
}

pub mod reopen_ticket {
    use super::*;

    pub type PathParams = TicketPathParams;
    pub type APIResponse = TicketResponse;
}

pub mod archive_ticket {
    use super::*;

    pub type PathParams = TicketPathParams;
    pub type APIResponse = TicketResponse;
}

pub mod get_seats {
    use super::*;

    pub type PathParams = TicketPathParams;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub ticket_id: ID,
        /// Null when the ticket is unlimited
        pub free: Option<i64>,
        pub reserved: i64,
        pub limit: i64,
    }

    impl APIResponse {
        pub fn new(ticket_id: ID, seats: Seats) -> Self {
            Self {
                ticket_id,
                free: seats.free,
                reserved: seats.reserved,
                limit: seats.limit,
            }
        }
    }
}
