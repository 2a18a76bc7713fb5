use crate::dtos::{EventDTO, TicketDTO};
use crate::ticket::api::create_ticket;
use boxoffice_domain::{Event, EventMode, EventStatus, Ticket, ID};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub event: EventDTO,
    pub tickets: Vec<TicketDTO>,
}

impl EventResponse {
    pub fn new(event: Event, tickets: Vec<Ticket>) -> Self {
        Self {
            event: EventDTO::new(event),
            tickets: tickets.into_iter().map(TicketDTO::new).collect(),
        }
    }
}

pub mod create_event {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub name: String,
        pub date_time: i64,
        pub timezone: String,
        #[serde(default)]
        pub mode: Option<EventMode>,
        #[serde(default)]
        pub opens_at: Option<i64>,
        #[serde(default)]
        pub deadline: Option<i64>,
        /// Open sales right away instead of waiting for `opensAt`
        #[serde(default)]
        pub publish: Option<bool>,
        #[serde(default)]
        pub tickets: Option<Vec<create_ticket::RequestBody>>,
    }

    pub type APIResponse = EventResponse;
}

pub mod publish_event {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub event_id: ID,
    }

    pub type APIResponse = EventResponse;
}

pub mod update_event_status {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub event_id: ID,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub status: EventStatus,
    }

    pub type APIResponse = EventResponse;
}
