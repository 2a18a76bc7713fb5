use boxoffice_domain::{Event, EventMode, EventStatus, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EventDTO {
    pub id: ID,
    pub org_id: ID,
    pub name: String,
    pub date_time: i64,
    pub opens_at: Option<i64>,
    pub deadline: Option<i64>,
    pub timezone: String,
    pub status: EventStatus,
    pub mode: EventMode,
    pub created: i64,
    pub updated: i64,
}

impl EventDTO {
    pub fn new(event: Event) -> Self {
        Self {
            id: event.id,
            org_id: event.org_id,
            name: event.name,
            date_time: event.date_time,
            opens_at: event.opens_at,
            deadline: event.deadline,
            timezone: event.timezone,
            status: event.status,
            mode: event.mode,
            created: event.created,
            updated: event.updated,
        }
    }
}
