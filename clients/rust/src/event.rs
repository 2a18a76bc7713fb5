use crate::{APIResponse, BaseClient};
use boxoffice_api_structs::*;
use boxoffice_domain::{EventMode, EventStatus, ID};
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct EventClient {
    base: Arc<BaseClient>,
}

pub struct CreateEventInput {
    pub name: String,
    pub date_time: i64,
    pub timezone: String,
    pub mode: Option<EventMode>,
    pub opens_at: Option<i64>,
    pub deadline: Option<i64>,
    pub publish: bool,
    pub tickets: Vec<create_ticket::RequestBody>,
}

impl EventClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn create(&self, input: CreateEventInput) -> APIResponse<create_event::APIResponse> {
        let body = create_event::RequestBody {
            name: input.name,
            date_time: input.date_time,
            timezone: input.timezone,
            mode: input.mode,
            opens_at: input.opens_at,
            deadline: input.deadline,
            publish: Some(input.publish),
            tickets: Some(input.tickets),
        };
        self.base
            .post(body, "events".into(), StatusCode::CREATED)
            .await
    }

    pub async fn publish(&self, event_id: ID) -> APIResponse<publish_event::APIResponse> {
        self.base
            .post((), format!("events/{}/publish", event_id), StatusCode::OK)
            .await
    }

    pub async fn update_status(
        &self,
        event_id: ID,
        status: EventStatus,
    ) -> APIResponse<update_event_status::APIResponse> {
        let body = update_event_status::RequestBody { status };
        self.base
            .put(body, format!("events/{}/status", event_id), StatusCode::OK)
            .await
    }

    pub async fn subscribe(&self, event_id: ID) -> APIResponse<subscribe::APIResponse> {
        self.base
            .post(
                (),
                format!("events/{}/subscriptions", event_id),
                StatusCode::OK,
            )
            .await
    }
}
