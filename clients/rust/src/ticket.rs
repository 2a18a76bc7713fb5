use crate::{APIResponse, BaseClient};
use boxoffice_api_structs::*;
use boxoffice_domain::ID;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct TicketClient {
    base: Arc<BaseClient>,
}

impl TicketClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn create(
        &self,
        event_id: ID,
        input: create_ticket::RequestBody,
    ) -> APIResponse<create_ticket::APIResponse> {
        self.base
            .post(
                input,
                format!("events/{}/tickets", event_id),
                StatusCode::CREATED,
            )
            .await
    }

    pub async fn publish(&self, ticket_id: ID) -> APIResponse<publish_ticket::APIResponse> {
        self.base
            .put((), format!("tickets/{}/publish", ticket_id), StatusCode::OK)
            .await
    }

    pub async fn close(&self, ticket_id: ID) -> APIResponse<close_ticket::APIResponse> {
        self.base
            .put((), format!("tickets/{}/close", ticket_id), StatusCode::OK)
            .await
    }

    pub async fn reopen(&self, ticket_id: ID) -> APIResponse<reopen_ticket::APIResponse> {
        self.base
            .put((), format!("tickets/{}/reopen", ticket_id), StatusCode::OK)
            .await
    }

    pub async fn archive(&self, ticket_id: ID) -> APIResponse<archive_ticket::APIResponse> {
        self.base
            .delete(format!("tickets/{}", ticket_id), StatusCode::OK)
            .await
    }

    pub async fn seats(&self, ticket_id: ID) -> APIResponse<get_seats::APIResponse> {
        self.base
            .get(format!("tickets/{}/seats", ticket_id), StatusCode::OK)
            .await
    }
}
