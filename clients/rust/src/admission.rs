use crate::{APIResponse, BaseClient};
use boxoffice_api_structs::*;
use boxoffice_domain::ID;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct AdmissionClient {
    base: Arc<BaseClient>,
}

impl AdmissionClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn code(&self, reservation_id: ID) -> APIResponse<get_admission_code::APIResponse> {
        self.base
            .get(
                format!("reservations/{}/code", reservation_id),
                StatusCode::OK,
            )
            .await
    }

    pub async fn admit(&self, code: String) -> APIResponse<admit::APIResponse> {
        let body = admit::RequestBody { code };
        self.base
            .post(body, "admissions".into(), StatusCode::CREATED)
            .await
    }
}
