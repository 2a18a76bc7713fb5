use crate::{APIResponse, BaseClient};
use reqwest::StatusCode;
use std::sync::Arc;

/// Delivers payment provider webhooks. Meant for tests and local development.
#[derive(Clone)]
pub struct WebhookClient {
    base: Arc<BaseClient>,
}

impl WebhookClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn deliver_payment_event(&self, payload: Vec<u8>, signature: String) -> APIResponse<()> {
        self.base
            .post_raw(
                payload,
                "webhooks/payments".into(),
                vec![("Stripe-Signature", signature)],
                StatusCode::NO_CONTENT,
            )
            .await
    }
}
