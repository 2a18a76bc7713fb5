use crate::{APIResponse, BaseClient};
use boxoffice_api_structs::*;
use boxoffice_domain::{CheckoutItem, ID};
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct BookingClient {
    base: Arc<BaseClient>,
}

impl BookingClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn checkout(
        &self,
        request_id: ID,
        items: Vec<CheckoutItem>,
    ) -> APIResponse<checkout::APIResponse> {
        let body = checkout::RequestBody { request_id, items };
        self.base
            .post(body, "checkout".into(), StatusCode::CREATED)
            .await
    }

    pub async fn resume_checkout(
        &self,
        transaction_id: ID,
    ) -> APIResponse<resume_checkout::APIResponse> {
        self.base
            .post(
                (),
                format!("transactions/{}/resume", transaction_id),
                StatusCode::OK,
            )
            .await
    }

    pub async fn cancel(&self, booking_id: ID) -> APIResponse<cancel_booking::APIResponse> {
        self.base
            .put((), format!("bookings/{}/cancel", booking_id), StatusCode::OK)
            .await
    }

    pub async fn cancel_transaction(
        &self,
        transaction_id: ID,
    ) -> APIResponse<cancel_bookings_by_transaction::APIResponse> {
        let body = cancel_bookings_by_transaction::RequestBody { transaction_id };
        self.base
            .put(body, "bookings/cancel".into(), StatusCode::OK)
            .await
    }
}
