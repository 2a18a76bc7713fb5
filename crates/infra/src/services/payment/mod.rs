mod inmemory;
mod stripe;
mod webhook;

use boxoffice_domain::ID;
pub use inmemory::InMemoryPaymentProvider;
pub use stripe::StripePaymentProvider;
pub use webhook::{
    sign_payload, verify_signature, CheckoutSessionObject, PaymentIntentObject, SignatureError,
    WebhookEvent, WebhookEventData,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutLineItem {
    pub name: String,
    /// Price in the smallest currency unit
    pub unit_amount: i64,
    pub currency: String,
    pub quantity: i64,
    /// Price object at the provider. Used instead of `unit_amount` when set.
    pub price_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateCheckoutSession {
    pub line_items: Vec<CheckoutLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    /// Echoed back as `requestId` metadata on every webhook of the session
    pub reference_id: ID,
    pub org_id: ID,
    pub user_id: ID,
    /// Timestamp in millis after which the session can no longer be paid
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutSessionStatus {
    Open,
    Complete,
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub status: CheckoutSessionStatus,
}

#[async_trait::async_trait]
pub trait IPaymentProvider: Send + Sync {
    async fn create_checkout_session(
        &self,
        session: &CreateCheckoutSession,
    ) -> anyhow::Result<CheckoutSession>;
    async fn retrieve_checkout_session(&self, session_id: &str) -> anyhow::Result<CheckoutSession>;
}
