use super::{CheckoutSession, CheckoutSessionStatus, CreateCheckoutSession, IPaymentProvider};
use std::collections::HashMap;
use std::sync::Mutex;

/// Payment provider fake used when no api key is configured. Sessions are
/// kept in memory and can be completed or expired by hand.
pub struct InMemoryPaymentProvider {
    sessions: Mutex<HashMap<String, (CreateCheckoutSession, CheckoutSession)>>,
    failing: Mutex<bool>,
}

impl InMemoryPaymentProvider {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            failing: Mutex::new(false),
        }
    }

    fn sessions(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, (CreateCheckoutSession, CheckoutSession)>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes every following call fail until reset
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap_or_else(|p| p.into_inner()) = failing;
    }

    fn is_failing(&self) -> bool {
        *self.failing.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn set_status(&self, session_id: &str, status: CheckoutSessionStatus) {
        if let Some((_, session)) = self.sessions().get_mut(session_id) {
            session.status = status;
        }
    }

    /// The request a session was created from
    pub fn request_of(&self, session_id: &str) -> Option<CreateCheckoutSession> {
        self.sessions()
            .get(session_id)
            .map(|(request, _)| request.clone())
    }
}

#[async_trait::async_trait]
impl IPaymentProvider for InMemoryPaymentProvider {
    async fn create_checkout_session(
        &self,
        request: &CreateCheckoutSession,
    ) -> anyhow::Result<CheckoutSession> {
        if self.is_failing() {
            anyhow::bail!("Payment provider is unavailable");
        }
        let id = format!("cs_{}", uuid::Uuid::new_v4().simple());
        let session = CheckoutSession {
            url: Some(format!("https://checkout.local/pay/{}", id)),
            id: id.clone(),
            status: CheckoutSessionStatus::Open,
        };
        self.sessions()
            .insert(id, (request.clone(), session.clone()));
        Ok(session)
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> anyhow::Result<CheckoutSession> {
        if self.is_failing() {
            anyhow::bail!("Payment provider is unavailable");
        }
        match self.sessions().get(session_id) {
            Some((_, session)) => Ok(session.clone()),
            None => anyhow::bail!("Checkout session {} was not found", session_id),
        }
    }
}
