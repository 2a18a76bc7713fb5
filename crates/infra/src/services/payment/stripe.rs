use super::{
    CheckoutSession, CheckoutSessionStatus, CreateCheckoutSession, IPaymentProvider,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::error;

/// Talks to the Stripe REST api. Requests are form encoded.
pub struct StripePaymentProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StripePaymentProvider {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
    status: Option<String>,
}

impl From<StripeCheckoutSession> for CheckoutSession {
    fn from(s: StripeCheckoutSession) -> Self {
        let status = match s.status.as_deref() {
            Some("complete") => CheckoutSessionStatus::Complete,
            Some("expired") => CheckoutSessionStatus::Expired,
            _ => CheckoutSessionStatus::Open,
        };
        Self {
            id: s.id,
            url: s.url,
            status,
        }
    }
}

/// Flattens the request into the bracketed form fields Stripe expects
fn checkout_form(session: &CreateCheckoutSession) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = vec![
        ("mode".into(), "payment".into()),
        ("success_url".into(), session.success_url.clone()),
        ("cancel_url".into(), session.cancel_url.clone()),
        ("client_reference_id".into(), session.reference_id.to_string()),
    ];
    let metadata = [
        ("requestId", session.reference_id.to_string()),
        ("orgId", session.org_id.to_string()),
        ("userId", session.user_id.to_string()),
    ];
    for (key, value) in metadata.iter() {
        form.push((format!("metadata[{}]", key), value.clone()));
        form.push((
            format!("payment_intent_data[metadata][{}]", key),
            value.clone(),
        ));
    }
    if let Some(expires_at) = session.expires_at {
        form.push(("expires_at".into(), (expires_at / 1000).to_string()));
    }
    for (i, item) in session.line_items.iter().enumerate() {
        let prefix = format!("line_items[{}]", i);
        form.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
        match &item.price_ref {
            Some(price) => form.push((format!("{}[price]", prefix), price.clone())),
            None => {
                form.push((
                    format!("{}[price_data][currency]", prefix),
                    item.currency.clone(),
                ));
                form.push((
                    format!("{}[price_data][unit_amount]", prefix),
                    item.unit_amount.to_string(),
                ));
                form.push((
                    format!("{}[price_data][product_data][name]", prefix),
                    item.name.clone(),
                ));
            }
        }
    }
    form
}

impl StripePaymentProvider {
    async fn read<T: for<'de> Deserialize<'de>>(
        res: reqwest::Response,
        method: &str,
    ) -> anyhow::Result<T> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!(
                "[Unexpected Response] Stripe API {} error. Status: {}, body: {}",
                method, status, body
            );
            anyhow::bail!("Stripe responded with status {}", status);
        }
        res.json::<T>().await.map_err(|e| {
            error!(
                "[Unexpected Response] Stripe API {} error. Error message: {:?}",
                method, e
            );
            anyhow::Error::new(e)
        })
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        form: &[(String, String)],
        path: &str,
    ) -> anyhow::Result<T> {
        match self
            .client
            .post(&format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .form(form)
            .send()
            .await
        {
            Ok(res) => Self::read(res, "POST").await,
            Err(e) => {
                error!("[Network Error] Stripe API POST error. Error message: {:?}", e);
                Err(anyhow::Error::new(e))
            }
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> anyhow::Result<T> {
        match self
            .client
            .get(&format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(res) => Self::read(res, "GET").await,
            Err(e) => {
                error!("[Network Error] Stripe API GET error. Error message: {:?}", e);
                Err(anyhow::Error::new(e))
            }
        }
    }
}

#[async_trait::async_trait]
impl IPaymentProvider for StripePaymentProvider {
    async fn create_checkout_session(
        &self,
        session: &CreateCheckoutSession,
    ) -> anyhow::Result<CheckoutSession> {
        let created: StripeCheckoutSession = self
            .post_form(&checkout_form(session), "v1/checkout/sessions")
            .await?;
        Ok(created.into())
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> anyhow::Result<CheckoutSession> {
        let session: StripeCheckoutSession = self
            .get(&format!("v1/checkout/sessions/{}", session_id))
            .await?;
        Ok(session.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::services::payment::CheckoutLineItem;
    use boxoffice_domain::ID;

    #[test]
    fn builds_checkout_form() {
        let session = CreateCheckoutSession {
            line_items: vec![
                CheckoutLineItem {
                    name: "GA".into(),
                    unit_amount: 100,
                    currency: "nok".into(),
                    quantity: 2,
                    price_ref: None,
                },
                CheckoutLineItem {
                    name: "VIP".into(),
                    unit_amount: 300,
                    currency: "nok".into(),
                    quantity: 1,
                    price_ref: Some("price_123".into()),
                },
            ],
            success_url: "http://localhost/success".into(),
            cancel_url: "http://localhost/cancel".into(),
            reference_id: ID::default(),
            org_id: ID::default(),
            user_id: ID::default(),
            expires_at: Some(1_700_000_000_500),
        };
        let form = checkout_form(&session);
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(
            get("metadata[requestId]"),
            Some(session.reference_id.to_string().as_str())
        );
        assert_eq!(
            get("payment_intent_data[metadata][requestId]"),
            Some(session.reference_id.to_string().as_str())
        );
        assert_eq!(get("expires_at"), Some("1700000000"));
        assert_eq!(get("line_items[0][quantity]"), Some("2"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("100"));
        assert_eq!(get("line_items[1][price]"), Some("price_123"));
        assert_eq!(get("line_items[1][price_data][unit_amount]"), None);
    }

    #[test]
    fn maps_session_status() {
        let session: StripeCheckoutSession = serde_json::from_str(
            r#"{"id": "cs_1", "url": null, "status": "expired", "object": "checkout.session"}"#,
        )
        .unwrap();
        let session = CheckoutSession::from(session);
        assert_eq!(session.status, CheckoutSessionStatus::Expired);
        assert_eq!(session.url, None);
    }
}
