use crate::error::BoxofficeError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_domain::{
    BookingStatus, PaymentSource, StatusSwap, Topic, Transaction, TransactionStatus,
    TransactionUpdate, ID,
};
use boxoffice_infra::{
    verify_signature, BoxofficeContext, CheckoutSessionObject, PaymentIntentObject,
    SignatureError, WebhookEvent,
};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Payment provider deliveries are acknowledged with 204 once handled or
/// ignored. Storage and queue failures answer 500 so the provider redelivers.
pub async fn handle_payment_webhook_controller(
    http_req: HttpRequest,
    body: web::Bytes,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    let signature = http_req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let usecase = HandlePaymentWebhookUseCase {
        payload: body.to_vec(),
        signature,
    };

    match execute(usecase, &ctx).await {
        Ok(_) => Ok(HttpResponse::NoContent().finish()),
        Err(UseCaseError::SignatureInvalid(e)) => Err(BoxofficeError::BadClientData(e.to_string())),
        Err(UseCaseError::MalformedEvent(e)) => Err(BoxofficeError::BadClientData(e)),
        Err(UseCaseError::StorageError | UseCaseError::QueueError) => {
            Err(BoxofficeError::InternalError)
        }
    }
}

#[derive(Debug)]
pub struct HandlePaymentWebhookUseCase {
    /// Raw request body. The signature is computed over these exact bytes.
    pub payload: Vec<u8>,
    pub signature: String,
}

#[derive(Debug, PartialEq)]
pub enum WebhookOutcome {
    Handled,
    Ignored,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    SignatureInvalid(SignatureError),
    MalformedEvent(String),
    StorageError,
    QueueError,
}

enum PaymentEvent {
    PaymentIntentCreated(PaymentIntentObject),
    PaymentIntentSucceeded(PaymentIntentObject),
    CheckoutSessionCompleted(CheckoutSessionObject),
}

impl PaymentEvent {
    fn parse(event: WebhookEvent) -> Result<Option<Self>, UseCaseError> {
        let object = event.data.object;
        let parsed = match event.event_type.as_str() {
            "payment_intent.created" => Self::PaymentIntentCreated(from_object(object)?),
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded(from_object(object)?),
            "checkout.session.completed" => Self::CheckoutSessionCompleted(from_object(object)?),
            _ => return Ok(None),
        };
        Ok(Some(parsed))
    }
}

fn from_object<T: serde::de::DeserializeOwned>(object: serde_json::Value) -> Result<T, UseCaseError> {
    serde_json::from_value(object).map_err(|e| UseCaseError::MalformedEvent(e.to_string()))
}

fn request_id(metadata: &HashMap<String, String>) -> Option<ID> {
    metadata.get("requestId").and_then(|id| id.parse().ok())
}

impl HandlePaymentWebhookUseCase {
    async fn find_transaction(
        reference_id: Option<ID>,
        ctx: &BoxofficeContext,
    ) -> Option<Transaction> {
        match reference_id {
            Some(reference_id) => ctx.repos.transactions.find_by_reference(&reference_id).await,
            None => None,
        }
    }

    async fn send_update(
        transaction: &Transaction,
        from: TransactionStatus,
        to: TransactionStatus,
        intent: &PaymentIntentObject,
        delay: Duration,
        ctx: &BoxofficeContext,
    ) -> Result<(), UseCaseError> {
        let swap = StatusSwap::new(transaction.id.clone(), from, to)
            .map_err(|e| UseCaseError::MalformedEvent(e.to_string()))?;
        let update = TransactionUpdate {
            swap,
            source: Some(PaymentSource::PaymentIntent),
            source_id: Some(intent.id.clone()),
            currency: intent.currency.clone(),
        };
        let body = serde_json::to_string(&update).map_err(|_| UseCaseError::QueueError)?;
        ctx.queue
            .send(Topic::PaymentTransactionUpdates.queue_name(), &body, delay)
            .await
            .map_err(|_| UseCaseError::QueueError)?;
        Ok(())
    }

    async fn payment_intent_created(
        intent: PaymentIntentObject,
        ctx: &BoxofficeContext,
    ) -> Result<WebhookOutcome, UseCaseError> {
        let transaction = match Self::find_transaction(request_id(&intent.metadata), ctx).await {
            Some(t) => t,
            None => {
                warn!(payment_intent = %intent.id, "No transaction matches the payment intent");
                return Ok(WebhookOutcome::Ignored);
            }
        };
        let now = ctx.sys.get_timestamp_millis();
        ctx.repos
            .saga
            .record_payment_intent(&transaction.id, &intent.id, now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Self::send_update(
            &transaction,
            TransactionStatus::Pending,
            TransactionStatus::Processing,
            &intent,
            Duration::ZERO,
            ctx,
        )
        .await?;
        Ok(WebhookOutcome::Handled)
    }

    async fn payment_intent_succeeded(
        intent: PaymentIntentObject,
        ctx: &BoxofficeContext,
    ) -> Result<WebhookOutcome, UseCaseError> {
        let transaction = match Self::find_transaction(request_id(&intent.metadata), ctx).await {
            Some(t) => t,
            None => {
                warn!(payment_intent = %intent.id, "No transaction matches the payment intent");
                return Ok(WebhookOutcome::Ignored);
            }
        };
        let pending = ctx
            .repos
            .bookings
            .find_by_transaction(&transaction.id)
            .await
            .map_err(|_| UseCaseError::StorageError)?
            .iter()
            .filter(|b| b.status == BookingStatus::Pending)
            .count();
        if pending == 0 {
            info!(transaction_id = %transaction.id, "Payment was already confirmed");
            return Ok(WebhookOutcome::Handled);
        }

        // The update is sent before anything is committed. Its consumer
        // confirms the payment as well, so it carries the whole step.
        // Leaves room for the pending -> processing update to land first.
        let delay = Duration::from_secs(ctx.config.payment_succeeded_delay_secs);
        Self::send_update(
            &transaction,
            TransactionStatus::Processing,
            TransactionStatus::Paid,
            &intent,
            delay,
            ctx,
        )
        .await?;

        let now = ctx.sys.get_timestamp_millis();
        ctx.repos
            .saga
            .confirm_payment(&transaction.id, &intent.id, now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        Ok(WebhookOutcome::Handled)
    }

    async fn checkout_session_completed(
        session: CheckoutSessionObject,
        ctx: &BoxofficeContext,
    ) -> Result<WebhookOutcome, UseCaseError> {
        let reference_id = session
            .client_reference_id
            .as_ref()
            .and_then(|id| id.parse().ok())
            .or_else(|| request_id(&session.metadata));
        let transaction = match Self::find_transaction(reference_id, ctx).await {
            Some(t) => t,
            None => {
                warn!(checkout_session = %session.id, "No transaction matches the checkout session");
                return Ok(WebhookOutcome::Ignored);
            }
        };
        let now = ctx.sys.get_timestamp_millis();
        ctx.repos
            .saga
            .record_checkout_session(&transaction.id, &session.id, session.url.as_deref(), now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        Ok(WebhookOutcome::Handled)
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for HandlePaymentWebhookUseCase {
    type Response = WebhookOutcome;

    type Error = UseCaseError;

    const NAME: &'static str = "HandlePaymentWebhook";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let now_secs = ctx.sys.get_timestamp_millis() / 1000;
        verify_signature(
            &self.payload,
            &self.signature,
            &ctx.config.payment_webhook_secret,
            now_secs,
            ctx.config.webhook_tolerance_secs,
        )
        .map_err(UseCaseError::SignatureInvalid)?;

        let event: WebhookEvent = serde_json::from_slice(&self.payload)
            .map_err(|e| UseCaseError::MalformedEvent(e.to_string()))?;
        let event_id = event.id.clone();
        let event_type = event.event_type.clone();

        match PaymentEvent::parse(event)? {
            Some(PaymentEvent::PaymentIntentCreated(intent)) => {
                Self::payment_intent_created(intent, ctx).await
            }
            Some(PaymentEvent::PaymentIntentSucceeded(intent)) => {
                Self::payment_intent_succeeded(intent, ctx).await
            }
            Some(PaymentEvent::CheckoutSessionCompleted(session)) => {
                Self::checkout_session_completed(session, ctx).await
            }
            None => {
                info!(event_id = %event_id, "Ignoring webhook event of type {}", event_type);
                Ok(WebhookOutcome::Ignored)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::booking::checkout::{CheckoutResponse, CheckoutUseCase};
    use crate::shared::test_helpers::setup_open_event;
    use boxoffice_domain::{CheckoutItem, ReservationStatus};
    use boxoffice_infra::{setup_context, sign_payload, IQueue, ReceivedMessage};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Refuses the first send and passes everything else through
    struct FlakyQueue {
        inner: Arc<dyn IQueue>,
        failed: AtomicBool,
    }

    #[async_trait::async_trait]
    impl IQueue for FlakyQueue {
        async fn send(&self, queue: &str, body: &str, delay: Duration) -> anyhow::Result<ID> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                anyhow::bail!("queue unavailable");
            }
            self.inner.send(queue, body, delay).await
        }

        async fn receive(
            &self,
            queue: &str,
            max_messages: usize,
            wait: Duration,
        ) -> anyhow::Result<Vec<ReceivedMessage>> {
            self.inner.receive(queue, max_messages, wait).await
        }

        async fn delete(&self, queue: &str, receipt_handle: &str) -> anyhow::Result<bool> {
            self.inner.delete(queue, receipt_handle).await
        }

        async fn subscribe(&self, topic: &str, queue: &str) -> anyhow::Result<()> {
            self.inner.subscribe(topic, queue).await
        }

        async fn publish(&self, topic: &str, body: &str) -> anyhow::Result<usize> {
            self.inner.publish(topic, body).await
        }
    }

    async fn checkout(ctx: &BoxofficeContext) -> CheckoutResponse {
        let (_, ticket) = setup_open_event(ctx, 5).await;
        CheckoutUseCase {
            user_id: ID::default(),
            request_id: ID::default(),
            items: vec![CheckoutItem {
                ticket_id: ticket.id,
                qty: 2,
            }],
        }
        .execute(ctx)
        .await
        .unwrap()
    }

    fn signed(ctx: &BoxofficeContext, event: serde_json::Value) -> HandlePaymentWebhookUseCase {
        let payload = serde_json::to_vec(&event).unwrap();
        let now_secs = ctx.sys.get_timestamp_millis() / 1000;
        let signature = sign_payload(&payload, &ctx.config.payment_webhook_secret, now_secs);
        HandlePaymentWebhookUseCase { payload, signature }
    }

    fn intent_event(event_type: &str, transaction: &Transaction) -> serde_json::Value {
        json!({
            "id": "evt_1",
            "type": event_type,
            "data": {
                "object": {
                    "id": "pi_1",
                    "currency": "nok",
                    "metadata": { "requestId": transaction.reference_id.to_string() }
                }
            }
        })
    }

    async fn updates(ctx: &BoxofficeContext) -> Vec<TransactionUpdate> {
        ctx.queue
            .receive(
                Topic::PaymentTransactionUpdates.queue_name(),
                10,
                Duration::from_millis(10),
            )
            .await
            .unwrap()
            .into_iter()
            .map(|m| serde_json::from_str(&m.body).unwrap())
            .collect()
    }

    #[actix_web::main]
    #[test]
    async fn rejects_bad_signature_without_side_effects() {
        let ctx = setup_context().await.unwrap();
        let res = checkout(&ctx).await;

        let mut usecase = signed(&ctx, intent_event("payment_intent.succeeded", &res.transaction));
        usecase.signature = sign_payload(&usecase.payload, "not-the-secret", 0);
        assert!(matches!(
            usecase.execute(&ctx).await,
            Err(UseCaseError::SignatureInvalid(_))
        ));

        let bookings = ctx
            .repos
            .bookings
            .find_by_transaction(&res.transaction.id)
            .await
            .unwrap();
        assert!(bookings.iter().all(|b| b.status == BookingStatus::Pending));
        assert!(updates(&ctx).await.is_empty());
    }

    #[actix_web::main]
    #[test]
    async fn created_records_intent_and_sends_processing_update() {
        let ctx = setup_context().await.unwrap();
        let res = checkout(&ctx).await;

        let outcome = signed(&ctx, intent_event("payment_intent.created", &res.transaction))
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Handled);

        let booking = ctx.repos.bookings.find(&res.bookings[0].id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_intent_id, Some("pi_1".into()));

        let updates = updates(&ctx).await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].swap.id, res.transaction.id);
        assert_eq!(updates[0].swap.from, TransactionStatus::Pending);
        assert_eq!(updates[0].swap.to, TransactionStatus::Processing);
        assert_eq!(updates[0].source_id, Some("pi_1".into()));
    }

    #[actix_web::main]
    #[test]
    async fn duplicate_succeeded_sends_one_update() {
        let mut ctx = setup_context().await.unwrap();
        ctx.config.payment_succeeded_delay_secs = 0;
        let res = checkout(&ctx).await;

        for _ in 0..2 {
            let outcome = signed(&ctx, intent_event("payment_intent.succeeded", &res.transaction))
                .execute(&ctx)
                .await
                .unwrap();
            assert_eq!(outcome, WebhookOutcome::Handled);
        }

        let booking = ctx.repos.bookings.find(&res.bookings[0].id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        let reservations = ctx
            .repos
            .reservations
            .find_by_booking(&booking.id)
            .await
            .unwrap();
        assert_eq!(reservations.len(), 2);
        assert!(reservations
            .iter()
            .all(|r| r.status == ReservationStatus::Paid));

        let updates = updates(&ctx).await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].swap.from, TransactionStatus::Processing);
        assert_eq!(updates[0].swap.to, TransactionStatus::Paid);
    }

    #[actix_web::main]
    #[test]
    async fn failed_send_leaves_succeeded_payment_for_redelivery() {
        let mut ctx = setup_context().await.unwrap();
        ctx.config.payment_succeeded_delay_secs = 0;
        let res = checkout(&ctx).await;
        ctx.queue = Arc::new(FlakyQueue {
            inner: ctx.queue.clone(),
            failed: AtomicBool::new(false),
        });

        let event = intent_event("payment_intent.succeeded", &res.transaction);
        assert_eq!(
            signed(&ctx, event.clone()).execute(&ctx).await,
            Err(UseCaseError::QueueError)
        );
        let booking = ctx.repos.bookings.find(&res.bookings[0].id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);

        let outcome = signed(&ctx, event).execute(&ctx).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Handled);
        let booking = ctx.repos.bookings.find(&res.bookings[0].id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);

        let updates = updates(&ctx).await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].swap.from, TransactionStatus::Processing);
        assert_eq!(updates[0].swap.to, TransactionStatus::Paid);
    }

    #[actix_web::main]
    #[test]
    async fn completed_session_is_recorded() {
        let ctx = setup_context().await.unwrap();
        let res = checkout(&ctx).await;

        let event = json!({
            "id": "evt_2",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_replaced",
                    "url": null,
                    "client_reference_id": res.transaction.reference_id.to_string(),
                }
            }
        });
        let outcome = signed(&ctx, event).execute(&ctx).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Handled);

        let transaction = ctx
            .repos
            .transactions
            .find(&res.transaction.id)
            .await
            .unwrap();
        assert_eq!(transaction.checkout_session_id, Some("cs_replaced".into()));
        assert_eq!(transaction.checkout_url, Some(res.checkout_url));
    }

    #[actix_web::main]
    #[test]
    async fn ignores_unknown_events_and_transactions() {
        let ctx = setup_context().await.unwrap();
        let res = checkout(&ctx).await;

        let outcome = signed(&ctx, intent_event("account.updated", &res.transaction))
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Ignored);

        let mut other = res.transaction.clone();
        other.reference_id = ID::default();
        let outcome = signed(&ctx, intent_event("payment_intent.succeeded", &other))
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Ignored);
        assert!(updates(&ctx).await.is_empty());

        let mut usecase = signed(&ctx, json!({ "type": "payment_intent.created", "data": {} }));
        assert!(matches!(
            usecase.execute(&ctx).await,
            Err(UseCaseError::MalformedEvent(_))
        ));
    }
}
