use boxoffice_domain::{
    Admission, CheckoutPlan, Event, EventMode, EventStatus, JobTask, StatusSwap, Ticket,
    TicketStatus, ID,
};
use boxoffice_infra::{BoxofficeContext, ISagaRepo, InMemoryPaymentProvider, SagaError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const HOUR: i64 = 1000 * 60 * 60;

/// An `Event` that is open for sales with one open `Ticket` of `limit` seats
pub async fn setup_open_event(ctx: &BoxofficeContext, limit: i64) -> (Event, Ticket) {
    let now = ctx.sys.get_timestamp_millis();
    let mut event = Event::new(
        ID::default(),
        "Jazz night".into(),
        now + 24 * HOUR,
        "Europe/Oslo".into(),
        now,
    );
    event.status = EventStatus::Open;
    ctx.repos.events.insert(&event).await.unwrap();

    let mut ticket = Ticket::new(event.id.clone(), "Standing".into(), 2000, "nok".into(), limit, now);
    ticket.status = TicketStatus::Open;
    ctx.repos.tickets.insert(&ticket).await.unwrap();

    (event, ticket)
}

/// Swaps the payment provider of the context for one the test can control
pub fn use_inmemory_payments(ctx: &mut BoxofficeContext) -> Arc<InMemoryPaymentProvider> {
    let payments = Arc::new(InMemoryPaymentProvider::new());
    ctx.payments = payments.clone();
    payments
}

/// Saga repository whose event writes fail while `failing` is set.
/// Everything else goes to the wrapped repository.
pub struct FailingEventWrites {
    pub inner: Arc<dyn ISagaRepo>,
    pub failing: AtomicBool,
}

impl FailingEventWrites {
    /// Swaps the saga repository of the context for a failing one
    pub fn install(ctx: &mut BoxofficeContext) -> Arc<Self> {
        let saga = Arc::new(Self {
            inner: ctx.repos.saga.clone(),
            failing: AtomicBool::new(true),
        });
        ctx.repos.saga = saga.clone();
        saga
    }

    pub fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), SagaError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("connection reset").into());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ISagaRepo for FailingEventWrites {
    async fn checkout(&self, plan: &CheckoutPlan) -> Result<(), SagaError> {
        self.inner.checkout(plan).await
    }

    async fn cancel(&self, booking_ids: &[ID], now: i64) -> Result<(), SagaError> {
        self.inner.cancel(booking_ids, now).await
    }

    async fn expire_booking(&self, booking_id: &ID, now: i64) -> Result<bool, SagaError> {
        self.inner.expire_booking(booking_id, now).await
    }

    async fn record_payment_intent(
        &self,
        transaction_id: &ID,
        payment_intent_id: &str,
        now: i64,
    ) -> Result<u64, SagaError> {
        self.inner
            .record_payment_intent(transaction_id, payment_intent_id, now)
            .await
    }

    async fn confirm_payment(
        &self,
        transaction_id: &ID,
        payment_intent_id: &str,
        now: i64,
    ) -> Result<u64, SagaError> {
        self.inner
            .confirm_payment(transaction_id, payment_intent_id, now)
            .await
    }

    async fn record_checkout_session(
        &self,
        transaction_id: &ID,
        session_id: &str,
        url: Option<&str>,
        now: i64,
    ) -> Result<(), SagaError> {
        self.inner
            .record_checkout_session(transaction_id, session_id, url, now)
            .await
    }

    async fn admit(&self, admission: &Admission, now: i64) -> Result<(), SagaError> {
        self.inner.admit(admission, now).await
    }

    async fn create_event(
        &self,
        event: &Event,
        tickets: &[Ticket],
        jobs: &[JobTask],
    ) -> Result<(), SagaError> {
        self.check()?;
        self.inner.create_event(event, tickets, jobs).await
    }

    async fn transition_event(
        &self,
        swap: &StatusSwap<EventStatus>,
        mode: EventMode,
        now: i64,
    ) -> Result<Option<u64>, SagaError> {
        self.check()?;
        self.inner.transition_event(swap, mode, now).await
    }
}
