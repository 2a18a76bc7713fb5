mod inmemory;
mod postgres;

use boxoffice_domain::{
    Admission, CheckoutPlan, Event, EventMode, EventStatus, InvalidTransition, JobTask, StatusSwap,
    Ticket, ID,
};
pub use inmemory::InMemorySagaRepo;
pub use postgres::PostgresSagaRepo;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SagaError {
    #[error("Ticket {0} was not found")]
    TicketNotFound(ID),
    #[error("Ticket {0} is not open for sale")]
    TicketNotOpen(ID),
    #[error("Ticket {ticket_id} only has {free} free seats left")]
    CapacityExceeded { ticket_id: ID, free: i64 },
    #[error("A transaction with the given reference already exists")]
    DuplicateReference,
    #[error("Booking {0} was not found")]
    BookingNotFound(ID),
    #[error("Reservation {0} was not found")]
    ReservationNotFound(ID),
    #[error("Reservation {0} has already been admitted")]
    AlreadyAdmitted(ID),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<sqlx::Error> for SagaError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.into())
    }
}

/// Writes that span several tables. Every method is applied completely or
/// not at all.
#[async_trait::async_trait]
pub trait ISagaRepo: Send + Sync {
    /// Persists the rows of the plan after checking the seats of every
    /// `Ticket` in it. Concurrent checkouts of the same `Ticket` are serialized.
    async fn checkout(&self, plan: &CheckoutPlan) -> Result<(), SagaError>;
    /// Cancels the pending `Booking`s together with their `Reservation`s and
    /// `Transaction`. The other pending `Booking`s of that `Transaction` are
    /// canceled with it, a checkout is never left partially canceled.
    async fn cancel(&self, booking_ids: &[ID], now: i64) -> Result<(), SagaError>;
    /// Expires the `Booking` if it is still pending. Returns whether it was expired.
    async fn expire_booking(&self, booking_id: &ID, now: i64) -> Result<bool, SagaError>;
    /// Stores the payment intent id on every `Booking` of the `Transaction`
    async fn record_payment_intent(
        &self,
        transaction_id: &ID,
        payment_intent_id: &str,
        now: i64,
    ) -> Result<u64, SagaError>;
    /// Completes the pending `Booking`s of the `Transaction` and marks their
    /// `Reservation`s paid until the start of the `Event`. Returns the number
    /// of `Booking`s completed.
    async fn confirm_payment(
        &self,
        transaction_id: &ID,
        payment_intent_id: &str,
        now: i64,
    ) -> Result<u64, SagaError>;
    async fn record_checkout_session(
        &self,
        transaction_id: &ID,
        session_id: &str,
        url: Option<&str>,
        now: i64,
    ) -> Result<(), SagaError>;
    /// Creates the `Admission` and completes its `Reservation`
    async fn admit(&self, admission: &Admission, now: i64) -> Result<(), SagaError>;
    /// Persists a new `Event` together with its `Ticket`s and the `JobTask`s
    /// that move it along its schedule
    async fn create_event(
        &self,
        event: &Event,
        tickets: &[Ticket],
        jobs: &[JobTask],
    ) -> Result<(), SagaError>;
    /// Moves the `Event` to `swap.to` only if it still is in `swap.from`.
    /// Opening it activates the subscriptions that wait for it. Returns `None`
    /// if the `Event` was not in `swap.from`, otherwise the number of
    /// subscriptions activated.
    async fn transition_event(
        &self,
        swap: &StatusSwap<EventStatus>,
        mode: EventMode,
        now: i64,
    ) -> Result<Option<u64>, SagaError>;
}

#[cfg(test)]
mod tests {
    use super::SagaError;
    use crate::{setup_context, BoxofficeContext};
    use boxoffice_domain::*;

    struct TestContext {
        ctx: BoxofficeContext,
        event: Event,
        ticket: Ticket,
    }

    async fn setup(limit: i64) -> TestContext {
        let ctx = setup_context().await.unwrap();
        let mut event = Event::new(ID::default(), "Concert".into(), 50_000, "UTC".into(), 0);
        event.status = EventStatus::Open;
        ctx.repos.events.insert(&event).await.unwrap();
        let mut ticket = Ticket::new(event.id.clone(), "GA".into(), 100, "nok".into(), limit, 0);
        ticket.status = TicketStatus::Open;
        ctx.repos.tickets.insert(&ticket).await.unwrap();
        TestContext { ctx, event, ticket }
    }

    fn plan(tickets: &[&Ticket], qty: i64) -> CheckoutPlan {
        let items: Vec<_> = tickets
            .iter()
            .map(|t| CheckoutItem {
                ticket_id: t.id.clone(),
                qty,
            })
            .collect();
        let tickets: Vec<_> = tickets.iter().map(|t| (*t).clone()).collect();
        CheckoutPlan::build(&items, 10, &tickets, &ID::default(), &ID::default(), 1000, 0).unwrap()
    }

    #[tokio::test]
    async fn rejects_checkout_over_capacity() {
        let TestContext { ctx, ticket, .. } = setup(3).await;

        ctx.repos.saga.checkout(&plan(&[&ticket], 2)).await.unwrap();
        let res = ctx.repos.saga.checkout(&plan(&[&ticket], 2)).await;
        assert!(matches!(res, Err(SagaError::CapacityExceeded { free: 1, .. })));
        ctx.repos.saga.checkout(&plan(&[&ticket], 1)).await.unwrap();
        assert_eq!(ctx.repos.bookings.reserved_seats(&ticket.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn rejects_duplicate_reference_and_closed_tickets() {
        let TestContext { ctx, ticket, .. } = setup(0).await;

        let first = plan(&[&ticket], 1);
        ctx.repos.saga.checkout(&first).await.unwrap();
        let mut again = plan(&[&ticket], 1);
        again.transaction.reference_id = first.transaction.reference_id.clone();
        assert!(matches!(
            ctx.repos.saga.checkout(&again).await,
            Err(SagaError::DuplicateReference)
        ));

        let swap = StatusSwap::new(ticket.id.clone(), TicketStatus::Open, TicketStatus::Closed).unwrap();
        ctx.repos.tickets.swap_status(&swap, 1).await.unwrap();
        assert!(matches!(
            ctx.repos.saga.checkout(&plan(&[&ticket], 1)).await,
            Err(SagaError::TicketNotOpen(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_checkouts_for_last_seat() {
        let TestContext { ctx, ticket, .. } = setup(1).await;

        let first = plan(&[&ticket], 1);
        let second = plan(&[&ticket], 1);
        let (a, b) = futures::join!(
            ctx.repos.saga.checkout(&first),
            ctx.repos.saga.checkout(&second)
        );
        assert!(a.is_ok() != b.is_ok());
        assert_eq!(ctx.repos.bookings.reserved_seats(&ticket.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cancel_of_one_booking_cancels_whole_checkout() {
        let TestContext {
            ctx, event, ticket, ..
        } = setup(10).await;
        let mut vip = Ticket::new(event.id.clone(), "VIP".into(), 300, "nok".into(), 2, 0);
        vip.status = TicketStatus::Open;
        ctx.repos.tickets.insert(&vip).await.unwrap();

        let plan = plan(&[&ticket, &vip], 2);
        ctx.repos.saga.checkout(&plan).await.unwrap();
        let transaction_id = plan.transaction.id.clone();

        ctx.repos
            .saga
            .cancel(&[plan.bookings[0].id.clone()], 1)
            .await
            .unwrap();
        let transaction = ctx.repos.transactions.find(&transaction_id).await.unwrap();
        assert_eq!(transaction.status, TransactionStatus::Canceled);
        for booking in &plan.bookings {
            let found = ctx.repos.bookings.find(&booking.id).await.unwrap();
            assert_eq!(found.status, BookingStatus::Canceled);
            let reservations = ctx
                .repos
                .reservations
                .find_by_booking(&booking.id)
                .await
                .unwrap();
            assert_eq!(reservations.len(), 2);
            assert!(reservations
                .iter()
                .all(|r| r.status == ReservationStatus::Canceled));
        }
        assert_eq!(ctx.repos.bookings.reserved_seats(&ticket.id).await.unwrap(), 0);
        assert_eq!(ctx.repos.bookings.reserved_seats(&vip.id).await.unwrap(), 0);

        // Nothing is left pending
        let res = ctx.repos.saga.cancel(&[plan.bookings[1].id.clone()], 2).await;
        assert!(matches!(res, Err(SagaError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn confirm_payment_is_conditional() {
        let TestContext {
            ctx, event, ticket, ..
        } = setup(10).await;
        let plan = plan(&[&ticket], 2);
        ctx.repos.saga.checkout(&plan).await.unwrap();
        let transaction_id = plan.transaction.id.clone();

        assert_eq!(
            ctx.repos
                .saga
                .record_payment_intent(&transaction_id, "pi_1", 1)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            ctx.repos
                .saga
                .confirm_payment(&transaction_id, "pi_1", 2)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            ctx.repos
                .saga
                .confirm_payment(&transaction_id, "pi_1", 3)
                .await
                .unwrap(),
            0
        );

        let booking = ctx.repos.bookings.find(&plan.bookings[0].id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        assert!(booking.is_paid());
        let reservations = ctx
            .repos
            .reservations
            .find_by_booking(&booking.id)
            .await
            .unwrap();
        assert!(reservations
            .iter()
            .all(|r| r.status == ReservationStatus::Paid && r.valid_until == event.date_time));

        // A paid booking can no longer expire
        assert!(!ctx.repos.saga.expire_booking(&booking.id, 4).await.unwrap());
    }

    #[tokio::test]
    async fn expires_pending_booking_and_transaction() {
        let TestContext { ctx, ticket, .. } = setup(10).await;
        let plan = plan(&[&ticket], 1);
        ctx.repos.saga.checkout(&plan).await.unwrap();

        assert!(ctx
            .repos
            .saga
            .expire_booking(&plan.bookings[0].id, 5)
            .await
            .unwrap());
        assert!(!ctx
            .repos
            .saga
            .expire_booking(&plan.bookings[0].id, 6)
            .await
            .unwrap());

        let booking = ctx.repos.bookings.find(&plan.bookings[0].id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Expired);
        let transaction = ctx.repos.transactions.find(&plan.transaction.id).await.unwrap();
        assert_eq!(transaction.status, TransactionStatus::Expired);
        assert!(matches!(
            ctx.repos.saga.expire_booking(&ID::default(), 7).await,
            Err(SagaError::BookingNotFound(_))
        ));
    }

    #[tokio::test]
    async fn admits_reservation_once() {
        let TestContext { ctx, ticket, .. } = setup(10).await;
        let plan = plan(&[&ticket], 1);
        ctx.repos.saga.checkout(&plan).await.unwrap();
        let reservation = plan.reservations[0].clone();
        let door = ID::default();

        // Not paid yet
        let res = ctx
            .repos
            .saga
            .admit(&Admission::new(reservation.id.clone(), door.clone(), 1), 1)
            .await;
        assert!(matches!(res, Err(SagaError::InvalidTransition(_))));
        assert!(ctx
            .repos
            .admissions
            .find_by_reservation(&reservation.id)
            .await
            .is_none());

        ctx.repos
            .saga
            .confirm_payment(&plan.transaction.id, "pi_1", 2)
            .await
            .unwrap();

        let first = Admission::new(reservation.id.clone(), door.clone(), 3);
        let second = Admission::new(reservation.id.clone(), door.clone(), 3);
        let (a, b) = futures::join!(
            ctx.repos.saga.admit(&first, 3),
            ctx.repos.saga.admit(&second, 3)
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(SagaError::AlreadyAdmitted(_))))
                .count(),
            1
        );
        let reservation = ctx.repos.reservations.find(&reservation.id).await.unwrap();
        assert_eq!(reservation.status, ReservationStatus::Completed);
    }

    #[tokio::test]
    async fn creates_event_with_tickets_and_jobs() {
        let ctx = setup_context().await.unwrap();
        let event = Event::new(ID::default(), "Premiere".into(), 50_000, "UTC".into(), 0);
        let tickets = vec![
            Ticket::new(event.id.clone(), "GA".into(), 100, "nok".into(), 10, 0),
            Ticket::new(event.id.clone(), "VIP".into(), 500, "nok".into(), 2, 0),
        ];
        let job = JobTask::new("open".into(), 1000, Topic::EventsToOpen, event.id.clone(), 0);

        ctx.repos
            .saga
            .create_event(&event, &tickets, &[job.clone()])
            .await
            .unwrap();
        assert!(ctx.repos.events.find(&event.id).await.is_some());
        assert_eq!(ctx.repos.tickets.find_by_event(&event.id).await.unwrap().len(), 2);
        assert!(ctx.repos.job_tasks.find(&job.id).await.is_some());

        // The same event again is rejected as a whole
        let other = Ticket::new(event.id.clone(), "Late".into(), 100, "nok".into(), 0, 0);
        assert!(ctx
            .repos
            .saga
            .create_event(&event, &[other], &[])
            .await
            .is_err());
        assert_eq!(ctx.repos.tickets.find_by_event(&event.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn opening_event_activates_waiting_subscriptions() {
        let ctx = setup_context().await.unwrap();
        let mut event = Event::new(ID::default(), "Gig".into(), 50_000, "UTC".into(), 0);
        event.status = EventStatus::Notify;
        let other = Event::new(ID::default(), "Other".into(), 50_000, "UTC".into(), 0);
        for e in [&event, &other] {
            ctx.repos.events.insert(e).await.unwrap();
        }
        let waiting = EventSubscription::new(event.id.clone(), ID::default(), 0);
        let elsewhere = EventSubscription::new(other.id.clone(), ID::default(), 0);
        for s in [&waiting, &elsewhere] {
            ctx.repos.subscriptions.insert(s).await.unwrap();
        }

        let swap = StatusSwap::new(event.id.clone(), EventStatus::Notify, EventStatus::Open).unwrap();
        let activated = ctx
            .repos
            .saga
            .transition_event(&swap, EventMode::Default, 5)
            .await
            .unwrap();
        assert_eq!(activated, Some(1));
        // Second time the precondition no longer holds
        let activated = ctx
            .repos
            .saga
            .transition_event(&swap, EventMode::Default, 6)
            .await
            .unwrap();
        assert_eq!(activated, None);

        let stored = ctx.repos.events.find(&event.id).await.unwrap();
        assert_eq!(stored.status, EventStatus::Open);
        assert_eq!(stored.updated, 5);
        let sub = ctx
            .repos
            .subscriptions
            .find_by_event_and_user(&event.id, &waiting.user_id)
            .await
            .unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.updated, 5);
        let untouched = ctx.repos.subscriptions.find_by_event(&other.id).await.unwrap();
        assert_eq!(untouched[0].status, SubscriptionStatus::Notify);
    }
}
