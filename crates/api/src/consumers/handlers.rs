use crate::booking::{
    expire_pending_booking::{self, ExpirePendingBookingUseCase},
    reconcile_transaction::{self, ReconcileTransactionUseCase},
};
use crate::event::update_event_status::{self, UpdateEventStatusUseCase};
use crate::job::complete_job::CompleteJobUseCase;
use crate::shared::usecase::execute;
use boxoffice_domain::{
    EventStatus, JobPayload, SwapOutcome, Topic, TransactionUpdate, TransitionTrigger,
};
use boxoffice_infra::BoxofficeContext;
use tracing::{info, warn};

/// Handles one message of the queue of `topic`. Returning an error leaves
/// the message for redelivery.
pub async fn handle_message(
    topic: Topic,
    body: String,
    ctx: BoxofficeContext,
) -> anyhow::Result<()> {
    match topic {
        Topic::EventsToOpen => move_event(&body, EventStatus::Open, &ctx).await,
        Topic::EventsToClose => move_event(&body, EventStatus::Admission, &ctx).await,
        Topic::EventsToComplete => move_event(&body, EventStatus::Completed, &ctx).await,
        Topic::PendingTransactions => expire_booking(&body, &ctx).await,
        Topic::PaymentTransactionUpdates => reconcile(&body, &ctx).await,
    }
}

async fn complete_job(payload: &JobPayload, ctx: &BoxofficeContext) -> anyhow::Result<()> {
    let usecase = CompleteJobUseCase {
        payload_id: payload.payload_id.clone(),
    };
    match execute(usecase, ctx).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            info!(payload_id = %payload.payload_id, "Job was already done or expired");
            Ok(())
        }
        Err(e) => anyhow::bail!("Unable to complete job: {:?}", e),
    }
}

async fn move_event(body: &str, status: EventStatus, ctx: &BoxofficeContext) -> anyhow::Result<()> {
    let payload: JobPayload = serde_json::from_str(body)?;
    let usecase = UpdateEventStatusUseCase {
        event_id: payload.entity_id.clone(),
        org_id: None,
        status,
        trigger: TransitionTrigger::Job,
    };

    use update_event_status::UseCaseError;
    match execute(usecase, ctx).await {
        Ok(_) => (),
        // Moved by hand in the meantime. The job has nothing left to do.
        Err(UseCaseError::InvalidTransition(e)) => {
            warn!(event_id = %payload.entity_id, "Skipping scheduled transition: {}", e)
        }
        Err(UseCaseError::NotFound(event_id)) => {
            warn!(event_id = %event_id, "Event of scheduled transition no longer exists")
        }
        Err(e) => anyhow::bail!("Unable to move event to {}: {:?}", status, e),
    }

    complete_job(&payload, ctx).await
}

async fn expire_booking(body: &str, ctx: &BoxofficeContext) -> anyhow::Result<()> {
    let payload: JobPayload = serde_json::from_str(body)?;
    let usecase = ExpirePendingBookingUseCase {
        booking_id: payload.entity_id.clone(),
    };

    use expire_pending_booking::UseCaseError;
    match execute(usecase, ctx).await {
        Ok(_) => (),
        Err(UseCaseError::NotFound(booking_id)) => {
            warn!(booking_id = %booking_id, "Booking of hold expiry no longer exists")
        }
        Err(e) => anyhow::bail!("Unable to expire booking: {:?}", e),
    }

    complete_job(&payload, ctx).await
}

async fn reconcile(body: &str, ctx: &BoxofficeContext) -> anyhow::Result<()> {
    let update: TransactionUpdate = serde_json::from_str(body)?;
    let transaction_id = update.swap.id.clone();
    let usecase = ReconcileTransactionUseCase { update };

    use reconcile_transaction::UseCaseError;
    match execute(usecase, ctx).await {
        Ok(SwapOutcome::Applied) | Ok(SwapOutcome::Stale) => Ok(()),
        Ok(SwapOutcome::Premature) => {
            anyhow::bail!("Update of transaction {} arrived before its predecessor", transaction_id)
        }
        Err(UseCaseError::NotFound(transaction_id)) => {
            warn!(transaction_id = %transaction_id, "Transaction of update no longer exists");
            Ok(())
        }
        Err(e) => anyhow::bail!("Unable to reconcile transaction: {:?}", e),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::booking::checkout::CheckoutUseCase;
    use crate::job::enqueue_job::EnqueueJobUseCase;
    use crate::shared::test_helpers::{setup_open_event, FailingEventWrites, HOUR};
    use crate::shared::usecase::UseCase;
    use boxoffice_domain::{
        CheckoutItem, Event, EventMode, EventSubscription, JobTask, JobTaskStatus, StatusSwap,
        SubscriptionStatus, TransactionStatus, ID,
    };
    use boxoffice_infra::setup_context;

    async fn scheduled_event(ctx: &BoxofficeContext, status: EventStatus) -> Event {
        let now = ctx.sys.get_timestamp_millis();
        let mut event = Event::new(
            ID::default(),
            "Opening night".into(),
            now + 24 * HOUR,
            "Europe/Oslo".into(),
            now,
        );
        event.status = status;
        event.mode = EventMode::Scheduled;
        ctx.repos.events.insert(&event).await.unwrap();
        event
    }

    async fn job(ctx: &BoxofficeContext, event: &Event, topic: Topic) -> JobTask {
        let now = ctx.sys.get_timestamp_millis();
        let mut usecase = EnqueueJobUseCase::for_event(event, topic, now + HOUR);
        usecase.execute(ctx).await.unwrap()
    }

    #[actix_web::main]
    #[test]
    async fn fired_open_job_opens_event_and_completes_job() {
        let ctx = setup_context().await.unwrap();
        let event = scheduled_event(&ctx, EventStatus::Notify).await;
        let job = job(&ctx, &event, Topic::EventsToOpen).await;

        let body = serde_json::to_string(&job.payload).unwrap();
        handle_message(Topic::EventsToOpen, body.clone(), ctx.clone())
            .await
            .unwrap();

        let stored = ctx.repos.events.find(&event.id).await.unwrap();
        assert_eq!(stored.status, EventStatus::Open);
        let stored_job = ctx.repos.job_tasks.find(&job.id).await.unwrap();
        assert_eq!(stored_job.status, JobTaskStatus::Done);

        // Redelivery of the same message is acknowledged without effect
        handle_message(Topic::EventsToOpen, body, ctx.clone())
            .await
            .unwrap();
        let stored = ctx.repos.events.find(&event.id).await.unwrap();
        assert_eq!(stored.status, EventStatus::Open);
    }

    #[actix_web::main]
    #[test]
    async fn failed_open_is_left_for_redelivery() {
        let mut ctx = setup_context().await.unwrap();
        let event = scheduled_event(&ctx, EventStatus::Notify).await;
        let job = job(&ctx, &event, Topic::EventsToOpen).await;
        let waiting = EventSubscription::new(event.id.clone(), ID::default(), 0);
        ctx.repos.subscriptions.insert(&waiting).await.unwrap();
        let saga = FailingEventWrites::install(&mut ctx);

        let body = serde_json::to_string(&job.payload).unwrap();
        assert!(handle_message(Topic::EventsToOpen, body.clone(), ctx.clone())
            .await
            .is_err());
        let stored = ctx.repos.events.find(&event.id).await.unwrap();
        assert_eq!(stored.status, EventStatus::Notify);
        let stored_job = ctx.repos.job_tasks.find(&job.id).await.unwrap();
        assert_eq!(stored_job.status, JobTaskStatus::Pending);

        saga.recover();
        handle_message(Topic::EventsToOpen, body, ctx.clone())
            .await
            .unwrap();
        let stored = ctx.repos.events.find(&event.id).await.unwrap();
        assert_eq!(stored.status, EventStatus::Open);
        let subscription = ctx
            .repos
            .subscriptions
            .find_by_event_and_user(&event.id, &waiting.user_id)
            .await
            .unwrap();
        assert_eq!(subscription.status, SubscriptionStatus::Active);
        let stored_job = ctx.repos.job_tasks.find(&job.id).await.unwrap();
        assert_eq!(stored_job.status, JobTaskStatus::Done);
    }

    #[actix_web::main]
    #[test]
    async fn close_job_on_canceled_event_is_completed() {
        let ctx = setup_context().await.unwrap();
        let event = scheduled_event(&ctx, EventStatus::Canceled).await;
        let job = job(&ctx, &event, Topic::EventsToClose).await;

        let body = serde_json::to_string(&job.payload).unwrap();
        handle_message(Topic::EventsToClose, body, ctx.clone())
            .await
            .unwrap();

        let stored = ctx.repos.events.find(&event.id).await.unwrap();
        assert_eq!(stored.status, EventStatus::Canceled);
        let stored_job = ctx.repos.job_tasks.find(&job.id).await.unwrap();
        assert_eq!(stored_job.status, JobTaskStatus::Done);
    }

    #[actix_web::main]
    #[test]
    async fn premature_update_is_left_for_redelivery() {
        let ctx = setup_context().await.unwrap();
        let (_, ticket) = setup_open_event(&ctx, 2).await;
        let res = CheckoutUseCase {
            user_id: ID::default(),
            request_id: ID::default(),
            items: vec![CheckoutItem {
                ticket_id: ticket.id,
                qty: 1,
            }],
        }
        .execute(&ctx)
        .await
        .unwrap();
        let update = |from, to| {
            let update = TransactionUpdate {
                swap: StatusSwap::new(res.transaction.id.clone(), from, to).unwrap(),
                source: None,
                source_id: Some("pi_1".into()),
                currency: None,
            };
            serde_json::to_string(&update).unwrap()
        };

        let paid = update(TransactionStatus::Processing, TransactionStatus::Paid);
        assert!(handle_message(Topic::PaymentTransactionUpdates, paid.clone(), ctx.clone())
            .await
            .is_err());

        let processing = update(TransactionStatus::Pending, TransactionStatus::Processing);
        handle_message(Topic::PaymentTransactionUpdates, processing, ctx.clone())
            .await
            .unwrap();
        handle_message(Topic::PaymentTransactionUpdates, paid.clone(), ctx.clone())
            .await
            .unwrap();
        // A duplicate is acknowledged
        handle_message(Topic::PaymentTransactionUpdates, paid, ctx.clone())
            .await
            .unwrap();

        let transaction = ctx
            .repos
            .transactions
            .find(&res.transaction.id)
            .await
            .unwrap();
        assert_eq!(transaction.status, TransactionStatus::Paid);

        assert!(
            handle_message(Topic::PaymentTransactionUpdates, "{".into(), ctx.clone())
                .await
                .is_err()
        );
    }
}
