use crate::shared::usecase::UseCase;
use boxoffice_domain::{SwapOutcome, TransactionStatus, TransactionUpdate, ID};
use boxoffice_infra::BoxofficeContext;
use tracing::{info, warn};

/// Applies a reconciliation message to its `Transaction`. The update only
/// lands while the row still is in the status it expects, so replays are no-ops.
/// A message that leaves the `Transaction` paid also completes its pending
/// `Booking`s, which makes it a carrier of the whole payment confirmation.
#[derive(Debug)]
pub struct ReconcileTransactionUseCase {
    pub update: TransactionUpdate,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for ReconcileTransactionUseCase {
    type Response = SwapOutcome;

    type Error = UseCaseError;

    const NAME: &'static str = "ReconcileTransaction";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let swap = &self.update.swap;
        let applied = ctx
            .repos
            .transactions
            .apply_update(&self.update, now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if applied {
            info!(
                transaction_id = %swap.id,
                "Transaction moved from {} to {}", swap.from, swap.to
            );
            self.confirm_payment(ctx, now).await?;
            return Ok(SwapOutcome::Applied);
        }

        let current = match ctx.repos.transactions.find(&swap.id).await {
            Some(t) => t.status,
            None => return Err(UseCaseError::NotFound(swap.id.clone())),
        };
        let outcome = swap.unmatched_outcome(current);
        warn!(
            transaction_id = %swap.id,
            "Update {} -> {} did not apply to transaction in {}: {:?}",
            swap.from, swap.to, current, outcome
        );
        // A replay after a failed confirmation finds the row paid already
        if current == swap.to {
            self.confirm_payment(ctx, now).await?;
        }
        Ok(outcome)
    }
}

impl ReconcileTransactionUseCase {
    async fn confirm_payment(&self, ctx: &BoxofficeContext, now: i64) -> Result<(), UseCaseError> {
        let payment_intent_id = match (&self.update.swap.to, &self.update.source_id) {
            (TransactionStatus::Paid, Some(id)) => id,
            _ => return Ok(()),
        };
        let completed = ctx
            .repos
            .saga
            .confirm_payment(&self.update.swap.id, payment_intent_id, now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if completed > 0 {
            info!(
                transaction_id = %self.update.swap.id,
                "Completed {} bookings of paid transaction", completed
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::booking::checkout::CheckoutUseCase;
    use crate::shared::test_helpers::setup_open_event;
    use boxoffice_domain::{
        Booking, BookingStatus, CheckoutItem, PaymentSource, ReservationStatus, StatusSwap,
        Transaction,
    };
    use boxoffice_infra::setup_context;

    async fn pending_transaction(ctx: &BoxofficeContext) -> Transaction {
        let (_, ticket) = setup_open_event(ctx, 3).await;
        CheckoutUseCase {
            user_id: ID::default(),
            request_id: ID::default(),
            items: vec![CheckoutItem {
                ticket_id: ticket.id,
                qty: 1,
            }],
        }
        .execute(ctx)
        .await
        .unwrap()
        .transaction
    }

    fn update(transaction: &Transaction, from: TransactionStatus, to: TransactionStatus) -> ReconcileTransactionUseCase {
        ReconcileTransactionUseCase {
            update: TransactionUpdate {
                swap: StatusSwap::new(transaction.id.clone(), from, to).unwrap(),
                source: Some(PaymentSource::PaymentIntent),
                source_id: Some("pi_1".into()),
                currency: Some("nok".into()),
            },
        }
    }

    async fn status_of(ctx: &BoxofficeContext, transaction: &Transaction) -> TransactionStatus {
        ctx.repos
            .transactions
            .find(&transaction.id)
            .await
            .unwrap()
            .status
    }

    async fn bookings_of(ctx: &BoxofficeContext, transaction: &Transaction) -> Vec<Booking> {
        ctx.repos
            .bookings
            .find_by_transaction(&transaction.id)
            .await
            .unwrap()
    }

    #[actix_web::main]
    #[test]
    async fn moves_through_processing_and_never_back() {
        use TransactionStatus::*;
        let ctx = setup_context().await.unwrap();
        let transaction = pending_transaction(&ctx).await;

        let outcome = update(&transaction, Pending, Processing)
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(outcome, SwapOutcome::Applied);
        let outcome = update(&transaction, Processing, Paid)
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(outcome, SwapOutcome::Applied);
        assert_eq!(status_of(&ctx, &transaction).await, Paid);

        // A late duplicate of the first message must not regress the payment
        let outcome = update(&transaction, Pending, Processing)
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(outcome, SwapOutcome::Stale);
        assert_eq!(status_of(&ctx, &transaction).await, Paid);
    }

    #[actix_web::main]
    #[test]
    async fn reports_updates_that_arrive_too_early() {
        use TransactionStatus::*;
        let ctx = setup_context().await.unwrap();
        let transaction = pending_transaction(&ctx).await;

        let outcome = update(&transaction, Processing, Paid)
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(outcome, SwapOutcome::Premature);
        assert_eq!(status_of(&ctx, &transaction).await, Pending);
    }

    #[actix_web::main]
    #[test]
    async fn rejects_unknown_transaction() {
        use TransactionStatus::*;
        let ctx = setup_context().await.unwrap();
        let transaction = pending_transaction(&ctx).await;
        let mut usecase = update(&transaction, Pending, Processing);
        usecase.update.swap.id = ID::default();

        assert!(matches!(
            usecase.execute(&ctx).await,
            Err(UseCaseError::NotFound(_))
        ));
    }

    #[actix_web::main]
    #[test]
    async fn paid_update_completes_pending_bookings() {
        use TransactionStatus::*;
        let ctx = setup_context().await.unwrap();
        let transaction = pending_transaction(&ctx).await;

        update(&transaction, Pending, Processing)
            .execute(&ctx)
            .await
            .unwrap();
        assert!(bookings_of(&ctx, &transaction)
            .await
            .iter()
            .all(|b| b.status == BookingStatus::Pending));

        let outcome = update(&transaction, Processing, Paid)
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(outcome, SwapOutcome::Applied);
        let completed = bookings_of(&ctx, &transaction).await;
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].status, BookingStatus::Completed);
        assert_eq!(completed[0].payment_intent_id, Some("pi_1".into()));
        let reservations = ctx
            .repos
            .reservations
            .find_by_booking(&completed[0].id)
            .await
            .unwrap();
        assert!(reservations
            .iter()
            .all(|r| r.status == ReservationStatus::Paid));

        // Replays still report stale and leave the confirmation in place
        let outcome = update(&transaction, Processing, Paid)
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(outcome, SwapOutcome::Stale);
        let replayed = bookings_of(&ctx, &transaction).await;
        assert_eq!(replayed[0].status, BookingStatus::Completed);
    }
}
