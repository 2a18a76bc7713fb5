mod inmemory;
mod postgres;

use boxoffice_domain::{Transaction, TransactionUpdate, ID};
pub use inmemory::InMemoryTransactionRepo;
pub use postgres::PostgresTransactionRepo;

#[async_trait::async_trait]
pub trait ITransactionRepo: Send + Sync {
    async fn find(&self, transaction_id: &ID) -> Option<Transaction>;
    async fn find_by_reference(&self, reference_id: &ID) -> Option<Transaction>;
    /// Applies the update only while the `Transaction` still has the status
    /// `update.swap.from`. Returns whether the row was updated.
    async fn apply_update(&self, update: &TransactionUpdate, now: i64) -> anyhow::Result<bool>;
}

#[cfg(test)]
mod tests {
    use crate::setup_context;
    use boxoffice_domain::{
        CheckoutItem, CheckoutPlan, Event, PaymentSource, StatusSwap, Ticket, TicketStatus,
        TransactionStatus, TransactionUpdate, ID,
    };

    #[tokio::test]
    async fn update_applies_once() {
        let ctx = setup_context().await.unwrap();
        let event = Event::new(ID::default(), "Gig".into(), 10_000, "UTC".into(), 0);
        ctx.repos.events.insert(&event).await.unwrap();
        let mut ticket = Ticket::new(event.id.clone(), "GA".into(), 100, "nok".into(), 0, 0);
        ticket.status = TicketStatus::Open;
        ctx.repos.tickets.insert(&ticket).await.unwrap();

        let items = vec![CheckoutItem {
            ticket_id: ticket.id.clone(),
            qty: 1,
        }];
        let plan = CheckoutPlan::build(&items, 10, &[ticket], &ID::default(), &ID::default(), 100, 0)
            .unwrap();
        ctx.repos.saga.checkout(&plan).await.unwrap();
        let transaction_id = plan.transaction.id.clone();

        let update = TransactionUpdate {
            swap: StatusSwap::new(
                transaction_id.clone(),
                TransactionStatus::Pending,
                TransactionStatus::Processing,
            )
            .unwrap(),
            source: Some(PaymentSource::PaymentIntent),
            source_id: Some("pi_1".into()),
            currency: Some("nok".into()),
        };
        assert!(ctx.repos.transactions.apply_update(&update, 1).await.unwrap());
        assert!(!ctx.repos.transactions.apply_update(&update, 2).await.unwrap());

        let transaction = ctx.repos.transactions.find(&transaction_id).await.unwrap();
        assert_eq!(transaction.status, TransactionStatus::Processing);
        assert_eq!(transaction.source, Some(PaymentSource::PaymentIntent));
        assert_eq!(transaction.source_id.as_deref(), Some("pi_1"));
        assert_eq!(transaction.updated, 1);

        let found = ctx
            .repos
            .transactions
            .find_by_reference(&plan.transaction.reference_id)
            .await
            .unwrap();
        assert_eq!(found.id, transaction_id);
    }
}
