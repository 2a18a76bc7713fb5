use super::ITransactionRepo;
use crate::repos::shared::inmemory_repo::*;
use boxoffice_domain::{Transaction, TransactionUpdate, ID};
use std::sync::Mutex;

pub struct InMemoryTransactionRepo {
    pub(crate) transactions: Mutex<Vec<Transaction>>,
}

impl InMemoryTransactionRepo {
    pub fn new() -> Self {
        Self {
            transactions: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl ITransactionRepo for InMemoryTransactionRepo {
    async fn find(&self, transaction_id: &ID) -> Option<Transaction> {
        find(transaction_id, &self.transactions)
    }

    async fn find_by_reference(&self, reference_id: &ID) -> Option<Transaction> {
        find_by(&self.transactions, |t| t.reference_id == *reference_id)
            .into_iter()
            .next()
    }

    async fn apply_update(&self, update: &TransactionUpdate, now: i64) -> anyhow::Result<bool> {
        let updated = update_many(
            &self.transactions,
            |t| t.id == update.swap.id && t.status == update.swap.from,
            |t| {
                t.status = update.swap.to;
                if update.source.is_some() {
                    t.source = update.source;
                }
                if update.source_id.is_some() {
                    t.source_id = update.source_id.clone();
                }
                if let Some(currency) = &update.currency {
                    t.currency = currency.clone();
                }
                t.updated = now;
            },
        );
        Ok(updated > 0)
    }
}
