use super::ITransactionRepo;
use crate::repos::shared::postgres_repo::parse_column;
use boxoffice_domain::{Status, Transaction, TransactionUpdate, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresTransactionRepo {
    pool: PgPool,
}

impl PostgresTransactionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TransactionRaw {
    transaction_uid: Uuid,
    org_uid: Uuid,
    user_uid: Uuid,
    reference_uid: Uuid,
    amount: i64,
    currency: String,
    status: String,
    source: Option<String>,
    source_id: Option<String>,
    checkout_session_id: Option<String>,
    checkout_url: Option<String>,
    created: i64,
    updated: i64,
}

impl TryFrom<TransactionRaw> for Transaction {
    type Error = anyhow::Error;

    fn try_from(t: TransactionRaw) -> anyhow::Result<Self> {
        let source = match t.source {
            Some(source) => Some(parse_column("transactions.source", &source)?),
            None => None,
        };
        Ok(Self {
            id: t.transaction_uid.into(),
            org_id: t.org_uid.into(),
            user_id: t.user_uid.into(),
            reference_id: t.reference_uid.into(),
            amount: t.amount,
            currency: t.currency,
            status: parse_column("transactions.status", &t.status)?,
            source,
            source_id: t.source_id,
            checkout_session_id: t.checkout_session_id,
            checkout_url: t.checkout_url,
            created: t.created,
            updated: t.updated,
        })
    }
}

impl PostgresTransactionRepo {
    async fn find_one(&self, column: &str, id: &ID) -> Option<Transaction> {
        let query = format!("SELECT * FROM transactions WHERE {} = $1", column);
        let raw: TransactionRaw = match sqlx::query_as(&query)
            .bind(id.inner_ref())
            .fetch_optional(&self.pool)
            .await
        {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Unable to query transaction by {} {}: {:?}", column, id, e);
                return None;
            }
        };
        raw.try_into().ok()
    }
}

#[async_trait::async_trait]
impl ITransactionRepo for PostgresTransactionRepo {
    async fn find(&self, transaction_id: &ID) -> Option<Transaction> {
        self.find_one("transaction_uid", transaction_id).await
    }

    async fn find_by_reference(&self, reference_id: &ID) -> Option<Transaction> {
        self.find_one("reference_uid", reference_id).await
    }

    async fn apply_update(&self, update: &TransactionUpdate, now: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $3,
                source = COALESCE($4, source),
                source_id = COALESCE($5, source_id),
                currency = COALESCE($6, currency),
                updated = $7
            WHERE transaction_uid = $1 AND status = $2
            "#,
        )
        .bind(update.swap.id.inner_ref())
        .bind(update.swap.from.as_str())
        .bind(update.swap.to.as_str())
        .bind(update.source.map(|s| s.as_str()))
        .bind(&update.source_id)
        .bind(&update.currency)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }
}
