use super::ISubscriptionRepo;
use crate::repos::shared::postgres_repo::parse_column;
use boxoffice_domain::{EventSubscription, Status, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresSubscriptionRepo {
    pool: PgPool,
}

impl PostgresSubscriptionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SubscriptionRaw {
    subscription_uid: Uuid,
    event_uid: Uuid,
    user_uid: Uuid,
    status: String,
    created: i64,
    updated: i64,
}

impl TryFrom<SubscriptionRaw> for EventSubscription {
    type Error = anyhow::Error;

    fn try_from(s: SubscriptionRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: s.subscription_uid.into(),
            event_id: s.event_uid.into(),
            user_id: s.user_uid.into(),
            status: parse_column("event_subscriptions.status", &s.status)?,
            created: s.created,
            updated: s.updated,
        })
    }
}

#[async_trait::async_trait]
impl ISubscriptionRepo for PostgresSubscriptionRepo {
    async fn insert(&self, subscription: &EventSubscription) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO event_subscriptions
            (subscription_uid, event_uid, user_uid, status, created, updated)
            VALUES($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(subscription.id.inner_ref())
        .bind(subscription.event_id.inner_ref())
        .bind(subscription.user_id.inner_ref())
        .bind(subscription.status.as_str())
        .bind(subscription.created)
        .bind(subscription.updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_event_and_user(
        &self,
        event_id: &ID,
        user_id: &ID,
    ) -> Option<EventSubscription> {
        let raw: SubscriptionRaw = match sqlx::query_as(
            r#"
            SELECT * FROM event_subscriptions AS s
            WHERE s.event_uid = $1 AND s.user_uid = $2
            "#,
        )
        .bind(event_id.inner_ref())
        .bind(user_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!(
                    "Unable to query subscription of user {} to event {}: {:?}",
                    user_id, event_id, e
                );
                return None;
            }
        };
        raw.try_into().ok()
    }

    async fn find_by_event(&self, event_id: &ID) -> anyhow::Result<Vec<EventSubscription>> {
        let subscriptions: Vec<SubscriptionRaw> = sqlx::query_as(
            r#"
            SELECT * FROM event_subscriptions AS s
            WHERE s.event_uid = $1
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;

        subscriptions
            .into_iter()
            .map(EventSubscription::try_from)
            .collect()
    }
}
