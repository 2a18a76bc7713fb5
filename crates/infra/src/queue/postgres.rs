use super::{parse_receipt_handle, receipt_handle, IQueue, ReceivedMessage};
use crate::system::ISys;
use boxoffice_domain::ID;
use sqlx::{types::Uuid, FromRow, PgPool};
use std::sync::Arc;
use std::time::Duration;

pub struct PostgresQueue {
    pool: PgPool,
    sys: Arc<dyn ISys>,
    visibility_timeout: Duration,
}

const POLL_INTERVAL: Duration = Duration::from_millis(500);

impl PostgresQueue {
    pub fn new(pool: PgPool, sys: Arc<dyn ISys>, visibility_timeout: Duration) -> Self {
        Self {
            pool,
            sys,
            visibility_timeout,
        }
    }

    async fn claim(&self, queue: &str, max_messages: usize) -> anyhow::Result<Vec<ReceivedMessage>> {
        let now = self.sys.get_timestamp_millis();
        let receipt = ID::default();
        let claimed: Vec<ClaimedRaw> = sqlx::query_as(
            r#"
            WITH claimable AS (
                SELECT message_uid
                FROM queue_messages
                WHERE queue = $1 AND visible_at <= $2
                ORDER BY visible_at ASC, created ASC
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            UPDATE queue_messages AS m
            SET visible_at = $4,
                receive_count = m.receive_count + 1,
                receipt_uid = $5
            WHERE m.message_uid IN (SELECT message_uid FROM claimable)
            RETURNING m.message_uid, m.body, m.receive_count
            "#,
        )
        .bind(queue)
        .bind(now)
        .bind(max_messages as i64)
        .bind(now + self.visibility_timeout.as_millis() as i64)
        .bind(receipt.inner_ref())
        .fetch_all(&self.pool)
        .await?;

        Ok(claimed
            .into_iter()
            .map(|m| {
                let id: ID = m.message_uid.into();
                ReceivedMessage {
                    receipt_handle: receipt_handle(&id, &receipt),
                    id,
                    body: m.body,
                    receive_count: m.receive_count,
                }
            })
            .collect())
    }
}

#[derive(Debug, FromRow)]
struct ClaimedRaw {
    message_uid: Uuid,
    body: String,
    receive_count: i32,
}

#[async_trait::async_trait]
impl IQueue for PostgresQueue {
    async fn send(&self, queue: &str, body: &str, delay: Duration) -> anyhow::Result<ID> {
        let id = ID::default();
        let now = self.sys.get_timestamp_millis();
        sqlx::query(
            r#"
            INSERT INTO queue_messages
            (message_uid, queue, body, visible_at, receive_count, created)
            VALUES($1, $2, $3, $4, 0, $5)
            "#,
        )
        .bind(id.inner_ref())
        .bind(queue)
        .bind(body)
        .bind(now + delay.as_millis() as i64)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
    ) -> anyhow::Result<Vec<ReceivedMessage>> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let messages = self.claim(queue, max_messages).await?;
            let now = tokio::time::Instant::now();
            if !messages.is_empty() || now >= deadline {
                return Ok(messages);
            }
            tokio::time::sleep(std::cmp::min(deadline - now, POLL_INTERVAL)).await;
        }
    }

    async fn delete(&self, queue: &str, receipt_handle: &str) -> anyhow::Result<bool> {
        let (message_id, receipt) = match parse_receipt_handle(receipt_handle) {
            Some(parsed) => parsed,
            None => anyhow::bail!("Malformed receipt handle: {}", receipt_handle),
        };
        let res = sqlx::query(
            r#"
            DELETE FROM queue_messages
            WHERE message_uid = $1 AND queue = $2 AND receipt_uid = $3
            "#,
        )
        .bind(message_id.inner_ref())
        .bind(queue)
        .bind(receipt.inner_ref())
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn subscribe(&self, topic: &str, queue: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queue_subscriptions (topic, queue)
            VALUES($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(topic)
        .bind(queue)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn publish(&self, topic: &str, body: &str) -> anyhow::Result<usize> {
        let now = self.sys.get_timestamp_millis();
        let mut tx = self.pool.begin().await?;
        let queues: Vec<String> =
            sqlx::query_scalar("SELECT queue FROM queue_subscriptions WHERE topic = $1")
                .bind(topic)
                .fetch_all(&mut *tx)
                .await?;
        for queue in &queues {
            sqlx::query(
                r#"
                INSERT INTO queue_messages
                (message_uid, queue, body, visible_at, receive_count, created)
                VALUES($1, $2, $3, $4, 0, $4)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(queue)
            .bind(body)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(queues.len())
    }
}
