use super::IEventRepo;
use crate::repos::shared::postgres_repo::parse_column;
use boxoffice_domain::{Event, EventStatus, Status, ID};
use sqlx::{types::Uuid, FromRow, PgExecutor, PgPool};
use tracing::error;

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRaw {
    event_uid: Uuid,
    org_uid: Uuid,
    name: String,
    date_time: i64,
    opens_at: Option<i64>,
    deadline: Option<i64>,
    timezone: String,
    status: String,
    mode: String,
    created: i64,
    updated: i64,
}

impl TryFrom<EventRaw> for Event {
    type Error = anyhow::Error;

    fn try_from(e: EventRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: e.event_uid.into(),
            org_id: e.org_uid.into(),
            name: e.name,
            date_time: e.date_time,
            opens_at: e.opens_at,
            deadline: e.deadline,
            timezone: e.timezone,
            status: parse_column("events.status", &e.status)?,
            mode: parse_column("events.mode", &e.mode)?,
            created: e.created,
            updated: e.updated,
        })
    }
}

/// Inserts the `Event` on the given connection, which may be inside a transaction
pub(crate) async fn insert_event<'c, E>(executor: E, e: &Event) -> anyhow::Result<()>
where
    E: PgExecutor<'c>,
{
    sqlx::query(
        r#"
        INSERT INTO events
        (event_uid, org_uid, name, date_time, opens_at, deadline, timezone, status, mode, created, updated)
        VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(e.id.inner_ref())
    .bind(e.org_id.inner_ref())
    .bind(&e.name)
    .bind(e.date_time)
    .bind(e.opens_at)
    .bind(e.deadline)
    .bind(&e.timezone)
    .bind(e.status.as_str())
    .bind(e.mode.as_str())
    .bind(e.created)
    .bind(e.updated)
    .execute(executor)
    .await?;

    Ok(())
}

#[async_trait::async_trait]
impl IEventRepo for PostgresEventRepo {
    async fn insert(&self, e: &Event) -> anyhow::Result<()> {
        insert_event(&self.pool, e).await
    }

    async fn find(&self, event_id: &ID) -> Option<Event> {
        let raw: EventRaw = match sqlx::query_as(
            r#"
            SELECT * FROM events AS e
            WHERE e.event_uid = $1
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Unable to query event {}: {:?}", event_id, e);
                return None;
            }
        };
        raw.try_into().ok()
    }

    async fn find_by_statuses_starting_before(
        &self,
        statuses: &[EventStatus],
        before: i64,
    ) -> anyhow::Result<Vec<Event>> {
        let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        let events: Vec<EventRaw> = sqlx::query_as(
            r#"
            SELECT * FROM events AS e
            WHERE e.status = ANY($1) AND e.date_time < $2
            "#,
        )
        .bind(&statuses)
        .bind(before)
        .fetch_all(&self.pool)
        .await?;

        events.into_iter().map(Event::try_from).collect()
    }
}
