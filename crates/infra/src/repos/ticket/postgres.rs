use super::ITicketRepo;
use crate::repos::shared::postgres_repo::parse_column;
use boxoffice_domain::{Status, StatusSwap, Ticket, TicketStatus, ID};
use sqlx::{types::Uuid, FromRow, PgExecutor, PgPool};
use tracing::error;

pub struct PostgresTicketRepo {
    pool: PgPool,
}

impl PostgresTicketRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TicketRaw {
    ticket_uid: Uuid,
    event_uid: Uuid,
    name: String,
    price: i64,
    currency: String,
    seat_limit: i64,
    status: String,
    price_ref: Option<String>,
    created: i64,
    updated: i64,
}

impl TryFrom<TicketRaw> for Ticket {
    type Error = anyhow::Error;

    fn try_from(t: TicketRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: t.ticket_uid.into(),
            event_id: t.event_uid.into(),
            name: t.name,
            price: t.price,
            currency: t.currency,
            limit: t.seat_limit,
            status: parse_column("tickets.status", &t.status)?,
            price_ref: t.price_ref,
            created: t.created,
            updated: t.updated,
        })
    }
}

/// Inserts the `Ticket` on the given connection, which may be inside a transaction
pub(crate) async fn insert_ticket<'c, E>(executor: E, ticket: &Ticket) -> anyhow::Result<()>
where
    E: PgExecutor<'c>,
{
    sqlx::query(
        r#"
        INSERT INTO tickets
        (ticket_uid, event_uid, name, price, currency, seat_limit, status, price_ref, created, updated)
        VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(ticket.id.inner_ref())
    .bind(ticket.event_id.inner_ref())
    .bind(&ticket.name)
    .bind(ticket.price)
    .bind(&ticket.currency)
    .bind(ticket.limit)
    .bind(ticket.status.as_str())
    .bind(&ticket.price_ref)
    .bind(ticket.created)
    .bind(ticket.updated)
    .execute(executor)
    .await?;

    Ok(())
}

#[async_trait::async_trait]
impl ITicketRepo for PostgresTicketRepo {
    async fn insert(&self, ticket: &Ticket) -> anyhow::Result<()> {
        insert_ticket(&self.pool, ticket).await
    }

    async fn find(&self, ticket_id: &ID) -> Option<Ticket> {
        let raw: TicketRaw = match sqlx::query_as(
            r#"
            SELECT * FROM tickets AS t
            WHERE t.ticket_uid = $1
            "#,
        )
        .bind(ticket_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Unable to query ticket {}: {:?}", ticket_id, e);
                return None;
            }
        };
        raw.try_into().ok()
    }

    async fn find_many(&self, ticket_ids: &[ID]) -> anyhow::Result<Vec<Ticket>> {
        let ids: Vec<Uuid> = ticket_ids.iter().map(|id| *id.inner_ref()).collect();
        let tickets: Vec<TicketRaw> = sqlx::query_as(
            r#"
            SELECT * FROM tickets AS t
            WHERE t.ticket_uid = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        tickets.into_iter().map(Ticket::try_from).collect()
    }

    async fn find_by_event(&self, event_id: &ID) -> anyhow::Result<Vec<Ticket>> {
        let tickets: Vec<TicketRaw> = sqlx::query_as(
            r#"
            SELECT * FROM tickets AS t
            WHERE t.event_uid = $1
            ORDER BY t.created
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;

        tickets.into_iter().map(Ticket::try_from).collect()
    }

    async fn swap_status(&self, swap: &StatusSwap<TicketStatus>, now: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE tickets
            SET status = $3, updated = $4
            WHERE ticket_uid = $1 AND status = $2
            "#,
        )
        .bind(swap.id.inner_ref())
        .bind(swap.from.as_str())
        .bind(swap.to.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }
}
