use super::IBookingRepo;
use crate::repos::shared::postgres_repo::parse_column;
use boxoffice_domain::{Booking, BookingStatus, Status, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct BookingRaw {
    booking_uid: Uuid,
    event_uid: Uuid,
    ticket_uid: Uuid,
    user_uid: Uuid,
    org_uid: Uuid,
    qty: i64,
    subtotal: i64,
    currency: String,
    status: String,
    checkout_session_id: Option<String>,
    payment_intent_id: Option<String>,
    transaction_uid: Option<Uuid>,
    created: i64,
    updated: i64,
}

impl TryFrom<BookingRaw> for Booking {
    type Error = anyhow::Error;

    fn try_from(b: BookingRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: b.booking_uid.into(),
            event_id: b.event_uid.into(),
            ticket_id: b.ticket_uid.into(),
            user_id: b.user_uid.into(),
            org_id: b.org_uid.into(),
            qty: b.qty,
            subtotal: b.subtotal,
            currency: b.currency,
            status: parse_column("bookings.status", &b.status)?,
            checkout_session_id: b.checkout_session_id,
            payment_intent_id: b.payment_intent_id,
            transaction_id: b.transaction_uid.map(|id| id.into()),
            created: b.created,
            updated: b.updated,
        })
    }
}

pub(crate) fn holding_statuses() -> Vec<&'static str> {
    BookingStatus::HOLDING_SEATS
        .iter()
        .map(|s| s.as_str())
        .collect()
}

#[async_trait::async_trait]
impl IBookingRepo for PostgresBookingRepo {
    async fn find(&self, booking_id: &ID) -> Option<Booking> {
        let raw: BookingRaw = match sqlx::query_as(
            r#"
            SELECT * FROM bookings AS b
            WHERE b.booking_uid = $1
            "#,
        )
        .bind(booking_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Unable to query booking {}: {:?}", booking_id, e);
                return None;
            }
        };
        raw.try_into().ok()
    }

    async fn find_by_transaction(&self, transaction_id: &ID) -> anyhow::Result<Vec<Booking>> {
        let bookings: Vec<BookingRaw> = sqlx::query_as(
            r#"
            SELECT * FROM bookings AS b
            WHERE b.transaction_uid = $1
            ORDER BY b.created
            "#,
        )
        .bind(transaction_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;

        bookings.into_iter().map(Booking::try_from).collect()
    }

    async fn find_pending_by_event(&self, event_id: &ID) -> anyhow::Result<Vec<Booking>> {
        let bookings: Vec<BookingRaw> = sqlx::query_as(
            r#"
            SELECT * FROM bookings AS b
            WHERE b.event_uid = $1 AND b.status = $2
            "#,
        )
        .bind(event_id.inner_ref())
        .bind(BookingStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;

        bookings.into_iter().map(Booking::try_from).collect()
    }

    async fn reserved_seats(&self, ticket_id: &ID) -> anyhow::Result<i64> {
        let reserved: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(b.qty), 0)::BIGINT FROM bookings AS b
            WHERE b.ticket_uid = $1 AND b.status = ANY($2)
            "#,
        )
        .bind(ticket_id.inner_ref())
        .bind(holding_statuses())
        .fetch_one(&self.pool)
        .await?;

        Ok(reserved)
    }
}
