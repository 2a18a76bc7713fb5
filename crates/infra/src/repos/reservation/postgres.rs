use super::IReservationRepo;
use crate::repos::shared::postgres_repo::parse_column;
use boxoffice_domain::{Reservation, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresReservationRepo {
    pool: PgPool,
}

impl PostgresReservationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReservationRaw {
    reservation_uid: Uuid,
    booking_uid: Uuid,
    ticket_uid: Uuid,
    event_uid: Uuid,
    user_uid: Uuid,
    status: String,
    valid_until: i64,
    created: i64,
    updated: i64,
}

impl TryFrom<ReservationRaw> for Reservation {
    type Error = anyhow::Error;

    fn try_from(r: ReservationRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: r.reservation_uid.into(),
            booking_id: r.booking_uid.into(),
            ticket_id: r.ticket_uid.into(),
            event_id: r.event_uid.into(),
            user_id: r.user_uid.into(),
            status: parse_column("reservations.status", &r.status)?,
            valid_until: r.valid_until,
            created: r.created,
            updated: r.updated,
        })
    }
}

#[async_trait::async_trait]
impl IReservationRepo for PostgresReservationRepo {
    async fn find(&self, reservation_id: &ID) -> Option<Reservation> {
        let raw: ReservationRaw = match sqlx::query_as(
            r#"
            SELECT * FROM reservations AS r
            WHERE r.reservation_uid = $1
            "#,
        )
        .bind(reservation_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Unable to query reservation {}: {:?}", reservation_id, e);
                return None;
            }
        };
        raw.try_into().ok()
    }

    async fn find_by_booking(&self, booking_id: &ID) -> anyhow::Result<Vec<Reservation>> {
        let reservations: Vec<ReservationRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reservations AS r
            WHERE r.booking_uid = $1
            ORDER BY r.created
            "#,
        )
        .bind(booking_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;

        reservations.into_iter().map(Reservation::try_from).collect()
    }
}
