use super::{ISagaRepo, SagaError};
use crate::repos::booking::{holding_statuses, BookingRaw};
use crate::repos::event::insert_event;
use crate::repos::job_task::insert_job_task;
use crate::repos::reservation::ReservationRaw;
use crate::repos::ticket::insert_ticket;
use boxoffice_domain::{
    Admission, Booking, BookingStatus, CheckoutPlan, Event, EventMode, EventStatus, JobTask,
    Reservation, ReservationStatus, Seats, Status, StatusSwap, SubscriptionStatus, Ticket,
    TicketStatus, TransactionStatus, ID,
};
use sqlx::{types::Uuid, PgPool, Postgres, Transaction};

pub struct PostgresSagaRepo {
    pool: PgPool,
}

impl PostgresSagaRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

fn uuids(ids: &[ID]) -> Vec<Uuid> {
    ids.iter().map(|id| *id.inner_ref()).collect()
}

/// Statuses a `Transaction` can leave for `to`
fn open_statuses(to: TransactionStatus) -> Vec<&'static str> {
    [TransactionStatus::Pending, TransactionStatus::Processing]
        .iter()
        .filter(|s| s.can_transition_to(to))
        .map(|s| s.as_str())
        .collect()
}

/// Moves the `Transaction` to `to` unless one of its `Booking`s still holds seats
async fn close_transaction(
    tx: &mut Transaction<'_, Postgres>,
    transaction_id: &ID,
    to: TransactionStatus,
    now: i64,
) -> Result<(), SagaError> {
    sqlx::query(
        r#"
        UPDATE transactions AS t
        SET status = $2, updated = $3
        WHERE t.transaction_uid = $1 AND t.status = ANY($4)
        AND NOT EXISTS (
            SELECT 1 FROM bookings AS b
            WHERE b.transaction_uid = t.transaction_uid AND b.status = ANY($5)
        )
        "#,
    )
    .bind(transaction_id.inner_ref())
    .bind(to.as_str())
    .bind(now)
    .bind(open_statuses(to))
    .bind(holding_statuses())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait::async_trait]
impl ISagaRepo for PostgresSagaRepo {
    async fn checkout(&self, plan: &CheckoutPlan) -> Result<(), SagaError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT transaction_uid FROM transactions WHERE reference_uid = $1",
        )
        .bind(plan.transaction.reference_id.inner_ref())
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            return Err(SagaError::DuplicateReference);
        }

        // Ticket rows are locked in a fixed order so that concurrent
        // checkouts of overlapping tickets queue up instead of deadlocking
        let mut quantities = plan.quantities();
        quantities.sort_by_key(|(ticket_id, _)| *ticket_id.inner_ref());
        for (ticket_id, qty) in quantities {
            let ticket: Option<(i64, String)> = sqlx::query_as(
                "SELECT seat_limit, status FROM tickets WHERE ticket_uid = $1 FOR UPDATE",
            )
            .bind(ticket_id.inner_ref())
            .fetch_optional(&mut *tx)
            .await?;
            let (limit, status) = ticket.ok_or_else(|| SagaError::TicketNotFound(ticket_id.clone()))?;
            if status != TicketStatus::Open.as_str() {
                return Err(SagaError::TicketNotOpen(ticket_id));
            }

            let reserved: i64 = sqlx::query_scalar(
                r#"
                SELECT COALESCE(SUM(b.qty), 0)::BIGINT FROM bookings AS b
                WHERE b.ticket_uid = $1 AND b.status = ANY($2)
                "#,
            )
            .bind(ticket_id.inner_ref())
            .bind(holding_statuses())
            .fetch_one(&mut *tx)
            .await?;
            let seats = Seats::new(limit, reserved);
            if !seats.can_fit(qty) {
                return Err(SagaError::CapacityExceeded {
                    ticket_id,
                    free: seats.free.unwrap_or(0),
                });
            }
        }

        let t = &plan.transaction;
        sqlx::query(
            r#"
            INSERT INTO transactions
            (transaction_uid, org_uid, user_uid, reference_uid, amount, currency, status, source, source_id, checkout_session_id, checkout_url, created, updated)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(t.id.inner_ref())
        .bind(t.org_id.inner_ref())
        .bind(t.user_id.inner_ref())
        .bind(t.reference_id.inner_ref())
        .bind(t.amount)
        .bind(&t.currency)
        .bind(t.status.as_str())
        .bind(t.source.map(|s| s.as_str()))
        .bind(&t.source_id)
        .bind(&t.checkout_session_id)
        .bind(&t.checkout_url)
        .bind(t.created)
        .bind(t.updated)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                SagaError::DuplicateReference
            } else {
                e.into()
            }
        })?;

        for b in &plan.bookings {
            sqlx::query(
                r#"
                INSERT INTO bookings
                (booking_uid, event_uid, ticket_uid, user_uid, org_uid, qty, subtotal, currency, status, checkout_session_id, payment_intent_id, transaction_uid, created, updated)
                VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                "#,
            )
            .bind(b.id.inner_ref())
            .bind(b.event_id.inner_ref())
            .bind(b.ticket_id.inner_ref())
            .bind(b.user_id.inner_ref())
            .bind(b.org_id.inner_ref())
            .bind(b.qty)
            .bind(b.subtotal)
            .bind(&b.currency)
            .bind(b.status.as_str())
            .bind(&b.checkout_session_id)
            .bind(&b.payment_intent_id)
            .bind(b.transaction_id.as_ref().map(|id| *id.inner_ref()))
            .bind(b.created)
            .bind(b.updated)
            .execute(&mut *tx)
            .await?;
        }

        for r in &plan.reservations {
            sqlx::query(
                r#"
                INSERT INTO reservations
                (reservation_uid, booking_uid, ticket_uid, event_uid, user_uid, status, valid_until, created, updated)
                VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(r.id.inner_ref())
            .bind(r.booking_id.inner_ref())
            .bind(r.ticket_id.inner_ref())
            .bind(r.event_id.inner_ref())
            .bind(r.user_id.inner_ref())
            .bind(r.status.as_str())
            .bind(r.valid_until)
            .bind(r.created)
            .bind(r.updated)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn cancel(&self, booking_ids: &[ID], now: i64) -> Result<(), SagaError> {
        let mut tx = self.pool.begin().await?;

        // The requested bookings and every sibling from the same checkout
        let raws: Vec<BookingRaw> = sqlx::query_as(
            r#"
            SELECT * FROM bookings AS b
            WHERE b.booking_uid = ANY($1)
            OR b.transaction_uid IN (
                SELECT r.transaction_uid FROM bookings AS r WHERE r.booking_uid = ANY($1)
            )
            ORDER BY b.booking_uid
            FOR UPDATE
            "#,
        )
        .bind(uuids(booking_ids))
        .fetch_all(&mut *tx)
        .await?;
        let bookings = raws
            .into_iter()
            .map(Booking::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut transaction_ids: Vec<ID> = Vec::new();
        for booking_id in booking_ids {
            let booking = bookings
                .iter()
                .find(|b| b.id == *booking_id)
                .ok_or_else(|| SagaError::BookingNotFound(booking_id.clone()))?;
            booking.status.transition(BookingStatus::Canceled)?;
            if let Some(transaction_id) = &booking.transaction_id {
                if !transaction_ids.contains(transaction_id) {
                    transaction_ids.push(transaction_id.clone());
                }
            }
        }
        let canceled: Vec<ID> = bookings
            .iter()
            .filter(|b| booking_ids.contains(&b.id) || b.status == BookingStatus::Pending)
            .map(|b| b.id.clone())
            .collect();

        sqlx::query(
            r#"
            UPDATE bookings
            SET status = $2, updated = $3
            WHERE booking_uid = ANY($1)
            "#,
        )
        .bind(uuids(&canceled))
        .bind(BookingStatus::Canceled.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE reservations
            SET status = $3, updated = $4
            WHERE booking_uid = ANY($1) AND status = ANY($2)
            "#,
        )
        .bind(uuids(&canceled))
        .bind(vec![
            ReservationStatus::Pending.as_str(),
            ReservationStatus::Paid.as_str(),
        ])
        .bind(ReservationStatus::Canceled.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE transactions
            SET status = $2, updated = $3
            WHERE transaction_uid = ANY($1) AND status = ANY($4)
            "#,
        )
        .bind(uuids(&transaction_ids))
        .bind(TransactionStatus::Canceled.as_str())
        .bind(now)
        .bind(open_statuses(TransactionStatus::Canceled))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn expire_booking(&self, booking_id: &ID, now: i64) -> Result<bool, SagaError> {
        let mut tx = self.pool.begin().await?;

        let raw: Option<BookingRaw> = sqlx::query_as(
            "SELECT * FROM bookings WHERE booking_uid = $1 FOR UPDATE",
        )
        .bind(booking_id.inner_ref())
        .fetch_optional(&mut *tx)
        .await?;
        let booking = match raw {
            Some(raw) => Booking::try_from(raw)?,
            None => return Err(SagaError::BookingNotFound(booking_id.clone())),
        };
        if booking.status != BookingStatus::Pending {
            return Ok(false);
        }

        sqlx::query("UPDATE bookings SET status = $2, updated = $3 WHERE booking_uid = $1")
            .bind(booking_id.inner_ref())
            .bind(BookingStatus::Expired.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            UPDATE reservations
            SET status = $3, updated = $4
            WHERE booking_uid = $1 AND status = $2
            "#,
        )
        .bind(booking_id.inner_ref())
        .bind(ReservationStatus::Pending.as_str())
        .bind(ReservationStatus::Canceled.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if let Some(transaction_id) = &booking.transaction_id {
            close_transaction(&mut tx, transaction_id, TransactionStatus::Expired, now).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn record_payment_intent(
        &self,
        transaction_id: &ID,
        payment_intent_id: &str,
        now: i64,
    ) -> Result<u64, SagaError> {
        let res = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_intent_id = $2, updated = $3
            WHERE transaction_uid = $1
            "#,
        )
        .bind(transaction_id.inner_ref())
        .bind(payment_intent_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected())
    }

    async fn confirm_payment(
        &self,
        transaction_id: &ID,
        payment_intent_id: &str,
        now: i64,
    ) -> Result<u64, SagaError> {
        let mut tx = self.pool.begin().await?;

        let completed: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE bookings
            SET status = $3, payment_intent_id = $4, updated = $5
            WHERE transaction_uid = $1 AND status = $2
            RETURNING booking_uid
            "#,
        )
        .bind(transaction_id.inner_ref())
        .bind(BookingStatus::Pending.as_str())
        .bind(BookingStatus::Completed.as_str())
        .bind(payment_intent_id)
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        if !completed.is_empty() {
            sqlx::query(
                r#"
                UPDATE reservations AS r
                SET status = $3, valid_until = e.date_time, updated = $4
                FROM events AS e
                WHERE r.booking_uid = ANY($1) AND r.status = $2 AND e.event_uid = r.event_uid
                "#,
            )
            .bind(&completed)
            .bind(ReservationStatus::Pending.as_str())
            .bind(ReservationStatus::Paid.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(completed.len() as u64)
    }

    async fn record_checkout_session(
        &self,
        transaction_id: &ID,
        session_id: &str,
        url: Option<&str>,
        now: i64,
    ) -> Result<(), SagaError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE bookings
            SET checkout_session_id = $2, updated = $3
            WHERE transaction_uid = $1
            "#,
        )
        .bind(transaction_id.inner_ref())
        .bind(session_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            r#"
            UPDATE transactions
            SET checkout_session_id = $2, checkout_url = COALESCE($3, checkout_url), updated = $4
            WHERE transaction_uid = $1
            "#,
        )
        .bind(transaction_id.inner_ref())
        .bind(session_id)
        .bind(url)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn admit(&self, admission: &Admission, now: i64) -> Result<(), SagaError> {
        let mut tx = self.pool.begin().await?;

        let raw: Option<ReservationRaw> = sqlx::query_as(
            "SELECT * FROM reservations WHERE reservation_uid = $1 FOR UPDATE",
        )
        .bind(admission.reservation_id.inner_ref())
        .fetch_optional(&mut *tx)
        .await?;
        let reservation = match raw {
            Some(raw) => Reservation::try_from(raw)?,
            None => {
                return Err(SagaError::ReservationNotFound(
                    admission.reservation_id.clone(),
                ))
            }
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO admissions
            (admission_uid, reservation_uid, admitted_by, kind, status, created)
            VALUES($1, $2, $3, $4, $5, $6)
            ON CONFLICT (reservation_uid) DO NOTHING
            "#,
        )
        .bind(admission.id.inner_ref())
        .bind(admission.reservation_id.inner_ref())
        .bind(admission.by.inner_ref())
        .bind(admission.kind.as_str())
        .bind(admission.status.as_str())
        .bind(admission.created)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(SagaError::AlreadyAdmitted(admission.reservation_id.clone()));
        }

        let status = reservation.status.transition(ReservationStatus::Completed)?;
        sqlx::query("UPDATE reservations SET status = $2, updated = $3 WHERE reservation_uid = $1")
            .bind(reservation.id.inner_ref())
            .bind(status.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn create_event(
        &self,
        event: &Event,
        tickets: &[Ticket],
        jobs: &[JobTask],
    ) -> Result<(), SagaError> {
        let mut tx = self.pool.begin().await?;

        insert_event(&mut *tx, event).await?;
        for ticket in tickets {
            insert_ticket(&mut *tx, ticket).await?;
        }
        for job in jobs {
            insert_job_task(&mut *tx, job).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn transition_event(
        &self,
        swap: &StatusSwap<EventStatus>,
        mode: EventMode,
        now: i64,
    ) -> Result<Option<u64>, SagaError> {
        let mut tx = self.pool.begin().await?;

        let res = sqlx::query(
            r#"
            UPDATE events
            SET status = $3, mode = $4, updated = $5
            WHERE event_uid = $1 AND status = $2
            "#,
        )
        .bind(swap.id.inner_ref())
        .bind(swap.from.as_str())
        .bind(swap.to.as_str())
        .bind(mode.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }

        let mut activated = 0;
        if swap.to == EventStatus::Open {
            activated = sqlx::query(
                r#"
                UPDATE event_subscriptions
                SET status = $3, updated = $4
                WHERE event_uid = $1 AND status = $2
                "#,
            )
            .bind(swap.id.inner_ref())
            .bind(SubscriptionStatus::Notify.as_str())
            .bind(SubscriptionStatus::Active.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(Some(activated))
    }
}
