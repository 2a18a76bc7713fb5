use super::{ISagaRepo, SagaError};
use crate::repos::admission::InMemoryAdmissionRepo;
use crate::repos::booking::InMemoryBookingRepo;
use crate::repos::event::InMemoryEventRepo;
use crate::repos::job_task::InMemoryJobTaskRepo;
use crate::repos::reservation::InMemoryReservationRepo;
use crate::repos::shared::inmemory_repo::lock;
use crate::repos::subscription::InMemorySubscriptionRepo;
use crate::repos::ticket::InMemoryTicketRepo;
use crate::repos::transaction::InMemoryTransactionRepo;
use boxoffice_domain::{
    Admission, Booking, BookingStatus, CheckoutPlan, Event, EventMode, EventStatus, JobTask,
    ReservationStatus, Seats, Status, StatusSwap, SubscriptionStatus, Ticket, TicketStatus,
    Transaction, TransactionStatus, ID,
};
use std::sync::Arc;

/// Works directly on the collections of the other in-memory repositories.
/// Locks are always taken in the order the fields are declared.
pub struct InMemorySagaRepo {
    events: Arc<InMemoryEventRepo>,
    tickets: Arc<InMemoryTicketRepo>,
    bookings: Arc<InMemoryBookingRepo>,
    reservations: Arc<InMemoryReservationRepo>,
    transactions: Arc<InMemoryTransactionRepo>,
    admissions: Arc<InMemoryAdmissionRepo>,
    job_tasks: Arc<InMemoryJobTaskRepo>,
    subscriptions: Arc<InMemorySubscriptionRepo>,
}

impl InMemorySagaRepo {
    pub fn new(
        events: Arc<InMemoryEventRepo>,
        tickets: Arc<InMemoryTicketRepo>,
        bookings: Arc<InMemoryBookingRepo>,
        reservations: Arc<InMemoryReservationRepo>,
        transactions: Arc<InMemoryTransactionRepo>,
        admissions: Arc<InMemoryAdmissionRepo>,
        job_tasks: Arc<InMemoryJobTaskRepo>,
        subscriptions: Arc<InMemorySubscriptionRepo>,
    ) -> Self {
        Self {
            events,
            tickets,
            bookings,
            reservations,
            transactions,
            admissions,
            job_tasks,
            subscriptions,
        }
    }
}

fn holds_seats(bookings: &[Booking], transaction_id: &ID) -> bool {
    bookings
        .iter()
        .any(|b| b.transaction_id.as_ref() == Some(transaction_id) && b.status.holds_seats())
}

fn close_transaction(
    transactions: &mut [Transaction],
    transaction_id: &ID,
    to: TransactionStatus,
    now: i64,
) {
    if let Some(t) = transactions.iter_mut().find(|t| t.id == *transaction_id) {
        if t.status.can_transition_to(to) {
            t.status = to;
            t.updated = now;
        }
    }
}

#[async_trait::async_trait]
impl ISagaRepo for InMemorySagaRepo {
    async fn checkout(&self, plan: &CheckoutPlan) -> Result<(), SagaError> {
        let tickets = lock(&self.tickets.tickets);
        let mut bookings = lock(&self.bookings.bookings);
        let mut reservations = lock(&self.reservations.reservations);
        let mut transactions = lock(&self.transactions.transactions);

        if transactions
            .iter()
            .any(|t| t.reference_id == plan.transaction.reference_id)
        {
            return Err(SagaError::DuplicateReference);
        }
        for (ticket_id, qty) in plan.quantities() {
            let ticket = tickets
                .iter()
                .find(|t| t.id == ticket_id)
                .ok_or_else(|| SagaError::TicketNotFound(ticket_id.clone()))?;
            if ticket.status != TicketStatus::Open {
                return Err(SagaError::TicketNotOpen(ticket_id));
            }
            let seats = Seats::for_ticket(ticket, bookings.iter());
            if !seats.can_fit(qty) {
                return Err(SagaError::CapacityExceeded {
                    ticket_id,
                    free: seats.free.unwrap_or(0),
                });
            }
        }

        transactions.push(plan.transaction.clone());
        bookings.extend_from_slice(&plan.bookings);
        reservations.extend_from_slice(&plan.reservations);
        Ok(())
    }

    async fn cancel(&self, booking_ids: &[ID], now: i64) -> Result<(), SagaError> {
        let mut bookings = lock(&self.bookings.bookings);
        let mut reservations = lock(&self.reservations.reservations);
        let mut transactions = lock(&self.transactions.transactions);

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

        // The pending siblings of a checkout go down with it
        let canceled: Vec<ID> = bookings
            .iter()
            .filter(|b| {
                booking_ids.contains(&b.id)
                    || (b.status == BookingStatus::Pending
                        && b.transaction_id
                            .as_ref()
                            .map_or(false, |id| transaction_ids.contains(id)))
            })
            .map(|b| b.id.clone())
            .collect();

        for transaction_id in &transaction_ids {
            close_transaction(&mut transactions, transaction_id, TransactionStatus::Canceled, now);
        }
        for b in bookings.iter_mut().filter(|b| canceled.contains(&b.id)) {
            b.status = BookingStatus::Canceled;
            b.updated = now;
        }
        for r in reservations
            .iter_mut()
            .filter(|r| canceled.contains(&r.booking_id))
        {
            if r.status.can_transition_to(ReservationStatus::Canceled) {
                r.status = ReservationStatus::Canceled;
                r.updated = now;
            }
        }
        Ok(())
    }

    async fn expire_booking(&self, booking_id: &ID, now: i64) -> Result<bool, SagaError> {
        let mut bookings = lock(&self.bookings.bookings);
        let mut reservations = lock(&self.reservations.reservations);
        let mut transactions = lock(&self.transactions.transactions);

        let booking = bookings
            .iter_mut()
            .find(|b| b.id == *booking_id)
            .ok_or_else(|| SagaError::BookingNotFound(booking_id.clone()))?;
        if booking.status != BookingStatus::Pending {
            return Ok(false);
        }
        booking.status = BookingStatus::Expired;
        booking.updated = now;
        let transaction_id = booking.transaction_id.clone();

        for r in reservations
            .iter_mut()
            .filter(|r| r.booking_id == *booking_id && r.status == ReservationStatus::Pending)
        {
            r.status = ReservationStatus::Canceled;
            r.updated = now;
        }
        if let Some(transaction_id) = transaction_id {
            if !holds_seats(&bookings, &transaction_id) {
                close_transaction(&mut transactions, &transaction_id, TransactionStatus::Expired, now);
            }
        }
        Ok(true)
    }

    async fn record_payment_intent(
        &self,
        transaction_id: &ID,
        payment_intent_id: &str,
        now: i64,
    ) -> Result<u64, SagaError> {
        let mut bookings = lock(&self.bookings.bookings);
        let mut updated = 0;
        for b in bookings
            .iter_mut()
            .filter(|b| b.transaction_id.as_ref() == Some(transaction_id))
        {
            b.payment_intent_id = Some(payment_intent_id.to_string());
            b.updated = now;
            updated += 1;
        }
        Ok(updated)
    }

    async fn confirm_payment(
        &self,
        transaction_id: &ID,
        payment_intent_id: &str,
        now: i64,
    ) -> Result<u64, SagaError> {
        let events = lock(&self.events.events);
        let mut bookings = lock(&self.bookings.bookings);
        let mut reservations = lock(&self.reservations.reservations);

        let mut completed = Vec::new();
        for b in bookings.iter_mut().filter(|b| {
            b.transaction_id.as_ref() == Some(transaction_id) && b.status == BookingStatus::Pending
        }) {
            b.status = BookingStatus::Completed;
            b.payment_intent_id = Some(payment_intent_id.to_string());
            b.updated = now;
            completed.push(b.id.clone());
        }

        for r in reservations.iter_mut().filter(|r| {
            completed.contains(&r.booking_id) && r.status == ReservationStatus::Pending
        }) {
            if let Some(event) = events.iter().find(|e| e.id == r.event_id) {
                r.valid_until = event.date_time;
            }
            r.status = ReservationStatus::Paid;
            r.updated = now;
        }
        Ok(completed.len() as u64)
    }

    async fn record_checkout_session(
        &self,
        transaction_id: &ID,
        session_id: &str,
        url: Option<&str>,
        now: i64,
    ) -> Result<(), SagaError> {
        let mut bookings = lock(&self.bookings.bookings);
        let mut transactions = lock(&self.transactions.transactions);

        for b in bookings
            .iter_mut()
            .filter(|b| b.transaction_id.as_ref() == Some(transaction_id))
        {
            b.checkout_session_id = Some(session_id.to_string());
            b.updated = now;
        }
        if let Some(t) = transactions.iter_mut().find(|t| t.id == *transaction_id) {
            t.checkout_session_id = Some(session_id.to_string());
            if let Some(url) = url {
                t.checkout_url = Some(url.to_string());
            }
            t.updated = now;
        }
        Ok(())
    }

    async fn admit(&self, admission: &Admission, now: i64) -> Result<(), SagaError> {
        let mut reservations = lock(&self.reservations.reservations);
        let mut admissions = lock(&self.admissions.admissions);

        let reservation = reservations
            .iter_mut()
            .find(|r| r.id == admission.reservation_id)
            .ok_or_else(|| SagaError::ReservationNotFound(admission.reservation_id.clone()))?;
        if admissions
            .iter()
            .any(|a| a.reservation_id == admission.reservation_id)
        {
            return Err(SagaError::AlreadyAdmitted(admission.reservation_id.clone()));
        }
        reservation.status = reservation.status.transition(ReservationStatus::Completed)?;
        reservation.updated = now;
        admissions.push(admission.clone());
        Ok(())
    }

    async fn create_event(
        &self,
        event: &Event,
        tickets: &[Ticket],
        jobs: &[JobTask],
    ) -> Result<(), SagaError> {
        let mut events = lock(&self.events.events);
        let mut stored_tickets = lock(&self.tickets.tickets);
        let mut stored_jobs = lock(&self.job_tasks.jobs);

        if events.iter().any(|e| e.id == event.id) {
            return Err(anyhow::anyhow!("Event {} already exists", event.id).into());
        }
        events.push(event.clone());
        stored_tickets.extend(tickets.iter().cloned());
        stored_jobs.extend(jobs.iter().cloned());
        Ok(())
    }

    async fn transition_event(
        &self,
        swap: &StatusSwap<EventStatus>,
        mode: EventMode,
        now: i64,
    ) -> Result<Option<u64>, SagaError> {
        let mut events = lock(&self.events.events);
        let mut subscriptions = lock(&self.subscriptions.subscriptions);

        let event = match events
            .iter_mut()
            .find(|e| e.id == swap.id && e.status == swap.from)
        {
            Some(event) => event,
            None => return Ok(None),
        };
        event.status = swap.to;
        event.mode = mode;
        event.updated = now;

        let mut activated = 0;
        if swap.to == EventStatus::Open {
            for s in subscriptions.iter_mut().filter(|s| {
                s.event_id == swap.id && s.status == SubscriptionStatus::Notify
            }) {
                s.status = SubscriptionStatus::Active;
                s.updated = now;
                activated += 1;
            }
        }
        Ok(Some(activated))
    }
}
