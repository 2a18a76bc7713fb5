mod admission;
mod booking;
mod event;
mod job_task;
mod reservation;
mod saga;
mod shared;
mod subscription;
mod ticket;
mod transaction;

use admission::{IAdmissionRepo, InMemoryAdmissionRepo, PostgresAdmissionRepo};
use booking::{IBookingRepo, InMemoryBookingRepo, PostgresBookingRepo};
use event::{IEventRepo, InMemoryEventRepo, PostgresEventRepo};
use job_task::{IJobTaskRepo, InMemoryJobTaskRepo, PostgresJobTaskRepo};
use reservation::{IReservationRepo, InMemoryReservationRepo, PostgresReservationRepo};
use saga::{InMemorySagaRepo, PostgresSagaRepo};
use sqlx::PgPool;
use std::sync::Arc;
use subscription::{ISubscriptionRepo, InMemorySubscriptionRepo, PostgresSubscriptionRepo};
use ticket::{ITicketRepo, InMemoryTicketRepo, PostgresTicketRepo};
use transaction::{ITransactionRepo, InMemoryTransactionRepo, PostgresTransactionRepo};

pub use saga::{ISagaRepo, SagaError};

#[derive(Clone)]
pub struct Repos {
    pub events: Arc<dyn IEventRepo>,
    pub tickets: Arc<dyn ITicketRepo>,
    pub bookings: Arc<dyn IBookingRepo>,
    pub reservations: Arc<dyn IReservationRepo>,
    pub transactions: Arc<dyn ITransactionRepo>,
    pub admissions: Arc<dyn IAdmissionRepo>,
    pub job_tasks: Arc<dyn IJobTaskRepo>,
    pub subscriptions: Arc<dyn ISubscriptionRepo>,
    pub saga: Arc<dyn ISagaRepo>,
}

impl Repos {
    pub fn create_postgres(pool: PgPool) -> Self {
        Self {
            events: Arc::new(PostgresEventRepo::new(pool.clone())),
            tickets: Arc::new(PostgresTicketRepo::new(pool.clone())),
            bookings: Arc::new(PostgresBookingRepo::new(pool.clone())),
            reservations: Arc::new(PostgresReservationRepo::new(pool.clone())),
            transactions: Arc::new(PostgresTransactionRepo::new(pool.clone())),
            admissions: Arc::new(PostgresAdmissionRepo::new(pool.clone())),
            job_tasks: Arc::new(PostgresJobTaskRepo::new(pool.clone())),
            subscriptions: Arc::new(PostgresSubscriptionRepo::new(pool.clone())),
            saga: Arc::new(PostgresSagaRepo::new(pool)),
        }
    }

    pub fn create_inmemory() -> Self {
        let events = Arc::new(InMemoryEventRepo::new());
        let tickets = Arc::new(InMemoryTicketRepo::new());
        let bookings = Arc::new(InMemoryBookingRepo::new());
        let reservations = Arc::new(InMemoryReservationRepo::new());
        let transactions = Arc::new(InMemoryTransactionRepo::new());
        let admissions = Arc::new(InMemoryAdmissionRepo::new());
        let job_tasks = Arc::new(InMemoryJobTaskRepo::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepo::new());
        let saga = InMemorySagaRepo::new(
            events.clone(),
            tickets.clone(),
            bookings.clone(),
            reservations.clone(),
            transactions.clone(),
            admissions.clone(),
            job_tasks.clone(),
            subscriptions.clone(),
        );
        Self {
            events,
            tickets,
            bookings,
            reservations,
            transactions,
            admissions,
            job_tasks,
            subscriptions,
            saga: Arc::new(saga),
        }
    }
}
