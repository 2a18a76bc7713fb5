use super::update_event_status::{transition_event, TransitionError};
use crate::shared::usecase::UseCase;
use boxoffice_domain::{EventStatus, TransitionTrigger};
use boxoffice_infra::BoxofficeContext;
use tracing::{info, warn};

/// Expires events that started without ever leaving the waitlist or the
/// sales phase, together with their pending bookings
#[derive(Debug)]
pub struct ExpireStaleEventsUseCase;

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for ExpireStaleEventsUseCase {
    /// Number of events expired
    type Response = usize;

    type Error = UseCaseError;

    const NAME: &'static str = "ExpireStaleEvents";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let events = ctx
            .repos
            .events
            .find_by_statuses_starting_before(&[EventStatus::Notify, EventStatus::Open], now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let mut expired = 0;
        for mut event in events {
            match transition_event(&mut event, EventStatus::Expired, TransitionTrigger::Job, ctx)
                .await
            {
                Ok(()) => (),
                Err(TransitionError::StorageError) => return Err(UseCaseError::StorageError),
                Err(e) => {
                    warn!(event_id = %event.id, "Skipping stale event: {:?}", e);
                    continue;
                }
            }
            expired += 1;

            let bookings = ctx
                .repos
                .bookings
                .find_pending_by_event(&event.id)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
            for booking in &bookings {
                ctx.repos
                    .saga
                    .expire_booking(&booking.id, now)
                    .await
                    .map_err(|_| UseCaseError::StorageError)?;
            }
            info!(
                event_id = %event.id,
                "Expired stale event and {} pending bookings",
                bookings.len()
            );
        }

        Ok(expired)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use boxoffice_domain::{
        BookingStatus, CheckoutItem, CheckoutPlan, Event, Ticket, TicketStatus, ID,
    };
    use boxoffice_infra::setup_context;

    #[actix_web::main]
    #[test]
    async fn expires_started_events_and_their_pending_bookings() {
        let ctx = setup_context().await.unwrap();
        let now = ctx.sys.get_timestamp_millis();

        let mut stale = Event::new(ID::default(), "Past".into(), now - 1000, "UTC".into(), now);
        stale.status = EventStatus::Open;
        let mut upcoming = Event::new(ID::default(), "Future".into(), now + 60_000, "UTC".into(), now);
        upcoming.status = EventStatus::Open;
        let mut running = Event::new(ID::default(), "Now".into(), now - 1000, "UTC".into(), now);
        running.status = EventStatus::Admission;
        for event in [&stale, &upcoming, &running] {
            ctx.repos.events.insert(event).await.unwrap();
        }

        let mut ticket = Ticket::new(stale.id.clone(), "Seated".into(), 100, "eur".into(), 10, now);
        ticket.status = TicketStatus::Open;
        ctx.repos.tickets.insert(&ticket).await.unwrap();
        let plan = CheckoutPlan::build(
            &[CheckoutItem {
                ticket_id: ticket.id.clone(),
                qty: 1,
            }],
            ctx.config.max_seats_per_checkout,
            &[ticket.clone()],
            &ID::default(),
            &ID::default(),
            now + 1000,
            now,
        )
        .unwrap();
        ctx.repos.saga.checkout(&plan).await.unwrap();

        let expired = ExpireStaleEventsUseCase.execute(&ctx).await.unwrap();
        assert_eq!(expired, 1);

        let status_of = |e: Option<Event>| e.unwrap().status;
        assert_eq!(status_of(ctx.repos.events.find(&stale.id).await), EventStatus::Expired);
        assert_eq!(status_of(ctx.repos.events.find(&upcoming.id).await), EventStatus::Open);
        assert_eq!(status_of(ctx.repos.events.find(&running.id).await), EventStatus::Admission);

        let booking = ctx.repos.bookings.find(&plan.bookings[0].id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Expired);
    }
}
