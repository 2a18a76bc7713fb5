use crate::error::BoxofficeError;
use crate::shared::{
    auth::protect_org_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_api_structs::{TicketPathParams, TicketResponse};
use boxoffice_domain::{InvalidTransition, StatusSwap, Ticket, TicketStatus, ID};
use boxoffice_infra::BoxofficeContext;

async fn transition_ticket(
    http_req: HttpRequest,
    path_params: web::Path<TicketPathParams>,
    ctx: web::Data<BoxofficeContext>,
    status: TicketStatus,
) -> Result<HttpResponse, BoxofficeError> {
    let (_, org_id) = protect_org_route(&http_req, &ctx)?;

    let usecase = TransitionTicketUseCase {
        ticket_id: path_params.ticket_id.clone(),
        org_id,
        status,
    };

    execute(usecase, &ctx)
        .await
        .map(|ticket| HttpResponse::Ok().json(TicketResponse::new(ticket)))
        .map_err(BoxofficeError::from)
}

pub async fn publish_ticket_controller(
    http_req: HttpRequest,
    path_params: web::Path<TicketPathParams>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    transition_ticket(http_req, path_params, ctx, TicketStatus::Open).await
}

pub async fn close_ticket_controller(
    http_req: HttpRequest,
    path_params: web::Path<TicketPathParams>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    transition_ticket(http_req, path_params, ctx, TicketStatus::Closed).await
}

pub async fn reopen_ticket_controller(
    http_req: HttpRequest,
    path_params: web::Path<TicketPathParams>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    transition_ticket(http_req, path_params, ctx, TicketStatus::Open).await
}

pub async fn archive_ticket_controller(
    http_req: HttpRequest,
    path_params: web::Path<TicketPathParams>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    transition_ticket(http_req, path_params, ctx, TicketStatus::Archived).await
}

/// Publishes, closes, reopens or archives a `Ticket`
#[derive(Debug)]
pub struct TransitionTicketUseCase {
    pub ticket_id: ID,
    pub org_id: ID,
    pub status: TicketStatus,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    InvalidTransition(InvalidTransition),
    /// Closing a ticket is not allowed while bookings hold its seats
    HasBookings(i64),
    /// The status was changed by someone else in the meantime
    Conflict,
    StorageError,
}

impl From<UseCaseError> for BoxofficeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(ticket_id) => Self::NotFound(format!(
                "The ticket with id: {}, was not found.",
                ticket_id
            )),
            UseCaseError::InvalidTransition(e) => Self::Conflict(e.to_string()),
            UseCaseError::HasBookings(reserved) => Self::Conflict(format!(
                "The ticket can not be closed while {} seats are booked",
                reserved
            )),
            UseCaseError::Conflict => {
                Self::Conflict("The ticket was modified by another request".into())
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for TransitionTicketUseCase {
    type Response = Ticket;

    type Error = UseCaseError;

    const NAME: &'static str = "TransitionTicket";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let mut ticket = match ctx.repos.tickets.find(&self.ticket_id).await {
            Some(ticket) => ticket,
            None => return Err(UseCaseError::NotFound(self.ticket_id.clone())),
        };
        match ctx.repos.events.find(&ticket.event_id).await {
            Some(event) if event.org_id == self.org_id => (),
            _ => return Err(UseCaseError::NotFound(self.ticket_id.clone())),
        };

        let swap = StatusSwap::new(ticket.id.clone(), ticket.status, self.status)
            .map_err(UseCaseError::InvalidTransition)?;

        if self.status == TicketStatus::Closed {
            let reserved = ctx
                .repos
                .bookings
                .reserved_seats(&ticket.id)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
            if reserved > 0 {
                return Err(UseCaseError::HasBookings(reserved));
            }
        }

        let now = ctx.sys.get_timestamp_millis();
        let swapped = ctx
            .repos
            .tickets
            .swap_status(&swap, now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if !swapped {
            return Err(UseCaseError::Conflict);
        }
        ticket
            .transition(self.status, now)
            .map_err(UseCaseError::InvalidTransition)?;

        Ok(ticket)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use boxoffice_domain::{CheckoutItem, CheckoutPlan, Event, EventStatus};
    use boxoffice_infra::setup_context;

    struct TestContext {
        ctx: BoxofficeContext,
        event: Event,
        ticket: Ticket,
    }

    async fn setup() -> TestContext {
        let ctx = setup_context().await.unwrap();
        let now = ctx.sys.get_timestamp_millis();
        let mut event = Event::new(
            ID::default(),
            "Concert".into(),
            now + 1000 * 60 * 60 * 24,
            "Europe/Oslo".into(),
            now,
        );
        event.status = EventStatus::Open;
        ctx.repos.events.insert(&event).await.unwrap();
        let ticket = Ticket::new(event.id.clone(), "Seated".into(), 1000, "eur".into(), 10, now);
        ctx.repos.tickets.insert(&ticket).await.unwrap();

        TestContext { ctx, event, ticket }
    }

    async fn transition(
        ctx: &BoxofficeContext,
        event: &Event,
        ticket: &Ticket,
        status: TicketStatus,
    ) -> Result<Ticket, UseCaseError> {
        let mut usecase = TransitionTicketUseCase {
            ticket_id: ticket.id.clone(),
            org_id: event.org_id.clone(),
            status,
        };
        usecase.execute(ctx).await
    }

    #[actix_web::main]
    #[test]
    async fn follows_the_transition_table() {
        let TestContext { ctx, event, ticket } = setup().await;

        let res = transition(&ctx, &event, &ticket, TicketStatus::Closed).await;
        assert!(matches!(res, Err(UseCaseError::InvalidTransition(_))));

        let opened = transition(&ctx, &event, &ticket, TicketStatus::Open).await.unwrap();
        assert_eq!(opened.status, TicketStatus::Open);
        let closed = transition(&ctx, &event, &ticket, TicketStatus::Closed).await.unwrap();
        assert_eq!(closed.status, TicketStatus::Closed);
        let reopened = transition(&ctx, &event, &ticket, TicketStatus::Open).await.unwrap();
        assert_eq!(reopened.status, TicketStatus::Open);
        let archived = transition(&ctx, &event, &ticket, TicketStatus::Archived).await.unwrap();
        assert_eq!(archived.status, TicketStatus::Archived);

        let res = transition(&ctx, &event, &ticket, TicketStatus::Open).await;
        assert!(matches!(res, Err(UseCaseError::InvalidTransition(_))));
        let stored = ctx.repos.tickets.find(&ticket.id).await.unwrap();
        assert_eq!(stored.status, TicketStatus::Archived);
    }

    #[actix_web::main]
    #[test]
    async fn rejects_closing_booked_ticket() {
        let TestContext { ctx, event, ticket } = setup().await;
        transition(&ctx, &event, &ticket, TicketStatus::Open).await.unwrap();

        let now = ctx.sys.get_timestamp_millis();
        let ticket = ctx.repos.tickets.find(&ticket.id).await.unwrap();
        let mut plan = CheckoutPlan::build(
            &[CheckoutItem {
                ticket_id: ticket.id.clone(),
                qty: 2,
            }],
            ctx.config.max_seats_per_checkout,
            &[ticket.clone()],
            &ID::default(),
            &ID::default(),
            now + 1000,
            now,
        )
        .unwrap();
        plan.set_org(&event.org_id);
        ctx.repos.saga.checkout(&plan).await.unwrap();

        let res = transition(&ctx, &event, &ticket, TicketStatus::Closed).await;
        assert_eq!(res.unwrap_err(), UseCaseError::HasBookings(2));
    }
}
