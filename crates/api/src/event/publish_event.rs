use super::update_event_status::{transition_event, TransitionError};
use crate::error::BoxofficeError;
use crate::shared::{
    auth::protect_org_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_api_structs::publish_event::*;
use boxoffice_domain::{
    Event, EventStatus, InvalidTransition, StatusSwap, Ticket, TicketStatus, TransitionTrigger,
    ID,
};
use boxoffice_infra::BoxofficeContext;

pub async fn publish_event_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    let (_, org_id) = protect_org_route(&http_req, &ctx)?;

    let usecase = PublishEventUseCase {
        event_id: path_params.event_id.clone(),
        org_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|(event, tickets)| HttpResponse::Ok().json(APIResponse::new(event, tickets)))
        .map_err(BoxofficeError::from)
}

/// Opens sales of the `Event` and of its draft `Ticket`s
#[derive(Debug)]
pub struct PublishEventUseCase {
    pub event_id: ID,
    pub org_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    NoTickets,
    InvalidTransition(InvalidTransition),
    Conflict,
    StorageError,
}

impl From<TransitionError> for UseCaseError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::InvalidTransition(e) => Self::InvalidTransition(e),
            TransitionError::Conflict => Self::Conflict,
            TransitionError::StorageError => Self::StorageError,
        }
    }
}

impl From<UseCaseError> for BoxofficeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(event_id) => Self::NotFound(format!(
                "The event with id: {}, was not found.",
                event_id
            )),
            UseCaseError::NoTickets => {
                Self::BadClientData("An event needs a ticket to be published".into())
            }
            UseCaseError::InvalidTransition(e) => Self::Conflict(e.to_string()),
            UseCaseError::Conflict => {
                Self::Conflict("The event was modified by another request".into())
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for PublishEventUseCase {
    type Response = (Event, Vec<Ticket>);

    type Error = UseCaseError;

    const NAME: &'static str = "PublishEvent";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let mut event = match ctx.repos.events.find(&self.event_id).await {
            Some(event) if event.org_id == self.org_id => event,
            _ => return Err(UseCaseError::NotFound(self.event_id.clone())),
        };
        let tickets = ctx
            .repos
            .tickets
            .find_by_event(&event.id)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        if event.status == EventStatus::Open {
            return Ok((event, tickets));
        }
        if tickets.iter().all(|t| t.status == TicketStatus::Archived) {
            return Err(UseCaseError::NoTickets);
        }

        transition_event(&mut event, EventStatus::Open, TransitionTrigger::Manual, ctx).await?;

        let now = ctx.sys.get_timestamp_millis();
        for ticket in tickets.iter().filter(|t| t.status == TicketStatus::Draft) {
            let swap = StatusSwap::new(ticket.id.clone(), TicketStatus::Draft, TicketStatus::Open)
                .map_err(UseCaseError::InvalidTransition)?;
            ctx.repos
                .tickets
                .swap_status(&swap, now)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
        }

        let tickets = ctx
            .repos
            .tickets
            .find_by_event(&event.id)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok((event, tickets))
    }
}
