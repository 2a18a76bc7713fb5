use super::subscribers::ScheduleCompletionOnAdmissionOpened;
use crate::error::BoxofficeError;
use crate::shared::{
    auth::protect_org_route,
    usecase::{execute, Subscriber, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_api_structs::update_event_status::*;
use boxoffice_domain::{
    Event, EventStatus, InvalidTransition, StatusSwap, Ticket, TransitionTrigger, ID,
};
use boxoffice_infra::BoxofficeContext;
use tracing::info;

pub async fn update_event_status_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    let (_, org_id) = protect_org_route(&http_req, &ctx)?;

    let usecase = UpdateEventStatusUseCase {
        event_id: path_params.event_id.clone(),
        org_id: Some(org_id),
        status: body.status,
        trigger: TransitionTrigger::Manual,
    };

    execute(usecase, &ctx)
        .await
        .map(|(event, tickets)| HttpResponse::Ok().json(APIResponse::new(event, tickets)))
        .map_err(BoxofficeError::from)
}

#[derive(Debug, PartialEq)]
pub enum TransitionError {
    InvalidTransition(InvalidTransition),
    /// The status was changed by someone else in the meantime
    Conflict,
    StorageError,
}

impl From<InvalidTransition> for TransitionError {
    fn from(e: InvalidTransition) -> Self {
        Self::InvalidTransition(e)
    }
}

/// Moves the `Event` to `to` with a conditional update on its current status.
/// Waiting subscriptions are activated in the same write when the event opens.
pub async fn transition_event(
    event: &mut Event,
    to: EventStatus,
    trigger: TransitionTrigger,
    ctx: &BoxofficeContext,
) -> Result<(), TransitionError> {
    let now = ctx.sys.get_timestamp_millis();
    let swap = StatusSwap::new(event.id.clone(), event.status, to)?;
    event.transition(to, trigger, now)?;

    let activated = ctx
        .repos
        .saga
        .transition_event(&swap, event.mode, now)
        .await
        .map_err(|_| TransitionError::StorageError)?;
    match activated {
        None => Err(TransitionError::Conflict),
        Some(0) => Ok(()),
        Some(activated) => {
            info!(event_id = %event.id, "Activated {} subscriptions", activated);
            Ok(())
        }
    }
}

#[derive(Debug)]
pub struct UpdateEventStatusUseCase {
    pub event_id: ID,
    /// Organizer of the event. `None` when triggered by a job.
    pub org_id: Option<ID>,
    pub status: EventStatus,
    pub trigger: TransitionTrigger,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
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
            UseCaseError::InvalidTransition(e) => Self::Conflict(e.to_string()),
            UseCaseError::Conflict => {
                Self::Conflict("The event was modified by another request".into())
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for UpdateEventStatusUseCase {
    type Response = (Event, Vec<Ticket>);

    type Error = UseCaseError;

    const NAME: &'static str = "UpdateEventStatus";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let mut event = match ctx.repos.events.find(&self.event_id).await {
            Some(event) if self.org_id.is_none() || self.org_id.as_ref() == Some(&event.org_id) => {
                event
            }
            _ => return Err(UseCaseError::NotFound(self.event_id.clone())),
        };

        transition_event(&mut event, self.status, self.trigger, ctx).await?;

        let tickets = ctx
            .repos
            .tickets
            .find_by_event(&event.id)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok((event, tickets))
    }

    fn subscribers() -> Vec<Box<dyn Subscriber<Self>>> {
        vec![Box::new(ScheduleCompletionOnAdmissionOpened)]
    }
}
