use crate::error::BoxofficeError;
use crate::shared::{
    auth::protect_org_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_api_structs::create_ticket::*;
use boxoffice_domain::{EventStatus, Ticket, ID};
use boxoffice_infra::BoxofficeContext;

pub async fn create_ticket_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    let (_, org_id) = protect_org_route(&http_req, &ctx)?;

    let usecase = CreateTicketUseCase {
        event_id: path_params.event_id.clone(),
        org_id,
        ticket: body.0.into(),
    };

    execute(usecase, &ctx)
        .await
        .map(|ticket| HttpResponse::Created().json(APIResponse::new(ticket)))
        .map_err(BoxofficeError::from)
}

/// Ticket fields given by the organizer
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub name: String,
    pub price: i64,
    pub currency: String,
    pub limit: i64,
    pub price_ref: Option<String>,
}

impl From<RequestBody> for NewTicket {
    fn from(body: RequestBody) -> Self {
        Self {
            name: body.name,
            price: body.price,
            currency: body.currency,
            limit: body.limit,
            price_ref: body.price_ref,
        }
    }
}

impl NewTicket {
    pub fn build(&self, event_id: &ID, now: i64) -> Ticket {
        let mut ticket = Ticket::new(
            event_id.clone(),
            self.name.clone(),
            self.price,
            self.currency.clone(),
            self.limit,
            now,
        );
        ticket.price_ref = self.price_ref.clone();
        ticket
    }
}

#[derive(Debug)]
pub struct CreateTicketUseCase {
    pub event_id: ID,
    pub org_id: ID,
    pub ticket: NewTicket,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    InvalidTicket,
    EventEnded(EventStatus),
    StorageError,
}

impl From<UseCaseError> for BoxofficeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(event_id) => Self::NotFound(format!(
                "The event with id: {}, was not found.",
                event_id
            )),
            UseCaseError::InvalidTicket => Self::BadClientData(
                "Tickets need a name, a 3 letter currency and a non negative price and limit"
                    .into(),
            ),
            UseCaseError::EventEnded(status) => Self::Conflict(format!(
                "Tickets can not be added to an event that is {}",
                status
            )),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreateTicketUseCase {
    type Response = Ticket;

    type Error = UseCaseError;

    const NAME: &'static str = "CreateTicket";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let event = match ctx.repos.events.find(&self.event_id).await {
            Some(event) if event.org_id == self.org_id => event,
            _ => return Err(UseCaseError::NotFound(self.event_id.clone())),
        };
        if !matches!(
            event.status,
            EventStatus::Draft | EventStatus::Notify | EventStatus::Open
        ) {
            return Err(UseCaseError::EventEnded(event.status));
        }

        let ticket = self
            .ticket
            .build(&event.id, ctx.sys.get_timestamp_millis());
        if !ticket.is_valid() {
            return Err(UseCaseError::InvalidTicket);
        }

        ctx.repos
            .tickets
            .insert(&ticket)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(ticket)
    }
}
