use crate::error::BoxofficeError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_api_structs::get_seats::*;
use boxoffice_domain::{Seats, ID};
use boxoffice_infra::BoxofficeContext;

pub async fn get_seats_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    protect_route(&http_req, &ctx)?;

    let usecase = GetSeatsUseCase {
        ticket_id: path_params.ticket_id.clone(),
    };

    execute(usecase, &ctx)
        .await
        .map(|seats| HttpResponse::Ok().json(APIResponse::new(path_params.ticket_id.clone(), seats)))
        .map_err(BoxofficeError::from)
}

#[derive(Debug)]
pub struct GetSeatsUseCase {
    pub ticket_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    StorageError,
}

impl From<UseCaseError> for BoxofficeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(ticket_id) => Self::NotFound(format!(
                "The ticket with id: {}, was not found.",
                ticket_id
            )),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetSeatsUseCase {
    type Response = Seats;

    type Error = UseCaseError;

    const NAME: &'static str = "GetSeats";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let ticket = match ctx.repos.tickets.find(&self.ticket_id).await {
            Some(ticket) => ticket,
            None => return Err(UseCaseError::NotFound(self.ticket_id.clone())),
        };
        let reserved = ctx
            .repos
            .bookings
            .reserved_seats(&ticket.id)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(Seats::new(ticket.limit, reserved))
    }
}
