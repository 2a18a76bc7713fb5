use crate::error::BoxofficeError;
use crate::shared::{
    auth::protect_org_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_api_structs::admit::*;
use boxoffice_domain::{Admission, AdmissionCode, EventStatus, ReservationStatus, ID};
use boxoffice_infra::{BoxofficeContext, SagaError};
use boxoffice_utils::decrypt_message;
use tracing::info;

pub async fn admit_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    let (user_id, org_id) = protect_org_route(&http_req, &ctx)?;

    let usecase = AdmitUseCase {
        code: body.0.code,
        admitted_by: user_id,
        org_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|admission| HttpResponse::Created().json(APIResponse::new(admission)))
        .map_err(BoxofficeError::from)
}

/// Redeems the code of a paid `Reservation` at the door. Succeeds at most
/// once per `Reservation`.
#[derive(Debug)]
pub struct AdmitUseCase {
    pub code: String,
    pub admitted_by: ID,
    /// Organizer the door staff works for
    pub org_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidCode,
    NotFound(ID),
    AdmissionClosed,
    AdmissionNotOpen(EventStatus),
    AlreadyAdmitted,
    NotPaid(ReservationStatus),
    StorageError,
}

impl From<UseCaseError> for BoxofficeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidCode => Self::BadClientData("The admission code is invalid".into()),
            UseCaseError::NotFound(id) => Self::NotFound(format!(
                "The reservation with id: {}, was not found.",
                id
            )),
            UseCaseError::AdmissionClosed => {
                Self::Forbidden("Admission to the event has closed".into())
            }
            UseCaseError::AdmissionNotOpen(status) => Self::Forbidden(format!(
                "Admission to the event is not open. The event is {}.",
                status
            )),
            UseCaseError::AlreadyAdmitted => {
                Self::Conflict("The reservation has already been admitted".into())
            }
            UseCaseError::NotPaid(status) => Self::Conflict(format!(
                "Only paid reservations can be admitted. This one is {}.",
                status
            )),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

impl AdmitUseCase {
    fn decode(&self, ctx: &BoxofficeContext) -> Result<AdmissionCode, UseCaseError> {
        let plaintext =
            decrypt_message(&ctx.config.qr_secret, &self.code).map_err(|_| UseCaseError::InvalidCode)?;
        serde_json::from_str(&plaintext).map_err(|_| UseCaseError::InvalidCode)
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for AdmitUseCase {
    type Response = Admission;

    type Error = UseCaseError;

    const NAME: &'static str = "Admit";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let code = self.decode(ctx)?;

        let reservation = match ctx.repos.reservations.find(&code.reservation_id).await {
            Some(r) => r,
            None => return Err(UseCaseError::NotFound(code.reservation_id)),
        };
        if reservation.ticket_id != code.ticket_id {
            return Err(UseCaseError::InvalidCode);
        }
        let event = match ctx.repos.events.find(&reservation.event_id).await {
            Some(event) if event.org_id == self.org_id => event,
            _ => return Err(UseCaseError::NotFound(reservation.id)),
        };

        match event.status {
            EventStatus::Admission => (),
            EventStatus::Completed => return Err(UseCaseError::AdmissionClosed),
            status => return Err(UseCaseError::AdmissionNotOpen(status)),
        }
        match reservation.status {
            ReservationStatus::Paid => (),
            ReservationStatus::Completed => return Err(UseCaseError::AlreadyAdmitted),
            status => return Err(UseCaseError::NotPaid(status)),
        }

        let now = ctx.sys.get_timestamp_millis();
        let admission = Admission::new(reservation.id.clone(), self.admitted_by.clone(), now);
        match ctx.repos.saga.admit(&admission, now).await {
            Ok(()) => {
                info!(reservation_id = %reservation.id, "Admitted reservation");
                Ok(admission)
            }
            Err(SagaError::AlreadyAdmitted(_)) => Err(UseCaseError::AlreadyAdmitted),
            Err(SagaError::ReservationNotFound(id)) => Err(UseCaseError::NotFound(id)),
            Err(SagaError::InvalidTransition(_)) => Err(UseCaseError::NotPaid(reservation.status)),
            Err(_) => Err(UseCaseError::StorageError),
        }
    }
}
