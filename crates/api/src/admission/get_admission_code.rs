use crate::error::BoxofficeError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_api_structs::get_admission_code::*;
use boxoffice_domain::{AdmissionCode, ReservationStatus, ID};
use boxoffice_infra::BoxofficeContext;
use boxoffice_utils::encrypt_message;

pub async fn get_admission_code_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    let user = protect_route(&http_req, &ctx)?;

    let usecase = GetAdmissionCodeUseCase {
        reservation_id: path_params.reservation_id.clone(),
        user_id: user.user_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|code| HttpResponse::Ok().json(APIResponse { code }))
        .map_err(BoxofficeError::from)
}

#[derive(Debug)]
pub struct GetAdmissionCodeUseCase {
    pub reservation_id: ID,
    pub user_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    NotPaid(ReservationStatus),
    EncryptionFailed,
}

impl From<UseCaseError> for BoxofficeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(id) => Self::NotFound(format!(
                "The reservation with id: {}, was not found.",
                id
            )),
            UseCaseError::NotPaid(status) => Self::Conflict(format!(
                "Only paid reservations have an admission code. This one is {}.",
                status
            )),
            UseCaseError::EncryptionFailed => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetAdmissionCodeUseCase {
    type Response = String;

    type Error = UseCaseError;

    const NAME: &'static str = "GetAdmissionCode";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let reservation = match ctx.repos.reservations.find(&self.reservation_id).await {
            Some(r) if r.user_id == self.user_id => r,
            _ => return Err(UseCaseError::NotFound(self.reservation_id.clone())),
        };
        if reservation.status != ReservationStatus::Paid {
            return Err(UseCaseError::NotPaid(reservation.status));
        }

        let code = AdmissionCode {
            ticket_id: reservation.ticket_id,
            reservation_id: reservation.id,
        };
        let plaintext = serde_json::to_string(&code).map_err(|_| UseCaseError::EncryptionFailed)?;
        encrypt_message(&ctx.config.qr_secret, &plaintext).map_err(|_| UseCaseError::EncryptionFailed)
    }
}
