use crate::error::BoxofficeError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_api_structs::{cancel_booking, cancel_bookings_by_transaction, BookingsResponse};
use boxoffice_domain::{Booking, BookingStatus, ID};
use boxoffice_infra::{BoxofficeContext, SagaError};

pub async fn cancel_booking_controller(
    http_req: HttpRequest,
    path_params: web::Path<cancel_booking::PathParams>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    let user = protect_route(&http_req, &ctx)?;

    let usecase = CancelBookingsUseCase {
        target: CancelTarget::Booking(path_params.booking_id.clone()),
        user_id: user.user_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|bookings| HttpResponse::Ok().json(BookingsResponse::new(bookings)))
        .map_err(BoxofficeError::from)
}

pub async fn cancel_bookings_by_transaction_controller(
    http_req: HttpRequest,
    body: web::Json<cancel_bookings_by_transaction::RequestBody>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    let user = protect_route(&http_req, &ctx)?;

    let usecase = CancelBookingsUseCase {
        target: CancelTarget::Transaction(body.transaction_id.clone()),
        user_id: user.user_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|bookings| HttpResponse::Ok().json(BookingsResponse::new(bookings)))
        .map_err(BoxofficeError::from)
}

#[derive(Debug)]
pub enum CancelTarget {
    Booking(ID),
    /// Every `Booking` created by the checkout of the `Transaction`
    Transaction(ID),
}

/// Cancels pending `Booking`s of the user together with their `Reservation`s
/// and `Transaction` in one unit
#[derive(Debug)]
pub struct CancelBookingsUseCase {
    pub target: CancelTarget,
    pub user_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    NotPending(ID),
    StorageError,
}

impl From<UseCaseError> for BoxofficeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(id) => {
                Self::NotFound(format!("No bookings were found for id: {}.", id))
            }
            UseCaseError::NotPending(booking_id) => Self::Conflict(format!(
                "The booking with id: {}, is no longer pending and cannot be canceled.",
                booking_id
            )),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

impl CancelBookingsUseCase {
    async fn bookings(&self, ctx: &BoxofficeContext) -> Result<Vec<Booking>, UseCaseError> {
        match &self.target {
            CancelTarget::Booking(booking_id) => match ctx.repos.bookings.find(booking_id).await {
                Some(booking) if booking.user_id == self.user_id => Ok(vec![booking]),
                _ => Err(UseCaseError::NotFound(booking_id.clone())),
            },
            CancelTarget::Transaction(transaction_id) => {
                match ctx.repos.transactions.find(transaction_id).await {
                    Some(t) if t.user_id == self.user_id => (),
                    _ => return Err(UseCaseError::NotFound(transaction_id.clone())),
                };
                let bookings = ctx
                    .repos
                    .bookings
                    .find_by_transaction(transaction_id)
                    .await
                    .map_err(|_| UseCaseError::StorageError)?;
                if bookings.is_empty() {
                    return Err(UseCaseError::NotFound(transaction_id.clone()));
                }
                Ok(bookings)
            }
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for CancelBookingsUseCase {
    type Response = Vec<Booking>;

    type Error = UseCaseError;

    const NAME: &'static str = "CancelBookings";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let bookings = self.bookings(ctx).await?;
        if let Some(booking) = bookings.iter().find(|b| b.status != BookingStatus::Pending) {
            return Err(UseCaseError::NotPending(booking.id.clone()));
        }

        let booking_ids: Vec<ID> = bookings.iter().map(|b| b.id.clone()).collect();
        let now = ctx.sys.get_timestamp_millis();
        match ctx.repos.saga.cancel(&booking_ids, now).await {
            Ok(()) => (),
            // Lost a race against payment or expiry
            Err(SagaError::InvalidTransition(_)) => {
                return Err(UseCaseError::NotPending(booking_ids[0].clone()))
            }
            Err(SagaError::BookingNotFound(id)) => return Err(UseCaseError::NotFound(id)),
            Err(_) => return Err(UseCaseError::StorageError),
        }

        let mut canceled = Vec::with_capacity(booking_ids.len());
        for booking_id in &booking_ids {
            if let Some(booking) = ctx.repos.bookings.find(booking_id).await {
                canceled.push(booking);
            }
        }
        Ok(canceled)
    }
}
