use crate::shared::usecase::UseCase;
use boxoffice_domain::ID;
use boxoffice_infra::{BoxofficeContext, SagaError};
use tracing::info;

/// Releases the seats of a `Booking` whose hold ran out before it was paid.
/// A `Booking` that is no longer pending is left untouched.
#[derive(Debug)]
pub struct ExpirePendingBookingUseCase {
    pub booking_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for ExpirePendingBookingUseCase {
    /// Whether the booking was expired
    type Response = bool;

    type Error = UseCaseError;

    const NAME: &'static str = "ExpirePendingBooking";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        match ctx.repos.saga.expire_booking(&self.booking_id, now).await {
            Ok(expired) => {
                if expired {
                    info!(booking_id = %self.booking_id, "Expired pending booking");
                }
                Ok(expired)
            }
            Err(SagaError::BookingNotFound(id)) => Err(UseCaseError::NotFound(id)),
            Err(_) => Err(UseCaseError::StorageError),
        }
    }
}
