use crate::error::BoxofficeError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_api_structs::resume_checkout::*;
use boxoffice_domain::{BookingStatus, ID};
use boxoffice_infra::{BoxofficeContext, CheckoutSessionStatus};

pub async fn resume_checkout_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    let user = protect_route(&http_req, &ctx)?;

    let usecase = ResumeCheckoutUseCase {
        transaction_id: path_params.transaction_id.clone(),
        user_id: user.user_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|checkout_url| HttpResponse::Ok().json(APIResponse { checkout_url }))
        .map_err(BoxofficeError::from)
}

/// Hands back the checkout url of a `Transaction` whose payment was never finished
#[derive(Debug)]
pub struct ResumeCheckoutUseCase {
    pub transaction_id: ID,
    pub user_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    SessionExpired,
    NotPending,
    PaymentProvider(String),
    StorageError,
}

impl From<UseCaseError> for BoxofficeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(id) => Self::NotFound(format!(
                "The transaction with id: {}, was not found.",
                id
            )),
            UseCaseError::SessionExpired => {
                Self::Forbidden("The checkout session has expired".into())
            }
            UseCaseError::NotPending => {
                Self::Conflict("The bookings of the transaction are no longer pending".into())
            }
            UseCaseError::PaymentProvider(e) => Self::BadGateway(e),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for ResumeCheckoutUseCase {
    type Response = String;

    type Error = UseCaseError;

    const NAME: &'static str = "ResumeCheckout";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let transaction = match ctx.repos.transactions.find(&self.transaction_id).await {
            Some(t) if t.user_id == self.user_id => t,
            _ => return Err(UseCaseError::NotFound(self.transaction_id.clone())),
        };

        let bookings = ctx
            .repos
            .bookings
            .find_by_transaction(&transaction.id)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if bookings.is_empty() || bookings.iter().any(|b| b.status != BookingStatus::Pending) {
            return Err(UseCaseError::NotPending);
        }

        let session_id = match &transaction.checkout_session_id {
            Some(id) => id.clone(),
            None => return Err(UseCaseError::NotFound(self.transaction_id.clone())),
        };
        let session = ctx
            .payments
            .retrieve_checkout_session(&session_id)
            .await
            .map_err(|e| UseCaseError::PaymentProvider(e.to_string()))?;

        match session.status {
            CheckoutSessionStatus::Open => session
                .url
                .or(transaction.checkout_url)
                .ok_or_else(|| UseCaseError::PaymentProvider("The checkout session has no url".into())),
            CheckoutSessionStatus::Expired => Err(UseCaseError::SessionExpired),
            CheckoutSessionStatus::Complete => Err(UseCaseError::NotPending),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::booking::checkout::CheckoutUseCase;
    use crate::shared::test_helpers::{setup_open_event, use_inmemory_payments};
    use boxoffice_domain::{CheckoutItem, Transaction};
    use boxoffice_infra::setup_context;

    async fn checkout(ctx: &BoxofficeContext) -> (Transaction, String) {
        let (_, ticket) = setup_open_event(ctx, 5).await;
        let res = CheckoutUseCase {
            user_id: ID::default(),
            request_id: ID::default(),
            items: vec![CheckoutItem {
                ticket_id: ticket.id,
                qty: 1,
            }],
        }
        .execute(ctx)
        .await
        .unwrap();
        (res.transaction, res.checkout_url)
    }

    #[actix_web::main]
    #[test]
    async fn returns_url_of_open_session() {
        let ctx = setup_context().await.unwrap();
        let (transaction, checkout_url) = checkout(&ctx).await;

        let mut usecase = ResumeCheckoutUseCase {
            transaction_id: transaction.id.clone(),
            user_id: transaction.user_id.clone(),
        };
        assert_eq!(usecase.execute(&ctx).await.unwrap(), checkout_url);

        let mut usecase = ResumeCheckoutUseCase {
            transaction_id: transaction.id,
            user_id: ID::default(),
        };
        assert!(matches!(
            usecase.execute(&ctx).await,
            Err(UseCaseError::NotFound(_))
        ));
    }

    #[actix_web::main]
    #[test]
    async fn rejects_expired_session() {
        let mut ctx = setup_context().await.unwrap();
        let payments = use_inmemory_payments(&mut ctx);
        let (transaction, _) = checkout(&ctx).await;

        let session_id = transaction.checkout_session_id.clone().unwrap();
        payments.set_status(&session_id, CheckoutSessionStatus::Expired);

        let mut usecase = ResumeCheckoutUseCase {
            transaction_id: transaction.id,
            user_id: transaction.user_id,
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::SessionExpired
        );
    }

    #[actix_web::main]
    #[test]
    async fn rejects_canceled_bookings() {
        let ctx = setup_context().await.unwrap();
        let (transaction, _) = checkout(&ctx).await;
        let bookings = ctx
            .repos
            .bookings
            .find_by_transaction(&transaction.id)
            .await
            .unwrap();
        let booking_ids: Vec<ID> = bookings.into_iter().map(|b| b.id).collect();
        ctx.repos.saga.cancel(&booking_ids, 0).await.unwrap();

        let mut usecase = ResumeCheckoutUseCase {
            transaction_id: transaction.id,
            user_id: transaction.user_id,
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::NotPending
        );
    }
}
