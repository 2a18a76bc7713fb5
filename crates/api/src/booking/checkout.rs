use crate::error::BoxofficeError;
use crate::job::enqueue_job::EnqueueJobUseCase;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_api_structs::checkout::*;
use boxoffice_domain::{
    merge_items, Booking, CheckoutItem, CheckoutPlan, CheckoutPlanError, EventStatus, Seats,
    Ticket, TicketStatus, Topic, Transaction, ID,
};
use boxoffice_infra::{BoxofficeContext, CheckoutLineItem, CreateCheckoutSession, SagaError};
use tracing::error;

pub async fn checkout_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    let user = protect_route(&http_req, &ctx)?;

    let body = body.0;
    let usecase = CheckoutUseCase {
        user_id: user.user_id,
        request_id: body.request_id,
        items: body.items,
    };

    execute(usecase, &ctx)
        .await
        .map(|res| {
            HttpResponse::Created().json(APIResponse::new(
                res.transaction,
                res.bookings,
                res.checkout_url,
            ))
        })
        .map_err(BoxofficeError::from)
}

/// Books seats of one or more `Ticket`s of the same `Event` and starts a
/// payment for them
#[derive(Debug)]
pub struct CheckoutUseCase {
    pub user_id: ID,
    /// Fresh id from the caller that becomes the reference of the `Transaction`
    pub request_id: ID,
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug)]
pub struct CheckoutResponse {
    pub transaction: Transaction,
    pub bookings: Vec<Booking>,
    pub checkout_url: String,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidItems(CheckoutPlanError),
    DuplicateRequest,
    NotFound(ID),
    TicketNotOpen(ID),
    EventNotOpen(ID),
    CapacityExceeded { ticket_id: ID, free: i64 },
    PaymentProvider(String),
    StorageError,
}

impl From<CheckoutPlanError> for UseCaseError {
    fn from(e: CheckoutPlanError) -> Self {
        match e {
            CheckoutPlanError::TicketNotFound(ticket_id) => Self::NotFound(ticket_id),
            e => Self::InvalidItems(e),
        }
    }
}

impl From<SagaError> for UseCaseError {
    fn from(e: SagaError) -> Self {
        match e {
            SagaError::TicketNotFound(ticket_id) => Self::NotFound(ticket_id),
            SagaError::TicketNotOpen(ticket_id) => Self::TicketNotOpen(ticket_id),
            SagaError::CapacityExceeded { ticket_id, free } => {
                Self::CapacityExceeded { ticket_id, free }
            }
            SagaError::DuplicateReference => Self::DuplicateRequest,
            _ => Self::StorageError,
        }
    }
}

impl From<UseCaseError> for BoxofficeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidItems(e) => Self::BadClientData(e.to_string()),
            UseCaseError::DuplicateRequest => Self::BadClientData(
                "The requestId has already been used. Use a fresh id for every checkout.".into(),
            ),
            UseCaseError::NotFound(id) => {
                Self::NotFound(format!("The ticket with id: {}, was not found.", id))
            }
            UseCaseError::TicketNotOpen(ticket_id) => Self::Conflict(format!(
                "The ticket with id: {}, is not open for sale.",
                ticket_id
            )),
            UseCaseError::EventNotOpen(event_id) => Self::Conflict(format!(
                "The event with id: {}, is not open for sale.",
                event_id
            )),
            UseCaseError::CapacityExceeded { ticket_id, free } => Self::Conflict(format!(
                "The ticket with id: {}, only has {} free seats left.",
                ticket_id, free
            )),
            UseCaseError::PaymentProvider(e) => Self::BadGateway(e),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

impl CheckoutUseCase {
    fn line_items(plan: &CheckoutPlan, tickets: &[Ticket]) -> Vec<CheckoutLineItem> {
        plan.bookings
            .iter()
            .filter_map(|booking| {
                let ticket = tickets.iter().find(|t| t.id == booking.ticket_id)?;
                Some(CheckoutLineItem {
                    name: ticket.name.clone(),
                    unit_amount: ticket.price,
                    currency: ticket.currency.clone(),
                    quantity: booking.qty,
                    price_ref: ticket.price_ref.clone(),
                })
            })
            .collect()
    }

    /// Releases the seats of a checkout the payment provider did not accept
    async fn compensate(plan: &CheckoutPlan, ctx: &BoxofficeContext) {
        let booking_ids: Vec<ID> = plan.bookings.iter().map(|b| b.id.clone()).collect();
        let now = ctx.sys.get_timestamp_millis();
        if let Err(e) = ctx.repos.saga.cancel(&booking_ids, now).await {
            error!(
                transaction_id = %plan.transaction.id,
                "Unable to cancel bookings of failed checkout: {:?}", e
            );
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for CheckoutUseCase {
    type Response = CheckoutResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "Checkout";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        if ctx
            .repos
            .transactions
            .find_by_reference(&self.request_id)
            .await
            .is_some()
        {
            return Err(UseCaseError::DuplicateRequest);
        }

        let ticket_ids: Vec<ID> = merge_items(&self.items)
            .into_iter()
            .map(|item| item.ticket_id)
            .collect();
        let tickets = ctx
            .repos
            .tickets
            .find_many(&ticket_ids)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let hold_until = now + ctx.config.reservation_hold_millis;
        let mut plan = match CheckoutPlan::build(
            &self.items,
            ctx.config.max_seats_per_checkout,
            &tickets,
            &self.user_id,
            &self.request_id,
            hold_until,
            now,
        ) {
            Ok(plan) => plan,
            Err(CheckoutPlanError::OverLimit { ticket_id, limit }) => {
                let reserved = ctx
                    .repos
                    .bookings
                    .reserved_seats(&ticket_id)
                    .await
                    .map_err(|_| UseCaseError::StorageError)?;
                let free = Seats::new(limit, reserved).free.unwrap_or(0);
                return Err(UseCaseError::CapacityExceeded { ticket_id, free });
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(ticket) = tickets.iter().find(|t| t.status != TicketStatus::Open) {
            return Err(UseCaseError::TicketNotOpen(ticket.id.clone()));
        }
        let event = match ctx.repos.events.find(plan.event_id()).await {
            Some(event) if event.status == EventStatus::Open => event,
            _ => return Err(UseCaseError::EventNotOpen(plan.event_id().clone())),
        };
        plan.set_org(&event.org_id);

        ctx.repos.saga.checkout(&plan).await?;

        let request = CreateCheckoutSession {
            line_items: Self::line_items(&plan, &tickets),
            success_url: ctx.config.checkout_success_url(),
            cancel_url: ctx.config.checkout_cancel_url(),
            reference_id: plan.transaction.reference_id.clone(),
            org_id: event.org_id.clone(),
            user_id: self.user_id.clone(),
            expires_at: None,
        };
        let session = match ctx.payments.create_checkout_session(&request).await {
            Ok(session) => session,
            Err(e) => {
                Self::compensate(&plan, ctx).await;
                return Err(UseCaseError::PaymentProvider(e.to_string()));
            }
        };
        let checkout_url = match &session.url {
            Some(url) => url.clone(),
            None => {
                Self::compensate(&plan, ctx).await;
                return Err(UseCaseError::PaymentProvider(
                    "The checkout session has no url".into(),
                ));
            }
        };
        ctx.repos
            .saga
            .record_checkout_session(&plan.transaction.id, &session.id, Some(&checkout_url), now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        for booking in &plan.bookings {
            let usecase = EnqueueJobUseCase {
                name: format!("{}:{}", Topic::PendingTransactions.as_str(), booking.id),
                runs_at: hold_until,
                topic: Topic::PendingTransactions,
                entity_id: booking.id.clone(),
            };
            // The stale event sweep still expires the booking if this fails
            if let Err(e) = execute(usecase, ctx).await {
                error!(booking_id = %booking.id, "Unable to schedule hold expiry: {:?}", e);
            }
        }

        let transaction = ctx
            .repos
            .transactions
            .find(&plan.transaction.id)
            .await
            .unwrap_or(plan.transaction);
        let bookings = ctx
            .repos
            .bookings
            .find_by_transaction(&transaction.id)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(CheckoutResponse {
            transaction,
            bookings,
            checkout_url,
        })
    }
}
