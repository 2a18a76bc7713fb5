use crate::error::BoxofficeError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_api_structs::subscribe::*;
use boxoffice_domain::{EventStatus, EventSubscription, ID};
use boxoffice_infra::BoxofficeContext;

pub async fn subscribe_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    let user = protect_route(&http_req, &ctx)?;

    let usecase = SubscribeUseCase {
        event_id: path_params.event_id.clone(),
        user_id: user.user_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|subscription| HttpResponse::Ok().json(APIResponse::new(subscription)))
        .map_err(BoxofficeError::from)
}

/// Registers interest in an `Event` that has not opened yet
#[derive(Debug)]
pub struct SubscribeUseCase {
    pub event_id: ID,
    pub user_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    NotSubscribable(EventStatus),
    StorageError,
}

impl From<UseCaseError> for BoxofficeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(event_id) => Self::NotFound(format!(
                "The event with id: {}, was not found.",
                event_id
            )),
            UseCaseError::NotSubscribable(status) => Self::Conflict(format!(
                "Subscriptions are closed for events that are {}",
                status
            )),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SubscribeUseCase {
    type Response = EventSubscription;

    type Error = UseCaseError;

    const NAME: &'static str = "Subscribe";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let event = match ctx.repos.events.find(&self.event_id).await {
            Some(event) => event,
            None => return Err(UseCaseError::NotFound(self.event_id.clone())),
        };
        if !matches!(event.status, EventStatus::Draft | EventStatus::Notify) {
            return Err(UseCaseError::NotSubscribable(event.status));
        }

        let subscriptions = &ctx.repos.subscriptions;
        if let Some(existing) = subscriptions
            .find_by_event_and_user(&event.id, &self.user_id)
            .await
        {
            return Ok(existing);
        }

        let subscription = EventSubscription::new(
            event.id.clone(),
            self.user_id.clone(),
            ctx.sys.get_timestamp_millis(),
        );
        if subscriptions.insert(&subscription).await.is_err() {
            // Lost a race against a concurrent subscribe of the same user
            return subscriptions
                .find_by_event_and_user(&event.id, &self.user_id)
                .await
                .ok_or(UseCaseError::StorageError);
        }

        Ok(subscription)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use boxoffice_domain::{Event, SubscriptionStatus};
    use boxoffice_infra::setup_context;

    async fn setup(status: EventStatus) -> (BoxofficeContext, Event) {
        let ctx = setup_context().await.unwrap();
        let now = ctx.sys.get_timestamp_millis();
        let mut event = Event::new(
            ID::default(),
            "Album release".into(),
            now + 1000 * 60 * 60,
            "UTC".into(),
            now,
        );
        event.status = status;
        ctx.repos.events.insert(&event).await.unwrap();
        (ctx, event)
    }

    #[actix_web::main]
    #[test]
    async fn subscribes_once() {
        let (ctx, event) = setup(EventStatus::Notify).await;
        let user_id = ID::default();

        let mut usecase = SubscribeUseCase {
            event_id: event.id.clone(),
            user_id: user_id.clone(),
        };
        let first = usecase.execute(&ctx).await.unwrap();
        assert_eq!(first.status, SubscriptionStatus::Notify);
        let second = usecase.execute(&ctx).await.unwrap();
        assert_eq!(first.id, second.id);

        let all = ctx.repos.subscriptions.find_by_event(&event.id).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[actix_web::main]
    #[test]
    async fn rejects_open_event() {
        let (ctx, event) = setup(EventStatus::Open).await;

        let mut usecase = SubscribeUseCase {
            event_id: event.id.clone(),
            user_id: ID::default(),
        };
        assert_eq!(
            usecase.execute(&ctx).await.unwrap_err(),
            UseCaseError::NotSubscribable(EventStatus::Open)
        );
    }
}
