use crate::shared::usecase::UseCase;
use boxoffice_domain::{Event, JobPayload, JobTask, Topic, ID};
use boxoffice_infra::{BoxofficeContext, IQueue};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Persists a `JobTask` and arms it in the in-process scheduler
#[derive(Debug)]
pub struct EnqueueJobUseCase {
    pub name: String,
    pub runs_at: i64,
    pub topic: Topic,
    /// The entity the consumer of the fired message acts on
    pub entity_id: ID,
}

impl EnqueueJobUseCase {
    /// Job that moves the `Event` as the consumer of `topic` does at `runs_at`
    pub fn for_event(event: &Event, topic: Topic, runs_at: i64) -> Self {
        Self {
            name: format!("{}:{}", topic.as_str(), event.id),
            runs_at,
            topic,
            entity_id: event.id.clone(),
        }
    }

    /// The `JobTask` this use case persists, for callers that store it themselves
    pub fn build(&self, now: i64) -> JobTask {
        JobTask::new(
            self.name.clone(),
            self.runs_at,
            self.topic,
            self.entity_id.clone(),
            now,
        )
    }
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for EnqueueJobUseCase {
    type Response = JobTask;

    type Error = UseCaseError;

    const NAME: &'static str = "EnqueueJob";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let job = self.build(ctx.sys.get_timestamp_millis());

        ctx.repos
            .job_tasks
            .insert(&job)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        arm_job(&job, ctx);

        Ok(job)
    }
}

/// Registers the job with the scheduler so that it fires at `runs_at`.
/// Jobs that are already due fire right away.
pub fn arm_job(job: &JobTask, ctx: &BoxofficeContext) -> bool {
    let now = ctx.sys.get_timestamp_millis();
    let delay = Duration::from_millis((job.runs_at - now).max(0) as u64);
    let task = fire_job(ctx.queue.clone(), job.id.clone(), job.payload.clone());
    ctx.scheduler
        .register_once(&job.id.to_string(), delay, Box::pin(task))
}

/// Publishes the payload of the job on its topic. The job stays pending
/// until the consumer of the message has acted on it.
pub async fn fire_job(queue: Arc<dyn IQueue>, job_id: ID, payload: JobPayload) {
    let body = match serde_json::to_string(&payload) {
        Ok(body) => body,
        Err(e) => {
            error!(job_id = %job_id, "Unable to serialize job payload: {:?}", e);
            return;
        }
    };
    match queue.publish(payload.topic.as_str(), &body).await {
        Ok(queues) => info!(
            job_id = %job_id,
            topic = payload.topic.as_str(),
            "Job fired to {} queues",
            queues
        ),
        Err(e) => error!(job_id = %job_id, "Unable to publish fired job: {:?}", e),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use boxoffice_domain::JobTaskStatus;
    use boxoffice_infra::setup_context;

    #[actix_web::main]
    #[test]
    async fn persists_and_arms_job() {
        let ctx = setup_context().await.unwrap();
        let now = ctx.sys.get_timestamp_millis();

        let mut usecase = EnqueueJobUseCase {
            name: "open-event".into(),
            runs_at: now + 60 * 60 * 1000,
            topic: Topic::EventsToOpen,
            entity_id: ID::default(),
        };
        let job = usecase.execute(&ctx).await.unwrap();

        let stored = ctx.repos.job_tasks.find(&job.id).await.unwrap();
        assert_eq!(stored.status, JobTaskStatus::Pending);
        assert_eq!(stored.payload.entity_id, usecase.entity_id);
        assert!(ctx.scheduler.is_armed(&job.id.to_string()));
    }

    #[actix_web::main]
    #[test]
    async fn fired_job_is_published_but_stays_pending() {
        let ctx = setup_context().await.unwrap();
        let queue = Topic::EventsToClose.queue_name();
        ctx.queue
            .subscribe(Topic::EventsToClose.as_str(), queue)
            .await
            .unwrap();
        let now = ctx.sys.get_timestamp_millis();

        let mut usecase = EnqueueJobUseCase {
            name: "close-event".into(),
            runs_at: now,
            topic: Topic::EventsToClose,
            entity_id: ID::default(),
        };
        let job = usecase.execute(&ctx).await.unwrap();

        let messages = ctx
            .queue
            .receive(queue, 10, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        let payload: JobPayload = serde_json::from_str(&messages[0].body).unwrap();
        assert_eq!(payload, job.payload);

        let stored = ctx.repos.job_tasks.find(&job.id).await.unwrap();
        assert_eq!(stored.status, JobTaskStatus::Pending);
    }
}
