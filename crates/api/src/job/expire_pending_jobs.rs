use crate::shared::usecase::UseCase;
use boxoffice_infra::BoxofficeContext;
use tracing::warn;

/// Expires pending jobs whose time has passed by more than the grace period.
/// Jobs missed while the process was down are never fired late.
#[derive(Debug)]
pub struct ExpirePendingJobsUseCase;

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for ExpirePendingJobsUseCase {
    type Response = u64;

    type Error = UseCaseError;

    const NAME: &'static str = "ExpirePendingJobs";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let expired = ctx
            .repos
            .job_tasks
            .expire_pending_before(now - ctx.config.job_expiry_grace_millis, now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if expired > 0 {
            warn!("Expired {} jobs that were not run in time", expired);
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use boxoffice_domain::{JobTask, JobTaskStatus, Topic, ID};
    use boxoffice_infra::setup_context;

    #[actix_web::main]
    #[test]
    async fn expires_only_jobs_past_the_grace_period() {
        let ctx = setup_context().await.unwrap();
        let now = ctx.sys.get_timestamp_millis();
        let grace = ctx.config.job_expiry_grace_millis;

        let missed = JobTask::new("missed".into(), now - grace - 1000, Topic::EventsToOpen, ID::default(), now);
        let late = JobTask::new("late".into(), now - grace / 2, Topic::EventsToOpen, ID::default(), now);
        ctx.repos.job_tasks.insert(&missed).await.unwrap();
        ctx.repos.job_tasks.insert(&late).await.unwrap();

        let res = ExpirePendingJobsUseCase.execute(&ctx).await.unwrap();
        assert_eq!(res, 1);

        let missed = ctx.repos.job_tasks.find(&missed.id).await.unwrap();
        assert_eq!(missed.status, JobTaskStatus::Expired);
        let late = ctx.repos.job_tasks.find(&late.id).await.unwrap();
        assert_eq!(late.status, JobTaskStatus::Pending);
    }
}
