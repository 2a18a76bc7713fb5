use super::enqueue_job::arm_job;
use crate::shared::usecase::UseCase;
use boxoffice_infra::BoxofficeContext;
use tracing::info;

/// Re-arms pending jobs after a process start. Only jobs inside the recovery
/// window are armed so that far away jobs do not pile up as timers.
#[derive(Debug)]
pub struct RecoverJobsUseCase;

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for RecoverJobsUseCase {
    /// Number of jobs armed
    type Response = usize;

    type Error = UseCaseError;

    const NAME: &'static str = "RecoverJobs";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let jobs = ctx
            .repos
            .job_tasks
            .find_pending_between(
                now + ctx.config.job_recovery_window_start_millis,
                now + ctx.config.job_recovery_window_end_millis,
                ctx.config.job_recovery_batch_size,
            )
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let armed = jobs.iter().filter(|job| arm_job(job, ctx)).count();
        info!("Recovered {} of {} pending jobs", armed, jobs.len());

        Ok(armed)
    }
}
