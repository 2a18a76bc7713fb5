use crate::shared::usecase::UseCase;
use boxoffice_domain::ID;
use boxoffice_infra::BoxofficeContext;

/// Marks the `JobTask` behind a consumed job message as done
#[derive(Debug)]
pub struct CompleteJobUseCase {
    pub payload_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for CompleteJobUseCase {
    /// Whether a pending job was found
    type Response = bool;

    type Error = UseCaseError;

    const NAME: &'static str = "CompleteJob";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        ctx.repos
            .job_tasks
            .mark_done_by_payload(&self.payload_id, ctx.sys.get_timestamp_millis())
            .await
            .map_err(|_| UseCaseError::StorageError)
    }
}
