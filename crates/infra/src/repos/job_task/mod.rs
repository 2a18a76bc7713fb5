mod inmemory;
mod postgres;

use boxoffice_domain::{JobTask, ID};
pub use inmemory::InMemoryJobTaskRepo;
pub(crate) use postgres::insert_job_task;
pub use postgres::PostgresJobTaskRepo;

#[async_trait::async_trait]
pub trait IJobTaskRepo: Send + Sync {
    async fn insert(&self, job: &JobTask) -> anyhow::Result<()>;
    async fn find(&self, job_id: &ID) -> Option<JobTask>;
    /// Pending jobs with `from <= runs_at < to`, earliest first
    async fn find_pending_between(
        &self,
        from: i64,
        to: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<JobTask>>;
    /// Marks the pending job with the given payload id as done. Returns
    /// whether a job was updated.
    async fn mark_done_by_payload(&self, payload_id: &ID, now: i64) -> anyhow::Result<bool>;
    /// Expires every pending job that should have run before `before`
    async fn expire_pending_before(&self, before: i64, now: i64) -> anyhow::Result<u64>;
}

#[cfg(test)]
mod tests {
    use crate::setup_context;
    use boxoffice_domain::{JobTask, JobTaskStatus, Topic, ID};
    use serial_test::serial;

    fn job(runs_at: i64) -> JobTask {
        JobTask::new(
            format!("Event_{}_OpensAt", runs_at),
            runs_at,
            Topic::EventsToOpen,
            ID::default(),
            0,
        )
    }

    #[tokio::test]
    #[serial]
    async fn finds_pending_jobs_in_window() {
        let ctx = setup_context().await.unwrap();
        let jobs = vec![job(300), job(100), job(200), job(10_000)];
        for j in &jobs {
            ctx.repos.job_tasks.insert(j).await.unwrap();
        }
        assert!(ctx
            .repos
            .job_tasks
            .mark_done_by_payload(&jobs[2].payload_id, 1)
            .await
            .unwrap());

        let found = ctx
            .repos
            .job_tasks
            .find_pending_between(50, 1000, 10)
            .await
            .unwrap();
        let runs_at: Vec<i64> = found.iter().map(|j| j.runs_at).collect();
        assert_eq!(runs_at, vec![100, 300]);

        let limited = ctx
            .repos
            .job_tasks
            .find_pending_between(50, 1000, 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].runs_at, 100);
    }

    #[tokio::test]
    #[serial]
    async fn marks_done_once() {
        let ctx = setup_context().await.unwrap();
        let j = job(100);
        ctx.repos.job_tasks.insert(&j).await.unwrap();

        assert!(ctx
            .repos
            .job_tasks
            .mark_done_by_payload(&j.payload_id, 5)
            .await
            .unwrap());
        assert!(!ctx
            .repos
            .job_tasks
            .mark_done_by_payload(&j.payload_id, 6)
            .await
            .unwrap());
        let j = ctx.repos.job_tasks.find(&j.id).await.unwrap();
        assert_eq!(j.status, JobTaskStatus::Done);
        assert_eq!(j.updated, 5);
    }

    #[tokio::test]
    #[serial]
    async fn expires_missed_jobs() {
        let ctx = setup_context().await.unwrap();
        let missed = job(100);
        let upcoming = job(900);
        ctx.repos.job_tasks.insert(&missed).await.unwrap();
        ctx.repos.job_tasks.insert(&upcoming).await.unwrap();

        let expired = ctx
            .repos
            .job_tasks
            .expire_pending_before(500, 600)
            .await
            .unwrap();
        assert_eq!(expired, 1);
        assert_eq!(
            ctx.repos.job_tasks.find(&missed.id).await.unwrap().status,
            JobTaskStatus::Expired
        );
        assert_eq!(
            ctx.repos.job_tasks.find(&upcoming.id).await.unwrap().status,
            JobTaskStatus::Pending
        );
    }
}
