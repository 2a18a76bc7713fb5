use super::IJobTaskRepo;
use crate::repos::shared::inmemory_repo::*;
use boxoffice_domain::{JobTask, JobTaskStatus, ID};
use std::sync::Mutex;

pub struct InMemoryJobTaskRepo {
    pub(crate) jobs: Mutex<Vec<JobTask>>,
}

impl InMemoryJobTaskRepo {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IJobTaskRepo for InMemoryJobTaskRepo {
    async fn insert(&self, job: &JobTask) -> anyhow::Result<()> {
        let mut jobs = lock(&self.jobs);
        if jobs.iter().any(|j| j.payload_id == job.payload_id) {
            anyhow::bail!("Job with payload id {} already exists", job.payload_id);
        }
        jobs.push(job.clone());
        Ok(())
    }

    async fn find(&self, job_id: &ID) -> Option<JobTask> {
        find(job_id, &self.jobs)
    }

    async fn find_pending_between(
        &self,
        from: i64,
        to: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<JobTask>> {
        let mut jobs = find_by(&self.jobs, |j| {
            j.status == JobTaskStatus::Pending && j.runs_at >= from && j.runs_at < to
        });
        jobs.sort_by_key(|j| j.runs_at);
        jobs.truncate(limit.max(0) as usize);
        Ok(jobs)
    }

    async fn mark_done_by_payload(&self, payload_id: &ID, now: i64) -> anyhow::Result<bool> {
        let updated = update_many(
            &self.jobs,
            |j| j.payload_id == *payload_id && j.status == JobTaskStatus::Pending,
            |j| {
                j.status = JobTaskStatus::Done;
                j.updated = now;
            },
        );
        Ok(updated > 0)
    }

    async fn expire_pending_before(&self, before: i64, now: i64) -> anyhow::Result<u64> {
        Ok(update_many(
            &self.jobs,
            |j| j.status == JobTaskStatus::Pending && j.runs_at < before,
            |j| {
                j.status = JobTaskStatus::Expired;
                j.updated = now;
            },
        ))
    }
}
