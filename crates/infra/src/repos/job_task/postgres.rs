use super::IJobTaskRepo;
use crate::repos::shared::postgres_repo::parse_column;
use boxoffice_domain::{JobPayload, JobTask, JobTaskStatus, Status, ID};
use sqlx::{types::Uuid, FromRow, PgExecutor, PgPool};
use tracing::error;

pub struct PostgresJobTaskRepo {
    pool: PgPool,
}

impl PostgresJobTaskRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct JobTaskRaw {
    job_task_uid: Uuid,
    name: String,
    job_type: String,
    runs_at: i64,
    handler_params: serde_json::Value,
    payload_uid: Uuid,
    payload: serde_json::Value,
    status: String,
    created: i64,
    updated: i64,
}

impl TryFrom<JobTaskRaw> for JobTask {
    type Error = anyhow::Error;

    fn try_from(j: JobTaskRaw) -> anyhow::Result<Self> {
        let payload: JobPayload = serde_json::from_value(j.payload)?;
        Ok(Self {
            id: j.job_task_uid.into(),
            name: j.name,
            job_type: parse_column("job_tasks.job_type", &j.job_type)?,
            runs_at: j.runs_at,
            handler_params: j.handler_params,
            payload_id: j.payload_uid.into(),
            payload,
            status: parse_column("job_tasks.status", &j.status)?,
            created: j.created,
            updated: j.updated,
        })
    }
}

/// Inserts the `JobTask` on the given connection, which may be inside a transaction
pub(crate) async fn insert_job_task<'c, E>(executor: E, job: &JobTask) -> anyhow::Result<()>
where
    E: PgExecutor<'c>,
{
    sqlx::query(
        r#"
        INSERT INTO job_tasks
        (job_task_uid, name, job_type, runs_at, handler_params, payload_uid, payload, status, created, updated)
        VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(job.id.inner_ref())
    .bind(&job.name)
    .bind(job.job_type.as_str())
    .bind(job.runs_at)
    .bind(&job.handler_params)
    .bind(job.payload_id.inner_ref())
    .bind(serde_json::to_value(&job.payload)?)
    .bind(job.status.as_str())
    .bind(job.created)
    .bind(job.updated)
    .execute(executor)
    .await?;

    Ok(())
}

#[async_trait::async_trait]
impl IJobTaskRepo for PostgresJobTaskRepo {
    async fn insert(&self, job: &JobTask) -> anyhow::Result<()> {
        insert_job_task(&self.pool, job).await
    }

    async fn find(&self, job_id: &ID) -> Option<JobTask> {
        let raw: JobTaskRaw = match sqlx::query_as(
            r#"
            SELECT * FROM job_tasks AS j
            WHERE j.job_task_uid = $1
            "#,
        )
        .bind(job_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Unable to query job task {}: {:?}", job_id, e);
                return None;
            }
        };
        raw.try_into().ok()
    }

    async fn find_pending_between(
        &self,
        from: i64,
        to: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<JobTask>> {
        let jobs: Vec<JobTaskRaw> = sqlx::query_as(
            r#"
            SELECT * FROM job_tasks AS j
            WHERE j.status = $1 AND j.runs_at >= $2 AND j.runs_at < $3
            ORDER BY j.runs_at ASC
            LIMIT $4
            "#,
        )
        .bind(JobTaskStatus::Pending.as_str())
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        jobs.into_iter().map(JobTask::try_from).collect()
    }

    async fn mark_done_by_payload(&self, payload_id: &ID, now: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE job_tasks
            SET status = $3, updated = $4
            WHERE payload_uid = $1 AND status = $2
            "#,
        )
        .bind(payload_id.inner_ref())
        .bind(JobTaskStatus::Pending.as_str())
        .bind(JobTaskStatus::Done.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn expire_pending_before(&self, before: i64, now: i64) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE job_tasks
            SET status = $3, updated = $4
            WHERE status = $1 AND runs_at < $2
            "#,
        )
        .bind(JobTaskStatus::Pending.as_str())
        .bind(before)
        .bind(JobTaskStatus::Expired.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected())
    }
}
