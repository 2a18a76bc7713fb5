pub mod complete_job;
pub mod enqueue_job;
pub mod expire_pending_jobs;
pub mod recover_jobs;
