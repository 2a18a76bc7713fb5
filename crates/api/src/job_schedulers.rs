use crate::{
    event::expire_stale_events::ExpireStaleEventsUseCase,
    job::expire_pending_jobs::ExpirePendingJobsUseCase, shared::usecase::execute,
};
use actix_web::rt::time::interval;
use boxoffice_infra::BoxofficeContext;
use std::time::Duration;

fn sweep_interval(ctx: &BoxofficeContext) -> Duration {
    Duration::from_millis(ctx.config.sweep_interval_millis.max(1) as u64)
}

/// Expires pending jobs that were never fired. Runs at boot and then on every
/// sweep interval.
pub fn start_expire_pending_jobs_scheduler(ctx: BoxofficeContext) {
    actix_web::rt::spawn(async move {
        let mut interval = interval(sweep_interval(&ctx));
        loop {
            interval.tick().await;
            let _ = execute(ExpirePendingJobsUseCase, &ctx).await;
        }
    });
}

pub fn start_expire_stale_events_scheduler(ctx: BoxofficeContext) {
    actix_web::rt::spawn(async move {
        let mut interval = interval(sweep_interval(&ctx));
        loop {
            interval.tick().await;
            let _ = execute(ExpireStaleEventsUseCase, &ctx).await;
        }
    });
}
