use super::update_event_status::UpdateEventStatusUseCase;
use crate::job::enqueue_job::EnqueueJobUseCase;
use crate::shared::usecase::{execute, Subscriber};
use boxoffice_domain::{Event, EventStatus, Ticket, Topic};
use boxoffice_infra::BoxofficeContext;
use tracing::error;

/// Completes the `Event` once the admission window after its start has passed
pub struct ScheduleCompletionOnAdmissionOpened;

#[async_trait::async_trait(?Send)]
impl Subscriber<UpdateEventStatusUseCase> for ScheduleCompletionOnAdmissionOpened {
    async fn notify(&self, e: &(Event, Vec<Ticket>), ctx: &BoxofficeContext) {
        let (event, _) = e;
        if event.status != EventStatus::Admission {
            return;
        }

        let usecase = EnqueueJobUseCase::for_event(
            event,
            Topic::EventsToComplete,
            event.date_time + ctx.config.admission_window_millis,
        );
        if let Err(e) = execute(usecase, ctx).await {
            error!(
                event_id = %event.id,
                "Unable to schedule completion of event: {:?}", e
            );
        }
    }
}
