use crate::error::BoxofficeError;
use crate::job::enqueue_job::{arm_job, EnqueueJobUseCase};
use crate::shared::{
    auth::protect_org_route,
    usecase::{execute, UseCase},
};
use crate::ticket::create_ticket::NewTicket;
use actix_web::{web, HttpRequest, HttpResponse};
use boxoffice_api_structs::create_event::*;
use boxoffice_domain::{
    Event, EventMode, EventStatus, JobTask, ScheduleError, Ticket, TicketStatus, Topic, ID,
};
use boxoffice_infra::BoxofficeContext;

pub async fn create_event_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<BoxofficeContext>,
) -> Result<HttpResponse, BoxofficeError> {
    let (_, org_id) = protect_org_route(&http_req, &ctx)?;

    let body = body.0;
    let usecase = CreateEventUseCase {
        org_id,
        name: body.name,
        date_time: body.date_time,
        timezone: body.timezone,
        mode: body.mode.unwrap_or(EventMode::Default),
        opens_at: body.opens_at,
        deadline: body.deadline,
        publish: body.publish.unwrap_or(false),
        tickets: body
            .tickets
            .unwrap_or_default()
            .into_iter()
            .map(NewTicket::from)
            .collect(),
    };

    execute(usecase, &ctx)
        .await
        .map(|(event, tickets)| HttpResponse::Created().json(APIResponse::new(event, tickets)))
        .map_err(BoxofficeError::from)
}

#[derive(Debug)]
pub struct CreateEventUseCase {
    pub org_id: ID,
    pub name: String,
    pub date_time: i64,
    pub timezone: String,
    pub mode: EventMode,
    pub opens_at: Option<i64>,
    pub deadline: Option<i64>,
    /// Open sales right away instead of at `opens_at`
    pub publish: bool,
    pub tickets: Vec<NewTicket>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidSchedule(ScheduleError),
    InvalidTicket(String),
    NoTickets,
    StorageError,
}

impl From<UseCaseError> for BoxofficeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidSchedule(e) => Self::BadClientData(e.to_string()),
            UseCaseError::InvalidTicket(name) => {
                Self::BadClientData(format!("The ticket: {}, is not valid", name))
            }
            UseCaseError::NoTickets => {
                Self::BadClientData("An event needs a ticket to be published".into())
            }
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreateEventUseCase {
    type Response = (Event, Vec<Ticket>);

    type Error = UseCaseError;

    const NAME: &'static str = "CreateEvent";

    async fn execute(&mut self, ctx: &BoxofficeContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let mut event = Event::new(
            self.org_id.clone(),
            self.name.clone(),
            self.date_time,
            self.timezone.clone(),
            now,
        );
        event.mode = self.mode;
        event.opens_at = self.opens_at;
        event.deadline = self.deadline;
        event
            .validate_schedule(now)
            .map_err(UseCaseError::InvalidSchedule)?;

        let mut tickets = Vec::with_capacity(self.tickets.len());
        for new_ticket in &self.tickets {
            let ticket = new_ticket.build(&event.id, now);
            if !ticket.is_valid() {
                return Err(UseCaseError::InvalidTicket(new_ticket.name.clone()));
            }
            tickets.push(ticket);
        }

        if self.publish {
            if tickets.is_empty() {
                return Err(UseCaseError::NoTickets);
            }
            event.status = EventStatus::Open;
            for ticket in tickets.iter_mut() {
                ticket.status = TicketStatus::Open;
            }
        } else if event.mode == EventMode::Scheduled {
            // Takes subscriptions until the open job fires
            event.status = EventStatus::Notify;
        }

        let mut jobs = Vec::with_capacity(2);
        if let (EventMode::Scheduled, Some(opens_at), Some(deadline)) =
            (event.mode, event.opens_at, event.deadline)
        {
            if !self.publish {
                jobs.push(EnqueueJobUseCase::for_event(&event, Topic::EventsToOpen, opens_at));
            }
            jobs.push(EnqueueJobUseCase::for_event(&event, Topic::EventsToClose, deadline));
        }
        let jobs: Vec<JobTask> = jobs.iter().map(|job| job.build(now)).collect();

        ctx.repos
            .saga
            .create_event(&event, &tickets, &jobs)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        // Only armed once the jobs are stored, a timer never fires for a missing row
        for job in &jobs {
            arm_job(job, ctx);
        }

        Ok((event, tickets))
    }
}
