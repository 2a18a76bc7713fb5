mod admission;
mod booking;
mod consumers;
mod error;
mod event;
mod job;
mod job_schedulers;
mod shared;
mod status;
mod subscription;
mod ticket;
mod webhook;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use boxoffice_domain::Topic;
use boxoffice_infra::BoxofficeContext;
use consumers::{start_consumers, ConsumerPool};
use job::recover_jobs::RecoverJobsUseCase;
use job_schedulers::{start_expire_pending_jobs_scheduler, start_expire_stale_events_scheduler};
use shared::usecase::execute;
use std::net::TcpListener;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    admission::configure_routes(cfg);
    booking::configure_routes(cfg);
    event::configure_routes(cfg);
    status::configure_routes(cfg);
    subscription::configure_routes(cfg);
    ticket::configure_routes(cfg);
    webhook::configure_routes(cfg);
}

pub struct Application {
    server: Server,
    port: u16,
    consumers: ConsumerPool,
}

impl Application {
    pub async fn new(context: BoxofficeContext) -> Result<Self, std::io::Error> {
        Application::subscribe_queues(&context).await?;
        Application::recover_jobs(&context).await;
        Application::start_job_schedulers(context.clone());
        let consumers = start_consumers(context.clone());
        let (server, port) = Application::configure_server(context).await?;

        Ok(Self {
            server,
            port,
            consumers,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Every topic fans out to the queue of the same name
    async fn subscribe_queues(context: &BoxofficeContext) -> Result<(), std::io::Error> {
        for topic in Topic::ALL {
            context
                .queue
                .subscribe(topic.as_str(), topic.queue_name())
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        }
        Ok(())
    }

    async fn recover_jobs(context: &BoxofficeContext) {
        match execute(RecoverJobsUseCase, context).await {
            Ok(armed) => info!("Re-armed {} pending jobs", armed),
            Err(e) => error!("Unable to recover pending jobs: {:?}", e),
        }
    }

    fn start_job_schedulers(context: BoxofficeContext) {
        start_expire_pending_jobs_scheduler(context.clone());
        start_expire_stale_events_scheduler(context);
    }

    async fn configure_server(context: BoxofficeContext) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();

        let server = HttpServer::new(move || {
            let ctx = context.clone();

            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(ctx))
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    pub async fn start(self) -> Result<(), std::io::Error> {
        let res = self.server.await;
        self.consumers.shutdown();
        res
    }
}
