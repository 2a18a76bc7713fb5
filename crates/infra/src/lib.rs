mod config;
mod queue;
mod repos;
mod scheduler;
mod services;
mod system;

pub use config::{Config, QueueConfig};
pub use queue::{IQueue, InMemoryQueue, PostgresQueue, ReceivedMessage};
pub use repos::{ISagaRepo, Repos, SagaError};
pub use scheduler::{IScheduler, TokioScheduler};
pub use services::payment::*;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
pub use system::{ISys, RealSys, StaticTimeSys};
use tracing::info;

#[derive(Clone)]
pub struct BoxofficeContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub queue: Arc<dyn IQueue>,
    pub scheduler: Arc<dyn IScheduler>,
    pub payments: Arc<dyn IPaymentProvider>,
}

impl BoxofficeContext {
    fn create_inmemory(config: Config) -> Self {
        let sys: Arc<dyn ISys> = Arc::new(RealSys {});
        let visibility_timeout = Duration::from_secs(config.queue.visibility_timeout_secs);
        Self {
            repos: Repos::create_inmemory(),
            queue: Arc::new(InMemoryQueue::new(sys.clone(), visibility_timeout)),
            scheduler: Arc::new(TokioScheduler::new()),
            payments: create_payment_provider(&config),
            config,
            sys,
        }
    }

    fn create_postgres(config: Config, pool: PgPool) -> Self {
        let sys: Arc<dyn ISys> = Arc::new(RealSys {});
        let visibility_timeout = Duration::from_secs(config.queue.visibility_timeout_secs);
        Self {
            repos: Repos::create_postgres(pool.clone()),
            queue: Arc::new(PostgresQueue::new(pool, sys.clone(), visibility_timeout)),
            scheduler: Arc::new(TokioScheduler::new()),
            payments: create_payment_provider(&config),
            config,
            sys,
        }
    }
}

fn create_payment_provider(config: &Config) -> Arc<dyn IPaymentProvider> {
    match &config.payment_api_key {
        Some(api_key) => Arc::new(StripePaymentProvider::new(
            api_key.clone(),
            config.payment_api_url.clone(),
        )),
        None => {
            info!("No payment api key configured. Using the in-memory payment provider.");
            Arc::new(InMemoryPaymentProvider::new())
        }
    }
}

/// Will setup the infrastructure context given the environment.
/// Postgres is used when `DATABASE_URL` is set and migrated before use,
/// otherwise everything is kept in memory.
pub async fn setup_context() -> anyhow::Result<BoxofficeContext> {
    let config = Config::new();
    match std::env::var("DATABASE_URL") {
        Ok(connection_string) => {
            info!("DB CHECKING CONNECTION ...");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&connection_string)
                .await?;
            info!("DB CHECKING CONNECTION ... [done]");
            run_migration(&pool).await?;
            Ok(BoxofficeContext::create_postgres(config, pool))
        }
        Err(_) => {
            info!("DATABASE_URL is not set. Using in-memory infrastructure.");
            Ok(BoxofficeContext::create_inmemory(config))
        }
    }
}

pub async fn run_migration(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}
