use boxoffice_utils::{create_random_key_hex, create_random_secret};
use tracing::{info, warn};

const SECOND: i64 = 1000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Base url of the web app. Checkout success and cancel urls are built from it.
    pub app_host: String,
    /// HS256 secret used to verify bearer tokens
    pub jwt_secret: String,
    /// Api key for the payment provider. The in-memory provider is used when missing.
    pub payment_api_key: Option<String>,
    pub payment_api_url: String,
    /// Secret the payment provider signs webhook payloads with
    pub payment_webhook_secret: String,
    /// Hex encoded AES-256 key used for admission codes
    pub qr_secret: String,
    /// How long a pending `Reservation` holds its seat
    pub reservation_hold_millis: i64,
    /// Max seats of one `Ticket` in a single checkout
    pub max_seats_per_checkout: i64,
    /// Pending `JobTask`s running this far from now or later are re-armed at boot
    pub job_recovery_window_start_millis: i64,
    /// Pending `JobTask`s running later than this are not re-armed at boot.
    /// This bounds the amount of timers held in memory.
    pub job_recovery_window_end_millis: i64,
    pub job_recovery_batch_size: i64,
    /// How long after `runs_at` a pending `JobTask` is considered missed
    pub job_expiry_grace_millis: i64,
    /// Interval of the expiry sweeps
    pub sweep_interval_millis: i64,
    /// How long after an `Event` starts the admission window stays open
    pub admission_window_millis: i64,
    /// Delay of the reconciliation message sent when a payment succeeded
    pub payment_succeeded_delay_secs: u64,
    /// Max age of a webhook signature timestamp
    pub webhook_tolerance_secs: i64,
    pub queue: QueueConfig,
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Long poll wait of a receive call
    pub wait_secs: u64,
    pub max_messages: usize,
    /// Capacity of the channel between the poller and the workers
    pub intake_capacity: usize,
    /// Max handlers running at the same time per queue
    pub concurrency: usize,
    /// Messages received this many times are moved to the dead letter queue
    pub max_receive_count: i32,
    /// How long a received message stays hidden before it is redelivered
    pub visibility_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            wait_secs: 20,
            max_messages: 10,
            intake_capacity: 5,
            concurrency: 10,
            max_receive_count: 5,
            visibility_timeout_secs: 30,
        }
    }
}

fn secret_from_env(var: &str, generate: fn() -> String) -> String {
    match std::env::var(var) {
        Ok(secret) => secret,
        Err(_) => {
            info!("Did not find {} environment variable. Going to create one.", var);
            generate()
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let default_port = 5000;
        let port = match std::env::var("PORT") {
            Ok(port) => match port.parse::<usize>() {
                Ok(port) => port,
                Err(_) => {
                    warn!(
                        "The given PORT: {} is not valid, falling back to the default port: {}.",
                        port, default_port
                    );
                    default_port
                }
            },
            Err(_) => default_port,
        };

        let default_app_host = "http://localhost:3000";
        let app_host = match std::env::var("APP_HOST") {
            Ok(host) if url::Url::parse(&host).is_ok() => host.trim_end_matches('/').to_string(),
            Ok(host) => {
                warn!(
                    "The given APP_HOST: {} is not a valid url, falling back to: {}.",
                    host, default_app_host
                );
                default_app_host.into()
            }
            Err(_) => default_app_host.into(),
        };

        let qr_secret = match std::env::var("QR_SECRET") {
            Ok(key) if hex::decode(&key).map(|k| k.len() == 32).unwrap_or(false) => key,
            Ok(_) => {
                warn!("The given QR_SECRET is not a hex encoded 32 byte key. Going to create one.");
                create_random_key_hex()
            }
            Err(_) => {
                info!("Did not find QR_SECRET environment variable. Going to create one.");
                create_random_key_hex()
            }
        };

        Self {
            port,
            app_host,
            jwt_secret: secret_from_env("JWT_SECRET", || create_random_secret(32)),
            payment_api_key: std::env::var("PAYMENT_API_KEY").ok(),
            payment_api_url: std::env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.stripe.com".into()),
            payment_webhook_secret: secret_from_env("PAYMENT_WEBHOOK_SECRET", || {
                format!("whsec_{}", create_random_secret(32))
            }),
            qr_secret,
            reservation_hold_millis: DAY,
            max_seats_per_checkout: 50,
            job_recovery_window_start_millis: MINUTE,
            job_recovery_window_end_millis: 90 * DAY,
            job_recovery_batch_size: 100,
            job_expiry_grace_millis: 5 * MINUTE,
            sweep_interval_millis: MINUTE,
            admission_window_millis: 6 * HOUR,
            payment_succeeded_delay_secs: 10,
            webhook_tolerance_secs: 300,
            queue: QueueConfig::default(),
        }
    }

    pub fn checkout_success_url(&self) -> String {
        format!("{}/checkout/callback/success", self.app_host)
    }

    pub fn checkout_cancel_url(&self) -> String {
        format!("{}/checkout/callback/cancel", self.app_host)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
