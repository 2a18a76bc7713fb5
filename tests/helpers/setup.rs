use boxoffice_api::Application;
use boxoffice_infra::{setup_context, Config};
use boxoffice_sdk::{BoxofficeSDK, ID};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

pub struct TestApp {
    pub config: Config,
    pub address: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    exp: usize,
    iat: usize,
    user_id: ID,
    org_id: Option<ID>,
}

impl TestApp {
    /// Sdk authenticated as a fresh user, member of `org_id` if given
    pub fn client(&self, org_id: Option<ID>) -> (BoxofficeSDK, ID) {
        let user_id = ID::default();
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            exp: now + 60 * 60,
            iat: now,
            user_id: user_id.clone(),
            org_id,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .expect("Expected to sign token");
        (BoxofficeSDK::new(self.address.clone(), token), user_id)
    }
}

// Launch the application as a background task
pub async fn spawn_app() -> (TestApp, BoxofficeSDK) {
    let mut ctx = setup_context().await.expect("Failed to setup context");
    ctx.config.port = 0; // Random port

    let config = ctx.config.clone();
    let application = Application::new(ctx)
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    let app = TestApp {
        config,
        address: address.clone(),
    };
    let sdk = BoxofficeSDK::new(address, "");
    (app, sdk)
}
