use crate::error::BoxofficeError;
use actix_web::HttpRequest;
use boxoffice_domain::ID;
use boxoffice_infra::BoxofficeContext;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub exp: usize,  // Expiration time (as UTC timestamp)
    pub iat: usize,  // Issued at (as UTC timestamp)
    pub user_id: ID, // Subject (whom token refers to)
    /// Set for members of an organization that runs events
    #[serde(default)]
    pub org_id: Option<ID>,
}

/// The caller of a protected route
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: ID,
    pub org_id: Option<ID>,
}

fn parse_authtoken_header(token_header_value: &str) -> String {
    token_header_value
        .replace("Bearer", "")
        .replace("bearer", "")
        .trim()
        .to_string()
}

fn decode_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let claims = decode::<Claims>(token, &decoding_key, &Validation::new(Algorithm::HS256))?.claims;

    Ok(claims)
}

pub fn auth_user_req(req: &HttpRequest, ctx: &BoxofficeContext) -> Option<AuthUser> {
    let token = req.headers().get("authorization")?;
    let token = match token.to_str() {
        Ok(token) => parse_authtoken_header(token),
        Err(_) => return None,
    };
    match decode_token(&ctx.config.jwt_secret, &token) {
        Ok(claims) => Some(AuthUser {
            user_id: claims.user_id,
            org_id: claims.org_id,
        }),
        Err(_) => None,
    }
}

pub fn protect_route(req: &HttpRequest, ctx: &BoxofficeContext) -> Result<AuthUser, BoxofficeError> {
    auth_user_req(req, ctx).ok_or_else(|| {
        BoxofficeError::Unauthorized("Unable to find user from credentials".into())
    })
}

/// Only lets through users acting on behalf of an organization. Returns the
/// user id and the organization id.
pub fn protect_org_route(
    req: &HttpRequest,
    ctx: &BoxofficeContext,
) -> Result<(ID, ID), BoxofficeError> {
    let user = protect_route(req, ctx)?;
    match user.org_id {
        Some(org_id) => Ok((user.user_id, org_id)),
        None => Err(BoxofficeError::Forbidden(
            "The credentials do not belong to an organization".into(),
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::test::TestRequest;
    use boxoffice_infra::setup_context;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn create_token(secret: &str, org_id: Option<ID>) -> String {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            exp: now + 60,
            iat: now,
            user_id: ID::default(),
            org_id,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[actix_web::main]
    #[test]
    async fn decodes_valid_token() {
        let ctx = setup_context().await.unwrap();
        let org_id = ID::default();
        let token = create_token(&ctx.config.jwt_secret, Some(org_id.clone()));
        let req = TestRequest::default()
            .insert_header(("authorization", format!("Bearer {}", token)))
            .to_http_request();

        let user = protect_route(&req, &ctx).unwrap();
        assert_eq!(user.org_id, Some(org_id.clone()));
        let (_, org) = protect_org_route(&req, &ctx).unwrap();
        assert_eq!(org, org_id);
    }

    #[actix_web::main]
    #[test]
    async fn rejects_missing_or_foreign_tokens() {
        let ctx = setup_context().await.unwrap();
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            protect_route(&req, &ctx),
            Err(BoxofficeError::Unauthorized(_))
        ));

        let token = create_token("some other secret", None);
        let req = TestRequest::default()
            .insert_header(("authorization", format!("Bearer {}", token)))
            .to_http_request();
        assert!(protect_route(&req, &ctx).is_err());
    }

    #[actix_web::main]
    #[test]
    async fn org_route_needs_org_claim() {
        let ctx = setup_context().await.unwrap();
        let token = create_token(&ctx.config.jwt_secret, None);
        let req = TestRequest::default()
            .insert_header(("authorization", format!("Bearer {}", token)))
            .to_http_request();
        assert!(matches!(
            protect_org_route(&req, &ctx),
            Err(BoxofficeError::Forbidden(_))
        ));
    }
}
