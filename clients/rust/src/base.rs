use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

pub(crate) struct BaseClient {
    address: String,
    token: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum APIErrorVariant {
    Network,
    MalformedResponse,
    BadClientData,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    BadGateway,
    UnexpectedStatusCode,
}

#[derive(Debug)]
pub struct APIError {
    pub variant: APIErrorVariant,
    pub status: Option<StatusCode>,
    pub message: String,
}

pub type APIResponse<T> = Result<T, APIError>;

impl APIError {
    fn network() -> Self {
        Self {
            variant: APIErrorVariant::Network,
            status: None,
            message: "Unable to reach the server".into(),
        }
    }
}

impl BaseClient {
    pub fn new(address: String) -> Self {
        Self {
            address,
            token: None,
        }
    }

    pub fn set_token(&mut self, token: String) {
        if !token.is_empty() {
            self.token = Some(token);
        }
    }

    fn get_client(&self, method: Method, path: String) -> RequestBuilder {
        let url = format!("{}/api/v1/{}", self.address, path);
        let builder = Client::new().request(method, &url);

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check_status_code(
        &self,
        res: Response,
        expected_status_code: StatusCode,
    ) -> Result<Response, APIError> {
        let status = res.status();
        if status == expected_status_code {
            return Ok(res);
        }
        let variant = match status {
            StatusCode::BAD_REQUEST => APIErrorVariant::BadClientData,
            StatusCode::UNAUTHORIZED => APIErrorVariant::Unauthorized,
            StatusCode::FORBIDDEN => APIErrorVariant::Forbidden,
            StatusCode::NOT_FOUND => APIErrorVariant::NotFound,
            StatusCode::CONFLICT => APIErrorVariant::Conflict,
            StatusCode::BAD_GATEWAY => APIErrorVariant::BadGateway,
            _ => APIErrorVariant::UnexpectedStatusCode,
        };
        let message = res.text().await.unwrap_or_default();
        Err(APIError {
            variant,
            status: Some(status),
            message,
        })
    }

    async fn handle_api_response<T: for<'de> Deserialize<'de>>(
        &self,
        res: Response,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = self.check_status_code(res, expected_status_code).await?;
        res.json::<T>().await.map_err(|e| APIError {
            variant: APIErrorVariant::MalformedResponse,
            status: None,
            message: e.to_string(),
        })
    }

    pub async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: String,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = match self.get_client(Method::GET, path).send().await {
            Ok(res) => res,
            Err(_) => return Err(APIError::network()),
        };
        self.handle_api_response(res, expected_status_code).await
    }

    pub async fn delete<T: for<'de> Deserialize<'de>>(
        &self,
        path: String,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = match self.get_client(Method::DELETE, path).send().await {
            Ok(res) => res,
            Err(_) => return Err(APIError::network()),
        };
        self.handle_api_response(res, expected_status_code).await
    }

    pub async fn put<T: for<'de> Deserialize<'de>, S: Serialize>(
        &self,
        body: S,
        path: String,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = match self.get_client(Method::PUT, path).json(&body).send().await {
            Ok(res) => res,
            Err(_) => return Err(APIError::network()),
        };
        self.handle_api_response(res, expected_status_code).await
    }

    pub async fn post<T: for<'de> Deserialize<'de>, S: Serialize>(
        &self,
        body: S,
        path: String,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = match self.get_client(Method::POST, path).json(&body).send().await {
            Ok(res) => res,
            Err(_) => return Err(APIError::network()),
        };
        self.handle_api_response(res, expected_status_code).await
    }

    /// Posts `body` as is, for endpoints that verify a signature over the raw bytes
    pub async fn post_raw(
        &self,
        body: Vec<u8>,
        path: String,
        headers: Vec<(&str, String)>,
        expected_status_code: StatusCode,
    ) -> APIResponse<()> {
        let mut builder = self
            .get_client(Method::POST, path)
            .header("content-type", "application/json")
            .body(body);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        let res = match builder.send().await {
            Ok(res) => res,
            Err(_) => return Err(APIError::network()),
        };
        self.check_status_code(res, expected_status_code).await?;
        Ok(())
    }
}
