use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, warn};

use super::error::ApiError;
use super::types::{ErrorBody, LoginRequest, LoginResponse, RegisterRequest};
use crate::model::{
    Actor, Forestry, Indicator, Period, RawMeasurement, ResponsibilityAssignment, Role, Section,
};
use crate::store::{RatingBackend, SaveRawData};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the rating server's REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` points at the API root, e.g. "http://localhost:3000/api".
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|_| ApiError::InvalidUrl(base_url.clone()))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("forestry-rating/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Transport {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        join_endpoint(&self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(status.canonical_reason(), &body),
        })
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, ApiError> {
        response.json::<T>().await.map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.send(url, self.http.get(url)).await?;
        Self::decode(url, response).await
    }

    /// GET with retries on transient failures (exponential backoff, 3 attempts).
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(3);

        debug!(url = %url, "GET");
        RetryIf::spawn(
            retry_strategy,
            || self.get_once(&url),
            |e: &ApiError| {
                let transient = e.is_transient();
                if transient {
                    warn!(url = %url, "retrying after error: {}", e);
                }
                transient
            },
        )
        .await
    }

    /// POST without retries: a failed write is reported to the caller.
    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        debug!(url = %url, "POST");
        let response = self.send(&url, self.http.post(&url).json(body)).await?;
        Self::decode(&url, response).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.post_json("login", &LoginRequest { email, password })
            .await
    }

    /// Create an account. Returns the new user; it still has to log in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<Actor, ApiError> {
        self.post_json(
            "register",
            &RegisterRequest {
                email,
                password,
                role,
            },
        )
        .await
    }

    /// The actor behind the current token.
    pub async fn me(&self) -> Result<Actor, ApiError> {
        self.get_json("me").await
    }
}

impl RatingBackend for ApiClient {
    async fn fetch_forestries(&self) -> Result<Vec<Forestry>, ApiError> {
        self.get_json("forestries").await
    }

    async fn fetch_sections(&self) -> Result<Vec<Section>, ApiError> {
        self.get_json("sections").await
    }

    async fn fetch_indicators(&self) -> Result<Vec<Indicator>, ApiError> {
        self.get_json("indicators").await
    }

    async fn fetch_raw_data(&self, period: Period) -> Result<Vec<RawMeasurement>, ApiError> {
        self.get_json(&format!("raw-data?period={}", period)).await
    }

    async fn fetch_responsibilities(&self) -> Result<Vec<ResponsibilityAssignment>, ApiError> {
        self.get_json("indicator-responsible").await
    }

    async fn save_raw_data(&self, request: &SaveRawData) -> Result<(), ApiError> {
        let _: serde_json::Value = self.post_json("raw-data", request).await?;
        Ok(())
    }
}

fn join_endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Prefer the server's `{"error": "..."}` message, then the raw body, then
/// the status reason.
fn error_message(reason: Option<&str>, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    let body = body.trim();
    if body.is_empty() {
        reason.unwrap_or("request failed").to_string()
    } else {
        body.to_string()
    }
}
