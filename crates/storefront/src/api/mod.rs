//! REST client for the storefront backend.
//!
//! # Architecture
//!
//! - One [`ApiClient`] per session; the session credential is an opaque
//!   cookie kept in the client's cookie jar and never inspected here
//! - The backend is the source of truth for carts, stock and orders
//! - Each concern sits behind a trait ([`CartApi`], [`SessionApi`],
//!   [`OrderApi`], [`CatalogApi`]) so the cart engine can run against test
//!   doubles
//!
//! No request timeout is configured: a stalled call stays pending until the
//! caller gives up on it.

mod cart;
mod catalog;
mod orders;
mod session;
pub mod types;

pub use cart::CartApi;
pub use catalog::{CatalogApi, ProductFilter};
pub use orders::OrderApi;
pub use session::SessionApi;
pub use types::*;

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::ApiConfig;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, TLS...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The session is missing or not allowed to do this.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the request.
    #[error("Rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the backend, verbatim.
        message: String,
    },

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An id that cannot stand as a single path segment.
    #[error("Invalid id: {0:?}")]
    InvalidId(String),

    /// Failed to build a request URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// The backend's own message, when it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(message)
            | Self::NotFound(message)
            | Self::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether the backend was never reached.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Result type alias for backend calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the connection pool and the cookie jar, so
/// they act on the same session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Base URL all endpoint paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve an endpoint path (without leading slash) against the base URL.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Execute a GET request and parse the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.inner.client.get(self.url(path)?).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a POST request with a JSON body and parse the JSON response.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .inner
            .client
            .post(self.url(path)?)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Execute a POST request with a JSON body, ignoring the response body.
    pub(crate) async fn post_ack<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<()> {
        let response = self
            .inner
            .client
            .post(self.url(path)?)
            .json(body)
            .send()
            .await?;
        Self::handle_ack(response).await
    }

    /// Execute a POST request without a body and parse the JSON response.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.inner.client.post(self.url(path)?).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a POST request without a body, ignoring the response body.
    pub(crate) async fn post_empty_ack(&self, path: &str) -> ApiResult<()> {
        let response = self.inner.client.post(self.url(path)?).send().await?;
        Self::handle_ack(response).await
    }

    /// Execute a PUT request, ignoring the response body.
    pub(crate) async fn put_ack<B: Serialize + Sync>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<()> {
        let mut request = self.inner.client.put(self.url(path)?);
        if let Some(body) = body {
            request = request.json(body);
        }
        Self::handle_ack(request.send().await?).await
    }

    /// Execute a DELETE request, ignoring the response body.
    pub(crate) async fn delete(&self, path: &str) -> ApiResult<()> {
        let response = self.inner.client.delete(self.url(path)?).send().await?;
        Self::handle_ack(response).await
    }

    /// Handle an API response and parse the JSON body.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::parse_error(response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(format!("Failed to parse response: {e}"))
        })
    }

    /// Handle an API response whose body carries nothing we need.
    async fn handle_ack(response: reqwest::Response) -> ApiResult<()> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::parse_error(response).await)
    }

    /// Turn an error response into an [`ApiError`].
    async fn parse_error(response: reqwest::Response) -> ApiError {
        let status = response.status();

        let message = match response.text().await {
            Ok(body) => extract_message(&body),
            Err(e) => return ApiError::Http(e),
        };

        tracing::debug!(status = %status, message = %message, "Backend returned error status");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Rejected {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Endpoint path for one resource: `prefix` followed by `id` as a single
/// percent-encoded segment.
///
/// # Errors
///
/// Returns [`ApiError::InvalidId`] for ids that resolve as dot segments or
/// are empty.
pub(crate) fn id_path(prefix: &str, id: &str) -> ApiResult<String> {
    if matches!(id, "" | "." | "..") {
        return Err(ApiError::InvalidId(id.to_string()));
    }
    Ok(format!("{prefix}/{}", urlencoding::encode(id)))
}

/// Pull the human-readable message out of an error body.
///
/// The backend answers errors with `{ "message": "..." }`; anything else is
/// passed through as text.
fn extract_message(body: &str) -> String {
    if let Ok(ErrorBody { message: Some(message) }) = serde_json::from_str::<ErrorBody>(body) {
        return message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Something went wrong".to_string()
    } else {
        trimmed.chars().take(500).collect()
    }
}
