//! MSP license service HTTP transport.
//!
//! A thin JSON client over `reqwest`. Authentication is handled by
//! pluggable [`TokenSource`] implementations, so the session layer can
//! hand out whatever bearer token is current at request time.
//!
//! # Usage
//!
//! ```ignore
//! use msp_client::{RestClient, StaticToken};
//!
//! let client = RestClient::new("http://localhost:5000/api", Arc::new(StaticToken::new("jwt")));
//! let customers: Vec<Customer> = client.get("/customers").await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

// ── Error ───────────────────────────────────────────────────────────

/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("auth: {0}")]
    Auth(String),

    #[error("decode: {0}")]
    Decode(String),
}

impl ApiError {
    /// The human-readable message the service attached to a rejection,
    /// if there is one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }

    /// HTTP status of a server rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Extract the message from an error response body.
///
/// The service answers `{"message": "..."}`; older endpoints use
/// `{"error": "..."}`. Anything else is passed through verbatim.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { message: Some(m), .. }) => m,
        Ok(ErrorBody { error: Some(e), .. }) => e,
        _ => body.trim().to_string(),
    }
}

// ── TokenSource ─────────────────────────────────────────────────────

/// Pluggable token provider. Called before every API request.
///
/// Returns `Ok(None)` to skip the Authorization header (anonymous).
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> Result<Option<String>, ApiError>;
}

/// No authentication: anonymous requests.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// Static bearer token (already obtained externally).
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(Some(self.0.clone()))
    }
}

// ── RestClient ──────────────────────────────────────────────────────

/// JSON client rooted at the service's base URL.
///
/// Paths passed to the verb methods are appended to the base URL, so
/// `get("/customers")` against `http://host/api` hits
/// `http://host/api/customers`.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token_source: Arc<dyn TokenSource>,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base(base_url.into()),
            token_source,
        }
    }

    /// Build a client whose requests give up after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        token_source: Arc<dyn TokenSource>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: normalize_base(base_url.into()),
            token_source,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build a request with auth header.
    async fn authed(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ApiError> {
        match self.token_source.token().await? {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }

    /// Fail on a non-2xx status, carrying the service's message.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let code = status.as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Server { status: code, message: error_message(&body) })
    }

    /// Parse an API response, mapping HTTP errors to `ApiError`.
    async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, ApiError> {
        let resp = Self::check(resp).await?;
        resp.json::<R>().await
            .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        debug!(path, "GET");
        let req = self.authed(self.http.get(self.url(path))).await?;
        Self::parse(req.send().await?).await
    }

    /// GET with query-string parameters.
    pub async fn get_query<Q, R>(&self, path: &str, query: &Q) -> Result<R, ApiError>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(path, "GET");
        let req = self.authed(self.http.get(self.url(path)).query(query)).await?;
        Self::parse(req.send().await?).await
    }

    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(path, "POST");
        let req = self.authed(self.http.post(self.url(path)).json(body)).await?;
        Self::parse(req.send().await?).await
    }

    pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(path, "PUT");
        let req = self.authed(self.http.put(self.url(path)).json(body)).await?;
        Self::parse(req.send().await?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        debug!(path, "DELETE");
        let req = self.authed(self.http.delete(self.url(path))).await?;
        Self::check(req.send().await?).await?;
        Ok(())
    }
}

fn normalize_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_auth_returns_none() {
        let ts = NoAuth;
        assert!(ts.token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn static_token_returns_value() {
        let ts = StaticToken::new("my-jwt-token");
        assert_eq!(ts.token().await.unwrap(), Some("my-jwt-token".to_string()));
    }

    #[test]
    fn url_joins_without_double_slash() {
        let client = RestClient::new("http://localhost:5000/api/", Arc::new(NoAuth));
        assert_eq!(client.base_url(), "http://localhost:5000/api");
        assert_eq!(client.url("/customers"), "http://localhost:5000/api/customers");
        assert_eq!(client.url("requests/pending"), "http://localhost:5000/api/requests/pending");
    }

    #[test]
    fn error_message_prefers_message_field() {
        assert_eq!(error_message(r#"{"message":"Request already processed"}"#), "Request already processed");
        assert_eq!(error_message(r#"{"error":"not found"}"#), "not found");
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_message(r#"{"code":"X"}"#), r#"{"code":"X"}"#);
    }

    #[test]
    fn server_message_skips_blank() {
        let err = ApiError::Server { status: 409, message: "already approved".into() };
        assert_eq!(err.server_message(), Some("already approved"));
        assert_eq!(err.status(), Some(409));

        let blank = ApiError::Server { status: 500, message: "  ".into() };
        assert_eq!(blank.server_message(), None);
        assert_eq!(ApiError::Auth("x".into()).server_message(), None);
    }
}
