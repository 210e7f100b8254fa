//! API client for the memoria REST backend.
//!
//! Login goes through `authenticate`; section data goes through the
//! `ResourceFetcher` impl, which issues a single GET per resource key and
//! hands the raw status and body to the navigator for classification.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ApiError;
use crate::auth::SessionData;
use crate::navigator::{FetchResponse, ResourceFetcher};
use crate::section::ResourceKey;

// ============================================================================
// Constants
// ============================================================================

/// Default API base URL when none is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://api.memoria.example";

/// HTTP request timeout when none is configured.
/// Matches the navigator's default fetch bound so both fail on the same path.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user: LoginUser,
}

#[derive(Debug, Deserialize)]
struct LoginUser {
    id: i64,
    email: String,
    #[serde(default)]
    name: Option<String>,
}

/// API client for the memoria backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
    timeout: Duration,
}

impl ApiClient {
    /// Create a new API client with the default request timeout
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a new API client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: None,
            timeout,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: &str) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: Arc::clone(&self.base_url),
            token: Some(Arc::from(token)),
            timeout: self.timeout,
        }
    }

    /// Same connection pool and base URL, no bearer token.
    pub fn without_token(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: Arc::clone(&self.base_url),
            token: None,
            timeout: self.timeout,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authenticate and return session data
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<SessionData> {
        let url = self.url("/api/auth/login");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout))
            .context("Failed to send login request")?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body).into());
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout))
            .context("Failed to parse login response")?;

        Ok(SessionData::new(
            login.token,
            login.user.id,
            login.user.email,
            login.user.name,
        ))
    }

    /// GET the resource behind `key`, returning status and raw body.
    async fn get_resource(&self, key: ResourceKey) -> Result<FetchResponse, ApiError> {
        let url = self.url(key.path());
        let mut request = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json");
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;
        debug!(key = %key, status, bytes = body.len(), "Resource response received");

        Ok(FetchResponse { status, body })
    }
}

impl ResourceFetcher for ApiClient {
    fn fetch(&self, key: ResourceKey) -> BoxFuture<'static, Result<FetchResponse, ApiError>> {
        let api = self.clone();
        async move { api.get_resource(key).await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = ApiClient::new("https://api.example.org/").unwrap();
        assert_eq!(api.base_url(), "https://api.example.org");
        assert_eq!(
            api.url(ResourceKey::Orders.path()),
            "https://api.example.org/api/orders/mine"
        );
    }

    #[test]
    fn test_with_token_shares_base_url() {
        let api = ApiClient::new(DEFAULT_API_BASE_URL).unwrap();
        assert!(!api.has_token());
        let authed = api.with_token("abc");
        assert!(authed.has_token());
        assert_eq!(authed.base_url(), api.base_url());
        assert!(!authed.without_token().has_token());
    }

    #[test]
    fn test_timeout_carried_across_token_changes() {
        let api = ApiClient::with_timeout(DEFAULT_API_BASE_URL, Duration::from_secs(40)).unwrap();
        assert_eq!(api.timeout(), Duration::from_secs(40));
        assert_eq!(api.with_token("abc").timeout(), Duration::from_secs(40));
        assert_eq!(ApiClient::new(DEFAULT_API_BASE_URL).unwrap().timeout(), DEFAULT_REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_silent_server_times_out_with_configured_bound() {
        // Connections land in the listen backlog but nothing ever answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let timeout = Duration::from_millis(150);
        let api = ApiClient::with_timeout(&format!("http://{}", addr), timeout).unwrap();

        let err = api.fetch(ResourceKey::Orders).await.unwrap_err();
        assert_eq!(err, ApiError::Timeout(timeout));
        drop(listener);
    }

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"token": "t0k", "user": {"id": 7, "email": "a@b.c", "name": "Ann"}}"#;
        let parsed: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.token, "t0k");
        assert_eq!(parsed.user.id, 7);
        assert_eq!(parsed.user.name.as_deref(), Some("Ann"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let err = api.fetch(ResourceKey::Profile).await.unwrap_err();
        assert!(!err.is_auth_failure());
        assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout(_)));
    }
}
