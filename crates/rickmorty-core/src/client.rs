//! HTTP transport for the Rick and Morty API
//!
//! This module provides the [`Transport`] seam used by every fetching
//! component and its reqwest-backed implementation. The transport issues
//! single GET requests with connect/response timeouts and never retries;
//! retry policy lives in [`crate::resolver`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::debug;

use crate::error::Result;

/// Base URL of the public API
pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api";

/// Default User-Agent sent with every request
const DEFAULT_USER_AGENT: &str = concat!("rickmorty-core/", env!("CARGO_PKG_VERSION"));

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, without trailing slash (default: public API)
    pub base_url: String,
    /// Connect timeout in seconds (default: 10)
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 10,
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// URL of one page of a list resource, e.g. `.../episode?page=2`.
    pub fn list_url(&self, resource: &str, page: u32) -> String {
        format!(
            "{}/{}?page={}",
            self.base_url.trim_end_matches('/'),
            resource,
            page
        )
    }
}

/// Raw outcome of a GET request that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpResponse {
    /// Create a response from a status code and body
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can GET an absolute URL.
///
/// Implementations return `Ok` for every response that reached the server,
/// whatever its status, and `Err(ApiError::Transport)` for connect errors
/// and timeouts.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a single GET request.
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// reqwest-backed [`Transport`]
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Underlying HTTP client
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a new client with custom configuration
    ///
    /// # Arguments
    /// * `config` - Client configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(url, status, bytes = body.len(), "response received");
        Ok(HttpResponse { status, body })
    }
}
