//! Single-record resolution with rate-limit retry
//!
//! A reference URL is fetched and decoded. HTTP 429 is retried with
//! exponential backoff; every other failure is permanent and turns into a
//! placeholder record, so callers always get a value back.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::Transport;
use crate::decode::decode;
use crate::error::{ApiError, Result};
use crate::types::Placeholder;

/// Default number of retries after a 429 response
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry (in milliseconds)
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1000;

/// Exponential backoff applied to rate-limited requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt (default: 3)
    pub max_retries: u32,
    /// Delay before the first retry, doubled after each one (default: 1s)
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): 1s, 2s, 4s, ...
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Record types the resolver can fetch
pub trait Resolvable: DeserializeOwned + Placeholder + Send + 'static {
    /// Human name of the record kind, used in placeholder text and logs
    const KIND: &'static str;
}

impl Resolvable for crate::types::Character {
    const KIND: &'static str = "character";
}

/// Fetches records by absolute URL, never failing on remote errors
#[derive(Clone)]
pub struct Resolver {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Resolver {
    /// Create a resolver over `transport` with the given retry policy.
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Retry policy in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Resolve one record by reference URL.
    ///
    /// # Returns
    /// The decoded record, or a placeholder (`is_placeholder() == true`)
    /// when the server keeps rate limiting, answers with any other error
    /// status, cannot be reached, or returns an undecodable body.
    ///
    /// # Errors
    /// - `ApiError::InvalidReference` if `reference` is blank
    /// - `ApiError::Interrupted` if `cancel` fires while waiting
    pub async fn resolve<T: Resolvable>(
        &self,
        reference: &str,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let url = reference.trim();
        if url.is_empty() {
            return Err(ApiError::InvalidReference(
                "reference URL cannot be empty".to_string(),
            ));
        }

        self.resolve_with_retry(url, 0, cancel).await
    }

    /// Internal method to fetch with retry logic
    fn resolve_with_retry<'a, T: Resolvable>(
        &'a self,
        url: &'a str,
        attempt: u32,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>> {
        Box::pin(async move {
            let err = match self.fetch_once::<T>(url, cancel).await {
                Ok(record) => return Ok(record),
                Err(ApiError::Interrupted) => return Err(ApiError::Interrupted),
                Err(err) => err,
            };

            if err.is_rate_limited() {
                if attempt < self.policy.max_retries {
                    let delay = self.policy.backoff_delay(attempt);
                    info!(
                        url,
                        attempt = attempt + 1,
                        remaining = self.policy.max_retries - attempt,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(ApiError::Interrupted),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    return self.resolve_with_retry(url, attempt + 1, cancel).await;
                }
                warn!(url, retries = attempt, "rate limit retries exhausted");
                return Ok(T::placeholder(format!(
                    "Error loading {} (rate limited)",
                    T::KIND
                )));
            }

            warn!(url, kind = T::KIND, error = %err, "resolution failed");
            Ok(T::placeholder(placeholder_reason::<T>(&err)))
        })
    }

    async fn fetch_once<T: Resolvable>(&self, url: &str, cancel: &CancellationToken) -> Result<T> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Interrupted),
            response = self.transport.get(url) => response?,
        };

        if !response.is_success() {
            return Err(ApiError::status(response.status, url, &response.body));
        }
        debug!(url, kind = T::KIND, "decoding");
        decode(&response.body, T::KIND)
    }
}

fn placeholder_reason<T: Resolvable>(err: &ApiError) -> String {
    match err {
        ApiError::Status { status, .. } => format!("Error loading {} (HTTP {status})", T::KIND),
        ApiError::Decode { .. } => format!("Error parsing {}", T::KIND),
        _ => format!("Error loading {}", T::KIND),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{character_json, character_url, FakeTransport};
    use crate::types::Character;

    fn resolver(transport: Arc<FakeTransport>) -> Resolver {
        Resolver::new(transport, RetryPolicy::default())
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_backoff, Duration::from_millis(1000));
    }

    #[test]
    fn test_backoff_delay_calculation() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let url = character_url(1);
        let transport = Arc::new(FakeTransport::new().reply(&url, 200, character_json(1)));

        let character: Character = resolver(transport)
            .resolve(&url, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(character.id, 1);
        assert_eq!(character.name, "Character 1");
    }

    #[tokio::test]
    async fn test_resolve_character_with_null_fields() {
        let url = character_url(5);
        let body = r#"{"id":5,"name":"Birdperson","status":"Alive","species":null,"gender":null,"image":null,"episode":null}"#;
        let transport = Arc::new(FakeTransport::new().reply(&url, 200, body));

        let character: Character = resolver(transport)
            .resolve(&url, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!character.is_placeholder());
        assert_eq!(character.id, 5);
        assert_eq!(character.name, "Birdperson");
        assert_eq!(character.image, "");
    }

    #[tokio::test]
    async fn test_resolve_trims_reference() {
        let url = character_url(4);
        let transport = Arc::new(FakeTransport::new().reply(&url, 200, character_json(4)));

        let character: Character = resolver(transport)
            .resolve(&format!("  {url} "), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(character.id, 4);
    }

    #[tokio::test]
    async fn test_resolve_blank_reference() {
        let transport = Arc::new(FakeTransport::new());
        let resolver = resolver(transport.clone());

        for reference in ["", "   "] {
            let result = resolver
                .resolve::<Character>(reference, &CancellationToken::new())
                .await;
            assert!(matches!(result, Err(ApiError::InvalidReference(_))));
        }
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_not_found_is_permanent() {
        let url = character_url(9999);
        let transport = Arc::new(FakeTransport::new().reply(&url, 404, "missing"));

        let character: Character = resolver(transport.clone())
            .resolve(&url, &CancellationToken::new())
            .await
            .unwrap();

        assert!(character.is_placeholder());
        assert_eq!(character.name, "Error loading character (HTTP 404)");
        assert_eq!(transport.count(&url), 1);
    }

    #[tokio::test]
    async fn test_resolve_server_error_not_retried() {
        let url = character_url(3);
        let transport = Arc::new(FakeTransport::new().reply(&url, 503, "down"));

        let character: Character = resolver(transport.clone())
            .resolve(&url, &CancellationToken::new())
            .await
            .unwrap();

        assert!(character.is_placeholder());
        assert_eq!(transport.count(&url), 1);
    }

    #[tokio::test]
    async fn test_resolve_undecodable_body() {
        let url = character_url(2);
        let transport = Arc::new(FakeTransport::new().reply(&url, 200, "{not json"));

        let character: Character = resolver(transport)
            .resolve(&url, &CancellationToken::new())
            .await
            .unwrap();

        assert!(character.is_placeholder());
        assert_eq!(character.name, "Error parsing character");
        assert_eq!(character.status, "unknown");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_then_success_backs_off_exponentially() {
        let url = character_url(1);
        let transport = Arc::new(
            FakeTransport::new()
                .reply(&url, 429, "")
                .reply(&url, 429, "")
                .reply(&url, 429, "")
                .reply(&url, 200, character_json(1)),
        );

        let character: Character = resolver(transport.clone())
            .resolve(&url, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(character.id, 1);

        let times: Vec<_> = transport.requests().into_iter().map(|(_, t)| t).collect();
        assert_eq!(times.len(), 4);
        let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhausted_returns_placeholder() {
        let url = character_url(1);
        let transport = Arc::new(FakeTransport::new().reply(&url, 429, ""));

        let character: Character = resolver(transport.clone())
            .resolve(&url, &CancellationToken::new())
            .await
            .unwrap();

        assert!(character.is_placeholder());
        assert_eq!(character.name, "Error loading character (rate limited)");
        // First attempt plus three retries.
        assert_eq!(transport.count(&url), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries() {
        let url = character_url(1);
        let transport = Arc::new(FakeTransport::new().reply(&url, 429, ""));
        let policy = RetryPolicy {
            max_retries: 0,
            ..Default::default()
        };

        let character: Character = Resolver::new(transport.clone(), policy)
            .resolve(&url, &CancellationToken::new())
            .await
            .unwrap();

        assert!(character.is_placeholder());
        assert_eq!(transport.count(&url), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let url = character_url(1);
        let transport = Arc::new(FakeTransport::new().reply(&url, 429, ""));
        let resolver = resolver(transport.clone());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let result = resolver.resolve::<Character>(&url, &cancel).await;
        assert!(matches!(result, Err(ApiError::Interrupted)));
        assert_eq!(transport.count(&url), 1);
    }
}
