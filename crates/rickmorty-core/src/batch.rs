//! Batched resolution of many references
//!
//! References are resolved in fixed-size batches. Members of a batch run
//! concurrently; a cooldown separates consecutive batches to keep the
//! aggregate request rate under the server's limit.

use std::time::Duration;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::resolver::{Resolvable, Resolver};

/// Default number of references resolved concurrently
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Default pause between batches (in milliseconds)
pub const DEFAULT_BATCH_COOLDOWN_MS: u64 = 500;

/// Batch sizing and pacing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// References per batch; 0 is treated as 1 (default: 3)
    pub batch_size: usize,
    /// Pause between consecutive batches (default: 500ms)
    pub cooldown: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            cooldown: Duration::from_millis(DEFAULT_BATCH_COOLDOWN_MS),
        }
    }
}

/// Trim every reference and drop the blank ones, keeping order.
pub fn normalize_references<S: AsRef<str>>(references: &[S]) -> Vec<String> {
    references
        .iter()
        .map(|r| r.as_ref().trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `items` into consecutive batches of at most `batch_size`.
pub fn partition<T>(items: &[T], batch_size: usize) -> Vec<&[T]> {
    items.chunks(batch_size.max(1)).collect()
}

/// Resolves reference lists batch by batch
#[derive(Clone)]
pub struct BatchScheduler {
    resolver: Resolver,
    config: BatchConfig,
}

impl BatchScheduler {
    /// Create a scheduler resolving through `resolver`.
    pub fn new(resolver: Resolver, config: BatchConfig) -> Self {
        Self { resolver, config }
    }

    /// Batch configuration in use
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Resolve every reference, keeping only real records.
    ///
    /// Blank references are dropped first; an empty list resolves to an
    /// empty result without any request. Placeholders returned by the
    /// resolver are logged and excluded.
    ///
    /// # Errors
    /// `ApiError::Interrupted` if `cancel` fires during a batch or cooldown
    pub async fn resolve_many<T: Resolvable>(
        &self,
        references: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        let references = normalize_references(references);
        if references.is_empty() {
            return Ok(Vec::new());
        }

        let batches = partition(&references, self.config.batch_size);
        let total = batches.len();
        let mut resolved = Vec::with_capacity(references.len());

        for (index, batch) in batches.into_iter().enumerate() {
            debug!(batch = index + 1, total, size = batch.len(), kind = T::KIND, "resolving batch");

            let results = join_all(
                batch
                    .iter()
                    .map(|reference| self.resolver.resolve::<T>(reference, cancel)),
            )
            .await;

            for (reference, result) in batch.iter().zip(results) {
                match result {
                    Ok(record) if record.is_placeholder() => {
                        debug!(url = %reference, "dropping placeholder");
                    }
                    Ok(record) => resolved.push(record),
                    Err(ApiError::Interrupted) => return Err(ApiError::Interrupted),
                    Err(err) => warn!(url = %reference, error = %err, "batch member failed"),
                }
            }

            if index + 1 < total {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ApiError::Interrupted),
                    _ = tokio::time::sleep(self.config.cooldown) => {}
                }
            }
        }

        Ok(resolved)
    }
}
