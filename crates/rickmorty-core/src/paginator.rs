//! Parallel pagination of list resources
//!
//! Page 1 is fetched first to learn the page count; the remaining pages
//! are fetched concurrently and reassembled in ascending page order.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ClientConfig, Transport};
use crate::decode::decode;
use crate::error::{ApiError, Result};
use crate::types::Page;

/// Fetches every page of a list resource
#[derive(Clone)]
pub struct Paginator {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl Paginator {
    /// Create a paginator over `transport`, building URLs from `config`.
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    /// Fetch all items of a list resource.
    ///
    /// # Arguments
    /// * `resource` - Resource name relative to the base URL (e.g. "episode")
    /// * `cancel` - Aborts outstanding requests when cancelled
    ///
    /// # Returns
    /// Items of every page that could be fetched, page 1 first.
    /// Pages after the first that fail are logged and skipped.
    ///
    /// # Errors
    /// - `ApiError::Status` / `ApiError::Transport` / `ApiError::Decode` if page 1 fails
    /// - `ApiError::Interrupted` if cancelled
    pub async fn fetch_all<T>(&self, resource: &str, cancel: &CancellationToken) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let first: Page<T> = fetch_page(&*self.transport, &self.config, resource, 1, cancel).await?;
        let pages = first.info.pages;
        let mut items = first.results;

        if pages <= 1 {
            debug!(resource, count = items.len(), "single page");
            return Ok(items);
        }

        info!(resource, pages, "fetching remaining pages");

        let mut tasks = JoinSet::new();
        for page in 2..=pages {
            let transport = Arc::clone(&self.transport);
            let config = self.config.clone();
            let resource = resource.to_string();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let result: Result<Page<T>> =
                    fetch_page(&*transport, &config, &resource, page, &cancel).await;
                (page, result)
            });
        }

        // Completion order is arbitrary; key by page number.
        let mut fetched = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((page, Ok(body))) => {
                    fetched.insert(page, body.results);
                }
                Ok((_, Err(ApiError::Interrupted))) => return Err(ApiError::Interrupted),
                Ok((page, Err(err))) => {
                    warn!(resource, page, error = %err, "skipping page");
                }
                Err(err) => {
                    warn!(resource, error = %err, "page task failed");
                }
            }
        }

        for (_, results) in fetched {
            items.extend(results);
        }
        debug!(resource, count = items.len(), "pagination complete");
        Ok(items)
    }
}

async fn fetch_page<T: DeserializeOwned>(
    transport: &dyn Transport,
    config: &ClientConfig,
    resource: &str,
    page: u32,
    cancel: &CancellationToken,
) -> Result<Page<T>> {
    let url = config.list_url(resource, page);
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ApiError::Interrupted),
        response = transport.get(&url) => response?,
    };

    if !response.is_success() {
        return Err(ApiError::status(response.status, url, &response.body));
    }
    decode(&response.body, &format!("{resource} page {page}"))
}
