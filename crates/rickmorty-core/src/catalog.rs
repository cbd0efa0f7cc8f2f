//! Main loader API
//!
//! This module provides the high-level entry point. A [`Catalog`] runs
//! load cycles (fetch episodes, group them by season, resolve characters)
//! and answers queries about the data loaded so far.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::batch::{BatchConfig, BatchScheduler};
use crate::client::{ApiClient, ClientConfig, Transport};
use crate::error::Result;
use crate::events::EventSender;
use crate::loader::{CharacterLoader, LoadState, LoadSummary, LoaderConfig};
use crate::paginator::Paginator;
use crate::resolver::{Resolver, RetryPolicy};
use crate::store::{CharacterStore, SeasonMap, SeasonStore};
use crate::types::{Character, Episode};

/// List resource holding the episodes
pub const EPISODE_RESOURCE: &str = "episode";

/// Full configuration of a catalog
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// HTTP client settings
    pub client: ClientConfig,
    /// Rate-limit retry policy
    pub retry: RetryPolicy,
    /// Character batch settings
    pub batch: BatchConfig,
    /// Episode concurrency settings
    pub loader: LoaderConfig,
    /// Name of the episode list resource (default: "episode")
    pub resource: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            retry: RetryPolicy::default(),
            batch: BatchConfig::default(),
            loader: LoaderConfig::default(),
            resource: EPISODE_RESOURCE.to_string(),
        }
    }
}

/// Episodes by season plus their resolved characters
///
/// # Example
/// ```no_run
/// use rickmorty_core::{events, Catalog};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let catalog = Catalog::new()?;
///     let (sender, _rx) = events::channel();
///
///     let summary = catalog.load(&sender, &CancellationToken::new()).await;
///     println!("{} episodes stored, {} errors", summary.stored, summary.errors);
///     Ok(())
/// }
/// ```
pub struct Catalog {
    paginator: Paginator,
    loader: CharacterLoader,
    seasons: Arc<SeasonStore>,
    characters: Arc<CharacterStore>,
    resource: String,
    cycle: Mutex<()>,
}

impl Catalog {
    /// Create a catalog for the public API with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_config(CatalogConfig::default())
    }

    /// Create a catalog with custom configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_config(config: CatalogConfig) -> Result<Self> {
        let transport = Arc::new(ApiClient::with_config(&config.client)?);
        Ok(Self::with_transport(transport, config))
    }

    /// Create a catalog over a custom transport.
    ///
    /// This is useful for testing or when requests go through another client.
    pub fn with_transport(transport: Arc<dyn Transport>, config: CatalogConfig) -> Self {
        let paginator = Paginator::new(Arc::clone(&transport), config.client.clone());
        let resolver = Resolver::new(transport, config.retry);
        let scheduler = BatchScheduler::new(resolver, config.batch);
        let characters = Arc::new(CharacterStore::new());
        let loader = CharacterLoader::new(Arc::new(scheduler), Arc::clone(&characters), config.loader);

        Self {
            paginator,
            loader,
            seasons: Arc::new(SeasonStore::new()),
            characters,
            resource: config.resource,
            cycle: Mutex::new(()),
        }
    }

    /// Run one load cycle and wait for it to finish.
    ///
    /// Previous results are cleared first. If the first episode page cannot
    /// be loaded the cycle ends with a failure status and
    /// `LoadingComplete { success: false }`; otherwise seasons are published
    /// through `SeasonsReady` and characters are resolved. Concurrent calls
    /// run one after another.
    pub async fn load(&self, events: &EventSender, cancel: &CancellationToken) -> LoadSummary {
        let _cycle = self.cycle.lock().await;
        self.seasons.clear();
        self.characters.clear();

        events.status("Loading episodes...");
        let episodes: Vec<Episode> = match self.paginator.fetch_all(&self.resource, cancel).await {
            Ok(episodes) => episodes,
            Err(err) => {
                error!(error = %err, "episode list unavailable");
                events.status(format!("Failed to load episodes: {err}"));
                events.loading_complete(false, 0);
                return LoadSummary::failed();
            }
        };

        events.status(format!(
            "Fetched {} episodes. Grouping by season...",
            episodes.len()
        ));
        self.seasons.extend(&episodes);
        let seasons = self.seasons.snapshot();
        info!(seasons = seasons.len(), episodes = episodes.len(), "seasons ready");
        events.seasons_ready(seasons);

        events.status("Episodes loaded. Resolving characters...");
        self.loader.load_characters_for(&episodes, events, cancel).await
    }

    /// Run one load cycle in the background.
    pub fn spawn_load(
        self: &Arc<Self>,
        events: EventSender,
        cancel: CancellationToken,
    ) -> JoinHandle<LoadSummary> {
        let catalog = Arc::clone(self);
        tokio::spawn(async move { catalog.load(&events, &cancel).await })
    }

    /// Copy of the current season grouping
    pub fn season_episodes(&self) -> SeasonMap {
        self.seasons.snapshot()
    }

    /// Season keys in sorted order
    pub fn season_keys(&self) -> Vec<String> {
        self.seasons.keys()
    }

    /// Episodes of one season
    pub fn episodes_in_season(&self, key: &str) -> Vec<Episode> {
        self.seasons.episodes(key)
    }

    /// Characters resolved so far for an episode (empty if none yet)
    pub fn episode_characters(&self, episode_id: u32) -> Vec<Character> {
        self.characters.get(episode_id)
    }

    /// Phase of the character loader
    pub fn state(&self) -> LoadState {
        self.loader.state()
    }
}
