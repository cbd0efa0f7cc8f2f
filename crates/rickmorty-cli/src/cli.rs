//! Command-line arguments

use std::time::Duration;

use clap::Parser;
use rickmorty_core::batch::{DEFAULT_BATCH_COOLDOWN_MS, DEFAULT_BATCH_SIZE};
use rickmorty_core::client::DEFAULT_BASE_URL;
use rickmorty_core::loader::{DEFAULT_EPISODE_PAUSE_MS, DEFAULT_MAX_CONCURRENT_EPISODES};
use rickmorty_core::resolver::{DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_RETRIES};
use rickmorty_core::{BatchConfig, CatalogConfig, ClientConfig, LoaderConfig, RetryPolicy};

/// Default size of the runtime worker pool
pub const DEFAULT_WORKERS: usize = 8;

/// Load every Rick and Morty episode with its characters
#[derive(Debug, Parser)]
#[command(name = "rickmorty", version, about)]
pub struct Cli {
    /// API root URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Runtime worker threads
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Episodes resolved at the same time
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_EPISODES)]
    pub max_concurrent: usize,

    /// Characters resolved concurrently per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Pause between character batches
    #[arg(long, default_value_t = DEFAULT_BATCH_COOLDOWN_MS)]
    pub batch_cooldown_ms: u64,

    /// Pause after each episode
    #[arg(long, default_value_t = DEFAULT_EPISODE_PAUSE_MS)]
    pub episode_pause_ms: u64,

    /// Retries after an HTTP 429
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// First backoff delay, doubled on each retry
    #[arg(long, default_value_t = DEFAULT_INITIAL_BACKOFF_MS)]
    pub initial_backoff_ms: u64,

    /// Whole-request timeout
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Connect timeout
    #[arg(long, default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Only print this season (e.g. S01)
    #[arg(long)]
    pub season: Option<String>,

    /// Print events and the dataset as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Catalog configuration described by the flags
    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            client: ClientConfig {
                base_url: self.base_url.clone(),
                connect_timeout_secs: self.connect_timeout_secs,
                timeout_secs: self.timeout_secs,
                ..Default::default()
            },
            retry: RetryPolicy {
                max_retries: self.max_retries,
                initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            },
            batch: BatchConfig {
                batch_size: self.batch_size,
                cooldown: Duration::from_millis(self.batch_cooldown_ms),
            },
            loader: LoaderConfig {
                max_concurrent_episodes: self.max_concurrent,
                episode_pause: Duration::from_millis(self.episode_pause_ms),
            },
            ..Default::default()
        }
    }
}
