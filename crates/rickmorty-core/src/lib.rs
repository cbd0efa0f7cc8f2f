//! Rick and Morty Loader Core Library
//!
//! This crate loads the episode/character dataset of the Rick and Morty
//! API concurrently and exposes it incrementally to a caller.
//!
//! # Features
//! - Parallel pagination of the episode list
//! - Character resolution in throttled batches with 429 backoff
//! - Per-episode fan-out under a concurrency cap, with partial-failure tolerance
//! - Progress event stream and thread-safe snapshots of the results

pub mod batch;
pub mod catalog;
pub mod client;
pub mod decode;
pub mod error;
pub mod events;
pub mod loader;
pub mod paginator;
pub mod resolver;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use batch::{BatchConfig, BatchScheduler};
pub use catalog::{Catalog, CatalogConfig};
pub use client::{ApiClient, ClientConfig, HttpResponse, Transport};
pub use error::{ApiError, Result};
pub use events::{EventSender, LoadEvent};
pub use loader::{CharacterLoader, CharacterSource, LoadState, LoadSummary, LoaderConfig};
pub use paginator::Paginator;
pub use resolver::{Resolvable, Resolver, RetryPolicy};
pub use store::{season_key, CharacterStore, SeasonMap, SeasonStore, UNKNOWN_SEASON};
pub use types::{Character, Episode, Page, PageInfo, Placeholder};
