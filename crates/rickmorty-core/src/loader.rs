//! Concurrency-limited character loading
//!
//! Every episode becomes one unit of work on the runtime. A counting
//! semaphore caps how many units resolve at the same time, independently
//! of the batch size used inside each unit. Results land in a shared
//! [`CharacterStore`]; a single completion event closes the cycle.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::batch::{normalize_references, BatchScheduler};
use crate::error::{ApiError, Result};
use crate::events::EventSender;
use crate::store::CharacterStore;
use crate::types::{Character, Episode};

/// Default number of episodes resolved at the same time
pub const DEFAULT_MAX_CONCURRENT_EPISODES: usize = 2;

/// Default pause after an episode's characters are stored (in milliseconds)
pub const DEFAULT_EPISODE_PAUSE_MS: u64 = 200;

/// Resolves the character references of one episode.
#[async_trait]
pub trait CharacterSource: Send + Sync {
    /// Resolve references to real characters; placeholders are excluded.
    async fn resolve_characters(
        &self,
        references: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Character>>;
}

#[async_trait]
impl CharacterSource for BatchScheduler {
    async fn resolve_characters(
        &self,
        references: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Character>> {
        self.resolve_many::<Character>(references, cancel).await
    }
}

/// Loader concurrency and pacing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Episodes resolved at the same time; 0 is treated as 1 (default: 2)
    pub max_concurrent_episodes: usize,
    /// Pause after storing an episode, before releasing its slot (default: 200ms)
    pub episode_pause: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_episodes: DEFAULT_MAX_CONCURRENT_EPISODES,
            episode_pause: Duration::from_millis(DEFAULT_EPISODE_PAUSE_MS),
        }
    }
}

/// Phase of the current load cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadState {
    /// No cycle started yet
    Idle,
    /// Units are being spawned
    Dispatching,
    /// Waiting for units to finish
    Aggregating,
    /// Every unit finished and the completion event was sent
    Complete,
}

/// Outcome of one load cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Episodes handed to the loader
    pub episodes: usize,
    /// Episodes with an entry in the store afterwards
    pub stored: usize,
    /// Units that failed (resolution error, panic, cancellation)
    pub errors: usize,
    /// Whether the cycle ran; errors are reported through `errors`
    pub success: bool,
}

impl LoadSummary {
    /// Summary of a cycle that could not start
    pub fn failed() -> Self {
        Self {
            episodes: 0,
            stored: 0,
            errors: 0,
            success: false,
        }
    }
}

/// Drives character resolution for a list of episodes
pub struct CharacterLoader {
    source: Arc<dyn CharacterSource>,
    store: Arc<CharacterStore>,
    config: LoaderConfig,
    state: Mutex<LoadState>,
}

/// State shared by the units of one cycle
struct Dispatch {
    source: Arc<dyn CharacterSource>,
    store: Arc<CharacterStore>,
    permits: Semaphore,
    processed: AtomicUsize,
    errors: AtomicUsize,
    events: EventSender,
    cancel: CancellationToken,
    pause: Duration,
    total: usize,
}

impl CharacterLoader {
    /// Create a loader writing into `store`.
    pub fn new(
        source: Arc<dyn CharacterSource>,
        store: Arc<CharacterStore>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
            state: Mutex::new(LoadState::Idle),
        }
    }

    /// Store the results are written to
    pub fn store(&self) -> &Arc<CharacterStore> {
        &self.store
    }

    /// Current phase
    pub fn state(&self) -> LoadState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: LoadState) {
        debug!(?state, "loader state");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Resolve the characters of every episode and wait for all of them.
    ///
    /// Each episode ends up with an entry in the store: its characters, or
    /// an empty list when it has none or its resolution failed. Failures
    /// are counted, never propagated. Emits progress statuses and exactly
    /// one `LoadingComplete` event.
    pub async fn load_characters_for(
        &self,
        episodes: &[Episode],
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> LoadSummary {
        self.set_state(LoadState::Dispatching);

        let dispatch = Arc::new(Dispatch {
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            permits: Semaphore::new(self.config.max_concurrent_episodes.max(1)),
            processed: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            events: events.clone(),
            cancel: cancel.clone(),
            pause: self.config.episode_pause,
            total: episodes.len(),
        });

        let mut units = JoinSet::new();
        for episode in episodes.iter().cloned() {
            units.spawn(run_unit(Arc::clone(&dispatch), episode));
        }

        self.set_state(LoadState::Aggregating);
        while let Some(joined) = units.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "episode unit aborted");
                dispatch.errors.fetch_add(1, Ordering::SeqCst);
            }
        }

        // Aborted units never reach their own failure handling.
        let missing = fill_missing(&self.store, episodes);
        if missing > 0 {
            warn!(missing, "stored empty entries for aborted units");
        }

        let errors = dispatch.errors.load(Ordering::SeqCst);
        let stored = episodes
            .iter()
            .filter(|e| self.store.contains(e.id))
            .count();

        if errors > 0 {
            events.status(format!(
                "Load complete: {stored} episodes stored, {errors} errors"
            ));
        } else {
            events.status(format!("Load complete: {stored} episodes stored"));
        }
        events.loading_complete(true, errors);
        self.set_state(LoadState::Complete);

        LoadSummary {
            episodes: episodes.len(),
            stored,
            errors,
            success: true,
        }
    }
}

async fn run_unit(dispatch: Arc<Dispatch>, episode: Episode) {
    let outcome = AssertUnwindSafe(resolve_episode(&dispatch, &episode))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(ApiError::TaskFailed(panic_message(&*panic))));

    if let Err(err) = outcome {
        dispatch.errors.fetch_add(1, Ordering::SeqCst);
        warn!(episode_id = episode.id, error = %err, "episode unit failed");
        if !dispatch.store.contains(episode.id) {
            dispatch.store.insert(episode.id, Vec::new());
        }
        dispatch.events.status(format!(
            "Failed to resolve characters for {}: {err}",
            episode.name
        ));
    }
}

async fn resolve_episode(dispatch: &Dispatch, episode: &Episode) -> Result<()> {
    // Held until return, on every path.
    let _permit = tokio::select! {
        biased;
        _ = dispatch.cancel.cancelled() => return Err(ApiError::Interrupted),
        permit = dispatch.permits.acquire() => permit
            .map_err(|_| ApiError::TaskFailed("episode semaphore closed".to_string()))?,
    };

    let current = dispatch.processed.fetch_add(1, Ordering::SeqCst) + 1;
    dispatch.events.status(format!(
        "Resolving characters for {} ({current}/{})",
        episode.name, dispatch.total
    ));

    if episode.characters.is_empty() {
        dispatch.store.insert(episode.id, Vec::new());
        dispatch
            .events
            .status(format!("{} has no characters", episode.name));
        return Ok(());
    }

    let references = normalize_references(&episode.characters);
    if references.is_empty() {
        dispatch.store.insert(episode.id, Vec::new());
        dispatch
            .events
            .status(format!("No valid character references for {}", episode.name));
        return Ok(());
    }

    let outcome = match dispatch
        .source
        .resolve_characters(&references, &dispatch.cancel)
        .await
    {
        Ok(characters) => {
            let count = characters.len();
            dispatch.store.insert(episode.id, characters);
            dispatch.events.status(format!(
                "Loaded {count} characters for {}",
                episode.name
            ));
            Ok(())
        }
        Err(err) => {
            dispatch.store.insert(episode.id, Vec::new());
            Err(err)
        }
    };

    // The entry is already stored; cancellation only cuts the pause short.
    tokio::select! {
        biased;
        _ = dispatch.cancel.cancelled() => {}
        _ = tokio::time::sleep(dispatch.pause) => {}
    }
    outcome
}

/// Store an empty entry for every episode that has none. Returns how many
/// entries were added.
fn fill_missing(store: &CharacterStore, episodes: &[Episode]) -> usize {
    let mut added = 0;
    for episode in episodes {
        if !store.contains(episode.id) {
            store.insert(episode.id, Vec::new());
            added += 1;
        }
    }
    added
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unit panicked".to_string())
}
