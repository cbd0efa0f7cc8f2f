//! Progress events streamed to the caller during a load cycle

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

use crate::store::SeasonMap;

/// Event emitted while a load cycle runs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LoadEvent {
    /// Free-form progress text, emitted repeatedly
    Status {
        /// Human-readable status line
        message: String,
    },
    /// Episodes fetched and grouped; emitted once per successful cycle
    SeasonsReady {
        /// Full season grouping
        seasons: SeasonMap,
    },
    /// Terminal event; emitted exactly once per cycle
    LoadingComplete {
        /// `false` only when the episode list itself could not be loaded
        success: bool,
        /// Number of episode units that failed
        errors: usize,
    },
}

/// Sending half of an event subscription.
///
/// Sending never blocks and never fails: events to a dropped receiver are
/// discarded.
#[derive(Debug, Clone, Default)]
pub struct EventSender {
    tx: Option<mpsc::UnboundedSender<LoadEvent>>,
}

impl EventSender {
    /// Wrap an existing channel sender
    pub fn new(tx: mpsc::UnboundedSender<LoadEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sender without subscriber; events are only logged
    pub fn discard() -> Self {
        Self { tx: None }
    }

    /// Log and emit a status line
    pub fn status(&self, message: impl Into<String>) {
        let message = message.into();
        info!(status = %message);
        self.send(LoadEvent::Status { message });
    }

    /// Emit the season grouping
    pub fn seasons_ready(&self, seasons: SeasonMap) {
        self.send(LoadEvent::SeasonsReady { seasons });
    }

    /// Emit the terminal event
    pub fn loading_complete(&self, success: bool, errors: usize) {
        self.send(LoadEvent::LoadingComplete { success, errors });
    }

    fn send(&self, event: LoadEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

/// Create a connected event sender / receiver pair
pub fn channel() -> (EventSender, mpsc::UnboundedReceiver<LoadEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender::new(tx), rx)
}
