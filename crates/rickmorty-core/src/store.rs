//! Shared result containers
//!
//! [`SeasonStore`] holds episodes grouped by season key and
//! [`CharacterStore`] holds the characters resolved per episode. Both are
//! safe for concurrent writers and readers; reads return copies.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use crate::types::{Character, Episode, Placeholder};

/// Season key used when an episode code is too short
pub const UNKNOWN_SEASON: &str = "Unknown";

/// Episodes grouped by season key, keys in sorted order
pub type SeasonMap = BTreeMap<String, Vec<Episode>>;

/// Season key of an episode code: its first three characters
/// (`"S01E03"` -> `"S01"`), or [`UNKNOWN_SEASON`] for shorter codes.
pub fn season_key(code: &str) -> String {
    let prefix: String = code.chars().take(3).collect();
    if prefix.chars().count() < 3 {
        return UNKNOWN_SEASON.to_string();
    }
    prefix
}

/// Group episodes by season key, keeping their relative order.
pub fn group_by_season<'a>(episodes: impl IntoIterator<Item = &'a Episode>) -> SeasonMap {
    let mut seasons = SeasonMap::new();
    for episode in episodes {
        seasons
            .entry(season_key(&episode.code))
            .or_default()
            .push(episode.clone());
    }
    seasons
}

/// Thread-safe season grouping
#[derive(Debug, Default)]
pub struct SeasonStore {
    seasons: RwLock<SeasonMap>,
}

impl SeasonStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append episodes to their seasons, in iteration order.
    pub fn extend<'a>(&self, episodes: impl IntoIterator<Item = &'a Episode>) {
        let grouped = group_by_season(episodes);
        let mut seasons = self.seasons.write().unwrap_or_else(PoisonError::into_inner);
        for (key, mut list) in grouped {
            seasons.entry(key).or_default().append(&mut list);
        }
    }

    /// Point-in-time copy of the grouping
    pub fn snapshot(&self) -> SeasonMap {
        self.seasons
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Season keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.seasons
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Episodes of one season (empty if the key is unknown)
    pub fn episodes(&self, key: &str) -> Vec<Episode> {
        self.seasons
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Remove every season
    pub fn clear(&self) {
        self.seasons
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Thread-safe map from episode id to its resolved characters
#[derive(Debug, Default)]
pub struct CharacterStore {
    characters: RwLock<HashMap<u32, Vec<Character>>>,
}

impl CharacterStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the characters of an episode. Placeholders are never stored.
    pub fn insert(&self, episode_id: u32, mut characters: Vec<Character>) {
        characters.retain(|c| !c.is_placeholder());
        self.characters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(episode_id, characters);
    }

    /// Characters of an episode; empty if none were stored yet.
    pub fn get(&self, episode_id: u32) -> Vec<Character> {
        self.characters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&episode_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether an entry exists for the episode
    pub fn contains(&self, episode_id: u32) -> bool {
        self.characters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&episode_id)
    }

    /// Number of episodes with an entry
    pub fn len(&self) -> usize {
        self.characters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store has no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point-in-time copy of every entry
    pub fn snapshot(&self) -> HashMap<u32, Vec<Character>> {
        self.characters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.characters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
