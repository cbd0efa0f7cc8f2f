//! Data types for the Rick and Morty loader
//!
//! This module contains the records decoded from the remote API.
//! All types implement Serialize and Deserialize; unknown JSON fields are ignored
//! and text or list fields that are missing or `null` decode as empty.

use serde::{Deserialize, Deserializer, Serialize};

/// Text used for every unknown field of a placeholder record
pub const UNKNOWN: &str = "unknown";

/// Decode `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Episode of the show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Unique episode identifier
    pub id: u32,
    /// Display name of the episode
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Air date as returned by the API (e.g. "December 2, 2013")
    #[serde(default, deserialize_with = "null_as_default")]
    pub air_date: String,
    /// Episode code in format SxxExx (e.g., S01E01)
    #[serde(rename = "episode", default, deserialize_with = "null_as_default")]
    pub code: String,
    /// Absolute URLs of the characters appearing in the episode
    #[serde(default, deserialize_with = "null_as_default")]
    pub characters: Vec<String>,
}

impl Episode {
    /// One-line label, e.g. "S01E01 - Pilot (December 2, 2013)".
    pub fn label(&self) -> String {
        format!("{} - {} ({})", self.code, self.name, self.air_date)
    }
}

/// Character of the show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Unique character identifier; `0` marks a placeholder
    pub id: u32,
    /// Name of the character
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Alive / Dead / unknown
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    /// Species of the character
    #[serde(default, deserialize_with = "null_as_default")]
    pub species: String,
    /// Gender of the character
    #[serde(default, deserialize_with = "null_as_default")]
    pub gender: String,
    /// Avatar image URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    /// Absolute URLs of the episodes the character appears in
    #[serde(default, deserialize_with = "null_as_default")]
    pub episode: Vec<String>,
}

impl Character {
    /// One-line label, e.g. "Rick Sanchez - Human (Alive)".
    pub fn label(&self) -> String {
        if self.is_placeholder() {
            return format!("[error] {}", self.name);
        }
        format!("{} - {} ({})", self.name, self.species, self.status)
    }
}

/// Records that have a well-formed stand-in for a failed lookup.
pub trait Placeholder {
    /// Build a placeholder carrying `reason` as its display text.
    fn placeholder(reason: impl Into<String>) -> Self;

    /// Whether this value is a placeholder rather than a real record.
    fn is_placeholder(&self) -> bool;
}

impl Placeholder for Character {
    fn placeholder(reason: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: reason.into(),
            status: UNKNOWN.to_string(),
            species: UNKNOWN.to_string(),
            gender: UNKNOWN.to_string(),
            image: String::new(),
            episode: Vec::new(),
        }
    }

    fn is_placeholder(&self) -> bool {
        self.id == 0
    }
}

/// Pagination metadata of a list response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Total number of items across all pages
    #[serde(default)]
    pub count: u32,
    /// Total number of pages
    #[serde(default)]
    pub pages: u32,
    /// URL of the next page
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page
    #[serde(default)]
    pub prev: Option<String>,
}

/// One page of a list resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Pagination metadata
    #[serde(default)]
    pub info: PageInfo,
    /// Items on this page, in server order
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_deserialize_ignores_unknown_fields() {
        let json = r#"{
            "id": 1,
            "name": "Pilot",
            "air_date": "December 2, 2013",
            "episode": "S01E01",
            "characters": ["https://rickandmortyapi.com/api/character/1"],
            "url": "https://rickandmortyapi.com/api/episode/1",
            "created": "2017-11-10T12:56:33.798Z"
        }"#;

        let episode: Episode = serde_json::from_str(json).unwrap();
        assert_eq!(episode.id, 1);
        assert_eq!(episode.code, "S01E01");
        assert_eq!(episode.characters.len(), 1);
    }

    #[test]
    fn test_episode_missing_characters_defaults_empty() {
        let episode: Episode = serde_json::from_str(r#"{"id": 7, "name": "x"}"#).unwrap();
        assert!(episode.characters.is_empty());
        assert_eq!(episode.code, "");
    }

    #[test]
    fn test_episode_null_fields_default_empty() {
        let json = r#"{"id": 3, "name": null, "air_date": null, "episode": null, "characters": null}"#;
        let episode: Episode = serde_json::from_str(json).unwrap();
        assert_eq!(episode.id, 3);
        assert_eq!(episode.code, "");
        assert_eq!(episode.name, "");
        assert!(episode.characters.is_empty());
    }

    #[test]
    fn test_episode_label() {
        let episode = Episode {
            id: 1,
            name: "Pilot".to_string(),
            air_date: "December 2, 2013".to_string(),
            code: "S01E01".to_string(),
            characters: Vec::new(),
        };
        assert_eq!(episode.label(), "S01E01 - Pilot (December 2, 2013)");
    }

    #[test]
    fn test_character_placeholder() {
        let placeholder = Character::placeholder("Error loading character (HTTP 404)");
        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.id, 0);
        assert_eq!(placeholder.status, UNKNOWN);
        assert_eq!(placeholder.species, UNKNOWN);
        assert_eq!(placeholder.gender, UNKNOWN);
        assert_eq!(placeholder.label(), "[error] Error loading character (HTTP 404)");
    }

    #[test]
    fn test_character_label() {
        let json = r#"{"id": 1, "name": "Rick Sanchez", "status": "Alive", "species": "Human"}"#;
        let character: Character = serde_json::from_str(json).unwrap();
        assert!(!character.is_placeholder());
        assert_eq!(character.label(), "Rick Sanchez - Human (Alive)");
    }

    #[test]
    fn test_character_null_fields_still_real() {
        let json = r#"{
            "id": 42,
            "name": "Squanchy",
            "status": null,
            "species": null,
            "gender": null,
            "image": null,
            "episode": null
        }"#;
        let character: Character = serde_json::from_str(json).unwrap();
        assert!(!character.is_placeholder());
        assert_eq!(character.id, 42);
        assert_eq!(character.image, "");
        assert!(character.episode.is_empty());
    }

    #[test]
    fn test_page_deserialize() {
        let json = r#"{
            "info": {"count": 51, "pages": 3, "next": "https://x/api/episode?page=2", "prev": null},
            "results": [{"id": 1}, {"id": 2}]
        }"#;
        let page: Page<Episode> = serde_json::from_str(json).unwrap();
        assert_eq!(page.info.pages, 3);
        assert_eq!(page.info.count, 51);
        assert!(page.info.prev.is_none());
        assert_eq!(page.results.len(), 2);
    }
}
