//! Text and JSON rendering of events and loaded data

use rickmorty_core::{Character, Episode, LoadEvent, SeasonMap};
use serde::Serialize;

/// One episode with its characters, as printed in JSON mode
#[derive(Debug, Serialize)]
pub struct EpisodeView<'a> {
    /// Season key the episode is grouped under
    pub season: &'a str,
    /// The episode itself
    pub episode: &'a Episode,
    /// Resolved characters, sorted by id
    pub characters: Vec<Character>,
}

/// One-line text form of an event
pub fn event_line(event: &LoadEvent) -> String {
    match event {
        LoadEvent::Status { message } => format!("[status] {message}"),
        LoadEvent::SeasonsReady { seasons } => {
            let counts: Vec<String> = seasons
                .iter()
                .map(|(key, episodes)| format!("{key}: {}", episodes.len()))
                .collect();
            format!("[seasons] {}", counts.join(", "))
        }
        LoadEvent::LoadingComplete { success, errors } => {
            format!("[complete] success={success} errors={errors}")
        }
    }
}

fn selected<'a>(
    seasons: &'a SeasonMap,
    only: Option<&'a str>,
) -> impl Iterator<Item = (&'a String, &'a Vec<Episode>)> {
    seasons
        .iter()
        .filter(move |(key, _)| only.map_or(true, |wanted| key.as_str() == wanted))
}

fn sorted(mut characters: Vec<Character>) -> Vec<Character> {
    characters.sort_by_key(|c| c.id);
    characters
}

/// Indented text listing of seasons, episodes and characters.
///
/// Characters are sorted by id since resolution order is not stable.
pub fn render_text<F>(seasons: &SeasonMap, characters: F, only: Option<&str>) -> String
where
    F: Fn(u32) -> Vec<Character>,
{
    let mut out = String::new();
    for (key, episodes) in selected(seasons, only) {
        out.push_str(&format!("== {key} ({} episodes)\n", episodes.len()));
        for episode in episodes {
            out.push_str(&format!("  {}\n", episode.label()));
            let cast = sorted(characters(episode.id));
            if cast.is_empty() {
                out.push_str("      (no characters)\n");
            }
            for character in cast {
                out.push_str(&format!("      {}\n", character.label()));
            }
        }
    }
    out
}

/// One JSON line per episode
pub fn render_json<F>(
    seasons: &SeasonMap,
    characters: F,
    only: Option<&str>,
) -> serde_json::Result<Vec<String>>
where
    F: Fn(u32) -> Vec<Character>,
{
    let mut lines = Vec::new();
    for (key, episodes) in selected(seasons, only) {
        for episode in episodes {
            let view = EpisodeView {
                season: key,
                episode,
                characters: sorted(characters(episode.id)),
            };
            lines.push(serde_json::to_string(&view)?);
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rickmorty_core::store::group_by_season;
    use rickmorty_core::Placeholder;

    use super::*;

    fn episode(id: u32, code: &str) -> Episode {
        Episode {
            id,
            name: format!("Episode {id}"),
            air_date: "May 1, 2020".to_string(),
            code: code.to_string(),
            characters: Vec::new(),
        }
    }

    fn character(id: u32, name: &str) -> Character {
        Character {
            id,
            name: name.to_string(),
            status: "Alive".to_string(),
            species: "Human".to_string(),
            gender: "Male".to_string(),
            image: String::new(),
            episode: Vec::new(),
        }
    }

    fn cast(id: u32) -> Vec<Character> {
        match id {
            1 => vec![character(2, "Morty Smith"), character(1, "Rick Sanchez")],
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_event_lines() {
        let seasons = group_by_season(&[episode(1, "S01E01"), episode(2, "S02E01")]);
        assert_eq!(
            event_line(&LoadEvent::SeasonsReady { seasons }),
            "[seasons] S01: 1, S02: 1"
        );
        assert_eq!(
            event_line(&LoadEvent::Status {
                message: "Loading episodes...".to_string()
            }),
            "[status] Loading episodes..."
        );
        assert_eq!(
            event_line(&LoadEvent::LoadingComplete {
                success: true,
                errors: 2
            }),
            "[complete] success=true errors=2"
        );
    }

    #[test]
    fn test_render_text_sorts_characters() {
        let seasons = group_by_season(&[episode(1, "S01E01"), episode(2, "S01E02")]);
        let text = render_text(&seasons, cast, None);

        assert_eq!(
            text,
            "== S01 (2 episodes)\n\
             \x20 S01E01 - Episode 1 (May 1, 2020)\n\
             \x20     Rick Sanchez - Human (Alive)\n\
             \x20     Morty Smith - Human (Alive)\n\
             \x20 S01E02 - Episode 2 (May 1, 2020)\n\
             \x20     (no characters)\n"
        );
    }

    #[test]
    fn test_render_text_placeholder_label() {
        let seasons = group_by_season(&[episode(1, "S01E01")]);
        let text = render_text(&seasons, |_| vec![Character::placeholder("Error loading character")], None);
        assert!(text.contains("[error] Error loading character"));
    }

    #[test]
    fn test_render_text_single_season() {
        let seasons = group_by_season(&[episode(1, "S01E01"), episode(2, "S02E01")]);
        let text = render_text(&seasons, |_| Vec::new(), Some("S02"));
        assert!(text.starts_with("== S02 (1 episodes)"));
        assert!(!text.contains("S01E01"));
    }

    #[test]
    fn test_render_json() {
        let seasons = group_by_season(&[episode(1, "S01E01")]);
        let lines = render_json(&seasons, cast, None).unwrap();

        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["season"], "S01");
        assert_eq!(value["episode"]["episode"], "S01E01");
        assert_eq!(value["characters"][0]["name"], "Rick Sanchez");
    }

    proptest! {
        #[test]
        fn prop_every_episode_is_listed(count in 0u32..20) {
            let episodes: Vec<Episode> = (1..=count)
                .map(|id| episode(id, &format!("S0{}E{id:02}", id % 3 + 1)))
                .collect();
            let seasons = group_by_season(&episodes);

            let text = render_text(&seasons, |_| Vec::new(), None);
            for episode in &episodes {
                prop_assert!(text.contains(&episode.label()));
            }
            prop_assert_eq!(render_json(&seasons, |_| Vec::new(), None).unwrap().len(), episodes.len());
        }
    }
}
