//! Loads the first season against the public API and prints it.
//!
//! Run with `cargo run -p rickmorty-core --example live_load`.

use std::sync::Arc;

use rickmorty_core::events::channel;
use rickmorty_core::{Catalog, LoadEvent};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Arc::new(Catalog::new()?);
    let (events, mut rx) = channel();

    let handle = catalog.spawn_load(events, CancellationToken::new());

    while let Some(event) = rx.recv().await {
        match event {
            LoadEvent::Status { message } => println!("... {message}"),
            LoadEvent::SeasonsReady { seasons } => {
                println!("\nSeasons ({}):", seasons.len());
                for (key, episodes) in &seasons {
                    println!("  {key} - {} episodes", episodes.len());
                }
                println!();
            }
            LoadEvent::LoadingComplete { success, errors } => {
                println!("\nDone (success: {success}, errors: {errors})");
            }
        }
    }

    let summary = handle.await?;
    println!("Stored characters for {} episodes.\n", summary.stored);

    for episode in catalog.episodes_in_season("S01") {
        println!("{}", episode.label());
        for character in catalog.episode_characters(episode.id) {
            println!("    {}", character.label());
        }
    }

    Ok(())
}
