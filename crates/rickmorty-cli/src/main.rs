//! Main entry point for the rickmorty CLI

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use rickmorty_cli::render::{event_line, render_json, render_text};
use rickmorty_cli::Cli;
use rickmorty_core::{events, Catalog};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing on stderr, JSON formatted when LOG_FORMAT=json
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rickmorty_core=info,rickmorty_cli=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cli.workers.max(1))
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let catalog = Arc::new(
        Catalog::with_config(cli.catalog_config()).context("failed to create HTTP client")?,
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl+C received - cancelling load");
                cancel.cancel();
            }
        }
    });

    let (sender, mut rx) = events::channel();
    let handle = catalog.spawn_load(sender, cancel);

    // Ends once the load task drops its sender.
    while let Some(event) = rx.recv().await {
        if cli.json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!("{}", event_line(&event));
        }
    }

    let summary = handle.await.context("load task failed")?;
    if !summary.success {
        bail!("episode list could not be loaded");
    }
    info!(
        episodes = summary.episodes,
        errors = summary.errors,
        "dataset loaded"
    );

    let seasons = catalog.season_episodes();
    let only = cli.season.as_deref();
    if cli.json {
        for line in render_json(&seasons, |id| catalog.episode_characters(id), only)? {
            println!("{line}");
        }
    } else {
        print!(
            "{}",
            render_text(&seasons, |id| catalog.episode_characters(id), only)
        );
    }
    Ok(())
}
