use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use plex_notifier::Settings;
use plex_notifier::cli::commands::{init, sections, watch};
use plex_notifier::cli::{Cli, Commands};
use plex_notifier::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        config,
        log,
        command,
    } = cli;

    match command {
        Commands::Init { force } => {
            let path = config.unwrap_or_else(Settings::default_config_path);
            init::run_init(&path, force)
        }
        Commands::Config => {
            let settings = load_settings(config.as_deref(), log.as_deref())?;
            init::run_config(&settings)
        }
        Commands::Sections { insecure, json } => {
            let settings = load_settings(config.as_deref(), log.as_deref())?;
            sections::run(sections::SectionsArgs { insecure, json }, settings).await
        }
        Commands::Watch { insecure, pidfile } => {
            let settings = load_settings(config.as_deref(), log.as_deref())?;
            watch::run(watch::WatchArgs { insecure, pidfile }, settings).await
        }
    }
}

/// Load settings and start logging with them.
fn load_settings(config: Option<&Path>, log: Option<&Path>) -> Result<Settings> {
    let settings = Settings::load(config)?;

    logging::init_with_config(&settings.logging, log).with_context(|| match log {
        Some(path) => format!("Failed to open log file {}", path.display()),
        None => "Failed to initialize logging".to_string(),
    })?;

    Ok(settings)
}
