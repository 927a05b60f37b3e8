//! Init and Config commands.

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Settings;

/// Run init command - create configuration file.
pub fn run_init(config_path: &Path, force: bool) -> Result<()> {
    let path = Settings::init_config_file(config_path, force)?;
    println!("Created configuration file at: {}", path.display());
    println!("Set plex.token and add a [path_maps.\"<Section>\"] entry per library.");
    Ok(())
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) -> Result<()> {
    let shown = toml::to_string_pretty(&config.redacted()).context("Failed to render settings")?;
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("{shown}");
    Ok(())
}
