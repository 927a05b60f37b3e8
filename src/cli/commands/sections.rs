//! Sections command - show what the server reports and what will be watched.

use anyhow::{Context, Result, bail};

use crate::config::{ConfigError, Settings};
use crate::plex::PlexClient;
use crate::types::Section;
use crate::watcher::{CollectionTable, Resolution};

/// Arguments for the sections command.
pub struct SectionsArgs {
    pub insecure: bool,
    pub json: bool,
}

pub async fn run(args: SectionsArgs, mut settings: Settings) -> Result<()> {
    if args.insecure {
        settings.plex.insecure = true;
    }
    if settings.plex.token.trim().is_empty() {
        return Err(ConfigError::MissingToken.into());
    }

    let client = PlexClient::new(&settings.plex).context("Failed to build HTTP client")?;
    let sections = fetch_sections(&client).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    println!("Sections on {}:", client.base_url());
    for section in &sections {
        println!("  {:>4}  {}", section.key, section.title);
    }

    if settings.path_maps.is_empty() {
        println!("\nNo path maps configured.");
        return Ok(());
    }

    let Resolution {
        table,
        unknown_titles,
    } = CollectionTable::resolve(&settings.path_maps, &sections);

    println!("\nWatch table:");
    for (root, collection) in table.entries() {
        println!("  {collection:>4}  {}", root.display());
    }
    for title in &unknown_titles {
        println!("  (no section named '{title}')");
    }

    Ok(())
}

/// List sections, naming the server in the error.
pub(crate) async fn fetch_sections(client: &PlexClient) -> Result<Vec<Section>> {
    client
        .sections()
        .await
        .with_context(|| format!("Failed to list library sections from {}", client.base_url()))
}

/// Build the watch table, warning about titles the server does not know.
///
/// An empty table is an error: there would be nothing to watch.
pub(crate) fn resolve_table(settings: &Settings, sections: &[Section]) -> Result<CollectionTable> {
    let Resolution {
        table,
        unknown_titles,
    } = CollectionTable::resolve(&settings.path_maps, sections);

    for title in unknown_titles {
        tracing::warn!("[sections] server has no section named '{title}'; its paths are not watched");
    }

    if table.is_empty() {
        bail!("None of the configured path maps matches a library section on the server");
    }

    Ok(table)
}
