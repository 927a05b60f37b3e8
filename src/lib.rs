//! Watches media directories and triggers debounced, rate-limited Plex
//! library rescans.

pub mod cli;
pub mod config;
pub mod logging;
pub mod plex;
pub mod scheduler;
pub mod types;
pub mod watcher;

pub use config::Settings;
pub use plex::{PlexClient, RefreshClient, RefreshError};
pub use scheduler::{SchedulerHandle, SchedulerTiming, UpdateScheduler};
pub use types::{CollectionId, Section};
pub use watcher::{CollectionTable, EventRouter, FsEvent, FsEventKind, LibraryWatcher, PathFilter};
