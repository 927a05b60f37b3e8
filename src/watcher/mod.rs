//! Library watcher: filesystem events in, queued sections out.
//!
//! # Architecture
//!
//! ```text
//! LibraryWatcher
//!   - Single notify::RecommendedWatcher, recursive over every root
//!   - FsEvent::from_notify normalises backend events
//!   - KnownDirs remembers directories for paths that are already gone
//!         |
//!    EventRouter
//!   - PathFilter (extension allow-list, @eaDir)
//!   - CollectionTable (root -> section, fan-out)
//!   - touched set (Modify waits for CloseWrite)
//!         |
//!   SchedulerHandle::queue_update
//! ```

mod collections;
mod dirs;
mod error;
mod event;
mod filter;
mod library;
mod router;

pub use collections::{CollectionTable, Resolution};
pub use dirs::KnownDirs;
pub use error::WatchError;
pub use event::{FsEvent, FsEventKind};
pub use filter::PathFilter;
pub use library::{LibraryWatcher, LibraryWatcherBuilder};
pub use router::{EventRouter, RouteOutcome};
