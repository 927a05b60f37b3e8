//! Recursive watcher over every library root.

use std::path::Path;

use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::default_allowed_extensions;
use crate::scheduler::SchedulerHandle;

use super::collections::CollectionTable;
use super::dirs::KnownDirs;
use super::error::WatchError;
use super::event::FsEvent;
use super::filter::PathFilter;
use super::router::EventRouter;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Watches all roots of a [`CollectionTable`] and feeds the router.
///
/// One `notify::RecommendedWatcher` covers every root recursively, so
/// directories created later are picked up without re-registering.
pub struct LibraryWatcher {
    router: EventRouter,
    /// Directories under the roots, for events on paths that are gone.
    dirs: KnownDirs,
    /// Channel for receiving file events.
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    /// Kept alive for as long as events are wanted.
    _watcher: notify::RecommendedWatcher,
}

impl LibraryWatcher {
    /// Create a builder for configuring the watcher.
    pub fn builder() -> LibraryWatcherBuilder {
        LibraryWatcherBuilder::new()
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    /// Route events until `cancel` fires.
    ///
    /// Returns an error only if the backend goes away.
    pub async fn watch(mut self, cancel: CancellationToken) -> Result<(), WatchError> {
        crate::log_event!("watcher", "started", "{} roots", self.router.table().len());

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                res = self.event_rx.recv() => match res {
                    Some(Ok(event)) => self.handle_event(&event),
                    Some(Err(e)) => tracing::error!("[watcher] file watch error: {e}"),
                    None => return Err(WatchError::ChannelClosed),
                },
            }
        }

        crate::log_event!("watcher", "stopped");
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) {
        for fs_event in FsEvent::from_notify(event, &self.dirs) {
            self.dirs.observe(&fs_event);
            self.router.handle(&fs_event);
        }
    }
}

/// Builder for constructing a [`LibraryWatcher`].
pub struct LibraryWatcherBuilder {
    filter: Option<PathFilter>,
    table: CollectionTable,
    scheduler: Option<SchedulerHandle>,
}

impl LibraryWatcherBuilder {
    pub fn new() -> Self {
        Self {
            filter: None,
            table: CollectionTable::new(),
            scheduler: None,
        }
    }

    /// Set the path filter. Defaults to the stock media extensions.
    pub fn filter(mut self, filter: PathFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the watch root table.
    pub fn table(mut self, table: CollectionTable) -> Self {
        self.table = table;
        self
    }

    /// Set the scheduler that receives queued sections.
    pub fn scheduler(mut self, scheduler: SchedulerHandle) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Build the watcher and register every root.
    ///
    /// Fails if the table is empty or any root cannot be watched.
    pub fn build(self) -> Result<LibraryWatcher, WatchError> {
        let scheduler = self.scheduler.ok_or_else(|| WatchError::InitFailed {
            reason: "Scheduler is required".to_string(),
        })?;

        if self.table.is_empty() {
            return Err(WatchError::NoRoots);
        }

        let filter = self
            .filter
            .unwrap_or_else(|| PathFilter::new(default_allowed_extensions()));

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        let mut dirs = KnownDirs::new();
        for (root, collection) in self.table.entries() {
            watch_root(&mut watcher, root)?;
            let found = dirs.scan(root);
            crate::log_event!(
                "watcher",
                "watching",
                "{} (section {collection}, {found} directories)",
                root.display()
            );
        }

        Ok(LibraryWatcher {
            router: EventRouter::new(filter, self.table, scheduler),
            dirs,
            event_rx: rx,
            _watcher: watcher,
        })
    }
}

impl Default for LibraryWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn watch_root(watcher: &mut notify::RecommendedWatcher, root: &Path) -> Result<(), WatchError> {
    if !root.is_dir() {
        return Err(WatchError::PathWatchFailed {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| WatchError::PathWatchFailed {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plex::{RefreshClient, RefreshError};
    use crate::scheduler::{SchedulerTiming, UpdateScheduler};
    use crate::types::CollectionId;
    use async_trait::async_trait;
    use notify::EventKind;
    use notify::event::{ModifyKind, RenameMode};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct NoopClient;

    #[async_trait]
    impl RefreshClient for NoopClient {
        async fn refresh(&self, _collection: CollectionId) -> Result<(), RefreshError> {
            Ok(())
        }
    }

    fn handle() -> SchedulerHandle {
        UpdateScheduler::new(Arc::new(NoopClient), SchedulerTiming::default()).handle()
    }

    #[tokio::test]
    async fn test_empty_table_is_rejected() {
        let result = LibraryWatcher::builder().scheduler(handle()).build();
        assert!(matches!(result, Err(WatchError::NoRoots)));
    }

    #[tokio::test]
    async fn test_scheduler_is_required() {
        let temp_dir = TempDir::new().unwrap();
        let mut table = CollectionTable::new();
        table.insert(temp_dir.path(), CollectionId::new(1));

        let result = LibraryWatcher::builder().table(table).build();
        assert!(matches!(result, Err(WatchError::InitFailed { .. })));
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("not-there");
        let mut table = CollectionTable::new();
        table.insert(&missing, CollectionId::new(1));

        let result = LibraryWatcher::builder().table(table).scheduler(handle()).build();
        match result {
            Err(WatchError::PathWatchFailed { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected PathWatchFailed, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_watch_stops_on_cancel() {
        let temp_dir = TempDir::new().unwrap();
        let mut table = CollectionTable::new();
        table.insert(temp_dir.path(), CollectionId::new(1));

        let watcher = LibraryWatcher::builder()
            .table(table)
            .scheduler(handle())
            .build()
            .unwrap();
        assert_eq!(watcher.router().table().len(), 1);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(watcher.watch(cancel.clone()));
        cancel.cancel();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_directory_moved_out_queues_section() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("movies");
        let film = root.join("Film (2024)");
        fs::create_dir_all(&film).unwrap();

        let mut table = CollectionTable::new();
        table.insert(&root, CollectionId::new(5));
        let scheduler = handle();

        let mut watcher = LibraryWatcher::builder()
            .filter(PathFilter::new(["mkv"]))
            .table(table)
            .scheduler(scheduler.clone())
            .build()
            .unwrap();

        fs::rename(&film, temp_dir.path().join("Film (2024)")).unwrap();

        let moved_out = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path(film.clone());
        watcher.handle_event(&moved_out);

        assert_eq!(scheduler.snapshot().pending, vec![CollectionId::new(5)]);
        assert!(!watcher.dirs.contains(&film));
    }
}
