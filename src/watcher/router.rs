//! Routes filesystem events to the scheduler.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use crate::scheduler::SchedulerHandle;
use crate::types::CollectionId;

use super::collections::CollectionTable;
use super::event::{FsEvent, FsEventKind};
use super::filter::PathFilter;

/// What the router did with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A write started; the path waits for its close.
    Touched,
    /// Sections queued for a rescan.
    Queued(BTreeSet<CollectionId>),
    /// Rejected by the extension or `@eaDir` filter.
    Filtered,
    /// Allowed, but under no watch root.
    Unmatched,
    /// `CloseWrite` on a path that never saw a `Modify`.
    Ignored,
}

/// Applies the event policy:
///
/// - `Modify` records the path as touched (if it passes the filter)
/// - `CloseWrite` acts only on touched paths
/// - every other kind acts immediately
///
/// Acting means filter, match, queue every matching section, then forget the
/// path.
#[derive(Debug)]
pub struct EventRouter {
    filter: PathFilter,
    table: CollectionTable,
    /// Paths with an open write in progress.
    touched: HashSet<PathBuf>,
    scheduler: SchedulerHandle,
}

impl EventRouter {
    pub fn new(filter: PathFilter, table: CollectionTable, scheduler: SchedulerHandle) -> Self {
        Self {
            filter,
            table,
            touched: HashSet::new(),
            scheduler,
        }
    }

    pub fn table(&self) -> &CollectionTable {
        &self.table
    }

    /// Number of paths waiting for a close.
    pub fn touched_len(&self) -> usize {
        self.touched.len()
    }

    pub fn handle(&mut self, event: &FsEvent) -> RouteOutcome {
        match event.kind {
            FsEventKind::Modify => {
                if self.filter.is_allowed(&event.path, event.is_directory) {
                    crate::debug_event!("router", "touched", "{}", event.path.display());
                    self.touched.insert(event.path.clone());
                    RouteOutcome::Touched
                } else {
                    RouteOutcome::Filtered
                }
            }
            FsEventKind::CloseWrite => {
                if self.touched.contains(&event.path) {
                    self.act(event)
                } else {
                    RouteOutcome::Ignored
                }
            }
            _ => self.act(event),
        }
    }

    fn act(&mut self, event: &FsEvent) -> RouteOutcome {
        let outcome = self.route(event);
        self.touched.remove(&event.path);
        outcome
    }

    fn route(&self, event: &FsEvent) -> RouteOutcome {
        let path = &event.path;

        if !self.filter.is_allowed(path, event.is_directory) {
            crate::log_event!("router", "ignoring", "{} {}", event.kind.as_str(), path.display());
            return RouteOutcome::Filtered;
        }

        let collections = self.table.match_collections(path);
        if collections.is_empty() {
            crate::log_event!("router", "no section for", "{}", path.display());
            return RouteOutcome::Unmatched;
        }

        crate::log_event!("router", event.kind.as_str(), "{}", path.display());
        for collection in &collections {
            self.scheduler.queue_update(*collection);
        }

        RouteOutcome::Queued(collections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plex::{RefreshClient, RefreshError};
    use crate::scheduler::{SchedulerTiming, UpdateScheduler};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoopClient;

    #[async_trait]
    impl RefreshClient for NoopClient {
        async fn refresh(&self, _collection: CollectionId) -> Result<(), RefreshError> {
            Ok(())
        }
    }

    fn id(value: u32) -> CollectionId {
        CollectionId::new(value)
    }

    fn router() -> (EventRouter, SchedulerHandle) {
        let scheduler = UpdateScheduler::new(Arc::new(NoopClient), SchedulerTiming::default());
        let handle = scheduler.handle();

        let mut table = CollectionTable::new();
        table.insert("/data/movies", id(5));
        table.insert("/data", id(9));

        let router = EventRouter::new(PathFilter::new(["mkv", "mp4"]), table, handle.clone());
        (router, handle)
    }

    #[test]
    fn test_create_queues_every_match() {
        let (mut router, handle) = router();

        let outcome = router.handle(&FsEvent::file(FsEventKind::Create, "/data/movies/a.mkv"));
        assert_eq!(outcome, RouteOutcome::Queued([id(5), id(9)].into()));
        assert_eq!(handle.snapshot().pending, vec![id(5), id(9)]);
    }

    #[test]
    fn test_modify_then_close_write() {
        let (mut router, handle) = router();
        let path = "/data/movies/a.mkv";

        assert_eq!(router.handle(&FsEvent::file(FsEventKind::Modify, path)), RouteOutcome::Touched);
        assert!(handle.snapshot().pending.is_empty());
        assert_eq!(router.touched_len(), 1);

        let outcome = router.handle(&FsEvent::file(FsEventKind::CloseWrite, path));
        assert!(matches!(outcome, RouteOutcome::Queued(_)));
        assert_eq!(router.touched_len(), 0);

        // A second close without a new write does nothing
        assert_eq!(
            router.handle(&FsEvent::file(FsEventKind::CloseWrite, path)),
            RouteOutcome::Ignored
        );
    }

    #[test]
    fn test_close_write_without_modify_is_ignored() {
        let (mut router, handle) = router();

        let outcome = router.handle(&FsEvent::file(FsEventKind::CloseWrite, "/data/movies/a.mkv"));
        assert_eq!(outcome, RouteOutcome::Ignored);
        assert!(handle.snapshot().pending.is_empty());
    }

    #[test]
    fn test_rejected_modify_is_not_touched() {
        let (mut router, handle) = router();
        let path = "/data/movies/a.mkv.part";

        assert_eq!(router.handle(&FsEvent::file(FsEventKind::Modify, path)), RouteOutcome::Filtered);
        assert_eq!(router.touched_len(), 0);
        assert_eq!(
            router.handle(&FsEvent::file(FsEventKind::CloseWrite, path)),
            RouteOutcome::Ignored
        );
        assert!(handle.snapshot().pending.is_empty());
    }

    #[test]
    fn test_delete_clears_touched_path() {
        let (mut router, _handle) = router();
        let path = "/data/movies/a.mkv";

        router.handle(&FsEvent::file(FsEventKind::Modify, path));
        router.handle(&FsEvent::file(FsEventKind::Delete, path));
        assert_eq!(router.touched_len(), 0);
    }

    #[test]
    fn test_unmatched_and_filtered_paths() {
        let (mut router, handle) = router();

        assert_eq!(
            router.handle(&FsEvent::file(FsEventKind::MovedTo, "/elsewhere/a.mkv")),
            RouteOutcome::Unmatched
        );
        assert_eq!(
            router.handle(&FsEvent::file(FsEventKind::Create, "/data/movies/@eaDir/a.mkv")),
            RouteOutcome::Filtered
        );
        assert_eq!(
            router.handle(&FsEvent::file(FsEventKind::MovedFrom, "/data/movies/notes.txt")),
            RouteOutcome::Filtered
        );
        assert!(handle.snapshot().pending.is_empty());
    }

    #[test]
    fn test_directory_events_skip_extension_check() {
        let (mut router, handle) = router();

        let outcome = router.handle(&FsEvent::new(FsEventKind::Create, "/data/movies/New Film", true));
        assert!(matches!(outcome, RouteOutcome::Queued(_)));
        assert_eq!(handle.snapshot().pending.len(), 2);
    }
}
