//! Filesystem events as the router sees them.
//!
//! `notify` reports a rich, platform-dependent `EventKind`; everything the
//! notifier reacts to collapses into the six kinds of [`FsEventKind`].

use std::path::PathBuf;

use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};

use super::dirs::KnownDirs;

/// Kind of change delivered by the watch backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsEventKind {
    Create,
    Delete,
    /// Content written; the file may still be open.
    Modify,
    /// A writer closed the file.
    CloseWrite,
    MovedTo,
    MovedFrom,
}

impl FsEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Delete => "DELETE",
            Self::Modify => "MODIFY",
            Self::CloseWrite => "WRITE",
            Self::MovedTo => "MOVED TO",
            Self::MovedFrom => "MOVED FROM",
        }
    }
}

/// A single change on a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub is_directory: bool,
    pub kind: FsEventKind,
}

impl FsEvent {
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>, is_directory: bool) -> Self {
        Self {
            path: path.into(),
            is_directory,
            kind,
        }
    }

    /// A file (non-directory) event.
    pub fn file(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self::new(kind, path, false)
    }

    /// Translate a `notify` event into zero or more router events.
    ///
    /// Metadata, access and unknown events are dropped. When the backend does
    /// not say whether the path is a directory, `dirs` decides: the
    /// filesystem while the path exists, the recorded set once it is gone.
    pub fn from_notify(event: &Event, dirs: &KnownDirs) -> Vec<FsEvent> {
        let each = |kind: FsEventKind, dir_hint: Option<bool>| -> Vec<FsEvent> {
            event
                .paths
                .iter()
                .map(|path| {
                    let is_directory = dir_hint.unwrap_or_else(|| dirs.is_dir(path));
                    FsEvent::new(kind, path.clone(), is_directory)
                })
                .collect()
        };

        match event.kind {
            EventKind::Create(kind) => {
                each(FsEventKind::Create, folder_hint(kind == CreateKind::Folder))
            }
            EventKind::Remove(kind) => {
                each(FsEventKind::Delete, folder_hint(kind == RemoveKind::Folder))
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                each(FsEventKind::MovedFrom, None)
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => each(FsEventKind::MovedTo, None),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                // paths = [from, to]
                let mut events = Vec::with_capacity(2);
                if let Some(to) = event.paths.get(1) {
                    let to_is_dir = dirs.is_dir(to);
                    if let Some(from) = event.paths.first() {
                        let from_is_dir = to_is_dir || dirs.contains(from);
                        events.push(FsEvent::new(FsEventKind::MovedFrom, from.clone(), from_is_dir));
                    }
                    events.push(FsEvent::new(FsEventKind::MovedTo, to.clone(), to_is_dir));
                }
                events
            }
            EventKind::Modify(ModifyKind::Name(_)) => event
                .paths
                .iter()
                .map(|path| {
                    // Backends that cannot tell the direction: whatever still
                    // exists was moved in.
                    let kind = if path.exists() {
                        FsEventKind::MovedTo
                    } else {
                        FsEventKind::MovedFrom
                    };
                    FsEvent::new(kind, path.clone(), dirs.is_dir(path))
                })
                .collect(),
            EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
            EventKind::Modify(_) => each(FsEventKind::Modify, Some(false)),
            EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
                each(FsEventKind::CloseWrite, Some(false))
            }
            _ => Vec::new(),
        }
    }
}

fn folder_hint(is_folder: bool) -> Option<bool> {
    // Only trust a positive answer; `Any` kinds say nothing.
    if is_folder { Some(true) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::DataChange;

    fn notify_event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    fn translate(event: &Event) -> Vec<FsEvent> {
        FsEvent::from_notify(event, &KnownDirs::new())
    }

    #[test]
    fn test_create_and_remove() {
        let events = translate(&notify_event(
            EventKind::Create(CreateKind::File),
            &["/missing/a.mkv"],
        ));
        assert_eq!(events, vec![FsEvent::file(FsEventKind::Create, "/missing/a.mkv")]);

        let events = translate(&notify_event(
            EventKind::Remove(RemoveKind::Folder),
            &["/missing/season 1"],
        ));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, FsEventKind::Delete);
        assert!(events[0].is_directory);
    }

    #[test]
    fn test_modify_and_close_write() {
        let events = translate(&notify_event(
            EventKind::Modify(ModifyKind::Data(DataChange::Any)),
            &["/missing/a.mkv"],
        ));
        assert_eq!(events[0].kind, FsEventKind::Modify);

        let events = translate(&notify_event(
            EventKind::Access(AccessKind::Close(AccessMode::Write)),
            &["/missing/a.mkv"],
        ));
        assert_eq!(events[0].kind, FsEventKind::CloseWrite);
    }

    #[test]
    fn test_rename_both_splits_into_two_events() {
        let events = translate(&notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/missing/old.mkv", "/missing/new.mkv"],
        ));
        assert_eq!(
            events,
            vec![
                FsEvent::file(FsEventKind::MovedFrom, "/missing/old.mkv"),
                FsEvent::file(FsEventKind::MovedTo, "/missing/new.mkv"),
            ]
        );
    }

    #[test]
    fn test_ignored_kinds() {
        let metadata = notify_event(
            EventKind::Modify(ModifyKind::Metadata(notify::event::MetadataKind::Any)),
            &["/missing/a.mkv"],
        );
        assert!(translate(&metadata).is_empty());

        let open = notify_event(
            EventKind::Access(AccessKind::Open(AccessMode::Read)),
            &["/missing/a.mkv"],
        );
        assert!(translate(&open).is_empty());
    }

    #[test]
    fn test_directory_detected_from_filesystem() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let sub = temp_dir.path().join("Season 01");
        std::fs::create_dir(&sub).unwrap();

        let event = Event::new(EventKind::Create(CreateKind::Any)).add_path(sub.clone());
        let events = translate(&event);
        assert_eq!(events, vec![FsEvent::new(FsEventKind::Create, sub, true)]);
    }

    #[test]
    fn test_vanished_directory_keeps_its_type() {
        let mut dirs = KnownDirs::new();
        dirs.insert("/missing/movies/Film (2024)");

        let moved_out = notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/missing/movies/Film (2024)"],
        );
        assert_eq!(
            FsEvent::from_notify(&moved_out, &dirs),
            vec![FsEvent::new(FsEventKind::MovedFrom, "/missing/movies/Film (2024)", true)]
        );

        let undirected = notify_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
            &["/missing/movies/Film (2024)"],
        );
        assert_eq!(
            FsEvent::from_notify(&undirected, &dirs),
            vec![FsEvent::new(FsEventKind::MovedFrom, "/missing/movies/Film (2024)", true)]
        );

        let removed = notify_event(
            EventKind::Remove(RemoveKind::Any),
            &["/missing/movies/Film (2024)"],
        );
        assert!(FsEvent::from_notify(&removed, &dirs)[0].is_directory);
    }
}
