//! Directories known to exist under the watch roots.
//!
//! Some backends report a rename or removal without saying whether the path
//! was a directory, and by then the path is gone from disk. The set answers
//! that question from what was seen earlier.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::event::{FsEvent, FsEventKind};

/// Every directory seen under the watch roots.
#[derive(Debug, Clone, Default)]
pub struct KnownDirs {
    dirs: HashSet<PathBuf>,
}

impl KnownDirs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `root` and every directory below it.
    ///
    /// Symlinks are not followed. Unreadable entries are skipped.
    pub fn scan(&mut self, root: &Path) -> usize {
        let before = self.dirs.len();

        for entry in WalkDir::new(root).follow_links(false).into_iter() {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => {
                    self.dirs.insert(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => crate::debug_event!("dirs", "skipped", "{e}"),
            }
        }

        self.dirs.len() - before
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>) {
        self.dirs.insert(path.into());
    }

    /// Forget `path` and everything recorded below it.
    pub fn remove_tree(&mut self, path: &Path) {
        self.dirs.retain(|dir| !dir.starts_with(path));
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    /// Whether `path` is a directory: asks the filesystem while the path
    /// exists, the recorded set once it is gone.
    pub fn is_dir(&self, path: &Path) -> bool {
        if path.exists() {
            path.is_dir()
        } else {
            self.contains(path)
        }
    }

    /// Keep the set current after an event has been classified.
    pub fn observe(&mut self, event: &FsEvent) {
        if !event.is_directory {
            return;
        }

        match event.kind {
            FsEventKind::Create => self.insert(event.path.clone()),
            // Moved in with its contents
            FsEventKind::MovedTo => {
                self.scan(&event.path);
            }
            FsEventKind::Delete | FsEventKind::MovedFrom => self.remove_tree(&event.path),
            FsEventKind::Modify | FsEventKind::CloseWrite => {}
        }
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_records_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("tv/Show/Season 01")).unwrap();
        fs::write(root.join("tv/Show/Season 01/e01.mkv"), b"x").unwrap();

        let mut dirs = KnownDirs::new();
        assert_eq!(dirs.scan(root), 4);
        assert!(dirs.contains(&root.join("tv/Show/Season 01")));
        assert!(!dirs.contains(&root.join("tv/Show/Season 01/e01.mkv")));
    }

    #[test]
    fn test_vanished_path_uses_recorded_type() {
        let mut dirs = KnownDirs::new();
        dirs.insert("/missing/movies/Film (2024)");

        assert!(dirs.is_dir(Path::new("/missing/movies/Film (2024)")));
        assert!(!dirs.is_dir(Path::new("/missing/movies/film.mkv")));
    }

    #[test]
    fn test_observe_tracks_moves() {
        let mut dirs = KnownDirs::new();
        dirs.insert("/missing/movies/Film");
        dirs.insert("/missing/movies/Film/Extras");
        dirs.insert("/missing/movies/Film2");

        dirs.observe(&FsEvent::new(FsEventKind::MovedFrom, "/missing/movies/Film", true));
        assert_eq!(dirs.len(), 1);
        assert!(dirs.contains(Path::new("/missing/movies/Film2")));

        // File events never touch the set
        dirs.observe(&FsEvent::file(FsEventKind::Delete, "/missing/movies/Film2"));
        assert_eq!(dirs.len(), 1);

        dirs.observe(&FsEvent::new(FsEventKind::Create, "/missing/movies/New", true));
        assert!(dirs.contains(Path::new("/missing/movies/New")));
    }
}
