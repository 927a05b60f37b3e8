//! Relevance filter for changed paths.
//!
//! A path is relevant when it carries an allowed media extension and does not
//! live inside a Synology `@eaDir` thumbnail directory.

use std::collections::HashSet;
use std::path::Path;

/// Synology DSM keeps generated thumbnails in `@eaDir` folders next to media.
const EXCLUDED_DIR: &str = "@eaDir";

/// Decides whether a changed path can affect a library.
#[derive(Debug, Clone)]
pub struct PathFilter {
    /// Lower-case extensions without the leading dot.
    allowed: HashSet<String>,
}

impl PathFilter {
    /// Build a filter from an extension allow-list.
    ///
    /// Entries are matched case-insensitively; a leading dot is ignored.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        Self { allowed }
    }

    /// Check whether an event on `path` should be acted upon.
    ///
    /// Directories skip the extension check. `@eaDir` only rejects when it
    /// appears after the first character of the path, so a relative path that
    /// starts with `@eaDir` is still allowed.
    pub fn is_allowed(&self, path: &Path, is_directory: bool) -> bool {
        if !is_directory {
            match extension_of(path) {
                Some(ext) if self.allowed.contains(&ext) => {}
                _ => return false,
            }
        }

        let text = path.to_string_lossy();
        if text.find(EXCLUDED_DIR).is_some_and(|index| index > 0) {
            return false;
        }

        true
    }

    /// Number of allowed extensions.
    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
}
