//! Watch root table: which library sections own which directories.
//!
//! Built once at startup from the configured path maps and the sections the
//! server reports. A changed path fans out to every section whose root
//! contains it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::config::PathMap;
use crate::types::{CollectionId, Section};

/// Maps watch roots to library sections.
#[derive(Debug, Clone, Default)]
pub struct CollectionTable {
    /// Watch root -> section, in insertion order.
    roots: IndexMap<PathBuf, CollectionId>,
}

/// Result of resolving configured path maps against the server's sections.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub table: CollectionTable,
    /// Configured titles the server does not know.
    pub unknown_titles: Vec<String>,
}

impl CollectionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a watch root to a section. Re-binding a root replaces it.
    pub fn insert(&mut self, root: impl Into<PathBuf>, collection: CollectionId) {
        self.roots.insert(root.into(), collection);
    }

    /// Build the table by matching section titles against the path maps.
    ///
    /// Sections are visited in server order, so if the server reports two
    /// sections with the same title the later one owns the roots.
    pub fn resolve(path_maps: &IndexMap<String, PathMap>, sections: &[Section]) -> Resolution {
        let mut table = Self::new();

        for section in sections {
            if let Some(map) = path_maps.get(&section.title) {
                for path in &map.paths {
                    table.insert(path.clone(), section.key);
                }
            }
        }

        let unknown_titles = path_maps
            .keys()
            .filter(|title| !sections.iter().any(|s| &s.title == *title))
            .cloned()
            .collect();

        Resolution {
            table,
            unknown_titles,
        }
    }

    /// All sections owning a root that strictly contains `path`.
    ///
    /// Matching is component-wise: `/media/tv` matches `/media/tv/show/e01.mkv`
    /// but neither `/media/tv2/x.mkv` nor `/media/tv` itself.
    pub fn match_collections(&self, path: &Path) -> BTreeSet<CollectionId> {
        self.roots
            .iter()
            .filter(|(root, _)| is_strict_descendant(path, root))
            .map(|(_, collection)| *collection)
            .collect()
    }

    /// Root/section pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&Path, CollectionId)> {
        self.roots.iter().map(|(root, id)| (root.as_path(), *id))
    }

    /// Distinct sections referenced by the table.
    pub fn collections(&self) -> BTreeSet<CollectionId> {
        self.roots.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn is_strict_descendant(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root)
        .map(|rest| !rest.as_os_str().is_empty())
        .unwrap_or(false)
}
