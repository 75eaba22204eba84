use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Identifier of a stored page index, held by the environment that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexId(Uuid);

impl IndexId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IndexId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable identity of a page, independent of its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

/// One pre-rendered snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Identity used when removing the page
    pub id: PageId,

    /// Normalized path, unique within its index
    pub path: String,

    /// Rendered HTML, stored verbatim
    pub content: String,
}

impl Page {
    pub fn new(path: String, content: String) -> Self {
        Self {
            id: PageId::new(),
            path,
            content,
        }
    }
}

/// All snapshots of one environment, in insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageIndex {
    pub id: IndexId,

    #[serde(default)]
    pub pages: Vec<Page>,
}

impl PageIndex {
    /// Create an empty index with the given identifier
    pub fn new(id: IndexId) -> Self {
        Self {
            id,
            pages: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Find the page stored under an already normalized path
    pub fn find(&self, path: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.path == path)
    }

    /// Insert or replace the content stored under a normalized path.
    ///
    /// An existing page keeps its path and identity; only the content changes.
    /// Returns `true` when a new page was appended.
    pub fn upsert(&mut self, path: &str, content: String) -> bool {
        if let Some(existing) = self.pages.iter_mut().find(|p| p.path == path) {
            existing.content = content;
            ::log::trace!("Replaced content of {}", path);
            false
        } else {
            self.pages.push(Page::new(path.to_string(), content));
            ::log::trace!("Appended page {}", path);
            true
        }
    }

    /// Remove every page whose identity is in `ids`, returning how many were removed
    pub fn remove_ids(&mut self, ids: &HashSet<PageId>) -> usize {
        let before = self.pages.len();
        self.pages.retain(|p| !ids.contains(&p.id));
        before - self.pages.len()
    }
}
