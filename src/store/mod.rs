//! Persistence of page indexes.
//!
//! The service never touches disk itself; it loads, creates and persists whole
//! indexes through an [`IndexStore`]. Each persist replaces the stored copy in
//! one step.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::page::{IndexId, PageIndex};
use std::future::Future;

/// Backing storage for page indexes
pub trait IndexStore: Send + Sync {
    /// Load an index, or `None` when nothing is stored under `id`
    fn load(&self, id: IndexId) -> impl Future<Output = Result<Option<PageIndex>>> + Send;

    /// Allocate a new, empty index. It is not stored until persisted.
    fn create(&self) -> PageIndex {
        PageIndex::new(IndexId::new())
    }

    /// Replace the stored copy of `index`
    fn persist(&self, index: &PageIndex) -> impl Future<Output = Result<()>> + Send;
}
