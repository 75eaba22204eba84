//! Environment-scoped page index operations.
//!
//! Every mutating call runs load, mutate and persist while holding the lock of
//! its environment, so two writers in one environment never interleave.
//! Lookups take no lock and read whatever was last persisted.

#[cfg(test)]
mod tests;

use crate::environment::EnvironmentRegistry;
use crate::error::{Error, Result};
use crate::filter::DeleteFilter;
use crate::page::{Page, PageIndex};
use crate::path;
use crate::request::{PageInput, UpsertRequest};
use crate::store::IndexStore;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of [`PageIndexService::execute`], shaped like the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UpsertOutcome {
    Single(Page),
    Batch(Vec<Page>),
}

/// Liveness report
#[derive(Debug, Clone, Serialize)]
pub struct Ping {
    pub ok: bool,
    pub name: &'static str,
    pub version: &'static str,
}

/// Page index operations over an index store and an environment registry
pub struct PageIndexService<S, R> {
    store: S,
    registry: R,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: IndexStore, R: EnvironmentRegistry> PageIndexService<S, R> {
    pub fn new(store: S, registry: R) -> Self {
        Self {
            store,
            registry,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn ping(&self) -> Ping {
        Ping {
            ok: true,
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Store one page, returning it as stored
    pub async fn upsert(&self, environment: &str, path: &str, content: &str) -> Result<Page> {
        let key = path::normalize(path);
        let index = self
            .apply(environment, vec![(key.clone(), content.to_string())])
            .await?;

        index.find(&key).cloned().ok_or_else(|| {
            Error::InvariantViolation(format!("page {} missing right after upsert", key))
        })
    }

    /// Store a batch of pages in one persist.
    ///
    /// Later entries win when two normalize to the same path. Returns every
    /// stored page whose path appeared in the batch, once each.
    pub async fn upsert_batch(&self, environment: &str, pages: &[PageInput]) -> Result<Vec<Page>> {
        let entries: Vec<(String, String)> = pages
            .iter()
            .map(|p| (path::normalize(&p.path), p.content.clone()))
            .collect();
        let requested: HashSet<String> = entries.iter().map(|(key, _)| key.clone()).collect();

        let index = self.apply(environment, entries).await?;

        Ok(index
            .pages
            .into_iter()
            .filter(|p| requested.contains(&p.path))
            .collect())
    }

    /// Apply a decoded upsert request
    pub async fn execute(&self, environment: &str, request: UpsertRequest) -> Result<UpsertOutcome> {
        match request {
            UpsertRequest::Single(page) => self
                .upsert(environment, &page.path, &page.content)
                .await
                .map(UpsertOutcome::Single),
            UpsertRequest::Batch(pages) => self
                .upsert_batch(environment, &pages)
                .await
                .map(UpsertOutcome::Batch),
        }
    }

    /// Content stored for a path.
    ///
    /// The raw value may carry a `path=` wrapper. `NotFound` covers both a
    /// missing index and a missing page.
    pub async fn lookup(&self, environment: &str, raw_path: &str) -> Result<String> {
        let env = self.registry.resolve(environment).await?;
        let key = path::lookup_key(raw_path);

        let Some(id) = env.index else {
            ::log::debug!("Environment {} has no index yet", environment);
            return Err(Error::NotFound);
        };
        let Some(index) = self.store.load(id).await? else {
            ::log::warn!("Environment {} points at missing index {}", environment, id);
            return Err(Error::NotFound);
        };

        match index.find(&key) {
            Some(page) => {
                ::log::debug!("Lookup hit for {} in {}", key, environment);
                Ok(page.content.clone())
            }
            None => {
                ::log::debug!("Lookup miss for {} in {}", key, environment);
                Err(Error::NotFound)
            }
        }
    }

    /// Delete by exact path, or by prefix pattern when `use_pattern` is set.
    ///
    /// Returns the number of removed pages. After persisting, the stored index
    /// is read back; any page the filter still selects is reported as an
    /// `InvariantViolation`.
    pub async fn delete(&self, environment: &str, raw_path: &str, use_pattern: bool) -> Result<usize> {
        let filter = DeleteFilter::new(raw_path, use_pattern);

        let lock = self.environment_lock(environment).await?;
        let _guard = lock.lock().await;

        // re-read under the lock: another writer may have attached an index
        let env = self.registry.resolve(environment).await?;
        let Some(id) = env.index else {
            return Err(Error::NotFound);
        };
        let Some(mut index) = self.store.load(id).await? else {
            ::log::warn!("Environment {} points at missing index {}", environment, id);
            return Err(Error::NotFound);
        };

        let selected = filter.select(&index);
        if selected.is_empty() {
            ::log::debug!("Nothing matches '{}' in {}", filter.path(), environment);
            return Err(Error::NotFound);
        }

        let removed = index.remove_ids(&selected);
        self.store.persist(&index).await.inspect_err(|e| {
            ::log::error!("Failed to persist index {} after delete: {}", id, e);
        })?;

        let stored = self.store.load(id).await?.ok_or_else(|| {
            Error::InvariantViolation(format!("index {} missing after delete", id))
        })?;
        let leftover = filter.remaining(&stored);
        if !leftover.is_empty() {
            ::log::error!(
                "Delete of '{}' in {} left {} matching pages behind",
                filter.path(),
                environment,
                leftover.len()
            );
            return Err(Error::InvariantViolation(format!(
                "pages still match '{}' after delete: {:?}",
                filter.path(),
                leftover
            )));
        }

        ::log::info!(
            "Deleted {} pages matching '{}' (pattern: {}) from {}",
            removed,
            filter.path(),
            filter.is_pattern(),
            environment
        );
        Ok(removed)
    }

    /// Load (or create), apply every entry in order, persist once, and attach a
    /// newly created index to its environment.
    async fn apply(&self, environment: &str, entries: Vec<(String, String)>) -> Result<PageIndex> {
        let lock = self.environment_lock(environment).await?;
        let _guard = lock.lock().await;

        let env = self.registry.resolve(environment).await?;
        let existing = match env.index {
            Some(id) => {
                let loaded = self.store.load(id).await?;
                if loaded.is_none() {
                    ::log::warn!(
                        "Environment {} points at missing index {}, starting a new one",
                        environment,
                        id
                    );
                }
                loaded
            }
            None => None,
        };
        let created = existing.is_none();
        let mut index = existing.unwrap_or_else(|| self.store.create());

        let count = entries.len();
        let mut inserted = 0;
        for (key, content) in entries {
            if index.upsert(&key, content) {
                inserted += 1;
            }
        }

        self.store.persist(&index).await.inspect_err(|e| {
            ::log::error!("Failed to persist index {} for {}: {}", index.id, environment, e);
        })?;

        if created {
            self.registry
                .attach_index(environment, index.id)
                .await
                .map_err(|e| {
                    ::log::error!(
                        "Index {} was saved but could not be attached to {}: {}",
                        index.id,
                        environment,
                        e
                    );
                    Error::persistence(
                        format!("attaching index {} to environment {}", index.id, environment),
                        e,
                    )
                })?;
        }

        ::log::info!(
            "Upserted {} pages ({} new) into {} for {}",
            count,
            inserted,
            index.id,
            environment
        );
        Ok(index)
    }

    /// Write lock of a known environment.
    ///
    /// The name is resolved first so unknown environments never get an entry
    /// in the lock table.
    async fn environment_lock(&self, environment: &str) -> Result<Arc<Mutex<()>>> {
        self.registry.resolve(environment).await?;

        let mut locks = self.locks.lock().await;
        ::log::trace!("Acquiring write lock for {}", environment);
        Ok(Arc::clone(locks.entry(environment.to_string()).or_default()))
    }
}
