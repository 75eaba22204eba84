use crate::error::{Error, Result};
use crate::page::IndexId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// A tenant environment and the page index it owns, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexId>,
}

impl Environment {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            index: None,
        }
    }
}

/// Resolves environments and records which index each one owns
pub trait EnvironmentRegistry: Send + Sync {
    /// Look up an environment; unknown names are `Unauthorized`
    fn resolve(&self, name: &str) -> impl Future<Output = Result<Environment>> + Send;

    /// Persist the association between an environment and its index
    fn attach_index(&self, name: &str, id: IndexId) -> impl Future<Output = Result<()>> + Send;

    /// Add an environment with no index. Registering an existing name is a no-op.
    fn register(&self, name: &str) -> impl Future<Output = Result<Environment>> + Send;
}

/// Environment registry held in memory
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    environments: RwLock<BTreeMap<String, Environment>>,
    fail_attach: AtomicBool,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `attach_index` call fail (or succeed again)
    pub fn fail_attach(&self, fail: bool) {
        self.fail_attach.store(fail, Ordering::SeqCst);
    }
}

impl EnvironmentRegistry for MemoryRegistry {
    async fn resolve(&self, name: &str) -> Result<Environment> {
        self.environments
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Unauthorized(name.to_string()))
    }

    async fn attach_index(&self, name: &str, id: IndexId) -> Result<()> {
        if self.fail_attach.load(Ordering::SeqCst) {
            return Err(Error::persistence(
                format!("attaching index {} to {}", id, name),
                "memory registry is failing writes",
            ));
        }
        let mut environments = self.environments.write().await;
        let environment = environments
            .get_mut(name)
            .ok_or_else(|| Error::Unauthorized(name.to_string()))?;
        environment.index = Some(id);
        Ok(())
    }

    async fn register(&self, name: &str) -> Result<Environment> {
        let mut environments = self.environments.write().await;
        Ok(environments
            .entry(name.to_string())
            .or_insert_with(|| Environment::new(name))
            .clone())
    }
}

/// Environment registry persisted as `<data_dir>/environments.json`
#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    guard: tokio::sync::Mutex<()>,
}

impl FileRegistry {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("environments.json"),
            guard: tokio::sync::Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Environment>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let list: Vec<Environment> = serde_json::from_slice(&bytes).map_err(|e| {
                    Error::persistence(format!("decoding {}", self.path.display()), e)
                })?;
                Ok(list.into_iter().map(|env| (env.name.clone(), env)).collect())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(Error::persistence(
                format!("reading {}", self.path.display()),
                e,
            )),
        }
    }

    async fn write_all(&self, environments: &BTreeMap<String, Environment>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::persistence(format!("creating {}", parent.display()), e))?;
        }
        let list: Vec<&Environment> = environments.values().collect();
        let json = serde_json::to_vec_pretty(&list)
            .map_err(|e| Error::persistence("encoding environments", e))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| Error::persistence(format!("writing {}", tmp.display()), e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::persistence(format!("replacing {}", self.path.display()), e))
    }
}

impl EnvironmentRegistry for FileRegistry {
    async fn resolve(&self, name: &str) -> Result<Environment> {
        self.read_all()
            .await?
            .remove(name)
            .ok_or_else(|| Error::Unauthorized(name.to_string()))
    }

    async fn attach_index(&self, name: &str, id: IndexId) -> Result<()> {
        let _guard = self.guard.lock().await;
        let mut environments = self.read_all().await?;
        let environment = environments
            .get_mut(name)
            .ok_or_else(|| Error::Unauthorized(name.to_string()))?;
        environment.index = Some(id);
        self.write_all(&environments).await?;
        ::log::info!("Environment {} now uses index {}", name, id);
        Ok(())
    }

    async fn register(&self, name: &str) -> Result<Environment> {
        let _guard = self.guard.lock().await;
        let mut environments = self.read_all().await?;
        if let Some(existing) = environments.get(name) {
            return Ok(existing.clone());
        }
        let environment = Environment::new(name);
        environments.insert(name.to_string(), environment.clone());
        self.write_all(&environments).await?;
        ::log::info!("Registered environment {}", name);
        Ok(environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_registry_unknown_is_unauthorized() {
        let registry = MemoryRegistry::new();
        let err = registry.resolve("missing").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_memory_registry_attach() {
        let registry = MemoryRegistry::new();
        registry.register("_default").await.unwrap();
        let id = IndexId::new();
        registry.attach_index("_default", id).await.unwrap();
        assert_eq!(registry.resolve("_default").await.unwrap().index, Some(id));

        // registering again keeps the association
        let again = registry.register("_default").await.unwrap();
        assert_eq!(again.index, Some(id));
    }

    #[tokio::test]
    async fn test_file_registry_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = IndexId::new();
        {
            let registry = FileRegistry::new(dir.path());
            registry.register("staging").await.unwrap();
            registry.attach_index("staging", id).await.unwrap();
        }

        let reopened = FileRegistry::new(dir.path());
        let environment = reopened.resolve("staging").await.unwrap();
        assert_eq!(environment.index, Some(id));
        assert!(matches!(
            reopened.resolve("production").await,
            Err(Error::Unauthorized(_))
        ));
    }
}
