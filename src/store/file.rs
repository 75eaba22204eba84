use crate::error::{Error, Result};
use crate::page::{IndexId, PageIndex};
use crate::store::IndexStore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Index store keeping one JSON document per index on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `<data_dir>/indexes` as the storage directory
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: data_dir.as_ref().join("indexes"),
        }
    }

    fn index_path(&self, id: IndexId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl IndexStore for FileStore {
    async fn load(&self, id: IndexId) -> Result<Option<PageIndex>> {
        let path = self.index_path(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                ::log::debug!("No stored index at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(Error::persistence(format!("reading {}", path.display()), e)),
        };

        let index = serde_json::from_slice(&bytes)
            .map_err(|e| Error::persistence(format!("decoding {}", path.display()), e))?;
        Ok(Some(index))
    }

    async fn persist(&self, index: &PageIndex) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::persistence(format!("creating {}", self.dir.display()), e))?;

        let path = self.index_path(index.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec(index)
            .map_err(|e| Error::persistence(format!("encoding index {}", index.id), e))?;

        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| Error::persistence(format!("writing {}", tmp.display()), e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::persistence(format!("replacing {}", path.display()), e))?;

        ::log::debug!(
            "Persisted index {} with {} pages to {}",
            index.id,
            index.len(),
            path.display()
        );
        Ok(())
    }
}
