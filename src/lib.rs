pub mod config;
pub mod environment;
pub mod error;
pub mod filter;
pub mod page;
pub mod path;
pub mod request;
pub mod service;
pub mod store;

// Re-export commonly used types for convenience
pub use environment::{Environment, EnvironmentRegistry, FileRegistry, MemoryRegistry};
pub use error::{Error, Result};
pub use page::{IndexId, Page, PageId, PageIndex};
pub use request::{DeleteRequest, PageInput, UpsertRequest};
pub use service::{PageIndexService, UpsertOutcome};
pub use store::{FileStore, IndexStore, MemoryStore};

use config::IndexConfig;

/// Page index service backed by the data directory of `config`.
///
/// Every environment listed in the configuration is registered before the
/// service is returned.
pub async fn open(config: &IndexConfig) -> Result<PageIndexService<FileStore, FileRegistry>> {
    ::log::info!("Opening page index at {}", config.data_dir.display());

    let registry = FileRegistry::new(&config.data_dir);
    for name in &config.environments {
        registry.register(name).await?;
    }

    Ok(PageIndexService::new(
        FileStore::new(&config.data_dir),
        registry,
    ))
}
