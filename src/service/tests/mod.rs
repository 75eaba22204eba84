
use crate::environment::{EnvironmentRegistry, MemoryRegistry};
use crate::service::PageIndexService;
use crate::store::MemoryStore;

pub(super) const TEST_HTML: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>test</title></head><body>some content</body></html>";

pub(super) const ENV: &str = "_default";

/// Service over in-memory collaborators with the default environment registered
pub(super) async fn memory_service() -> PageIndexService<MemoryStore, MemoryRegistry> {
    let registry = MemoryRegistry::new();
    registry.register(ENV).await.unwrap();
    PageIndexService::new(MemoryStore::new(), registry)
}

#[tokio::test]
async fn test_ping() {
    let service = memory_service().await;
    let ping = service.ping();
    assert!(ping.ok);
    assert_eq!(ping.name, "fragment-index");
}
