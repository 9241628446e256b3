pub mod azure;
pub mod local;
pub mod memory;
pub mod name;

pub use azure::*;
pub use local::*;
pub use memory::*;
pub use name::*;

use async_trait::async_trait;
use bytes::Bytes;
use paperchef_models::{AppError, StorageBackend, StorageConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Flat container/name blob storage. `put` always overwrites.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn kind(&self) -> &'static str;

    async fn ensure_container(&self, container: &str) -> Result<(), AppError>;

    /// Stores `data` and returns a URL identifying the blob.
    async fn put(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, AppError>;

    async fn get(&self, container: &str, name: &str) -> Result<Option<Bytes>, AppError>;
}

pub fn store_from_config(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, AppError> {
    let store: Arc<dyn BlobStore> = match config.resolved_backend() {
        StorageBackend::Azure => {
            let conn = config.connection_string().ok_or_else(|| AppError::Config {
                reason: "AZURE_STORAGE_CONN is required for the azure storage backend".to_string(),
            })?;
            let store = AzureBlobStore::from_connection_string(
                conn,
                Duration::from_millis(config.timeout_ms),
            )?;
            info!(account = %store.account(), "Using Azure blob storage");
            Arc::new(store)
        }
        StorageBackend::Local | StorageBackend::Auto => {
            info!(dir = %config.local_dir, "Using local blob storage");
            Arc::new(LocalBlobStore::new(&config.local_dir))
        }
        StorageBackend::Memory => Arc::new(MemoryBlobStore::new()),
    };
    Ok(store)
}
