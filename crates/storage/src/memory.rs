use crate::BlobStore;
use async_trait::async_trait;
use bytes::Bytes;
use paperchef_models::AppError;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<(String, String), StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn blob(&self, container: &str, name: &str) -> Option<StoredBlob> {
        self.blobs
            .read()
            .await
            .get(&(container.to_string(), name.to_string()))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn ensure_container(&self, _container: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn put(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, AppError> {
        self.blobs.write().await.insert(
            (container.to_string(), name.to_string()),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("memory://{container}/{name}"))
    }

    async fn get(&self, container: &str, name: &str) -> Result<Option<Bytes>, AppError> {
        Ok(self.blob(container, name).await.map(|blob| blob.data))
    }
}
