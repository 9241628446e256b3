use crate::BlobStore;
use async_trait::async_trait;
use bytes::Bytes;
use paperchef_models::AppError;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Blobs as plain files under `root/<container>/<name>`.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn blob_path(&self, container: &str, name: &str) -> PathBuf {
        self.root.join(container).join(name)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn ensure_container(&self, container: &str) -> Result<(), AppError> {
        tokio::fs::create_dir_all(self.root.join(container))
            .await
            .map_err(AppError::storage)
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<String, AppError> {
        self.ensure_container(container).await?;
        let path = self.blob_path(container, name);
        tokio::fs::write(&path, &data)
            .await
            .map_err(AppError::storage)?;
        debug!("Wrote blob to {:?}", path);
        Ok(format!("file://{}", path.display()))
    }

    async fn get(&self, container: &str, name: &str) -> Result<Option<Bytes>, AppError> {
        match tokio::fs::read(self.blob_path(container, name)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::storage(e)),
        }
    }
}
