use crate::fakes::StaticExtractor;
use anyhow::Result;
use paperchef_agent::{ChatModel, CookingAgent, LazyAgent};
use paperchef_api::{start_server, AppState};
use paperchef_extract::DocumentExtractor;
use paperchef_metrics::MetricsService;
use paperchef_models::{Config, StorageBackend};
use paperchef_storage::{BlobStore, LocalBlobStore, MemoryBlobStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A paperchef server running in-process on an ephemeral port.
pub struct TestApp {
    pub base_url: String,
    pub addr: SocketAddr,
    pub config: Config,
    pub memory: Option<Arc<MemoryBlobStore>>,
    pub data_dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestApp {
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        (&mut self.handle).await??;
        Ok(())
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Default)]
pub struct ConfigOverride {
    pub max_upload_mb: Option<u64>,
    /// Store on disk under the temp dir instead of in memory.
    pub local_storage: bool,
    pub container: Option<String>,
}

pub struct TestAppBuilder {
    overrides: ConfigOverride,
    extractor: Arc<dyn DocumentExtractor>,
    chat_model: Option<Arc<dyn ChatModel>>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            overrides: ConfigOverride::default(),
            extractor: Arc::new(StaticExtractor::new(
                "Test Document",
                "Test Author",
                "A short test summary.",
            )),
            chat_model: None,
        }
    }
}

impl TestAppBuilder {
    pub fn overrides(mut self, overrides: ConfigOverride) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    pub async fn spawn(self) -> Result<TestApp> {
        let data_dir = tempfile::tempdir()?;

        let mut config = Config::default();
        config.server.bind = "127.0.0.1".to_string();
        config.server.port = 0;
        config.storage.local_dir = data_dir.path().join("blobs").to_string_lossy().to_string();
        if let Some(mb) = self.overrides.max_upload_mb {
            config.limits.max_upload_mb = mb;
        }
        if let Some(container) = self.overrides.container {
            config.storage.container = container;
        }

        let (store, memory): (Arc<dyn BlobStore>, _) = if self.overrides.local_storage {
            config.storage.backend = StorageBackend::Local;
            (Arc::new(LocalBlobStore::new(&config.storage.local_dir)), None)
        } else {
            config.storage.backend = StorageBackend::Memory;
            let memory = Arc::new(MemoryBlobStore::new());
            (memory.clone() as Arc<dyn BlobStore>, Some(memory))
        };
        store.ensure_container(&config.storage.container).await?;

        let agent = match self.chat_model {
            Some(model) => LazyAgent::ready(Arc::new(CookingAgent::with_model(
                model,
                config.agent.max_tool_rounds,
            ))),
            None => LazyAgent::new(config.agent.clone()),
        };

        let state = AppState::new(
            config.clone(),
            store,
            self.extractor,
            Arc::new(agent),
            Arc::new(MetricsService::new()?),
        );

        let listener = TcpListener::bind((config.server.bind.as_str(), 0)).await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(start_server(state, listener, async move {
            let _ = rx.await;
        }));

        Ok(TestApp {
            base_url: format!("http://{addr}"),
            addr,
            config,
            memory,
            data_dir,
            shutdown: Some(tx),
            handle,
        })
    }
}

pub async fn spawn_app() -> Result<TestApp> {
    TestAppBuilder::default().spawn().await
}
