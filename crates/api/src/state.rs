use paperchef_agent::LazyAgent;
use paperchef_extract::DocumentExtractor;
use paperchef_metrics::MetricsService;
use paperchef_models::Config;
use paperchef_storage::BlobStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn BlobStore>,
    pub extractor: Arc<dyn DocumentExtractor>,
    pub agent: Arc<LazyAgent>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn BlobStore>,
        extractor: Arc<dyn DocumentExtractor>,
        agent: Arc<LazyAgent>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            config,
            store,
            extractor,
            agent,
            metrics,
        }
    }
}
