pub mod gemini;
pub mod parse;

pub use gemini::*;
pub use parse::*;

use async_trait::async_trait;
use paperchef_models::{AppError, DocumentSummary, ExtractionConfig};
use std::sync::Arc;
use tracing::warn;

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Title, author and summary of a PDF. Unparseable model output yields
    /// `DocumentSummary::unparseable()`; transport failures are errors.
    async fn extract(&self, pdf: &[u8]) -> Result<DocumentSummary, AppError>;
}

/// Stands in when no API key is configured so the service can still start
/// and store uploads.
pub struct UnconfiguredExtractor;

#[async_trait]
impl DocumentExtractor for UnconfiguredExtractor {
    async fn extract(&self, _pdf: &[u8]) -> Result<DocumentSummary, AppError> {
        Err(AppError::Config {
            reason: "GEMINI_API_KEY is not set".to_string(),
        })
    }
}

pub fn extractor_from_config(
    config: &ExtractionConfig,
) -> Result<Arc<dyn DocumentExtractor>, AppError> {
    if config.api_key().is_none() {
        warn!("GEMINI_API_KEY is not set; uploads will be stored but not summarized");
        return Ok(Arc::new(UnconfiguredExtractor));
    }
    Ok(Arc::new(GeminiExtractor::new(config)?))
}
