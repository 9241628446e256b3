use paperchef_models::{AppError, DocumentSummary, LogFormat, LoggingConfig};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub struct TracingService;

impl TracingService {
    /// `RUST_LOG` wins over the configured filter when set.
    pub fn init(config: &LoggingConfig) -> Result<(), AppError> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.filter))
            .map_err(|e| AppError::Config {
                reason: format!("invalid log filter '{}': {}", config.filter, e),
            })?;

        let registry = tracing_subscriber::registry().with(filter);
        let result = match config.format {
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .json()
                        .with_timer(fmt::time::UtcTime::rfc_3339()),
                )
                .try_init(),
            LogFormat::Pretty => registry.with(fmt::layer().with_target(false)).try_init(),
        };

        result.map_err(|e| AppError::Internal {
            reason: format!("failed to install tracing subscriber: {e}"),
        })
    }

    pub fn log_upload_received(filename: &str, size_bytes: u64, content_type: &str) {
        info!(
            filename = %filename,
            size_bytes = size_bytes,
            content_type = %content_type,
            "Upload received"
        );
    }

    pub fn log_upload_stored(filename: &str, blob_url: &str, backend: &str) {
        info!(
            filename = %filename,
            blob_url = %blob_url,
            backend = %backend,
            "Upload stored"
        );
    }

    pub fn log_document_summarized(summary: &DocumentSummary, duration_ms: u64) {
        if summary == &DocumentSummary::unparseable() {
            warn!(duration_ms = duration_ms, "Model answer could not be parsed");
        } else {
            info!(
                title = %summary.title,
                author = %summary.author,
                duration_ms = duration_ms,
                "Document summarized"
            );
        }
    }

    pub fn log_upload_failed(filename: &str, stage: &str, error: &AppError) {
        error!(
            filename = %filename,
            stage = %stage,
            error_type = %error.error_type(),
            error_message = %error,
            "Upload failed"
        );
    }

    pub fn log_chat_turn(tools_used: &[String], failed: bool, duration_ms: u64) {
        if failed {
            warn!(
                tools_used = ?tools_used,
                duration_ms = duration_ms,
                "Chat turn failed"
            );
        } else {
            info!(
                tools_used = ?tools_used,
                duration_ms = duration_ms,
                "Chat turn completed"
            );
        }
    }
}
