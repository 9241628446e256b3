use paperchef_models::AppError;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};
use tracing::{debug, instrument};

fn internal(e: prometheus::Error) -> AppError {
    AppError::Internal {
        reason: e.to_string(),
    }
}

pub struct MetricsService {
    registry: Registry,
    uploads_total: Counter,
    upload_failures_total: CounterVec,
    extraction_fallbacks_total: Counter,
    chat_requests_total: Counter,
    chat_failures_total: Counter,
    tool_calls_total: CounterVec,
    upload_size_bytes: Histogram,
    extraction_duration_ms: Histogram,
}

impl MetricsService {
    pub fn new() -> Result<Self, AppError> {
        let registry = Registry::new();

        let uploads_total = Counter::new(
            "paperchef_uploads_total",
            "Total number of accepted PDF uploads",
        )
        .map_err(internal)?;

        let upload_failures_total = CounterVec::new(
            Opts::new(
                "paperchef_upload_failures_total",
                "Total number of failed uploads by stage",
            ),
            &["stage"],
        )
        .map_err(internal)?;

        let extraction_fallbacks_total = Counter::new(
            "paperchef_extraction_fallbacks_total",
            "Total number of model answers that could not be parsed",
        )
        .map_err(internal)?;

        let chat_requests_total = Counter::new(
            "paperchef_chat_requests_total",
            "Total number of cooking agent turns",
        )
        .map_err(internal)?;

        let chat_failures_total = Counter::new(
            "paperchef_chat_failures_total",
            "Total number of cooking agent turns that failed",
        )
        .map_err(internal)?;

        let tool_calls_total = CounterVec::new(
            Opts::new("paperchef_tool_calls_total", "Total number of agent tool calls"),
            &["tool"],
        )
        .map_err(internal)?;

        let upload_size_bytes = Histogram::with_opts(
            HistogramOpts::new("paperchef_upload_size_bytes", "Size of uploaded PDFs in bytes")
                .buckets(exponential_buckets(16.0 * 1024.0, 4.0, 7).map_err(internal)?),
        )
        .map_err(internal)?;

        let extraction_duration_ms = Histogram::with_opts(
            HistogramOpts::new(
                "paperchef_extraction_duration_ms",
                "Document extraction duration in milliseconds",
            )
            .buckets(exponential_buckets(100.0, 2.0, 10).map_err(internal)?),
        )
        .map_err(internal)?;

        registry
            .register(Box::new(uploads_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(upload_failures_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(extraction_fallbacks_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(chat_requests_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(chat_failures_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(tool_calls_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(upload_size_bytes.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(extraction_duration_ms.clone()))
            .map_err(internal)?;

        Ok(Self {
            registry,
            uploads_total,
            upload_failures_total,
            extraction_fallbacks_total,
            chat_requests_total,
            chat_failures_total,
            tool_calls_total,
            upload_size_bytes,
            extraction_duration_ms,
        })
    }

    #[instrument(skip(self))]
    pub fn record_upload(&self, filename: &str, size_bytes: u64) {
        self.uploads_total.inc();
        self.upload_size_bytes.observe(size_bytes as f64);
        debug!("Recorded upload of {} ({} bytes)", filename, size_bytes);
    }

    /// `stage` is one of `request`, `storage`, `extraction`.
    #[instrument(skip(self))]
    pub fn record_upload_failure(&self, stage: &str) {
        self.upload_failures_total.with_label_values(&[stage]).inc();
    }

    pub fn record_extraction(&self, duration_ms: f64, fell_back: bool) {
        self.extraction_duration_ms.observe(duration_ms);
        if fell_back {
            self.extraction_fallbacks_total.inc();
        }
    }

    pub fn record_chat(&self, tools_used: &[String], failed: bool) {
        self.chat_requests_total.inc();
        if failed {
            self.chat_failures_total.inc();
        }
        for tool in tools_used {
            self.tool_calls_total.with_label_values(&[tool]).inc();
        }
    }

    pub fn render(&self) -> Result<String, AppError> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(internal)?;

        String::from_utf8(buffer).map_err(|e| AppError::Internal {
            reason: e.to_string(),
        })
    }
}
