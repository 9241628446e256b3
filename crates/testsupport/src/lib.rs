pub mod daemon;
pub mod fakes;
pub mod http_client;
pub mod metrics;

pub use daemon::*;
pub use fakes::*;
pub use http_client::*;
pub use metrics::*;

/// Smallest byte sequence that looks like a PDF to a human reader.
pub fn sample_pdf(label: &str) -> Vec<u8> {
    format!("%PDF-1.4\n% {label}\n%%EOF\n").into_bytes()
}
