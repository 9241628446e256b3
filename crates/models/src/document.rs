use serde::{Deserialize, Serialize};

/// Metadata the extraction model pulls out of an uploaded PDF.
///
/// Model output is loosely shaped, so unknown keys are ignored and missing
/// keys become empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl DocumentSummary {
    /// Shown when the model answer is not valid JSON.
    pub fn unparseable() -> Self {
        Self {
            title: "Error".to_string(),
            author: "Error".to_string(),
            summary: "Could not parse AI response.".to_string(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadOutcome {
    pub blob_url: String,
    pub size_bytes: u64,
    pub summary: DocumentSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub storage: String,
    pub agent_configured: bool,
}
