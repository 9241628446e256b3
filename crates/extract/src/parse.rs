use paperchef_models::DocumentSummary;
use tracing::warn;

/// Removes markdown code fences the model likes to wrap JSON in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn parse_summary(text: &str) -> DocumentSummary {
    let cleaned = strip_code_fences(text);
    match serde_json::from_str::<DocumentSummary>(&cleaned) {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, "Model response is not a JSON summary");
            DocumentSummary::unparseable()
        }
    }
}
