use crate::{parse_summary, DocumentExtractor};
use async_trait::async_trait;
use base64::Engine;
use paperchef_models::{AppError, DocumentSummary, ExtractionConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, instrument};

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    InlineData { inline_data: InlineData<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Sends the PDF inline to the Gemini `generateContent` endpoint.
pub struct GeminiExtractor {
    client: Client,
    endpoint: String,
    api_key: String,
    prompt: String,
}

impl GeminiExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self, AppError> {
        let api_key = config.api_key().ok_or_else(|| AppError::Config {
            reason: "GEMINI_API_KEY is not set".to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(AppError::internal)?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: api_key.to_string(),
            prompt: config.prompt.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DocumentExtractor for GeminiExtractor {
    #[instrument(skip(self, pdf), fields(size = pdf.len()))]
    async fn extract(&self, pdf: &[u8]) -> Result<DocumentSummary, AppError> {
        let started = Instant::now();
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "application/pdf",
                            data: base64::engine::general_purpose::STANDARD.encode(pdf),
                        },
                    },
                    Part::Text { text: &self.prompt },
                ],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(AppError::upstream)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                reason: format!("Gemini returned {status}: {body}"),
            });
        }

        let body: GenerateContentResponse =
            response.json().await.map_err(AppError::upstream)?;
        let text = body.text();
        info!(
            duration_ms = started.elapsed().as_millis() as u64,
            response_chars = text.len(),
            "Gemini extraction finished"
        );
        Ok(parse_summary(&text))
    }
}
