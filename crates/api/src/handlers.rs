use crate::page::{render_page, PageView};
use crate::{embedded_file_response, AppState};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
};
use bytes::{Bytes, BytesMut};
use paperchef_metrics::TracingService;
use paperchef_models::{
    AppError, ChatHistory, ChatReply, ChatRequest, DocumentSummary, ErrorShape, HealthStatus,
    UploadOutcome,
};
use paperchef_storage::sanitize_blob_name;
use std::time::Instant;
use tracing::{error, info, instrument};

pub const UPLOAD_FIELD: &str = "file";
const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

type ApiError = (StatusCode, Json<ErrorShape>);

fn status_of(e: &AppError) -> StatusCode {
    StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn api_error(e: AppError) -> ApiError {
    (status_of(&e), Json(e.to_error_shape()))
}

fn multipart_error(e: MultipartError, max_size: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge {
            size: max_size as u64 + 1,
            max_size: max_size as u64,
        }
    } else {
        AppError::invalid(e.body_text())
    }
}

struct ReceivedFile {
    name: String,
    content_type: String,
    data: Bytes,
}

/// Pulls the `file` field out of the form, enforcing the size limit while
/// streaming. Other fields are ignored.
async fn read_upload(multipart: &mut Multipart, max_size: usize) -> Result<ReceivedFile, AppError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let raw_name = field.file_name().unwrap_or_default().to_string();
        let name = sanitize_blob_name(&raw_name)?;
        let content_type = field
            .content_type()
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let mut data = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, max_size))?
        {
            if data.len() + chunk.len() > max_size {
                return Err(AppError::PayloadTooLarge {
                    size: (data.len() + chunk.len()) as u64,
                    max_size: max_size as u64,
                });
            }
            data.extend_from_slice(&chunk);
        }

        if data.is_empty() {
            return Err(AppError::invalid(format!("uploaded file '{name}' is empty")));
        }

        return Ok(ReceivedFile {
            name,
            content_type,
            data: data.freeze(),
        });
    }

    Err(AppError::invalid(format!(
        "multipart field '{UPLOAD_FIELD}' is required"
    )))
}

/// Stores the upload, then asks the extractor to summarize it.
async fn process_upload(state: &AppState, mut multipart: Multipart) -> Result<UploadOutcome, AppError> {
    let max_size = state.config.limits.max_upload_bytes();
    let file = match read_upload(&mut multipart, max_size).await {
        Ok(file) => file,
        Err(e) => {
            state.metrics.record_upload_failure("request");
            TracingService::log_upload_failed("-", "request", &e);
            return Err(e);
        }
    };

    let size_bytes = file.data.len() as u64;
    TracingService::log_upload_received(&file.name, size_bytes, &file.content_type);
    state.metrics.record_upload(&file.name, size_bytes);

    let container = &state.config.storage.container;
    let blob_url = match state
        .store
        .put(container, &file.name, file.data.clone(), &file.content_type)
        .await
    {
        Ok(url) => url,
        Err(e) => {
            state.metrics.record_upload_failure("storage");
            TracingService::log_upload_failed(&file.name, "storage", &e);
            return Err(e);
        }
    };
    TracingService::log_upload_stored(&file.name, &blob_url, state.store.kind());

    let started = Instant::now();
    let summary = match state.extractor.extract(&file.data).await {
        Ok(summary) => summary,
        Err(e) => {
            state.metrics.record_upload_failure("extraction");
            TracingService::log_upload_failed(&file.name, "extraction", &e);
            return Err(e);
        }
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let fell_back = summary == DocumentSummary::unparseable();
    state.metrics.record_extraction(elapsed_ms as f64, fell_back);
    TracingService::log_document_summarized(&summary, elapsed_ms);

    Ok(UploadOutcome {
        blob_url,
        size_bytes,
        summary: summary.with_filename(file.name),
    })
}

pub async fn home() -> Html<String> {
    Html(render_page(PageView::Empty))
}

#[instrument(skip_all)]
pub async fn upload_page(
    State(state): State<AppState>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    match process_upload(&state, multipart).await {
        Ok(outcome) => (
            StatusCode::OK,
            Html(render_page(PageView::Summary(&outcome.summary))),
        ),
        Err(e) => (status_of(&e), Html(render_page(PageView::Failure(&e)))),
    }
}

#[instrument(skip_all)]
pub async fn upload_json(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadOutcome>, ApiError> {
    process_upload(&state, multipart)
        .await
        .map(Json)
        .map_err(api_error)
}

#[instrument(skip_all)]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(AppError::invalid("message must not be empty")));
    }

    let agent = state.agent.get().await.map_err(|e| {
        error!("Cooking agent unavailable: {}", e);
        api_error(e)
    })?;

    let started = Instant::now();
    let turn = agent.chat_turn(&payload.message).await;
    state.metrics.record_chat(&turn.tools_used, turn.failed);
    TracingService::log_chat_turn(
        &turn.tools_used,
        turn.failed,
        started.elapsed().as_millis() as u64,
    );

    Ok(Json(ChatReply { reply: turn.reply }))
}

#[instrument(skip(state))]
pub async fn chat_history(State(state): State<AppState>) -> Result<Json<ChatHistory>, ApiError> {
    let agent = state.agent.get().await.map_err(api_error)?;
    Ok(Json(ChatHistory {
        messages: agent.history().await,
    }))
}

#[instrument(skip(state))]
pub async fn reset_chat(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let agent = state.agent.get().await.map_err(api_error)?;
    agent.reset().await;
    info!("Chat thread reset");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn static_asset(Path(path): Path<String>) -> impl IntoResponse {
    embedded_file_response(&path)
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.store.kind().to_string(),
        agent_configured: state.agent.is_configured(),
    })
}

#[instrument(skip(state))]
pub async fn metrics(State(state): State<AppState>) -> Result<String, StatusCode> {
    match state.metrics.render() {
        Ok(metrics) => Ok(metrics),
        Err(e) => {
            error!("Failed to get metrics: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
