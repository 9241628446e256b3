use crate::{handlers::*, AppState};
use axum::{
    routing::{get, post},
    Router,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Upload page
        .route("/", get(home))
        .route("/upload", post(upload_page))
        .route("/static/*path", get(static_asset))
        // JSON API
        .route("/api/upload", post(upload_json))
        .route("/api/chat", post(chat))
        .route("/api/chat/history", get(chat_history).delete(reset_chat))
        // Health and metrics
        .route("/healthz", get(health_check))
        .route("/metrics", get(metrics))
}

pub fn build_router(state: AppState) -> Router {
    create_router().with_state(state)
}
