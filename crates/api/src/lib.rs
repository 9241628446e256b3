pub mod handlers;
pub mod page;
pub mod routes;
pub mod state;

pub use handlers::*;
pub use page::*;
pub use routes::*;
pub use state::*;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use rust_embed::RustEmbed;
use std::future::Future;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Room for multipart boundaries and headers on top of the file limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(RustEmbed)]
#[folder = "assets"]
pub struct Assets;

pub(crate) fn embedded_file_response(path: &str) -> impl IntoResponse {
    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_str(mime.as_ref())
                    .unwrap_or(HeaderValue::from_static("application/octet-stream")),
            );
            let body = axum::body::Body::from(content.data.into_owned());
            (StatusCode::OK, headers, body).into_response()
        }
        None => (StatusCode::NOT_FOUND, HeaderMap::new(), axum::body::Body::empty()).into_response(),
    }
}

/// Full application: routes plus tracing, CORS and the request body limit.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.limits.max_upload_bytes() + MULTIPART_OVERHEAD;

    Router::new().merge(build_router(state)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(DefaultBodyLimit::max(body_limit)),
    )
}

pub async fn start_server(
    state: AppState,
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    info!("paperchef listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
}
