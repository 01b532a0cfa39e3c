use axum::{
    extract::DefaultBodyLimit,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use super::{links, upload, AppState};

/// Room for multipart boundaries and the caption field on top of the file
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Builds the API router
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/link/initiate", post(links::handle_initiate))
        .route("/link/status", get(links::handle_status))
        .route("/auth/telegram-callback", get(links::handle_widget_callback))
        .route(
            "/upload",
            post(upload::handle_upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/files", get(upload::handle_list_files))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Starts the web server and serves until the listener fails
pub async fn run_web_server(port: u16, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    log::info!("Starting web server on http://{}", addr);
    log::info!("  POST /link/initiate          - issue a linking code");
    log::info!("  GET  /link/status            - linked chat of the session user");
    log::info!("  GET  /auth/telegram-callback - Login Widget redirect target");
    log::info!("  POST /upload                 - relay a file to Telegram");
    log::info!("  GET  /files                  - gallery");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// GET /health
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tgvault"
    }))
}
