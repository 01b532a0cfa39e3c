//! HTTP API for the web front end.
//!
//! - `POST /link/initiate`, `GET /link/status` - chat linking for the signed-in user
//! - `GET /auth/telegram-callback` - Telegram Login Widget redirect target
//! - `POST /upload`, `GET /files` - upload relay and gallery
//! - `GET /health`

pub mod auth;
pub mod links;
pub mod server;
pub mod upload;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::linking::{LinkRegistry, LinkResolver};
use crate::storage::{CredentialStore, StoreError};
use crate::telegram::Messenger;

pub use auth::{AuthError, SessionUser, SessionVerifier, SupabaseSessions};
pub use server::{create_router, run_web_server};

// ============================================================================
// STATE
// ============================================================================

/// Shared state for all endpoints
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub registry: Arc<LinkRegistry>,
    pub resolver: LinkResolver,
    pub messenger: Arc<dyn Messenger>,
    pub sessions: Arc<dyn SessionVerifier>,
    /// Bot token; also the Login Widget signing secret
    pub bot_secret: String,
    /// Where the widget callback sends the browser back to
    pub frontend_url: String,
    pub max_upload_bytes: usize,
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    Conflict(String),
    PayloadTooLarge(String),
    BadGateway(String),
    Unavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::Rejected => ApiError::Unauthorized(err.to_string()),
            AuthError::Unavailable(_) => ApiError::Unavailable(err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        log::error!("Store failure: {}", err);
        ApiError::Internal("Storage is unavailable, try again later".to_string())
    }
}
