//! Linking endpoints: code initiation, link status and the Login Widget callback.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::auth::authenticate;
use super::{ApiError, AppState};
use crate::core::config;
use crate::linking::{widget, Initiation, WidgetPayload};
use crate::storage::StoreError;
use crate::telegram::handlers::LINKED_TEXT;

#[derive(Debug, Serialize)]
pub struct InitiateResponse {
    pub code: Option<String>,
    pub instructions: String,
    pub linked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStatusResponse {
    pub linked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

pub const ALREADY_LINKED_TEXT: &str = "Your account is already linked to a Telegram chat.";

/// POST /link/initiate - issue a linking code for the signed-in user
pub async fn handle_initiate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<InitiateResponse>, ApiError> {
    let user = authenticate(state.sessions.as_ref(), &headers).await?;

    let response = match state.registry.initiate(&user.id).await? {
        Initiation::Issued { code, instructions } => InitiateResponse {
            code: Some(code),
            instructions,
            linked: false,
        },
        Initiation::AlreadyLinked { .. } => InitiateResponse {
            code: None,
            instructions: ALREADY_LINKED_TEXT.to_string(),
            linked: true,
        },
    };

    Ok(Json(response))
}

/// GET /link/status - whether the signed-in user has a linked chat
pub async fn handle_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<LinkStatusResponse>, ApiError> {
    let user = authenticate(state.sessions.as_ref(), &headers).await?;
    let chat_id = state.resolver.resolve(&user.id).await?;

    Ok(Json(LinkStatusResponse {
        linked: chat_id.is_some(),
        chat_id,
    }))
}

/// Builds `<frontend>/?<key>=<value>`, falling back to string concatenation
/// when the configured URL does not parse.
pub fn frontend_redirect(frontend_url: &str, key: &str, value: &str) -> Redirect {
    let target = match url::Url::parse(frontend_url) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair(key, value);
            url.to_string()
        }
        Err(_) => format!("{}/?{}={}", frontend_url.trim_end_matches('/'), key, value),
    };
    Redirect::to(&target)
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// GET /auth/telegram-callback - Telegram Login Widget redirect target.
///
/// The link is written only after the signature checks out. Rejections go
/// back to the front end as `?error=...`; a failed write is a server error.
pub async fn handle_widget_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(payload): Query<WidgetPayload>,
) -> Result<Redirect, ApiError> {
    let frontend = state.frontend_url.as_str();

    if !widget::verify(&payload, &state.bot_secret) {
        log::warn!(
            "Rejected Login Widget callback with invalid signature (telegram id {:?})",
            payload.telegram_id()
        );
        return Ok(frontend_redirect(frontend, "error", "signature_invalid"));
    }

    if !widget::is_fresh(&payload, unix_now(), config::linking::WIDGET_MAX_AGE_SECS) {
        log::warn!("Rejected stale Login Widget callback (auth_date {:?})", payload.get("auth_date"));
        return Ok(frontend_redirect(frontend, "error", "auth_expired"));
    }

    let Some(chat_id) = payload.telegram_id() else {
        log::warn!("Signed Login Widget callback without an id field");
        return Ok(frontend_redirect(frontend, "error", "signature_invalid"));
    };

    let user = match authenticate(state.sessions.as_ref(), &headers).await {
        Ok(user) => user,
        Err(e) => {
            log::warn!("Login Widget callback without a valid session: {}", e);
            return Ok(frontend_redirect(frontend, "error", "not_authenticated"));
        }
    };

    tokio::time::timeout(
        config::linking::persist_timeout(),
        state.store.upsert_link(&user.id, chat_id, payload.username()),
    )
    .await
    .map_err(|_| StoreError::Timeout)??;

    log::info!("Linked session {} to chat {} via Login Widget", user.id, chat_id);

    // The chat may never have started the bot; the link stands either way
    if let Err(e) = state.messenger.send_text(chat_id, LINKED_TEXT).await {
        log::warn!("Could not confirm link in chat {}: {}", chat_id, e);
    }

    Ok(frontend_redirect(frontend, "linked", "1"))
}
