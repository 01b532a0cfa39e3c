//! Upload relay and gallery.
//!
//! Bytes are never written to disk: they go straight to the user's linked
//! Telegram chat and only Telegram's file handle is kept.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

use super::auth::authenticate;
use super::{ApiError, AppState};
use crate::core::config;
use crate::storage::{FileRecord, NewFile};

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub files: Vec<FileRecord>,
}

/// A file pulled out of the multipart body
struct IncomingFile {
    file_name: String,
    mime_type: String,
    data: Bytes,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("File is too large".to_string())
    } else {
        ApiError::BadRequest(format!("Error reading multipart: {}", err.body_text()))
    }
}

/// Reads the `file` field and the optional `caption` field.
async fn read_upload(
    mut multipart: Multipart,
    max_bytes: usize,
) -> Result<(IncomingFile, Option<String>), ApiError> {
    let mut file = None;
    let mut caption = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or("unnamed")
                    .to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or(config::upload::FALLBACK_MIME)
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some(IncomingFile {
                    file_name,
                    mime_type,
                    data,
                });
            }
            Some("caption") => {
                let text = field.text().await.map_err(multipart_error)?;
                caption = Some(text).filter(|c| !c.trim().is_empty());
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    if file.data.is_empty() {
        return Err(ApiError::BadRequest("File is empty".to_string()));
    }
    if file.data.len() > max_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "File is larger than {} bytes",
            max_bytes
        )));
    }

    Ok((file, caption))
}

/// POST /upload - relay a file to the user's linked chat and record it
pub async fn handle_upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<FileRecord>), ApiError> {
    let user = authenticate(state.sessions.as_ref(), &headers).await?;

    // Resolve before reading the body so unlinked users fail fast
    let chat_id = state
        .resolver
        .resolve(&user.id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Link a Telegram chat before uploading".to_string()))?;

    let (file, caption) = read_upload(multipart, state.max_upload_bytes).await?;
    let size_bytes = file.data.len() as i64;

    log::info!(
        "Upload from {}: {} ({}, {} bytes)",
        user.id,
        file.file_name,
        file.mime_type,
        size_bytes
    );

    let sent = state
        .messenger
        .send_document(
            &chat_id,
            file.data,
            &file.file_name,
            &file.mime_type,
            caption.as_deref(),
        )
        .await
        .map_err(|e| {
            log::error!("Telegram rejected upload for {}: {}", user.id, e);
            ApiError::BadGateway("Failed to store file in Telegram".to_string())
        })?;

    let record = state
        .store
        .save_file(NewFile {
            session_user_id: user.id.clone(),
            chat_id,
            telegram_file_id: sent.file_id.clone(),
            telegram_unique_id: sent.file_unique_id,
            file_name: file.file_name,
            mime_type: file.mime_type,
            size_bytes,
            caption,
        })
        .await
        .map_err(|e| {
            // The document already sits in the chat; only the record is lost
            log::error!(
                "Failed to record upload {} for {}: {}",
                sent.file_id,
                user.id,
                e
            );
            ApiError::Internal("File was sent but could not be recorded".to_string())
        })?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /files - the signed-in user's files, newest first
pub async fn handle_list_files(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<FilesResponse>, ApiError> {
    let user = authenticate(state.sessions.as_ref(), &headers).await?;
    let files = state.store.list_files(&user.id).await?;
    Ok(Json(FilesResponse { files }))
}
