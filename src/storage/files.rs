//! Metadata for files relayed into Telegram chats.
//!
//! The bytes live in Telegram; this table keeps the handle Telegram returned
//! plus enough metadata to render a gallery.

use rusqlite::{Connection, Row};
use serde::Serialize;

/// Structure representing a stored file entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub id: i64,
    /// Web session user who uploaded the file
    pub session_user_id: String,
    /// Chat the document was sent to
    pub chat_id: String,
    /// Telegram file_id for retrieval
    pub telegram_file_id: String,
    /// Telegram file_unique_id for deduplication
    pub telegram_unique_id: Option<String>,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub caption: Option<String>,
    pub uploaded_at: String,
}

/// Parameters for saving a new file
#[derive(Debug, Clone)]
pub struct NewFile {
    pub session_user_id: String,
    pub chat_id: String,
    pub telegram_file_id: String,
    pub telegram_unique_id: Option<String>,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub caption: Option<String>,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        session_user_id: row.get(1)?,
        chat_id: row.get(2)?,
        telegram_file_id: row.get(3)?,
        telegram_unique_id: row.get(4)?,
        file_name: row.get(5)?,
        mime_type: row.get(6)?,
        size_bytes: row.get(7)?,
        caption: row.get(8)?,
        uploaded_at: row.get(9)?,
    })
}

/// Saves a new file and returns the stored record
pub fn save_file(conn: &Connection, file: &NewFile) -> rusqlite::Result<FileRecord> {
    let uploaded_at = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO files (
            session_user_id, chat_id, telegram_file_id, telegram_unique_id,
            file_name, mime_type, size_bytes, caption, uploaded_at
         )
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            file.session_user_id,
            file.chat_id,
            file.telegram_file_id,
            file.telegram_unique_id,
            file.file_name,
            file.mime_type,
            file.size_bytes,
            file.caption,
            uploaded_at,
        ],
    )?;

    Ok(FileRecord {
        id: conn.last_insert_rowid(),
        session_user_id: file.session_user_id.clone(),
        chat_id: file.chat_id.clone(),
        telegram_file_id: file.telegram_file_id.clone(),
        telegram_unique_id: file.telegram_unique_id.clone(),
        file_name: file.file_name.clone(),
        mime_type: file.mime_type.clone(),
        size_bytes: file.size_bytes,
        caption: file.caption.clone(),
        uploaded_at,
    })
}

/// Lists a user's files, newest first
pub fn list_files(conn: &Connection, session_user_id: &str) -> rusqlite::Result<Vec<FileRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, session_user_id, chat_id, telegram_file_id, telegram_unique_id,
                file_name, mime_type, size_bytes, caption, uploaded_at
         FROM files WHERE session_user_id = ?1
         ORDER BY id DESC",
    )?;

    let rows = stmt.query_map(rusqlite::params![session_user_id], map_row)?;
    rows.collect()
}
