//! Credential store: account links and uploaded-file metadata.
//!
//! Callers depend on the [`CredentialStore`] trait; [`SqliteStore`] is the
//! production backend. Query functions in `links` and `files` are plain
//! synchronous rusqlite code, run on the blocking pool by `SqliteStore`.

pub mod db;
pub mod files;
pub mod links;
pub mod migrations;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use db::{create_pool, get_connection, DbConnection, DbPool};
pub use files::{FileRecord, NewFile};
pub use links::AccountLink;

/// Errors surfaced by the credential store. "Not found" is never an error;
/// lookups return `Ok(None)` for it.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("migration error: {0}")]
    Migration(#[from] refinery::Error),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("store call timed out")]
    Timeout,
}

/// Query contract the linking and upload flows rely on
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert-or-update keyed on `session_user_id`
    async fn upsert_link(
        &self,
        session_user_id: &str,
        chat_id: &str,
        chat_username: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn get_link(&self, session_user_id: &str) -> Result<Option<AccountLink>, StoreError>;

    async fn save_file(&self, file: NewFile) -> Result<FileRecord, StoreError>;

    /// Newest first
    async fn list_files(&self, session_user_id: &str) -> Result<Vec<FileRecord>, StoreError>;
}

/// SQLite-backed store over an r2d2 pool
#[derive(Clone)]
pub struct SqliteStore {
    pool: Arc<DbPool>,
}

impl SqliteStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Runs `f` with a pooled connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&DbConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let conn = get_connection(&pool)?;
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn upsert_link(
        &self,
        session_user_id: &str,
        chat_id: &str,
        chat_username: Option<&str>,
    ) -> Result<(), StoreError> {
        let session_user_id = session_user_id.to_string();
        let chat_id = chat_id.to_string();
        let chat_username = chat_username.map(str::to_string);
        self.with_conn(move |conn| {
            links::upsert_link(conn, &session_user_id, &chat_id, chat_username.as_deref())?;
            Ok(())
        })
        .await
    }

    async fn get_link(&self, session_user_id: &str) -> Result<Option<AccountLink>, StoreError> {
        let session_user_id = session_user_id.to_string();
        self.with_conn(move |conn| Ok(links::get_link(conn, &session_user_id)?))
            .await
    }

    async fn save_file(&self, file: NewFile) -> Result<FileRecord, StoreError> {
        self.with_conn(move |conn| Ok(files::save_file(conn, &file)?)).await
    }

    async fn list_files(&self, session_user_id: &str) -> Result<Vec<FileRecord>, StoreError> {
        let session_user_id = session_user_id.to_string();
        self.with_conn(move |conn| Ok(files::list_files(conn, &session_user_id)?))
            .await
    }
}
