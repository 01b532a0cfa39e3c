//! In-memory credential store with injectable failures and delays

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tgvault::storage::{AccountLink, CredentialStore, FileRecord, NewFile, StoreError};

#[derive(Default)]
pub struct MockStore {
    links: Mutex<HashMap<String, AccountLink>>,
    files: Mutex<Vec<FileRecord>>,
    /// Number of upcoming `upsert_link` calls that fail
    failing_upserts: AtomicUsize,
    /// Number of upcoming `get_link` calls that fail
    failing_get_links: AtomicUsize,
    upsert_delay: Mutex<Option<Duration>>,
    upsert_calls: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already knows `session_user_id -> chat_id`
    pub fn with_link(session_user_id: &str, chat_id: &str) -> Self {
        let store = Self::new();
        store.links.lock().unwrap().insert(
            session_user_id.to_string(),
            AccountLink {
                session_user_id: session_user_id.to_string(),
                chat_id: chat_id.to_string(),
                chat_username: None,
                linked_at: "2024-01-01T00:00:00+00:00".to_string(),
            },
        );
        store
    }

    pub fn fail_next_upserts(&self, count: usize) {
        self.failing_upserts.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_get_links(&self, count: usize) {
        self.failing_get_links.store(count, Ordering::SeqCst);
    }

    pub fn set_upsert_delay(&self, delay: Duration) {
        *self.upsert_delay.lock().unwrap() = Some(delay);
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn link(&self, session_user_id: &str) -> Option<AccountLink> {
        self.links.lock().unwrap().get(session_user_id).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

/// Consumes one pending failure, if any
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl CredentialStore for MockStore {
    async fn upsert_link(
        &self,
        session_user_id: &str,
        chat_id: &str,
        chat_username: Option<&str>,
    ) -> Result<(), StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.upsert_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if take_failure(&self.failing_upserts) {
            return Err(StoreError::Database(rusqlite::Error::InvalidQuery));
        }

        self.links.lock().unwrap().insert(
            session_user_id.to_string(),
            AccountLink {
                session_user_id: session_user_id.to_string(),
                chat_id: chat_id.to_string(),
                chat_username: chat_username.map(str::to_string),
                linked_at: chrono::Utc::now().to_rfc3339(),
            },
        );
        Ok(())
    }

    async fn get_link(&self, session_user_id: &str) -> Result<Option<AccountLink>, StoreError> {
        if take_failure(&self.failing_get_links) {
            return Err(StoreError::Database(rusqlite::Error::InvalidQuery));
        }
        Ok(self.link(session_user_id))
    }

    async fn save_file(&self, file: NewFile) -> Result<FileRecord, StoreError> {
        let mut files = self.files.lock().unwrap();
        let record = FileRecord {
            id: files.len() as i64 + 1,
            session_user_id: file.session_user_id,
            chat_id: file.chat_id,
            telegram_file_id: file.telegram_file_id,
            telegram_unique_id: file.telegram_unique_id,
            file_name: file.file_name,
            mime_type: file.mime_type,
            size_bytes: file.size_bytes,
            caption: file.caption,
            uploaded_at: chrono::Utc::now().to_rfc3339(),
        };
        files.push(record.clone());
        Ok(record)
    }

    async fn list_files(&self, session_user_id: &str) -> Result<Vec<FileRecord>, StoreError> {
        let files = self.files.lock().unwrap();
        Ok(files
            .iter()
            .rev()
            .filter(|f| f.session_user_id == session_user_id)
            .cloned()
            .collect())
    }
}
