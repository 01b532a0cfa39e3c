//! Messenger that records sends instead of calling the Bot API

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tgvault::core::{AppError, AppResult};
use tgvault::telegram::{Messenger, SentDocument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCall {
    pub chat_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub caption: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
pub struct MockMessenger {
    sent: Mutex<Vec<SentCall>>,
    texts: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every following send is rejected, like a Bot API error
    pub fn fail_sends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentCall> {
        self.sent.lock().unwrap().clone()
    }

    /// `(chat_id, text)` pairs passed to `send_text`
    pub fn texts(&self) -> Vec<(String, String)> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_document(
        &self,
        chat_id: &str,
        bytes: Bytes,
        file_name: &str,
        mime_type: &str,
        caption: Option<&str>,
    ) -> AppResult<SentDocument> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Validation("Bad Request: chat not found".to_string()));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(SentCall {
            chat_id: chat_id.to_string(),
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            caption: caption.map(str::to_string),
            bytes: bytes.to_vec(),
        });

        Ok(SentDocument {
            file_id: format!("BQACAgI-{}", sent.len()),
            file_unique_id: Some(format!("AgAD-{}", sent.len())),
        })
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> AppResult<()> {
        self.texts
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}
