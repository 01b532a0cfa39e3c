//! Outbound side of the Telegram bot: documents and plain text.
//!
//! Web handlers depend on the [`Messenger`] trait rather than on `Bot`
//! directly so the upload relay can be exercised without the Bot API.

use async_trait::async_trait;
use bytes::Bytes;
use teloxide::prelude::*;
use teloxide::types::{FileMeta, InputFile};

use crate::core::{AppError, AppResult};

/// Handles Telegram returned for a stored document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDocument {
    pub file_id: String,
    pub file_unique_id: Option<String>,
}

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends `bytes` as a document to `chat_id` and returns Telegram's file handles.
    ///
    /// The Bot API infers the MIME type itself; `mime_type` is advisory.
    async fn send_document(
        &self,
        chat_id: &str,
        bytes: Bytes,
        file_name: &str,
        mime_type: &str,
        caption: Option<&str>,
    ) -> AppResult<SentDocument>;

    async fn send_text(&self, chat_id: &str, text: &str) -> AppResult<()>;
}

/// Chat ids are stored as strings; the Bot API wants the numeric form.
pub fn parse_chat_id(chat_id: &str) -> AppResult<ChatId> {
    chat_id
        .trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| AppError::Validation(format!("invalid chat id: {}", chat_id)))
}

/// Telegram may answer a sendDocument with an animation, video or audio
/// message depending on the content; any of them carries the file handle.
fn sent_file_meta(msg: &Message) -> Option<&FileMeta> {
    msg.document()
        .map(|d| &d.file)
        .or_else(|| msg.animation().map(|a| &a.file))
        .or_else(|| msg.video().map(|v| &v.file))
        .or_else(|| msg.audio().map(|a| &a.file))
}

/// [`Messenger`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_document(
        &self,
        chat_id: &str,
        bytes: Bytes,
        file_name: &str,
        mime_type: &str,
        caption: Option<&str>,
    ) -> AppResult<SentDocument> {
        let chat = parse_chat_id(chat_id)?;
        log::info!(
            "Sending document {} ({}, {} bytes) to chat {}",
            file_name,
            mime_type,
            bytes.len(),
            chat
        );

        let file = InputFile::memory(bytes.to_vec()).file_name(file_name.to_string());
        let mut request = self.bot.send_document(chat, file);
        if let Some(caption) = caption {
            request = request.caption(caption.to_string());
        }
        let msg = request.await?;

        let meta = sent_file_meta(&msg)
            .ok_or_else(|| AppError::Validation("Telegram response carried no file".to_string()))?;

        Ok(SentDocument {
            file_id: meta.id.to_string(),
            file_unique_id: Some(meta.unique_id.to_string()),
        })
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> AppResult<()> {
        let chat = parse_chat_id(chat_id)?;
        self.bot.send_message(chat, text.to_string()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_id() {
        assert_eq!(parse_chat_id("998877").unwrap(), ChatId(998877));
        assert_eq!(parse_chat_id(" -100123 ").unwrap(), ChatId(-100123));
        assert!(parse_chat_id("not-a-chat").is_err());
    }
}
