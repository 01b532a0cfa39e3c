//! Telegram bot handler tree configuration
//!
//! The bot only has one job: accept linking codes typed (or deep-linked)
//! into a chat and answer with the outcome.

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{ChatKind, Message};

use crate::linking::{LinkRegistry, RedemptionResult};
use crate::telegram::bot::Command;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub const WELCOME_TEXT: &str = "👋 I store the files you upload in the web app.\n\n\
To link this chat, press \"Link Telegram\" in the web app and send me the 6-character code it shows.";

pub const UNRECOGNIZED_TEXT: &str = "🤔 I don't recognise that code. Codes expire after 10 minutes \
and work once.\n\nPress \"Link Telegram\" in the web app to get a fresh one, then send it here.";

pub const LINKED_TEXT: &str = "✅ This chat is now linked. Files you upload in the web app will arrive here.";

pub const RETRY_TEXT: &str = "⚠️ I couldn't save the link right now. Your code is still valid, please send it again in a minute.";

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub registry: Arc<LinkRegistry>,
}

impl HandlerDeps {
    pub fn new(registry: Arc<LinkRegistry>) -> Self {
        Self { registry }
    }
}

/// Chat reply for each redemption outcome
pub fn redemption_reply(result: &RedemptionResult) -> &'static str {
    match result {
        RedemptionResult::Success { .. } => LINKED_TEXT,
        RedemptionResult::Unrecognized => UNRECOGNIZED_TEXT,
        RedemptionResult::PersistenceFailed => RETRY_TEXT,
    }
}

/// Runs a chat message through the registry and picks the reply.
pub async fn handle_link_text(
    registry: &LinkRegistry,
    chat_id: ChatId,
    chat_username: Option<&str>,
    text: &str,
) -> &'static str {
    let result = registry.redeem(text, &chat_id.0.to_string(), chat_username).await;
    if result == RedemptionResult::Unrecognized {
        log::debug!("Unrecognized linking text from chat {}", chat_id);
    }
    redemption_reply(&result)
}

/// Creates the dispatcher schema for the bot.
///
/// The same schema is used in production and can be used in integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(command_handler(deps.clone()))
        .branch(text_handler(deps))
}

fn sender_username(msg: &Message) -> Option<String> {
    msg.from.as_ref().and_then(|u| u.username.clone())
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command {:?} from chat {}", cmd, msg.chat.id);

                let reply = match cmd {
                    // t.me/<bot>?start=<code> arrives as "/start <code>"
                    Command::Start(payload) if !payload.trim().is_empty() => {
                        let username = sender_username(&msg);
                        handle_link_text(&deps.registry, msg.chat.id, username.as_deref(), &payload).await
                    }
                    Command::Start(_) | Command::Help => WELCOME_TEXT,
                };

                bot.send_message(msg.chat.id, reply).await?;
                Ok(())
            }
        },
    ))
}

/// Plain text counts as a code attempt only in a private chat with the bot;
/// group chatter is ignored.
pub fn accepts_plain_text(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Plain text is treated as a linking code attempt
fn text_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| accepts_plain_text(&msg))
        .filter_map(|msg: Message| msg.text().map(str::to_owned))
        .endpoint(move |bot: Bot, msg: Message, text: String| {
            let deps = deps.clone();
            async move {
                let username = sender_username(&msg);
                let reply = handle_link_text(&deps.registry, msg.chat.id, username.as_deref(), &text).await;

                if let Err(e) = bot.send_message(msg.chat.id, reply).await {
                    log::error!("Failed to answer chat {}: {}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_in(chat: serde_json::Value) -> Message {
        serde_json::from_value(serde_json::json!({
            "message_id": 1,
            "date": 1700000000,
            "chat": chat,
            "from": {
                "id": 998877,
                "is_bot": false,
                "first_name": "Bo",
                "username": "bo"
            },
            "text": "A3B9C4"
        }))
        .unwrap()
    }

    #[test]
    fn test_plain_text_accepted_in_private_chat() {
        let msg = message_in(serde_json::json!({
            "id": 998877,
            "type": "private",
            "first_name": "Bo"
        }));
        assert!(accepts_plain_text(&msg));
    }

    #[test]
    fn test_plain_text_ignored_in_group_chat() {
        let msg = message_in(serde_json::json!({
            "id": -100123,
            "type": "group",
            "title": "Study group"
        }));
        assert!(!accepts_plain_text(&msg));
    }

    #[test]
    fn test_redemption_reply_texts() {
        let success = RedemptionResult::Success {
            session_user_id: "user-42".to_string(),
        };
        assert_eq!(redemption_reply(&success), LINKED_TEXT);
        assert_eq!(redemption_reply(&RedemptionResult::Unrecognized), UNRECOGNIZED_TEXT);
        assert_eq!(redemption_reply(&RedemptionResult::PersistenceFailed), RETRY_TEXT);
    }
}
