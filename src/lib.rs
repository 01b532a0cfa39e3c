//! tgvault - keep web app uploads in Telegram
//!
//! Files uploaded through the web app are relayed to the user's Telegram chat
//! by a bot, and only Telegram's file handle is stored locally. A web account
//! is tied to a chat either through the Telegram Login Widget or by typing a
//! short code into the bot chat.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging
//! - `storage`: SQLite-backed credential store (links and file metadata)
//! - `linking`: widget signature check, code pairing registry, link resolver
//! - `telegram`: bot setup, dispatcher schema, outbound messenger
//! - `web`: HTTP API

pub mod cli;
pub mod core;
pub mod linking;
pub mod storage;
pub mod telegram;
pub mod web;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use linking::{LinkRegistry, LinkResolver, RedemptionResult, WidgetPayload};
pub use storage::{create_pool, CredentialStore, SqliteStore, StoreError};
pub use web::{create_router, AppState};
