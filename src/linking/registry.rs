use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use crate::core::config;
use crate::storage::{CredentialStore, StoreError};

/// Produces a fresh linking code
pub type CodeGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// 3 random bytes as 6 uppercase hex characters.
///
/// Not checked against live codes; a collision overwrites the older entry.
pub fn random_code() -> String {
    let bytes: [u8; 3] = rand::random();
    hex::encode_upper(bytes)
}

/// What a user typed into the chat, reduced to a lookup key
pub fn normalize_code(text: &str) -> String {
    text.trim().to_uppercase()
}

#[derive(Debug)]
struct PendingCode {
    owner_session_id: String,
    created_at: Instant,
    /// Distinguishes this entry from a later one registered under the same code
    generation: u64,
    /// Set while the link write for this code is in flight
    claimed: bool,
}

impl PendingCode {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }
}

/// Result of starting the chat linking flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Initiation {
    /// A new code was registered
    Issued { code: String, instructions: String },
    /// The session user already has a chat; no code was registered
    AlreadyLinked { chat_id: String },
}

/// Result of a chat message that may carry a linking code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedemptionResult {
    /// Link persisted and the code consumed
    Success { session_user_id: String },
    /// No live code matched (unknown, expired, or already consumed)
    Unrecognized,
    /// The link write failed or timed out; the code stays live
    PersistenceFailed,
}

/// In-memory registry of short-lived linking codes.
///
/// Codes are checked for expiry lazily on every lookup; [`spawn_sweeper`]
/// additionally drops dead entries in the background. The map lock is never
/// held across the store write.
///
/// [`spawn_sweeper`]: LinkRegistry::spawn_sweeper
pub struct LinkRegistry {
    store: Arc<dyn CredentialStore>,
    pending: Mutex<HashMap<String, PendingCode>>,
    next_generation: AtomicU64,
    ttl: Duration,
    persist_timeout: Duration,
    bot_username: String,
    generate: CodeGenerator,
}

impl LinkRegistry {
    /// Registry with the production TTL, timeout and random codes.
    pub fn new(store: Arc<dyn CredentialStore>, bot_username: impl Into<String>) -> Self {
        Self::with_settings(
            store,
            bot_username,
            config::linking::code_ttl(),
            config::linking::persist_timeout(),
            Box::new(random_code),
        )
    }

    pub fn with_settings(
        store: Arc<dyn CredentialStore>,
        bot_username: impl Into<String>,
        ttl: Duration,
        persist_timeout: Duration,
        generate: CodeGenerator,
    ) -> Self {
        Self {
            store,
            pending: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            ttl,
            persist_timeout,
            bot_username: bot_username.into(),
            generate,
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<String, PendingCode>> {
        // Entries are plain data; a panic elsewhere cannot leave one half-written
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Human-readable instructions shown next to the code in the web app
    pub fn instructions(&self, code: &str) -> String {
        let minutes = self.ttl.as_secs() / 60;
        if self.bot_username.is_empty() {
            format!(
                "Send the code {} to our Telegram bot within {} minutes.",
                code, minutes
            )
        } else {
            format!(
                "Send the code {code} to @{bot} within {minutes} minutes, or open https://t.me/{bot}?start={code}",
                code = code,
                bot = self.bot_username,
                minutes = minutes
            )
        }
    }

    /// Starts the chat linking flow for a web session user.
    ///
    /// Already linked users get `AlreadyLinked` and no code is registered.
    /// Earlier codes for the same owner stay valid.
    pub async fn initiate(&self, owner_session_id: &str) -> Result<Initiation, StoreError> {
        let existing = tokio::time::timeout(self.persist_timeout, self.store.get_link(owner_session_id))
            .await
            .map_err(|_| StoreError::Timeout)??;

        if let Some(link) = existing {
            log::info!("Session {} already linked to chat {}", owner_session_id, link.chat_id);
            return Ok(Initiation::AlreadyLinked { chat_id: link.chat_id });
        }

        let code = (self.generate)();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        {
            let mut pending = self.lock_pending();
            if pending.contains_key(&code) {
                log::warn!("Linking code collision, replacing a live code");
            }
            pending.insert(
                code.clone(),
                PendingCode {
                    owner_session_id: owner_session_id.to_string(),
                    created_at: Instant::now(),
                    generation,
                    claimed: false,
                },
            );
        }

        log::info!("Issued linking code for session {}", owner_session_id);
        let instructions = self.instructions(&code);
        Ok(Initiation::Issued { code, instructions })
    }

    /// Redeems a code typed into the bot chat by `chat_id`.
    ///
    /// The matching entry is claimed under the lock, so a concurrent
    /// redemption of the same code sees `Unrecognized`. The code is removed
    /// only after the link write succeeds.
    pub async fn redeem(
        &self,
        received_text: &str,
        chat_id: &str,
        chat_username: Option<&str>,
    ) -> RedemptionResult {
        let code = normalize_code(received_text);
        if code.is_empty() {
            return RedemptionResult::Unrecognized;
        }

        let (owner, generation) = {
            let now = Instant::now();
            let mut pending = self.lock_pending();
            let Some(entry) = pending.get_mut(&code) else {
                return RedemptionResult::Unrecognized;
            };
            if entry.is_expired(now, self.ttl) {
                pending.remove(&code);
                return RedemptionResult::Unrecognized;
            }
            if entry.claimed {
                return RedemptionResult::Unrecognized;
            }
            entry.claimed = true;
            (entry.owner_session_id.clone(), entry.generation)
        };

        let write = tokio::time::timeout(
            self.persist_timeout,
            self.store.upsert_link(&owner, chat_id, chat_username),
        )
        .await;

        match write {
            Ok(Ok(())) => {
                let mut pending = self.lock_pending();
                // A colliding regeneration may have replaced the entry meanwhile
                if pending.get(&code).is_some_and(|entry| entry.generation == generation) {
                    pending.remove(&code);
                }
                log::info!("Linked session {} to chat {}", owner, chat_id);
                RedemptionResult::Success {
                    session_user_id: owner,
                }
            }
            Ok(Err(e)) => {
                log::error!("Failed to persist link for session {}: {}", owner, e);
                self.release(&code, generation);
                RedemptionResult::PersistenceFailed
            }
            Err(_) => {
                log::error!(
                    "Link write for session {} timed out after {:?}",
                    owner,
                    self.persist_timeout
                );
                self.release(&code, generation);
                RedemptionResult::PersistenceFailed
            }
        }
    }

    /// Makes a claimed code redeemable again after a failed write, unless
    /// the entry has since been replaced.
    fn release(&self, code: &str, generation: u64) {
        if let Some(entry) = self.lock_pending().get_mut(code) {
            if entry.generation == generation {
                entry.claimed = false;
            }
        }
    }

    /// Whether `code` is currently redeemable
    pub fn is_live(&self, code: &str) -> bool {
        let now = Instant::now();
        self.lock_pending()
            .get(&normalize_code(code))
            .is_some_and(|entry| !entry.claimed && !entry.is_expired(now, self.ttl))
    }

    /// Number of entries in the map, expired ones included until swept
    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut pending = self.lock_pending();
        let before = pending.len();
        pending.retain(|_, entry| !entry.is_expired(now, self.ttl));
        before - pending.len()
    }

    /// Runs [`purge_expired`](Self::purge_expired) every `every` until the
    /// returned handle is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = registry.purge_expired();
                if removed > 0 {
                    log::debug!("Swept {} expired linking codes", removed);
                }
            }
        })
    }
}
