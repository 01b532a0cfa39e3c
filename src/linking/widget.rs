use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Query parameters Telegram appends to the Login Widget callback URL
/// (`id`, `first_name`, `username`, `photo_url`, `auth_date`, `hash`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct WidgetPayload {
    fields: BTreeMap<String, String>,
}

impl WidgetPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// The signature Telegram attached to the payload
    pub fn hash(&self) -> Option<&str> {
        self.get("hash")
    }

    /// Telegram user id. For a private chat with the bot this is also the chat id.
    pub fn telegram_id(&self) -> Option<&str> {
        self.get("id").filter(|id| !id.is_empty())
    }

    pub fn username(&self) -> Option<&str> {
        self.get("username").filter(|name| !name.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WidgetPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Builds the data-check-string: every field except `hash` as `key=value`,
/// sorted byte-wise on the whole `key=value` string, joined with `\n`.
pub fn check_string(payload: &WidgetPayload) -> String {
    let mut pairs: Vec<String> = payload
        .fields
        .iter()
        .filter(|(key, _)| key.as_str() != "hash")
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();

    pairs.sort();
    pairs.join("\n")
}

/// Lowercase hex `HMAC_SHA256(SHA256(bot_secret), check_string)`.
///
/// Unlike Mini App init data, the Login Widget key is the plain SHA-256 of
/// the token, not an HMAC keyed with "WebAppData".
pub fn sign(payload: &WidgetPayload, bot_secret: &str) -> Option<String> {
    let signing_key = Sha256::digest(bot_secret.as_bytes());

    let mut mac = HmacSha256::new_from_slice(&signing_key).ok()?;
    mac.update(check_string(payload).as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Validates a Telegram Login Widget payload.
///
/// Returns `false` for an empty secret, a missing `hash`, or any mismatch.
/// The comparison is constant-time and case-sensitive.
///
/// # Example
/// ```rust
/// use tgvault::linking::widget::{verify, WidgetPayload};
///
/// let payload: WidgetPayload = [("id", "5"), ("first_name", "Bo"), ("hash", "00")].into_iter().collect();
/// assert!(!verify(&payload, "123456:ABC"));
/// ```
pub fn verify(payload: &WidgetPayload, bot_secret: &str) -> bool {
    if bot_secret.is_empty() {
        return false;
    }
    let Some(received) = payload.hash() else {
        return false;
    };
    let Some(calculated) = sign(payload, bot_secret) else {
        return false;
    };

    calculated.as_bytes().ct_eq(received.as_bytes()).into()
}

/// Checks `auth_date` against `now` (both unix seconds).
///
/// A payload is fresh when it is at most `max_age_secs` old and not more
/// than a minute in the future. Missing or malformed `auth_date` is stale.
pub fn is_fresh(payload: &WidgetPayload, now: i64, max_age_secs: i64) -> bool {
    let Some(auth_date) = payload.get("auth_date").and_then(|v| v.parse::<i64>().ok()) else {
        return false;
    };

    now.checked_sub(auth_date)
        .is_some_and(|age_seconds| (-60..=max_age_secs).contains(&age_seconds))
}
