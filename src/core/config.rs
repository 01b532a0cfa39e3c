//! Configuration read from the environment.
//!
//! Every value is read once, on first access. `main` loads `.env` before
//! touching any of these, so dotenv files behave like real environment.

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
/// Doubles as the Login Widget signing secret
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Public bot username (without @), used in linking instructions
/// Read from BOT_USERNAME environment variable
pub static BOT_USERNAME: Lazy<String> =
    Lazy::new(|| env::var("BOT_USERNAME").unwrap_or_else(|_| String::new()));

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: tgvault.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "tgvault.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: tgvault.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "tgvault.log".to_string()));

/// HTTP port for the web API
/// Read from WEB_PORT environment variable
/// Default: 8080
pub static WEB_PORT: Lazy<u16> = Lazy::new(|| {
    env::var("WEB_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080)
});

/// Supabase project URL, e.g. https://xyzcompany.supabase.co
pub static SUPABASE_URL: Lazy<String> =
    Lazy::new(|| env::var("SUPABASE_URL").unwrap_or_else(|_| String::new()));

/// Supabase anon key, sent as `apikey` when verifying session tokens
pub static SUPABASE_ANON_KEY: Lazy<String> =
    Lazy::new(|| env::var("SUPABASE_ANON_KEY").unwrap_or_else(|_| String::new()));

/// Front end base URL the widget callback redirects back to
/// Default: http://localhost:3000
pub static FRONTEND_URL: Lazy<String> =
    Lazy::new(|| env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()));

/// Maximum accepted upload size in bytes
/// Read from MAX_UPLOAD_BYTES environment variable
/// Default: 50 MiB, the Bot API limit for documents sent by bots
pub static MAX_UPLOAD_BYTES: Lazy<usize> = Lazy::new(|| {
    env::var("MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(upload::DEFAULT_MAX_BYTES)
});

/// Account linking configuration
pub mod linking {
    use super::Duration;

    /// Lifetime of a linking code (in seconds)
    pub const CODE_TTL_SECS: u64 = 600; // 10 minutes

    /// Interval between background sweeps of expired codes (in seconds)
    pub const SWEEP_INTERVAL_SECS: u64 = 60;

    /// Upper bound on a single link write (in seconds)
    pub const PERSIST_TIMEOUT_SECS: u64 = 10;

    /// Maximum age of a Login Widget payload (in seconds)
    pub const WIDGET_MAX_AGE_SECS: i64 = 86400; // 24 hours

    /// Code TTL duration
    pub fn code_ttl() -> Duration {
        Duration::from_secs(CODE_TTL_SECS)
    }

    /// Sweep interval duration
    pub fn sweep_interval() -> Duration {
        Duration::from_secs(SWEEP_INTERVAL_SECS)
    }

    /// Persistence timeout duration
    pub fn persist_timeout() -> Duration {
        Duration::from_secs(PERSIST_TIMEOUT_SECS)
    }
}

/// Upload configuration
pub mod upload {
    /// Default upload limit (50 MiB)
    pub const DEFAULT_MAX_BYTES: usize = 50 * 1024 * 1024;

    /// Fallback MIME type when the client sends none
    pub const FALLBACK_MIME: &str = "application/octet-stream";
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for outbound HTTP requests (in seconds)
    /// Large enough for a 50 MiB document upload to the Bot API
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    /// Timeout for session verification calls (in seconds)
    pub const AUTH_TIMEOUT_SECS: u64 = 10;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    /// Session verification timeout duration
    pub fn auth_timeout() -> Duration {
        Duration::from_secs(AUTH_TIMEOUT_SECS)
    }
}
