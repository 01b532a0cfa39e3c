//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup summary of the configuration the service will run with

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs what the service is about to run with and flags settings that will
/// break a flow at runtime. Secrets are never printed, only their presence.
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("tgvault configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Database: {}", config::DATABASE_PATH.as_str());
    log::info!("Web port: {}", *config::WEB_PORT);
    log::info!("Upload limit: {} bytes", *config::MAX_UPLOAD_BYTES);
    log::info!("Front end: {}", config::FRONTEND_URL.as_str());

    if config::BOT_TOKEN.is_empty() {
        log::error!("❌ BOT_TOKEN: not set. Uploads fail and widget logins are rejected");
    } else {
        log::info!("✅ BOT_TOKEN: set");
    }

    if config::BOT_USERNAME.is_empty() {
        log::warn!("⚠️  BOT_USERNAME: not set, linking instructions will not name the bot");
    } else {
        log::info!("✅ BOT_USERNAME: @{}", config::BOT_USERNAME.as_str());
    }

    if config::SUPABASE_URL.is_empty() || config::SUPABASE_ANON_KEY.is_empty() {
        log::error!("❌ SUPABASE_URL / SUPABASE_ANON_KEY: not set. Every authenticated request will be rejected");
    } else {
        log::info!("✅ Supabase: {}", config::SUPABASE_URL.as_str());
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::NamedTempFile;

    #[test]
    fn test_init_logger_creates_log_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        // A second init in the same process fails; either way the file exists
        let _ = init_logger(path);
        assert!(temp_file.path().exists());
    }

    #[test]
    fn test_init_logger_rejects_unwritable_path() {
        let result = init_logger("/nonexistent-dir/for/sure/tgvault.log");
        assert!(result.is_err());
    }
}
