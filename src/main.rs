use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::signal;
use tokio::task::JoinHandle;

use tgvault::cli::{Cli, Commands};
use tgvault::core::{config, init_logger, log_startup_configuration};
use tgvault::linking::{LinkRegistry, LinkResolver};
use tgvault::storage::{create_pool, CredentialStore, SqliteStore};
use tgvault::telegram::{create_bot, schema, setup_bot_commands, Bot, HandlerDeps, TelegramMessenger};
use tgvault::web::{run_web_server, AppState, SupabaseSessions};

/// Main entry point
///
/// Parses CLI arguments and dispatches to the selected subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load .env before any config static is touched
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run { no_bot }) => run_service(no_bot).await,
        Some(Commands::Migrate) => run_migrate(),
        None => {
            log::info!("No command specified, running web API and bot");
            run_service(false).await
        }
    }
}

/// Apply migrations and exit
fn run_migrate() -> Result<()> {
    create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to migrate database: {}", e))?;
    log::info!("Database at {} is up to date", config::DATABASE_PATH.as_str());
    Ok(())
}

/// The configured username, or the one Telegram reports for this token
async fn resolve_bot_username(bot: &Bot) -> String {
    if !config::BOT_USERNAME.is_empty() {
        return config::BOT_USERNAME.clone();
    }
    match bot.get_me().await {
        Ok(me) => me.username().to_string(),
        Err(e) => {
            log::warn!("Could not fetch bot username: {}", e);
            String::new()
        }
    }
}

fn web_exit(result: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    match result {
        Ok(Ok(())) => {
            log::warn!("Web server stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(e) => Err(anyhow::anyhow!("Web server task failed: {}", e)),
    }
}

/// Run the web API, the code sweeper and (unless `no_bot`) the bot dispatcher
async fn run_service(no_bot: bool) -> Result<()> {
    log_startup_configuration();

    let pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );
    let store: Arc<dyn CredentialStore> = Arc::new(SqliteStore::new(pool));

    let bot = create_bot(&config::BOT_TOKEN)?;
    let bot_username = resolve_bot_username(&bot).await;

    let registry = Arc::new(LinkRegistry::new(Arc::clone(&store), bot_username));
    let sweeper = registry.spawn_sweeper(config::linking::sweep_interval());

    let state = AppState {
        store: Arc::clone(&store),
        registry: Arc::clone(&registry),
        resolver: LinkResolver::new(Arc::clone(&store)),
        messenger: Arc::new(TelegramMessenger::new(bot.clone())),
        sessions: Arc::new(SupabaseSessions::from_env()?),
        bot_secret: config::BOT_TOKEN.clone(),
        frontend_url: config::FRONTEND_URL.clone(),
        max_upload_bytes: *config::MAX_UPLOAD_BYTES,
    };

    let mut web: JoinHandle<Result<()>> = tokio::spawn(run_web_server(*config::WEB_PORT, state));

    let outcome = if no_bot {
        log::info!("Bot dispatcher disabled (--no-bot)");
        tokio::select! {
            result = &mut web => web_exit(result),
            _ = signal::ctrl_c() => {
                log::info!("Received Ctrl-C, shutting down");
                Ok(())
            }
        }
    } else {
        if let Err(e) = setup_bot_commands(&bot).await {
            log::warn!("Failed to set bot commands: {}", e);
        }

        let handler = schema(HandlerDeps::new(Arc::clone(&registry)));
        let mut dispatcher = Dispatcher::builder(bot, handler)
            .dependencies(DependencyMap::new())
            .enable_ctrlc_handler()
            .build();

        log::info!("Starting bot dispatcher");
        tokio::select! {
            result = &mut web => web_exit(result),
            _ = dispatcher.dispatch() => {
                log::info!("Dispatcher shutdown gracefully");
                Ok(())
            }
        }
    };

    web.abort();
    sweeper.abort();
    outcome
}
