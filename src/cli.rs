use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tgvault")]
#[command(author, version, about = "Web upload backend that keeps files in Telegram chats", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the web API and the bot (default)
    Run {
        /// Serve the web API only; another process runs the bot dispatcher
        #[arg(long)]
        no_bot: bool,
    },

    /// Apply database migrations and exit
    Migrate,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
