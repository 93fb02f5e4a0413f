use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use crate::api::ApiServer;
use crate::application::LedgerService;
use crate::bot::{BotClient, CommandBot};
use crate::domain::Coins;

/// Tapcoin - virtual coin ledger
#[derive(Parser)]
#[command(name = "tapcoin")]
#[command(about = "A virtual coin ledger with a GraphQL API and a Telegram bot front end")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "TAPCOIN_DATABASE", default_value = "tapcoin.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Run the GraphQL API server and the bot poller
    Serve {
        /// Port for the GraphQL server
        #[arg(short, long, env = "TAPCOIN_PORT", default_value_t = 4000)]
        port: u16,

        /// Telegram bot token. Required unless --no-bot is set.
        #[arg(long, env = "TAPCOIN_BOT_TOKEN", hide_env_values = true)]
        bot_token: Option<String>,

        /// Base URL embedded in the greeting deep links
        #[arg(
            long,
            env = "TAPCOIN_LINK_BASE",
            default_value = "https://tapmeclient.netlify.app"
        )]
        link_base: String,

        /// Run the API server without the bot poller
        #[arg(long)]
        no_bot: bool,
    },

    /// Insert an account with a starting balance
    Seed {
        /// Starting balance
        #[arg(short, long, default_value_t = 200)]
        coins: Coins,

        /// Account id (a UUID is generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                let service = LedgerService::init(&self.database).await?;
                service.shutdown().await;
                println!("Database initialized at {}", self.database);
                Ok(())
            }

            Commands::Serve {
                port,
                bot_token,
                link_base,
                no_bot,
            } => serve(&self.database, port, bot_token, link_base, no_bot).await,

            Commands::Seed { coins, id } => {
                let service = LedgerService::init(&self.database).await?;
                let account = service.seed_account(id, coins).await?;
                service.shutdown().await;
                println!("Inserted account {} with {} coins", account.id, account.coins);
                Ok(())
            }
        }
    }
}

/// Wire the store, service, API server and bot together, then run until
/// ctrl-c. Shutdown order: bot poller first, then the HTTP server, and the
/// store pool last.
async fn serve(
    database: &str,
    port: u16,
    bot_token: Option<String>,
    link_base: String,
    no_bot: bool,
) -> Result<()> {
    // Fail before touching the store if the token is missing.
    let bot_token = if no_bot {
        None
    } else {
        Some(bot_token.context("Bot token is required (set TAPCOIN_BOT_TOKEN or pass --no-bot)")?)
    };

    let service = Arc::new(LedgerService::init(database).await?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let bot_task = bot_token.map(|token| {
        let bot = CommandBot::new(BotClient::new(&token), service.clone(), link_base);
        tokio::spawn(bot.run(shutdown_rx.clone()))
    });

    let api = ApiServer::new(service.clone(), port);
    let mut api_task = tokio::spawn(api.start(shutdown_rx));

    let api_result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
            None
        }
        result = &mut api_task => Some(result),
    };

    let _ = shutdown_tx.send(true);

    if let Some(task) = bot_task {
        let _ = task.await;
    }

    let api_result = match api_result {
        Some(result) => result,
        None => api_task.await,
    };

    service.shutdown().await;

    match api_result {
        Ok(result) => result,
        Err(err) => Err(anyhow!("API server task panicked: {err}")),
    }
}
