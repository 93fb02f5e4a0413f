mod client;

pub use client::*;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::application::{AppError, LedgerService};

/// Long-poll timeout for getUpdates.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause before re-polling after a transport failure.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Build the reply for a `/start` event: look the account up, create it
/// with a zero balance when absent, and greet with the current balance and
/// a deep link. Every failure path terminates with one fixed message and
/// mutates nothing.
pub async fn start_reply(service: &LedgerService, user_id: &str, link_base: &str) -> String {
    let found = match service.lookup_account(user_id).await {
        Ok(found) => found,
        Err(err @ AppError::DuplicateAccountRows { .. }) => {
            error!(user_id, %err, "inconsistent account data");
            return "Multiple users found with the same ID.".to_string();
        }
        Err(err) => {
            error!(user_id, %err, "account lookup failed");
            return "Error fetching user data.".to_string();
        }
    };

    match found {
        Some(account) => format!(
            "Welcome back! You have {} coins. Click the link to manage your coins: {}/?userId={}",
            account.coins, link_base, user_id
        ),
        None => match service.create_account(user_id).await {
            Ok(account) => format!(
                "Welcome to TapMe! You have {} coins. Click the link to manage your coins: {}/?userId={}",
                account.coins, link_base, user_id
            ),
            Err(err) => {
                error!(user_id, %err, "account creation failed");
                "Error creating user.".to_string()
            }
        },
    }
}

/// Chat front end: polls for updates and answers `/start` commands with
/// the get-or-create greeting. One outbound message per handled event, no
/// retries.
pub struct CommandBot {
    client: BotClient,
    service: Arc<LedgerService>,
    link_base: String,
}

impl CommandBot {
    pub fn new(client: BotClient, service: Arc<LedgerService>, link_base: String) -> Self {
        Self {
            client,
            service,
            link_base,
        }
    }

    /// Poll until the shutdown signal fires. Runs alongside the API
    /// server; stopping this loop is the first step of shutdown, before
    /// store connections close.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("bot polling for updates");
        let mut offset = 0;

        loop {
            let updates = tokio::select! {
                _ = shutdown.changed() => break,
                updates = self.client.get_updates(offset, POLL_TIMEOUT_SECS) => updates,
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(err) => {
                    warn!(%err, "polling failed");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                if let Some(message) = update.message {
                    self.handle_message(message).await;
                }
            }
        }

        info!("bot stopped");
    }

    async fn handle_message(&self, message: Message) {
        let is_start = message
            .text
            .as_deref()
            .is_some_and(|text| text.starts_with("/start"));
        if !is_start {
            return;
        }

        let reply = match &message.from {
            None => "Unable to identify user.".to_string(),
            Some(sender) => {
                let user_id = sender.id.to_string();
                start_reply(&self.service, &user_id, &self.link_base).await
            }
        };

        if let Err(err) = self.client.send_message(message.chat.id, &reply).await {
            warn!(chat_id = message.chat.id, %err, "failed to send reply");
        }
    }
}
