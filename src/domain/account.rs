use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account identifiers are opaque strings: Telegram user ids for accounts
/// created through the bot, store-generated UUIDs for seeded ones.
pub type AccountId = String;

/// Coin balances are plain integers. Credits may be negative, so balances
/// can go below zero.
pub type Coins = i64;

/// A user's persisted identity plus coin balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub coins: Coins,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with a zero balance.
    pub fn new(id: impl Into<AccountId>) -> Self {
        Self {
            id: id.into(),
            coins: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_coins(mut self, coins: Coins) -> Self {
        self.coins = coins;
        self
    }
}
