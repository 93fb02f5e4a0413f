use thiserror::Error;

use crate::domain::Coins;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("Found {count} rows for account {id}, expected at most one")]
    DuplicateAccountRows { id: String, count: usize },

    #[error("Crediting {amount} to account {id} (balance {balance}) overflows")]
    AmountOverflow {
        id: String,
        balance: Coins,
        amount: Coins,
    },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
