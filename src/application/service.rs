use uuid::Uuid;

use crate::domain::{Account, Coins};
use crate::storage::Repository;

use super::AppError;

/// Application service providing the ledger operations.
/// This is the primary interface for any client (GraphQL API, bot, CLI).
pub struct LedgerService {
    repo: Repository,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Close the underlying store connections.
    pub async fn shutdown(&self) {
        self.repo.close().await;
    }

    // ========================
    // Ledger operations
    // ========================

    /// Get the unique account for an id.
    ///
    /// Zero rows is `AccountNotFound`; more than one row is
    /// `DuplicateAccountRows`, never a silently picked row.
    pub async fn get_account(&self, id: &str) -> Result<Account, AppError> {
        self.lookup_account(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))
    }

    /// Get the unique account for an id, where absence is an expected
    /// outcome rather than an error. Cardinality rules are the same as
    /// `get_account`.
    pub async fn lookup_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        let mut accounts = self.repo.find_accounts(id).await?;
        match accounts.len() {
            0 => Ok(None),
            1 => Ok(Some(accounts.remove(0))),
            count => Err(AppError::DuplicateAccountRows {
                id: id.to_string(),
                count,
            }),
        }
    }

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    /// Create a new account with a zero balance.
    pub async fn create_account(&self, id: &str) -> Result<Account, AppError> {
        if self.lookup_account(id).await?.is_some() {
            return Err(AppError::AccountAlreadyExists(id.to_string()));
        }

        Ok(self.repo.insert_account(&Account::new(id)).await?)
    }

    /// Look up an account, creating it with a zero balance if absent.
    /// Returns the account and whether a row was created.
    pub async fn get_or_create(&self, id: &str) -> Result<(Account, bool), AppError> {
        match self.lookup_account(id).await? {
            Some(account) => Ok((account, false)),
            None => {
                let account = self.repo.insert_account(&Account::new(id)).await?;
                Ok((account, true))
            }
        }
    }

    /// Insert an account with an arbitrary starting balance, generating a
    /// UUID identity when none is given. One-off seeding tool.
    pub async fn seed_account(
        &self,
        id: Option<String>,
        coins: Coins,
    ) -> Result<Account, AppError> {
        let id = match id {
            Some(id) => {
                if self.lookup_account(&id).await?.is_some() {
                    return Err(AppError::AccountAlreadyExists(id));
                }
                id
            }
            None => Uuid::new_v4().to_string(),
        };

        Ok(self
            .repo
            .insert_account(&Account::new(id).with_coins(coins))
            .await?)
    }

    /// Add `amount` to an account's balance and return the updated account.
    ///
    /// The increment runs as a single server-side statement, so two
    /// concurrent credits on the same id both land. This is the default
    /// path for every surface. `amount` is unvalidated: negative and zero
    /// amounts pass through, and the balance may go negative.
    pub async fn credit(&self, id: &str, amount: Coins) -> Result<Account, AppError> {
        let mut updated = self.repo.increment_coins(id, amount).await?;
        match updated.len() {
            0 => Err(AppError::AccountNotFound(id.to_string())),
            1 => Ok(updated.remove(0)),
            count => Err(AppError::DuplicateAccountRows {
                id: id.to_string(),
                count,
            }),
        }
    }

    /// Add `amount` to an account's balance via separate read and write
    /// round trips, returning the updated account.
    ///
    /// This reproduces the original read-modify-write: fetch the balance,
    /// add, write back. There is no locking between the two statements, so
    /// two concurrent calls on the same id can lose an update. Kept only so
    /// that behavior stays observable; use `credit` instead.
    pub async fn credit_naive(&self, id: &str, amount: Coins) -> Result<Account, AppError> {
        let balances = self.repo.get_coins(id).await?;
        let balance = match balances.len() {
            0 => return Err(AppError::AccountNotFound(id.to_string())),
            1 => balances[0],
            count => {
                return Err(AppError::DuplicateAccountRows {
                    id: id.to_string(),
                    count,
                });
            }
        };

        let new_balance = balance
            .checked_add(amount)
            .ok_or_else(|| AppError::AmountOverflow {
                id: id.to_string(),
                balance,
                amount,
            })?;

        let mut updated = self.repo.set_coins(id, new_balance).await?;
        match updated.len() {
            0 => Err(AppError::AccountNotFound(id.to_string())),
            1 => Ok(updated.remove(0)),
            count => Err(AppError::DuplicateAccountRows {
                id: id.to_string(),
                count,
            }),
        }
    }

    /// Direct access to the repository, for tests that need to construct
    /// store states the service itself refuses to create.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }
}
