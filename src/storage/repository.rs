use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::{Account, Coins};

use super::MIGRATION_001_INITIAL;

/// Repository for persisting and querying accounts.
///
/// This is the only collaborator holding state. It exposes exactly the
/// primitives of the store contract: point lookup by id (zero/one/many
/// rows), insert-one returning the stored row, and update-one-field-by-id
/// returning the post-update rows. Cardinality is checked by callers.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Close the connection pool. Called last during shutdown, after the
    /// surfaces that issue queries have stopped.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================
    // Account operations
    // ========================

    /// Point lookup by id. Returns every matching row; callers decide what
    /// zero, one or many rows mean.
    pub async fn find_accounts(&self, id: &str) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, coins, created_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch account")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Insert a new account row and return it as stored.
    pub async fn insert_account(&self, account: &Account) -> Result<Account> {
        let row = sqlx::query(
            r#"
            INSERT INTO accounts (id, coins, created_at)
            VALUES (?, ?, ?)
            RETURNING id, coins, created_at
            "#,
        )
        .bind(&account.id)
        .bind(account.coins)
        .bind(account.created_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert account")?;

        Self::row_to_account(&row)
    }

    /// Lookup restricted to the `coins` column, one value per matching row.
    /// First half of the naive read-modify-write.
    pub async fn get_coins(&self, id: &str) -> Result<Vec<Coins>> {
        let rows = sqlx::query(
            r#"
            SELECT coins
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch coins")?;

        Ok(rows.iter().map(|row| row.get("coins")).collect())
    }

    /// Overwrite the balance for an id and return the post-update rows.
    /// Second half of the naive read-modify-write.
    pub async fn set_coins(&self, id: &str, coins: Coins) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            UPDATE accounts
            SET coins = ?
            WHERE id = ?
            RETURNING id, coins, created_at
            "#,
        )
        .bind(coins)
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to update coins")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Add to the balance in a single server-side statement and return the
    /// post-update rows. The increment executes inside the store, so two
    /// concurrent calls cannot lose an update.
    pub async fn increment_coins(&self, id: &str, amount: Coins) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            UPDATE accounts
            SET coins = coins + ?
            WHERE id = ?
            RETURNING id, coins, created_at
            "#,
        )
        .bind(amount)
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to increment coins")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// List all accounts. No pagination or filtering.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, coins, created_at
            FROM accounts
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Count all account rows.
    pub async fn count_accounts(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM accounts")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count accounts")?;

        Ok(row.get("count"))
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: row.get("id"),
            coins: row.get("coins"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
