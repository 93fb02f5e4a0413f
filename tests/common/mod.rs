// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use tapcoin::application::LedgerService;
use tapcoin::domain::{Account, Coins};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Insert a row for an id directly through the repository, bypassing the
/// service's existence check. Used to simulate externally corrupted data
/// (duplicate rows for one id).
pub async fn insert_raw_row(service: &LedgerService, id: &str, coins: Coins) -> Result<()> {
    service
        .repository()
        .insert_account(&Account::new(id).with_coins(coins))
        .await?;
    Ok(())
}

/// Count all rows in the account table.
pub async fn count_rows(service: &LedgerService) -> Result<i64> {
    Ok(service.repository().count_accounts().await?)
}
