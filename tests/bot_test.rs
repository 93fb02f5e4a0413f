mod common;

use anyhow::Result;
use common::{count_rows, insert_raw_row, test_service};
use tapcoin::bot::start_reply;

const LINK_BASE: &str = "https://tapmeclient.netlify.app";

#[tokio::test]
async fn test_start_creates_account_and_greets() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let reply = start_reply(&service, "42", LINK_BASE).await;
    assert_eq!(
        reply,
        "Welcome to TapMe! You have 0 coins. Click the link to manage your coins: \
         https://tapmeclient.netlify.app/?userId=42"
    );

    let account = service.get_account("42").await?;
    assert_eq!(account.coins, 0);
    assert_eq!(count_rows(&service).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_start_greets_existing_account() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.seed_account(Some("42".to_string()), 150).await?;

    let reply = start_reply(&service, "42", LINK_BASE).await;
    assert!(reply.starts_with("Welcome back!"));
    assert!(reply.contains("You have 150 coins"));
    assert!(reply.contains("/?userId=42"));

    // No new row was created.
    assert_eq!(count_rows(&service).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_start_with_duplicate_rows_reports_inconsistency() -> Result<()> {
    let (service, _temp) = test_service().await?;

    insert_raw_row(&service, "42", 10).await?;
    insert_raw_row(&service, "42", 20).await?;

    let reply = start_reply(&service, "42", LINK_BASE).await;
    assert_eq!(reply, "Multiple users found with the same ID.");

    // The failure path is terminal: nothing was created or modified.
    assert_eq!(count_rows(&service).await?, 2);
    let mut balances = service.repository().get_coins("42").await?;
    balances.sort_unstable();
    assert_eq!(balances, vec![10, 20]);

    Ok(())
}

#[tokio::test]
async fn test_start_reports_store_errors() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // Closing the pool makes every query fail, simulating a store outage.
    service.shutdown().await;

    let reply = start_reply(&service, "42", LINK_BASE).await;
    assert_eq!(reply, "Error fetching user data.");

    Ok(())
}
