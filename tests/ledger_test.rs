mod common;

use anyhow::Result;
use common::{count_rows, insert_raw_row, test_service};
use tapcoin::application::AppError;

#[tokio::test]
async fn test_create_then_get_returns_zero_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let created = service.create_account("42").await?;
    assert_eq!(created.id, "42");
    assert_eq!(created.coins, 0);

    let fetched = service.get_account("42").await?;
    assert_eq!(fetched.id, "42");
    assert_eq!(fetched.coins, 0);

    Ok(())
}

#[tokio::test]
async fn test_get_missing_account_is_not_found() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // Never a zero-valued account for an id that has no row.
    let err = service.get_account("missing").await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(id) if id == "missing"));

    Ok(())
}

#[tokio::test]
async fn test_create_existing_account_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.create_account("42").await?;
    let err = service.create_account("42").await.unwrap_err();
    assert!(matches!(err, AppError::AccountAlreadyExists(id) if id == "42"));

    Ok(())
}

#[tokio::test]
async fn test_credit_adds_amount() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.seed_account(Some("42".to_string()), 150).await?;
    let updated = service.credit("42", 50).await?;
    assert_eq!(updated.coins, 200);

    let fetched = service.get_account("42").await?;
    assert_eq!(fetched.coins, 200);

    Ok(())
}

#[tokio::test]
async fn test_credit_accepts_negative_amounts() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // Amounts are unvalidated: the balance may go below zero.
    service.create_account("42").await?;
    let updated = service.credit("42", -30).await?;
    assert_eq!(updated.coins, -30);

    Ok(())
}

#[tokio::test]
async fn test_credit_missing_account_is_not_found() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service.credit("missing", 10).await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(_)));

    let err = service.credit_naive("missing", 10).await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_rows_surface_integrity_error() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // Corrupt the store: two rows for one id.
    insert_raw_row(&service, "42", 10).await?;
    insert_raw_row(&service, "42", 20).await?;

    // Neither read nor write may silently pick a row.
    let err = service.get_account("42").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::DuplicateAccountRows { ref id, count: 2 } if id == "42"
    ));

    let err = service.credit("42", 5).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateAccountRows { .. }));

    let err = service.credit_naive("42", 5).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateAccountRows { .. }));

    Ok(())
}

#[tokio::test]
async fn test_get_or_create_creates_once() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let (account, created) = service.get_or_create("42").await?;
    assert!(created);
    assert_eq!(account.coins, 0);

    let (account, created) = service.get_or_create("42").await?;
    assert!(!created);
    assert_eq!(account.coins, 0);

    assert_eq!(count_rows(&service).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_seed_account_generates_id_when_omitted() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = service.seed_account(None, 200).await?;
    assert!(!account.id.is_empty());
    assert_eq!(account.coins, 200);

    let fetched = service.get_account(&account.id).await?;
    assert_eq!(fetched.coins, 200);

    Ok(())
}

#[tokio::test]
async fn test_seed_account_rejects_existing_explicit_id() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.create_account("42").await?;
    let err = service
        .seed_account(Some("42".to_string()), 200)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountAlreadyExists(_)));

    Ok(())
}

#[tokio::test]
async fn test_naive_credit_adds_amount() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.seed_account(Some("42".to_string()), 150).await?;
    let updated = service.credit_naive("42", 50).await?;
    assert_eq!(updated.coins, 200);

    let updated = service.credit_naive("42", -200).await?;
    assert_eq!(updated.coins, 0);

    Ok(())
}

#[tokio::test]
async fn test_naive_credit_overflow_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.seed_account(Some("42".to_string()), 1).await?;
    let err = service.credit_naive("42", i64::MAX).await.unwrap_err();
    assert!(matches!(err, AppError::AmountOverflow { balance: 1, .. }));

    // The failed credit must not leave a partial mutation behind.
    assert_eq!(service.get_account("42").await?.coins, 1);

    Ok(())
}

/// The naive path reads the balance and writes it back in two separate
/// round trips. Interleaving another credit between the two loses that
/// credit's update. This pins the known anomaly of the reference behavior;
/// it is why `credit` is the default path.
#[tokio::test]
async fn test_naive_read_write_interleaving_loses_update() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let repo = service.repository();

    service.create_account("42").await?;

    // First credit reads the balance...
    let balance = repo.get_coins("42").await?[0];

    // ...a concurrent credit lands in between...
    service.credit("42", 1).await?;

    // ...and the first credit writes its stale result back.
    repo.set_coins("42", balance + 1).await?;

    // Two +1 credits, final balance 1: one update was lost.
    assert_eq!(service.get_account("42").await?.coins, 1);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_atomic_credits_both_land() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.create_account("42").await?;

    let (a, b) = tokio::join!(service.credit("42", 1), service.credit("42", 1));
    a?;
    b?;

    assert_eq!(service.get_account("42").await?.coins, 2);

    Ok(())
}
