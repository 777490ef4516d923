//! MySQL repository tests
//!
//! Exercise the SQL behind the repository traits against a real database.
//! Run with `cargo test -- --ignored` and TEST_DATABASE_URL set.

#[path = "../helpers/mod.rs"]
mod helpers;

use chrono::{TimeZone, Utc};
use healthsync::core::Period;
use healthsync::modules::billing::{
    BillingRowRepository, BucketKey, ImportSource, MySqlBillingRowRepository,
};
use healthsync::modules::statements::StatementMapper;
use healthsync::modules::subscribers::{MySqlSubscriberRepository, SubscriberRepository};
use healthsync::modules::tokens::{MySqlTokenRepository, TokenRepository};
use helpers::*;

fn bucket(company_code: i32, period: Period, source: ImportSource) -> BucketKey {
    BucketKey {
        company: TestDataFactory::company_key(company_code),
        import_period: period,
        source,
    }
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_billing_rows_replace_bucket() {
    let pool = create_test_pool().await;
    let repo = MySqlBillingRowRepository::new(pool);
    let code = unique_company_code();
    let period = Period::new(3, 2025).unwrap();
    let key = bucket(code, period, ImportSource::Document);

    let rows = StatementMapper::flatten(
        &TestDataFactory::statement(&[3, 2]),
        &key.company,
        period,
        &key.source,
    );

    assert_eq!(repo.insert_rows(&rows).await.unwrap(), 5);
    assert_eq!(repo.count_bucket(&key).await.unwrap(), 5);

    assert_eq!(repo.delete_bucket(&key).await.unwrap(), 5);
    assert_eq!(repo.count_bucket(&key).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_buckets_are_isolated_by_source_and_period() {
    let pool = create_test_pool().await;
    let repo = MySqlBillingRowRepository::new(pool);
    let code = unique_company_code();
    let march = Period::new(3, 2025).unwrap();
    let april = Period::new(4, 2025).unwrap();

    let by_document = bucket(code, march, ImportSource::Document);
    let by_contract = bucket(
        code,
        march,
        ImportSource::Contract {
            contract_id: "C-100".to_string(),
        },
    );
    let next_month = bucket(code, april, ImportSource::Document);

    for key in [&by_document, &by_contract, &next_month] {
        let rows = StatementMapper::flatten(
            &TestDataFactory::statement(&[2]),
            &key.company,
            key.import_period,
            &key.source,
        );
        repo.insert_rows(&rows).await.unwrap();
    }

    repo.delete_bucket(&by_document).await.unwrap();

    assert_eq!(repo.count_bucket(&by_document).await.unwrap(), 0);
    assert_eq!(repo.count_bucket(&by_contract).await.unwrap(), 2);
    assert_eq!(repo.count_bucket(&next_month).await.unwrap(), 2);

    repo.delete_bucket(&by_contract).await.unwrap();
    repo.delete_bucket(&next_month).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_large_statement_inserted_in_one_transaction() {
    let pool = create_test_pool().await;
    let repo = MySqlBillingRowRepository::new(pool);
    let code = unique_company_code();
    let period = Period::new(5, 2025).unwrap();
    let key = bucket(code, period, ImportSource::Document);

    let rows = StatementMapper::flatten(
        &TestDataFactory::statement(&[400, 400, 400]),
        &key.company,
        period,
        &key.source,
    );

    assert_eq!(repo.insert_rows(&rows).await.unwrap(), 1200);
    assert_eq!(repo.delete_bucket(&key).await.unwrap(), 1200);
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_token_upsert_keeps_one_row_per_slot() {
    let pool = create_test_pool().await;
    let repo = MySqlTokenRepository::new(pool);
    let slot = format!("test-{}", unique_company_code());
    let first = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2025, 3, 1, 15, 0, 0).unwrap();

    assert!(repo.load(&slot).await.unwrap().is_none());

    repo.upsert(&slot, "tok-1", first).await.unwrap();
    repo.upsert(&slot, "tok-2", second).await.unwrap();

    let stored = repo.load(&slot).await.unwrap().unwrap();
    assert_eq!(stored.token, "tok-2");
    assert_eq!(stored.issued_at, second);
}

#[tokio::test]
#[ignore = "Requires test database configuration"]
async fn test_registry_lists_only_syncing_companies() {
    let pool = create_test_pool().await;
    let repo = MySqlSubscriberRepository::new(pool.clone());
    let code = unique_company_code();

    for (offset, syncing) in [(0, true), (1, false)] {
        let company = TestDataFactory::company(code + offset);
        sqlx::query(
            "INSERT INTO subscriber_companies \
             (company_code, group_code, branch_code, channel_code, name, document, syncing) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(company.key.company_code)
        .bind(company.key.group_code)
        .bind(company.key.branch_code)
        .bind(company.key.channel_code)
        .bind(&company.name)
        .bind(&company.document)
        .bind(syncing)
        .execute(&pool)
        .await
        .unwrap();
    }

    let companies = repo.list_syncing_companies().await.unwrap();
    assert!(companies.iter().any(|c| c.key.company_code == code));
    assert!(!companies.iter().any(|c| c.key.company_code == code + 1));

    sqlx::query("DELETE FROM subscriber_companies WHERE company_code IN (?, ?)")
        .bind(code)
        .bind(code + 1)
        .execute(&pool)
        .await
        .unwrap();
}
