//! Integration tests for the embedded migrations and pool helpers.
//!
//! Each test gets its own throwaway database from `ledger-test-utils`
//! (testcontainers, or `LEDGER_TEST_PG_URL`).

use ledger_db::pool;
use ledger_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn migrations_create_ledger_tables() {
    let (pool, db_name) = create_test_db().await;

    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT tablename::text FROM pg_tables \
         WHERE schemaname = 'public' AND tablename NOT LIKE '\\_sqlx%' \
         ORDER BY tablename",
    )
    .fetch_all(&pool)
    .await
    .expect("should list tables");

    let names: Vec<&str> = rows.iter().map(|(name,)| name.as_str()).collect();
    assert_eq!(names, pool::LEDGER_TABLES);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let (pool, db_name) = create_test_db().await;

    // create_test_db already ran them once.
    pool::run_migrations(&pool)
        .await
        .expect("second migration run should be a no-op");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn table_counts_start_at_zero() {
    let (pool, db_name) = create_test_db().await;

    let counts = pool::table_counts(&pool).await.expect("counts");
    assert_eq!(
        counts,
        vec![("category_budget_overview", 0), ("transaction_details", 0)]
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn transaction_type_is_constrained() {
    let (pool, db_name) = create_test_db().await;

    let res = sqlx::query(
        "INSERT INTO transaction_details (transaction_date, category, amount_inr, type) \
         VALUES ('2025-06-20', 'food', 10, 'transfer')",
    )
    .execute(&pool)
    .await;
    assert!(res.is_err(), "type outside expense/income should be rejected");

    pool.close().await;
    drop_test_db(&db_name).await;
}
