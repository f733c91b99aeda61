//! Database query functions for the `transaction_details` table.
//!
//! These are plain row operations. Keeping category spend in sync is the
//! caller's job (see `ledger_core::consistency`).

use anyhow::{Context, Result};
use sqlx::PgExecutor;

use crate::models::{NewTransaction, TransactionDetail};

/// Insert a new transaction row.
pub async fn insert_transaction<'e, E>(
    executor: E,
    new: &NewTransaction,
) -> Result<TransactionDetail>
where
    E: PgExecutor<'e>,
{
    let transaction = sqlx::query_as::<_, TransactionDetail>(
        "INSERT INTO transaction_details \
         (transaction_date, category, description, amount_inr, type, location) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(new.transaction_date)
    .bind(&new.category)
    .bind(&new.description)
    .bind(new.amount_inr)
    .bind(new.transaction_type)
    .bind(&new.location)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert transaction in category {:?}", new.category))?;

    Ok(transaction)
}

/// Fetch a transaction by id.
pub async fn get_transaction<'e, E>(executor: E, id: i64) -> Result<Option<TransactionDetail>>
where
    E: PgExecutor<'e>,
{
    let transaction =
        sqlx::query_as::<_, TransactionDetail>("SELECT * FROM transaction_details WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .context("failed to fetch transaction")?;

    Ok(transaction)
}

/// Fetch a transaction by id and lock the row until the enclosing
/// transaction ends, so concurrent edits cannot compute a spend delta from
/// the same stale row.
pub async fn get_transaction_for_update<'e, E>(
    executor: E,
    id: i64,
) -> Result<Option<TransactionDetail>>
where
    E: PgExecutor<'e>,
{
    let transaction = sqlx::query_as::<_, TransactionDetail>(
        "SELECT * FROM transaction_details WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .context("failed to lock transaction")?;

    Ok(transaction)
}

/// List all transactions, ordered by id.
pub async fn list_transactions<'e, E>(executor: E) -> Result<Vec<TransactionDetail>>
where
    E: PgExecutor<'e>,
{
    let transactions =
        sqlx::query_as::<_, TransactionDetail>("SELECT * FROM transaction_details ORDER BY id")
            .fetch_all(executor)
            .await
            .context("failed to list transactions")?;

    Ok(transactions)
}

/// Overwrite every mutable column of a transaction.
///
/// Returns `None` if no row has `transaction.id`.
pub async fn write_transaction<'e, E>(
    executor: E,
    transaction: &TransactionDetail,
) -> Result<Option<TransactionDetail>>
where
    E: PgExecutor<'e>,
{
    let updated = sqlx::query_as::<_, TransactionDetail>(
        "UPDATE transaction_details \
         SET transaction_date = $2, category = $3, description = $4, \
             amount_inr = $5, type = $6, location = $7 \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(transaction.id)
    .bind(transaction.transaction_date)
    .bind(&transaction.category)
    .bind(&transaction.description)
    .bind(transaction.amount_inr)
    .bind(transaction.transaction_type)
    .bind(&transaction.location)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("failed to update transaction {}", transaction.id))?;

    Ok(updated)
}

/// Delete a transaction. Returns whether a row was removed.
pub async fn delete_transaction<'e, E>(executor: E, id: i64) -> Result<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM transaction_details WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .context("failed to delete transaction")?;

    Ok(result.rows_affected() > 0)
}
