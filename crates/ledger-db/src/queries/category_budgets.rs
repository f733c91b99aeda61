//! Database query functions for the `category_budget_overview` table.
//!
//! Every function takes a [`PgExecutor`] so callers can run it against the
//! pool directly or inside an open transaction (`&mut *tx`).

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sqlx::PgExecutor;

use crate::models::{CategoryBudget, NewCategoryBudget};

/// Insert a new category budget with `remaining_budget_inr` derived from the
/// supplied budget and spend.
pub async fn insert_category_budget<'e, E>(
    executor: E,
    new: &NewCategoryBudget,
) -> Result<CategoryBudget>
where
    E: PgExecutor<'e>,
{
    let budget = sqlx::query_as::<_, CategoryBudget>(
        "INSERT INTO category_budget_overview \
         (category, budget_inr, total_spent_inr, remaining_budget_inr) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(&new.category)
    .bind(new.budget_inr)
    .bind(new.total_spent_inr)
    .bind(new.remaining_budget())
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert category budget {:?}", new.category))?;

    Ok(budget)
}

/// Fetch a category budget by id.
pub async fn get_category_budget<'e, E>(executor: E, id: i64) -> Result<Option<CategoryBudget>>
where
    E: PgExecutor<'e>,
{
    let budget = sqlx::query_as::<_, CategoryBudget>(
        "SELECT * FROM category_budget_overview WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .context("failed to fetch category budget")?;

    Ok(budget)
}

/// Fetch a category budget by id and lock the row until the enclosing
/// transaction ends.
pub async fn get_category_budget_for_update<'e, E>(
    executor: E,
    id: i64,
) -> Result<Option<CategoryBudget>>
where
    E: PgExecutor<'e>,
{
    let budget = sqlx::query_as::<_, CategoryBudget>(
        "SELECT * FROM category_budget_overview WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .context("failed to lock category budget")?;

    Ok(budget)
}

/// List all category budgets, ordered by id.
pub async fn list_category_budgets<'e, E>(executor: E) -> Result<Vec<CategoryBudget>>
where
    E: PgExecutor<'e>,
{
    let budgets = sqlx::query_as::<_, CategoryBudget>(
        "SELECT * FROM category_budget_overview ORDER BY id",
    )
    .fetch_all(executor)
    .await
    .context("failed to list category budgets")?;

    Ok(budgets)
}

/// Overwrite the mutable columns of a category budget.
///
/// Returns `None` if no row has `budget.id`.
pub async fn write_category_budget<'e, E>(
    executor: E,
    budget: &CategoryBudget,
) -> Result<Option<CategoryBudget>>
where
    E: PgExecutor<'e>,
{
    let updated = sqlx::query_as::<_, CategoryBudget>(
        "UPDATE category_budget_overview \
         SET category = $2, budget_inr = $3, total_spent_inr = $4, remaining_budget_inr = $5 \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(budget.id)
    .bind(&budget.category)
    .bind(budget.budget_inr)
    .bind(budget.total_spent_inr)
    .bind(budget.remaining_budget_inr)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("failed to update category budget {}", budget.id))?;

    Ok(updated)
}

/// Add `amount_change` to the spend of every budget named `category` and
/// recompute its remaining budget, in a single statement.
///
/// Both columns are computed from the pre-update row, and the implicit row
/// lock taken by `UPDATE` serializes concurrent adjustments to the same
/// category. Returns the adjusted rows; an empty vec means no budget matched.
pub async fn apply_spend_delta<'e, E>(
    executor: E,
    category: &str,
    amount_change: Decimal,
) -> Result<Vec<CategoryBudget>>
where
    E: PgExecutor<'e>,
{
    let adjusted = sqlx::query_as::<_, CategoryBudget>(
        "UPDATE category_budget_overview \
         SET total_spent_inr = total_spent_inr + $2, \
             remaining_budget_inr = budget_inr - (total_spent_inr + $2) \
         WHERE category = $1 \
         RETURNING *",
    )
    .bind(category)
    .bind(amount_change)
    .fetch_all(executor)
    .await
    .with_context(|| format!("failed to adjust spend for category {category:?}"))?;

    Ok(adjusted)
}

/// Delete a category budget. Returns whether a row was removed.
pub async fn delete_category_budget<'e, E>(executor: E, id: i64) -> Result<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM category_budget_overview WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .context("failed to delete category budget")?;

    Ok(result.rows_affected() > 0)
}
