//! Budget consistency engine.
//!
//! Keeps each category budget's `total_spent_inr` / `remaining_budget_inr`
//! in step with the expense rows attributed to it. Every adjustment runs on
//! the caller's connection so it commits or rolls back together with the
//! transaction write that triggered it.

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::{debug, info, warn};

use ledger_db::models::{CategoryBudget, TransactionDetail};
use ledger_db::queries::category_budgets;

/// A signed change to one category's spend.
///
/// Positive when an expense is added or grows, negative when one is removed
/// or shrinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendAdjustment {
    pub category: String,
    pub amount_change: Decimal,
}

impl SpendAdjustment {
    fn new(category: &str, amount_change: Decimal) -> Option<Self> {
        (!amount_change.is_zero()).then(|| Self {
            category: category.to_owned(),
            amount_change,
        })
    }
}

/// Adjustment for a newly inserted transaction.
pub fn adjustment_for_insert(inserted: &TransactionDetail) -> Option<SpendAdjustment> {
    SpendAdjustment::new(&inserted.category, inserted.contribution())
}

/// Adjustment reversing a deleted transaction.
pub fn adjustment_for_delete(deleted: &TransactionDetail) -> Option<SpendAdjustment> {
    SpendAdjustment::new(&deleted.category, -deleted.contribution())
}

/// Adjustments for a transaction that changed from `old` to `new`.
///
/// A category change targets two different rows, so it yields a reversal on
/// the old category and an application on the new one. Otherwise a single
/// net delta is produced (or none, when the contribution is unchanged).
pub fn adjustments_for_update(
    old: &TransactionDetail,
    new: &TransactionDetail,
) -> Vec<SpendAdjustment> {
    let old_contribution = old.contribution();
    let new_contribution = new.contribution();

    if old.category != new.category {
        SpendAdjustment::new(&old.category, -old_contribution)
            .into_iter()
            .chain(SpendAdjustment::new(&new.category, new_contribution))
            .collect()
    } else {
        SpendAdjustment::new(&new.category, new_contribution - old_contribution)
            .into_iter()
            .collect()
    }
}

/// Apply `amount_change` to every budget named `category`.
///
/// An unknown category is a silent no-op: the spend is not recorded
/// anywhere and no error is raised. It is logged at `warn` so the lost
/// attribution is at least visible.
pub async fn apply_spend_delta(
    conn: &mut PgConnection,
    category: &str,
    amount_change: Decimal,
) -> Result<Vec<CategoryBudget>> {
    debug!(category, %amount_change, "adjusting category spend");
    let adjusted = category_budgets::apply_spend_delta(&mut *conn, category, amount_change).await?;

    if adjusted.is_empty() {
        warn!(
            category,
            %amount_change,
            "no category budget matches; spend not attributed"
        );
    }
    for budget in &adjusted {
        info!(
            id = budget.id,
            category,
            total_spent_inr = %budget.total_spent_inr,
            remaining_budget_inr = %budget.remaining_budget_inr,
            "updated category budget"
        );
    }
    Ok(adjusted)
}

/// Adjustments sorted by category.
///
/// Every writer takes budget row locks in this order, so two transactions
/// moving spend between the same categories in opposite directions queue
/// behind each other instead of deadlocking.
fn lock_order(adjustments: &[SpendAdjustment]) -> Vec<&SpendAdjustment> {
    let mut ordered: Vec<&SpendAdjustment> = adjustments.iter().collect();
    ordered.sort_by(|a, b| a.category.cmp(&b.category));
    ordered
}

/// Apply every adjustment on `conn`, in category order.
pub async fn apply_adjustments(
    conn: &mut PgConnection,
    adjustments: &[SpendAdjustment],
) -> Result<()> {
    for adj in lock_order(adjustments) {
        apply_spend_delta(conn, &adj.category, adj.amount_change).await?;
    }
    Ok(())
}
