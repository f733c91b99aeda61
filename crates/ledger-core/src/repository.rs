//! Typed CRUD over the ledger tables.
//!
//! Each mutating call opens one database transaction and commits it only
//! after the row write and any spend adjustment succeeded. On every error
//! path the `sqlx::Transaction` is dropped uncommitted and rolls back.

use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, info, warn};

use ledger_db::models::{
    CategoryBudget, CategoryBudgetPatch, NewCategoryBudget, NewTransaction, TransactionDetail,
    TransactionPatch,
};
use ledger_db::queries::{category_budgets, transactions};

use crate::consistency;
use crate::entity::{EntityKind, NewRecord, Record, RecordPatch};

/// CRUD primitives for both entity kinds, sharing one connection pool.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // -----------------------------------------------------------------------
    // Kind-parameterized entry points
    // -----------------------------------------------------------------------

    /// Validate `payload` against the creation shape of `kind` and insert it.
    pub async fn add(&self, kind: EntityKind, payload: Value) -> Result<Record> {
        debug!(table = %kind, %payload, "adding item");
        let record = match NewRecord::parse(kind, payload)? {
            NewRecord::CategoryBudget(new) => self.add_category_budget(&new).await?.into(),
            NewRecord::Transaction(new) => self.add_transaction(&new).await?.into(),
        };
        Ok(record)
    }

    pub async fn get_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Record>> {
        let record = match kind {
            EntityKind::CategoryBudget => self.get_category_budget(id).await?.map(Record::from),
            EntityKind::Transaction => self.get_transaction(id).await?.map(Record::from),
        };
        if record.is_none() {
            warn!(table = %kind, id, "item not found");
        }
        Ok(record)
    }

    pub async fn get_all(&self, kind: EntityKind) -> Result<Vec<Record>> {
        let records: Vec<Record> = match kind {
            EntityKind::CategoryBudget => self
                .list_category_budgets()
                .await?
                .into_iter()
                .map(Record::from)
                .collect(),
            EntityKind::Transaction => self
                .list_transactions()
                .await?
                .into_iter()
                .map(Record::from)
                .collect(),
        };
        info!(table = %kind, count = records.len(), "retrieved items");
        Ok(records)
    }

    /// Apply a partial update. `None` when no row has `id`.
    pub async fn update(&self, kind: EntityKind, id: i64, patch: Value) -> Result<Option<Record>> {
        debug!(table = %kind, id, %patch, "updating item");
        let record = match RecordPatch::parse(kind, patch)? {
            RecordPatch::CategoryBudget(p) => {
                self.update_category_budget(id, &p).await?.map(Record::from)
            }
            RecordPatch::Transaction(p) => self.update_transaction(id, &p).await?.map(Record::from),
        };
        Ok(record)
    }

    /// Delete a row. Returns whether one was removed.
    pub async fn delete(&self, kind: EntityKind, id: i64) -> Result<bool> {
        match kind {
            EntityKind::CategoryBudget => self.delete_category_budget(id).await,
            EntityKind::Transaction => self.delete_transaction(id).await,
        }
    }

    // -----------------------------------------------------------------------
    // Category budgets
    // -----------------------------------------------------------------------

    pub async fn add_category_budget(&self, new: &NewCategoryBudget) -> Result<CategoryBudget> {
        let budget = category_budgets::insert_category_budget(&self.pool, new).await?;
        info!(
            id = budget.id,
            category = %budget.category,
            remaining_budget_inr = %budget.remaining_budget_inr,
            "added category budget"
        );
        Ok(budget)
    }

    pub async fn get_category_budget(&self, id: i64) -> Result<Option<CategoryBudget>> {
        category_budgets::get_category_budget(&self.pool, id).await
    }

    pub async fn list_category_budgets(&self) -> Result<Vec<CategoryBudget>> {
        category_budgets::list_category_budgets(&self.pool).await
    }

    /// Partially update a category budget, recomputing `remaining_budget_inr`
    /// when `budget_inr` or `total_spent_inr` is supplied.
    ///
    /// An empty patch returns the stored row without writing.
    pub async fn update_category_budget(
        &self,
        id: i64,
        patch: &CategoryBudgetPatch,
    ) -> Result<Option<CategoryBudget>> {
        if patch.is_empty() {
            return self.get_category_budget(id).await;
        }

        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        let Some(current) = category_budgets::get_category_budget_for_update(&mut *tx, id).await?
        else {
            warn!(id, "category budget not found for update");
            return Ok(None);
        };

        let merged = patch.apply_to(&current);
        let updated = category_budgets::write_category_budget(&mut *tx, &merged).await?;

        tx.commit().await.context("failed to commit transaction")?;

        if let Some(budget) = &updated {
            info!(
                id,
                category = %budget.category,
                remaining_budget_inr = %budget.remaining_budget_inr,
                "updated category budget"
            );
        }
        Ok(updated)
    }

    /// Delete a category budget. Transactions that reference its category are
    /// left in place.
    pub async fn delete_category_budget(&self, id: i64) -> Result<bool> {
        let removed = category_budgets::delete_category_budget(&self.pool, id).await?;
        info!(id, removed, "deleted category budget");
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Insert a transaction and, for an expense, add its amount to the
    /// matching category budget in the same database transaction.
    pub async fn add_transaction(&self, new: &NewTransaction) -> Result<TransactionDetail> {
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        let inserted = transactions::insert_transaction(&mut *tx, new).await?;
        if let Some(adj) = consistency::adjustment_for_insert(&inserted) {
            consistency::apply_adjustments(&mut tx, &[adj]).await?;
        }

        tx.commit().await.context("failed to commit transaction")?;

        info!(
            id = inserted.id,
            category = %inserted.category,
            amount_inr = %inserted.amount_inr,
            r#type = %inserted.transaction_type,
            "added transaction"
        );
        Ok(inserted)
    }

    pub async fn get_transaction(&self, id: i64) -> Result<Option<TransactionDetail>> {
        transactions::get_transaction(&self.pool, id).await
    }

    pub async fn list_transactions(&self) -> Result<Vec<TransactionDetail>> {
        transactions::list_transactions(&self.pool).await
    }

    /// Partially update a transaction and move its spend contribution.
    ///
    /// The previous row is locked for the duration so the delta is computed
    /// against the value actually being replaced. An empty patch returns the
    /// stored row without writing.
    pub async fn update_transaction(
        &self,
        id: i64,
        patch: &TransactionPatch,
    ) -> Result<Option<TransactionDetail>> {
        if patch.is_empty() {
            return self.get_transaction(id).await;
        }

        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        let Some(old) = transactions::get_transaction_for_update(&mut *tx, id).await? else {
            warn!(id, "transaction not found for update");
            return Ok(None);
        };

        let merged = patch.apply_to(&old);
        let Some(updated) = transactions::write_transaction(&mut *tx, &merged).await? else {
            return Ok(None);
        };

        let adjustments = consistency::adjustments_for_update(&old, &updated);
        consistency::apply_adjustments(&mut tx, &adjustments).await?;

        tx.commit().await.context("failed to commit transaction")?;

        info!(id, adjustments = adjustments.len(), "updated transaction");
        Ok(Some(updated))
    }

    /// Delete a transaction and, for an expense, reverse its contribution.
    pub async fn delete_transaction(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        let Some(existing) = transactions::get_transaction_for_update(&mut *tx, id).await? else {
            warn!(id, "transaction not found for delete");
            return Ok(false);
        };

        let removed = transactions::delete_transaction(&mut *tx, id).await?;
        if removed {
            if let Some(adj) = consistency::adjustment_for_delete(&existing) {
                consistency::apply_adjustments(&mut tx, &[adj]).await?;
            }
        }

        tx.commit().await.context("failed to commit transaction")?;

        info!(id, removed, "deleted transaction");
        Ok(removed)
    }
}
