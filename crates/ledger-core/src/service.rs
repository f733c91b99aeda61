//! Use-case handlers: one per CRUD operation, each returning a uniform
//! [`Result`] with failures classified into [`LedgerError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use ledger_db::pool;

use crate::entity::{EntityKind, Record};
use crate::error::{LedgerError, Result, classify};
use crate::repository::LedgerRepository;

/// Confirmation returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Clone)]
pub struct LedgerService {
    repo: LedgerRepository,
}

impl LedgerService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: LedgerRepository::new(pool),
        }
    }

    pub fn repository(&self) -> &LedgerRepository {
        &self.repo
    }

    /// Apply schema migrations. Idempotent.
    pub async fn create_tables(&self) -> Result<()> {
        pool::run_migrations(self.repo.pool())
            .await
            .map_err(|e| classify("create tables", e))?;
        info!("ledger tables ready");
        Ok(())
    }

    pub async fn handle_add(&self, kind: EntityKind, payload: Option<Value>) -> Result<Record> {
        let payload = match payload {
            Some(Value::Null) | None => None,
            Some(Value::Object(map)) if map.is_empty() => None,
            Some(other) => Some(other),
        }
        .ok_or_else(|| LedgerError::validation("payload is required for add operation"))?;

        self.repo
            .add(kind, payload)
            .await
            .map_err(|e| classify("add", e))
    }

    pub async fn handle_get_one(&self, kind: EntityKind, id: i64) -> Result<Record> {
        self.repo
            .get_by_id(kind, id)
            .await
            .map_err(|e| classify("get", e))?
            .ok_or_else(|| LedgerError::not_found(format!("{kind} item not found")))
    }

    pub async fn handle_get_all(&self, kind: EntityKind) -> Result<Vec<Record>> {
        self.repo
            .get_all(kind)
            .await
            .map_err(|e| classify("get all", e))
    }

    /// Partially update `id`. A missing row is reported as not found; an
    /// empty patch on an existing row returns it unchanged.
    pub async fn handle_update(&self, kind: EntityKind, id: i64, patch: Value) -> Result<Record> {
        self.repo
            .update(kind, id, patch)
            .await
            .map_err(|e| classify("update", e))?
            .ok_or_else(|| {
                LedgerError::not_found(format!("{kind} item not found or no changes made"))
            })
    }

    pub async fn handle_delete(&self, kind: EntityKind, id: i64) -> Result<DeleteOutcome> {
        let removed = self
            .repo
            .delete(kind, id)
            .await
            .map_err(|e| classify("delete", e))?;
        if !removed {
            return Err(LedgerError::not_found(format!("{kind} item not found")));
        }
        Ok(DeleteOutcome {
            message: format!("{kind} item deleted successfully"),
            id,
        })
    }
}
