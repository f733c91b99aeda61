//! Single-endpoint query envelope.
//!
//! `{ "table": ..., "query_type": ..., "payload": ... }` is routed to the
//! matching [`LedgerService`] handler and the result rendered as JSON.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::entity::EntityKind;
use crate::error::{LedgerError, Result};
use crate::service::LedgerService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOperation {
    CreateTables,
    Add,
    GetOne,
    GetAll,
    Update,
    Delete,
}

impl fmt::Display for QueryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CreateTables => "create_tables",
            Self::Add => "add",
            Self::GetOne => "get_one",
            Self::GetAll => "get_all",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub table: Option<EntityKind>,
    pub query_type: QueryOperation,
    #[serde(default)]
    pub payload: Option<Value>,
}

impl QueryRequest {
    fn require_table(&self) -> Result<EntityKind> {
        self.table.ok_or_else(|| {
            LedgerError::validation(format!("table is required for {} operation", self.query_type))
        })
    }

    fn payload_field(&self, field: &str) -> Option<&Value> {
        self.payload.as_ref()?.get(field)
    }

    fn require_id(&self) -> Result<i64> {
        let value = self.payload_field("id").ok_or_else(|| {
            LedgerError::validation(format!("id is required for {} operation", self.query_type))
        })?;
        value
            .as_i64()
            .ok_or_else(|| LedgerError::validation(format!("id must be an integer, got {value}")))
    }
}

impl LedgerService {
    /// Execute one query envelope.
    ///
    /// Results are `{"message": ...}` for `create_tables`, a record for
    /// `add`/`get_one`/`update`, an array for `get_all`, and the delete
    /// confirmation for `delete`.
    pub async fn dispatch(&self, request: QueryRequest) -> Result<Value> {
        tracing::debug!(
            query_type = %request.query_type,
            table = ?request.table,
            "dispatching query"
        );

        let value = match request.query_type {
            QueryOperation::CreateTables => {
                self.create_tables().await?;
                json!({ "message": "Tables created successfully" })
            }
            QueryOperation::Add => {
                let kind = request.require_table()?;
                to_json(self.handle_add(kind, request.payload).await?)?
            }
            QueryOperation::GetOne => {
                let kind = request.require_table()?;
                let id = request.require_id()?;
                to_json(self.handle_get_one(kind, id).await?)?
            }
            QueryOperation::GetAll => {
                let kind = request.require_table()?;
                to_json(self.handle_get_all(kind).await?)?
            }
            QueryOperation::Update => {
                let kind = request.require_table()?;
                let id = request.require_id()?;
                let patch = request
                    .payload_field("update_data")
                    .cloned()
                    .ok_or_else(|| {
                        LedgerError::validation("update_data is required for update operation")
                    })?;
                to_json(self.handle_update(kind, id, patch).await?)?
            }
            QueryOperation::Delete => {
                let kind = request.require_table()?;
                let id = request.require_id()?;
                to_json(self.handle_delete(kind, id).await?)?
            }
        };
        Ok(value)
    }
}

pub(crate) fn to_json(value: impl Serialize) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| LedgerError::OperationFailed {
        operation: "serialize",
        source: e.into(),
    })
}
