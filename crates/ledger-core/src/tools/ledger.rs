//! The ten ledger tools: five operations for each entity kind.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::Tool;
use crate::entity::EntityKind;
use crate::error::{LedgerError, Result};
use crate::query::to_json;
use crate::service::LedgerService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOperation {
    Add,
    Get,
    GetAll,
    Update,
    Delete,
}

impl ToolOperation {
    pub const ALL: [ToolOperation; 5] = [
        Self::Add,
        Self::Get,
        Self::GetAll,
        Self::Update,
        Self::Delete,
    ];
}

#[derive(Debug, Deserialize)]
struct AddArgs {
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct ItemArgs {
    item_id: i64,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    item_id: i64,
    update_data: Value,
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| LedgerError::validation(format!("invalid arguments for {tool}: {e}")))
}

/// One ledger operation bound to one entity kind.
#[derive(Debug, Clone)]
pub struct LedgerTool {
    service: LedgerService,
    kind: EntityKind,
    operation: ToolOperation,
    name: String,
    description: String,
}

impl LedgerTool {
    pub fn new(service: LedgerService, kind: EntityKind, operation: ToolOperation) -> Self {
        let (singular, plural) = match kind {
            EntityKind::CategoryBudget => ("category_budget", "category_budgets"),
            EntityKind::Transaction => ("transaction", "transactions"),
        };
        let (noun, noun_plural) = match kind {
            EntityKind::CategoryBudget => ("category budget", "category budgets"),
            EntityKind::Transaction => ("transaction", "transactions"),
        };
        let (name, description) = match operation {
            ToolOperation::Add => (
                format!("add_{singular}"),
                format!("Add a new {noun} to {kind}."),
            ),
            ToolOperation::Get => (
                format!("get_{singular}"),
                format!("Get a single {noun} by id."),
            ),
            ToolOperation::GetAll => (
                format!("get_all_{plural}"),
                format!("List all {noun_plural}."),
            ),
            ToolOperation::Update => (
                format!("update_{singular}"),
                format!("Partially update a {noun} by id."),
            ),
            ToolOperation::Delete => (
                format!("delete_{singular}"),
                format!("Delete a {noun} by id."),
            ),
        };
        Self {
            service,
            kind,
            operation,
            name,
            description,
        }
    }

    /// All ten ledger tools backed by `service`.
    pub fn all(service: &LedgerService) -> Vec<LedgerTool> {
        EntityKind::ALL
            .into_iter()
            .flat_map(|kind| {
                ToolOperation::ALL
                    .into_iter()
                    .map(move |op| LedgerTool::new(service.clone(), kind, op))
            })
            .collect()
    }

    fn record_schema(&self) -> Value {
        match self.kind {
            EntityKind::CategoryBudget => json!({
                "type": "object",
                "properties": {
                    "category": { "type": "string" },
                    "budget_inr": { "type": "number" },
                    "total_spent_inr": { "type": "number" }
                }
            }),
            EntityKind::Transaction => json!({
                "type": "object",
                "properties": {
                    "transaction_date": { "type": "string", "format": "date" },
                    "category": { "type": "string" },
                    "description": { "type": ["string", "null"] },
                    "amount_inr": { "type": "number", "minimum": 0 },
                    "type": { "type": "string", "enum": ["expense", "income"] },
                    "location": { "type": ["string", "null"] }
                }
            }),
        }
    }

    async fn run(&self, args: Value) -> Result<Value> {
        match self.operation {
            ToolOperation::Add => {
                let args: AddArgs = parse_args(&self.name, args)?;
                to_json(self.service.handle_add(self.kind, Some(args.payload)).await?)
            }
            ToolOperation::Get => {
                let args: ItemArgs = parse_args(&self.name, args)?;
                to_json(self.service.handle_get_one(self.kind, args.item_id).await?)
            }
            ToolOperation::GetAll => to_json(self.service.handle_get_all(self.kind).await?),
            ToolOperation::Update => {
                let args: UpdateArgs = parse_args(&self.name, args)?;
                to_json(
                    self.service
                        .handle_update(self.kind, args.item_id, args.update_data)
                        .await?,
                )
            }
            ToolOperation::Delete => {
                let args: ItemArgs = parse_args(&self.name, args)?;
                to_json(self.service.handle_delete(self.kind, args.item_id).await?)
            }
        }
    }
}

#[async_trait]
impl Tool for LedgerTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        let item_id = json!({ "type": "integer", "description": "Row id" });
        match self.operation {
            ToolOperation::Add => {
                let mut payload = self.record_schema();
                payload["required"] = match self.kind {
                    EntityKind::CategoryBudget => json!(["category", "budget_inr"]),
                    EntityKind::Transaction => {
                        json!(["transaction_date", "category", "amount_inr", "type"])
                    }
                };
                json!({
                    "type": "object",
                    "properties": { "payload": payload },
                    "required": ["payload"]
                })
            }
            ToolOperation::Get | ToolOperation::Delete => json!({
                "type": "object",
                "properties": { "item_id": item_id },
                "required": ["item_id"]
            }),
            ToolOperation::GetAll => json!({ "type": "object", "properties": {} }),
            ToolOperation::Update => json!({
                "type": "object",
                "properties": {
                    "item_id": item_id,
                    "update_data": self.record_schema()
                },
                "required": ["item_id", "update_data"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<Value> {
        info!(tool = %self.name, %args, "calling tool");
        let result = self.run(args).await;
        match &result {
            Ok(_) => info!(tool = %self.name, "tool succeeded"),
            Err(e) => warn!(tool = %self.name, error = %e, "tool failed"),
        }
        result
    }
}
