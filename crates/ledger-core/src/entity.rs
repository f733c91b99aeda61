//! Entity-kind selector and the per-kind tagged unions that flow through the
//! repository and use-case layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ledger_db::models::{
    CategoryBudget, CategoryBudgetPatch, NewCategoryBudget, NewTransaction, TransactionDetail,
    TransactionPatch, ValidationError, parse_payload,
};

/// The two ledger tables. Serialized as their table names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "category_budget_overview")]
    CategoryBudget,
    #[serde(rename = "transaction_details")]
    Transaction,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [Self::CategoryBudget, Self::Transaction];

    pub fn table_name(self) -> &'static str {
        match self {
            Self::CategoryBudget => "category_budget_overview",
            Self::Transaction => "transaction_details",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for EntityKind {
    type Err = EntityKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category_budget_overview" => Ok(Self::CategoryBudget),
            "transaction_details" => Ok(Self::Transaction),
            other => Err(EntityKindParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an unknown table name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown table: {0:?} (expected category_budget_overview or transaction_details)")]
pub struct EntityKindParseError(pub String);

// ---------------------------------------------------------------------------

/// A persisted row of either kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    CategoryBudget(CategoryBudget),
    Transaction(TransactionDetail),
}

impl Record {
    pub fn id(&self) -> i64 {
        match self {
            Self::CategoryBudget(b) => b.id,
            Self::Transaction(t) => t.id,
        }
    }

    pub fn as_category_budget(&self) -> Option<&CategoryBudget> {
        match self {
            Self::CategoryBudget(b) => Some(b),
            Self::Transaction(_) => None,
        }
    }

    pub fn as_transaction(&self) -> Option<&TransactionDetail> {
        match self {
            Self::Transaction(t) => Some(t),
            Self::CategoryBudget(_) => None,
        }
    }
}

impl From<CategoryBudget> for Record {
    fn from(b: CategoryBudget) -> Self {
        Self::CategoryBudget(b)
    }
}

impl From<TransactionDetail> for Record {
    fn from(t: TransactionDetail) -> Self {
        Self::Transaction(t)
    }
}

/// A validated creation payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NewRecord {
    CategoryBudget(NewCategoryBudget),
    Transaction(NewTransaction),
}

impl NewRecord {
    /// Validate `payload` against the creation shape of `kind`.
    pub fn parse(kind: EntityKind, payload: Value) -> Result<Self, ValidationError> {
        Ok(match kind {
            EntityKind::CategoryBudget => Self::CategoryBudget(parse_payload(payload)?),
            EntityKind::Transaction => Self::Transaction(parse_payload(payload)?),
        })
    }
}

/// A validated partial update.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPatch {
    CategoryBudget(CategoryBudgetPatch),
    Transaction(TransactionPatch),
}

impl RecordPatch {
    pub fn parse(kind: EntityKind, payload: Value) -> Result<Self, ValidationError> {
        Ok(match kind {
            EntityKind::CategoryBudget => Self::CategoryBudget(parse_payload(payload)?),
            EntityKind::Transaction => Self::Transaction(parse_payload(payload)?),
        })
    }
}
