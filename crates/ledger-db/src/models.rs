use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Direction of a transaction. Only expenses count towards a category's spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TransactionType {
    Expense,
    Income,
}

impl TransactionType {
    pub fn is_expense(self) -> bool {
        matches!(self, Self::Expense)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Expense => "expense",
            Self::Income => "income",
        };
        f.write_str(s)
    }
}

impl FromStr for TransactionType {
    type Err = TransactionTypeParseError;

    /// Case-insensitive: `"Expense"`, `"EXPENSE"` and `"expense"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("expense") {
            Ok(Self::Expense)
        } else if s.eq_ignore_ascii_case("income") {
            Ok(Self::Income)
        } else {
            Err(TransactionTypeParseError(s.to_owned()))
        }
    }
}

impl TryFrom<String> for TransactionType {
    type Error = TransactionTypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Error returned when parsing an invalid [`TransactionType`] string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transaction type: {0:?} (expected expense or income)")]
pub struct TransactionTypeParseError(pub String);

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A category budget with its running spend aggregate.
///
/// `remaining_budget_inr` always equals `budget_inr - total_spent_inr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CategoryBudget {
    pub id: i64,
    pub category: String,
    pub budget_inr: Decimal,
    pub total_spent_inr: Decimal,
    pub remaining_budget_inr: Decimal,
}

/// A single income or expense entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TransactionDetail {
    pub id: i64,
    pub transaction_date: NaiveDate,
    pub category: String,
    pub description: Option<String>,
    pub amount_inr: Decimal,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub location: Option<String>,
}

impl TransactionDetail {
    /// Amount this transaction adds to its category's `total_spent_inr`.
    pub fn contribution(&self) -> Decimal {
        contribution(self.transaction_type, self.amount_inr)
    }
}

/// `amount` for expenses, zero for income.
pub fn contribution(transaction_type: TransactionType, amount: Decimal) -> Decimal {
    if transaction_type.is_expense() {
        amount
    } else {
        Decimal::ZERO
    }
}

// ---------------------------------------------------------------------------
// Payload validation
// ---------------------------------------------------------------------------

/// A caller-supplied payload failed shape or value checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0}")]
    Shape(String),

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: Decimal },

    #[error("{field} allows at most 2 decimal places, got {value}")]
    Precision { field: &'static str, value: Decimal },
}

/// Decimal places stored by the `NUMERIC(14, 2)` money columns.
pub const MONEY_SCALE: u32 = 2;

/// A JSON payload shape that can be validated beyond what serde checks.
pub trait Payload: DeserializeOwned {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Deserialize and validate a JSON payload.
pub fn parse_payload<T: Payload>(value: serde_json::Value) -> Result<T, ValidationError> {
    let parsed: T =
        serde_json::from_value(value).map_err(|e| ValidationError::Shape(e.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

/// Reject amounts the database would silently round. Trailing zeros are fine.
fn whole_paise(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(ValidationError::Precision { field, value });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Category budget payloads
// ---------------------------------------------------------------------------

/// Creation shape for a category budget.
///
/// `remaining_budget_inr` is never accepted from callers; it is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCategoryBudget {
    pub category: String,
    pub budget_inr: Decimal,
    #[serde(default)]
    pub total_spent_inr: Decimal,
}

impl NewCategoryBudget {
    pub fn remaining_budget(&self) -> Decimal {
        self.budget_inr - self.total_spent_inr
    }
}

impl Payload for NewCategoryBudget {
    fn validate(&self) -> Result<(), ValidationError> {
        whole_paise("budget_inr", self.budget_inr)?;
        whole_paise("total_spent_inr", self.total_spent_inr)
    }
}

/// Partial update for a category budget. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryBudgetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_inr: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_spent_inr: Option<Decimal>,
}

impl CategoryBudgetPatch {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.budget_inr.is_none() && self.total_spent_inr.is_none()
    }

    /// Merge the patch over `current`.
    ///
    /// `remaining_budget_inr` is recomputed when either `budget_inr` or
    /// `total_spent_inr` is supplied, using the stored value for whichever
    /// one is not.
    pub fn apply_to(&self, current: &CategoryBudget) -> CategoryBudget {
        let mut merged = current.clone();
        if let Some(category) = &self.category {
            merged.category = category.clone();
        }
        if self.budget_inr.is_some() || self.total_spent_inr.is_some() {
            merged.budget_inr = self.budget_inr.unwrap_or(current.budget_inr);
            merged.total_spent_inr = self.total_spent_inr.unwrap_or(current.total_spent_inr);
            merged.remaining_budget_inr = merged.budget_inr - merged.total_spent_inr;
        }
        merged
    }
}

impl Payload for CategoryBudgetPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(budget) = self.budget_inr {
            whole_paise("budget_inr", budget)?;
        }
        if let Some(spent) = self.total_spent_inr {
            whole_paise("total_spent_inr", spent)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transaction payloads
// ---------------------------------------------------------------------------

/// Creation shape for a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub transaction_date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount_inr: Decimal,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub location: Option<String>,
}

impl Payload for NewTransaction {
    fn validate(&self) -> Result<(), ValidationError> {
        non_negative("amount_inr", self.amount_inr)?;
        whole_paise("amount_inr", self.amount_inr)
    }
}

/// Partial update for a transaction.
///
/// `description` and `location` accept an explicit `null` to clear the
/// stored value; omitting them leaves the value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_inr: Option<Decimal>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<Option<String>>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.transaction_date.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.amount_inr.is_none()
            && self.transaction_type.is_none()
            && self.location.is_none()
    }

    /// Merge the patch over `current`.
    pub fn apply_to(&self, current: &TransactionDetail) -> TransactionDetail {
        TransactionDetail {
            id: current.id,
            transaction_date: self.transaction_date.unwrap_or(current.transaction_date),
            category: self
                .category
                .clone()
                .unwrap_or_else(|| current.category.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            amount_inr: self.amount_inr.unwrap_or(current.amount_inr),
            transaction_type: self.transaction_type.unwrap_or(current.transaction_type),
            location: self
                .location
                .clone()
                .unwrap_or_else(|| current.location.clone()),
        }
    }
}

impl Payload for TransactionPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.amount_inr {
            Some(amount) => {
                non_negative("amount_inr", amount)?;
                whole_paise("amount_inr", amount)
            }
            None => Ok(()),
        }
    }
}
