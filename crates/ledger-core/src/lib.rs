//! Budget ledger core: repository, consistency engine, use-case handlers
//! and the tool adapter.

pub mod consistency;
pub mod entity;
pub mod error;
pub mod query;
pub mod repository;
pub mod service;
pub mod tools;

pub use entity::{EntityKind, NewRecord, Record, RecordPatch};
pub use error::{LedgerError, Result};
pub use query::{QueryOperation, QueryRequest};
pub use repository::LedgerRepository;
pub use service::{DeleteOutcome, LedgerService};
pub use tools::{Tool, ToolRegistry, ToolSpec};
