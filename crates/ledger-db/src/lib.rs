//! Ledger store: PostgreSQL schema, connection pool, row models, and the
//! query primitives for category budgets and transactions.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
