use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::migrate::MigrateDatabase;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use tracing::info;

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/ledger-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Tables owned by the ledger, in creation order.
pub const LEDGER_TABLES: [&str; 2] = ["category_budget_overview", "transaction_details"];

/// Upper bound on concurrent ledger operations per process.
pub const MAX_CONNECTIONS: u32 = 5;

/// Connect to the configured ledger database.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    connect(&config.database_url, Duration::from_secs(10)).await
}

/// Open a pool of [`MAX_CONNECTIONS`] on `url`.
pub async fn connect(url: &str, acquire_timeout: Duration) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(acquire_timeout)
        .connect(url)
        .await
        .context("failed to connect to ledger database")
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    info!("migrations applied successfully");
    Ok(())
}

/// Create the configured database if it does not exist yet.
///
/// Returns `true` when the database was created by this call.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let db_name = config
        .database_name()
        .context("database URL does not name a database")?;
    let url = &config.database_url;

    if Postgres::database_exists(url)
        .await
        .with_context(|| format!("failed to check whether database {db_name} exists"))?
    {
        info!(db = db_name, "database already exists");
        return Ok(false);
    }

    Postgres::create_database(url)
        .await
        .with_context(|| format!("failed to create database {db_name}"))?;
    info!(db = db_name, "database created");
    Ok(true)
}

/// Row count of each ledger table, for `ledger db-init` output.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(LEDGER_TABLES.len());
    for table in LEDGER_TABLES {
        // Fixed identifiers; tables cannot be bound as parameters.
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((table, count));
    }
    Ok(counts)
}
