//! Per-test PostgreSQL databases for ledger integration tests.
//!
//! The server comes from `LEDGER_TEST_PG_URL` (server root, no database
//! name) when set, otherwise from a `postgres:16` container started once per
//! test binary.

use std::time::Duration;

use sqlx::migrate::MigrateDatabase;
use sqlx::{PgPool, Postgres};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::OnceCell;
use uuid::Uuid;

use ledger_db::pool;

struct TestServer {
    base_url: String,
    _container: Option<ContainerAsync<PostgresImage>>,
}

static SERVER: OnceCell<TestServer> = OnceCell::const_new();

async fn start_server() -> TestServer {
    if let Ok(url) = std::env::var("LEDGER_TEST_PG_URL") {
        return TestServer {
            base_url: url.trim_end_matches('/').to_owned(),
            _container: None,
        };
    }

    let container = PostgresImage::default()
        .with_tag("16")
        .start()
        .await
        .expect("failed to start PostgreSQL container");
    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("container port");

    TestServer {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

async fn database_url(db_name: &str) -> String {
    let server = SERVER.get_or_init(start_server).await;
    format!("{}/{db_name}", server.base_url)
}

/// Create a fresh, migrated `ledger_test_<uuid>` database.
///
/// Returns `(pool, db_name)`; pass `db_name` to [`drop_test_db`] afterwards.
pub async fn create_test_db() -> (PgPool, String) {
    let db_name = format!("ledger_test_{}", Uuid::new_v4().simple());
    let url = database_url(&db_name).await;

    Postgres::create_database(&url)
        .await
        .unwrap_or_else(|e| panic!("failed to create {db_name}: {e}"));
    let pool = pool::connect(&url, Duration::from_secs(30))
        .await
        .unwrap_or_else(|e| panic!("failed to connect to {db_name}: {e:#}"));
    pool::run_migrations(&pool)
        .await
        .expect("migrations should succeed");

    (pool, db_name)
}

/// Drop a database made by [`create_test_db`], closing any leftover sessions.
pub async fn drop_test_db(db_name: &str) {
    let url = database_url(db_name).await;
    let _ = Postgres::force_drop_database(&url).await;
}
