use std::env;

/// Database configuration.
///
/// Reads from the `LEDGER_DATABASE_URL` environment variable, falling back to
/// `postgresql://localhost:5432/ledger` when unset.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// The default connection URL used when no environment variable is set.
    pub const DEFAULT_URL: &'static str = "postgresql://localhost:5432/ledger";

    /// Environment variable consulted by [`DbConfig::from_env`].
    pub const ENV_VAR: &'static str = "LEDGER_DATABASE_URL";

    /// Build a config from the environment.
    pub fn from_env() -> Self {
        let database_url =
            env::var(Self::ENV_VAR).unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        Self { database_url }
    }

    /// Build a config from an explicit URL (tests and CLI flags).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Extract the database name from the URL.
    ///
    /// Returns `None` if the URL has no path component. Query strings such as
    /// `?sslmode=require` are stripped.
    pub fn database_name(&self) -> Option<&str> {
        self.database_url
            .rsplit('/')
            .next()
            .map(|s| s.split('?').next().unwrap_or(s))
            .filter(|s| !s.is_empty() && !s.contains(':') && !s.contains('@'))
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
