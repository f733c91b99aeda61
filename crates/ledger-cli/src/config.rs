//! Configuration file management for ledger.
//!
//! Provides a TOML-based config file at `~/.config/ledger/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ledger_db::config::DbConfig;

pub const BIND_ENV_VAR: &str = "LEDGER_BIND";
pub const PORT_ENV_VAR: &str = "LEDGER_PORT";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind: String,
    pub port: u16,
}

impl ServerSection {
    pub const DEFAULT_BIND: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8080;
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: Self::DEFAULT_BIND.to_owned(),
            port: Self::DEFAULT_PORT,
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the ledger config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/ledger` or `~/.config/ledger`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("ledger");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ledger")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct LedgerConfig {
    pub db_config: DbConfig,
    pub server: ServerSection,
}

impl LedgerConfig {
    /// Resolve the database URL:
    /// `cli_db_url` > `LEDGER_DATABASE_URL` > `config_file.database.url` > `DbConfig::DEFAULT_URL`.
    ///
    /// Server settings resolve the same way through `LEDGER_BIND` /
    /// `LEDGER_PORT` and the `[server]` section; CLI overrides for them are
    /// applied with [`LedgerConfig::with_server_overrides`].
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_owned()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_owned()
        };

        let file_server = file_config.map(|cfg| cfg.server).unwrap_or_default();
        let bind = std::env::var(BIND_ENV_VAR).unwrap_or(file_server.bind);
        let port = match std::env::var(PORT_ENV_VAR) {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("{PORT_ENV_VAR} is not a valid port: {raw:?}"))?,
            Err(_) => file_server.port,
        };

        Ok(Self {
            db_config: DbConfig::new(db_url),
            server: ServerSection { bind, port },
        })
    }

    pub fn with_server_overrides(mut self, bind: Option<String>, port: Option<u16>) -> Self {
        if let Some(bind) = bind {
            self.server.bind = bind;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
