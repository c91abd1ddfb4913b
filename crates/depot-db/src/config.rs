//! # Engine Configuration
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                    | Default      | Meaning                                  |
//! |-----------------------------|--------------|------------------------------------------|
//! | `DEPOT_DATABASE_PATH`       | `./depot.db` | SQLite file                              |
//! | `DEPOT_MAX_CONNECTIONS`     | `8`          | Pool size                                |
//! | `DEPOT_BUSY_TIMEOUT_MS`     | `5000`       | How long a writer waits for the lock     |
//! | `DEPOT_DEFAULT_POLICY`      | `fifo`       | Allocation order for owners w/o a policy |
//! | `DEPOT_PUTAWAY_MATCH_DATES` | `false`      | Putaway merge also compares lot dates    |
//!
//! Owner rows in `inventory_policies` override the two policy defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use depot_core::AllocationPolicy;

use crate::pool::DbConfig;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Maximum pooled connections (one per concurrent request worker).
    pub max_connections: u32,

    /// Writer lock wait before SQLite reports the row as contended.
    pub busy_timeout_ms: u64,

    /// Ordering for owners without an `inventory_policies` row.
    pub default_policy: AllocationPolicy,

    /// Putaway merge compares rec/prod/exp dates for owners without a row.
    pub putaway_match_dates: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            database_path: PathBuf::from("./depot.db"),
            max_connections: 8,
            busy_timeout_ms: 5000,
            default_policy: AllocationPolicy::Fifo,
            putaway_match_dates: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = EngineConfig::default();

        let config = EngineConfig {
            database_path: env::var("DEPOT_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_var("DEPOT_MAX_CONNECTIONS", defaults.max_connections)?,

            busy_timeout_ms: parse_var("DEPOT_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms)?,

            default_policy: parse_var("DEPOT_DEFAULT_POLICY", defaults.default_policy)?,

            putaway_match_dates: parse_var(
                "DEPOT_PUTAWAY_MATCH_DATES",
                defaults.putaway_match_dates,
            )?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("DEPOT_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Pool settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

/// Policy defaults the engines fall back to when an owner has no
/// `inventory_policies` row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSettings {
    pub default_policy: AllocationPolicy,
    pub putaway_match_dates: bool,
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        EngineSettings {
            default_policy: config.default_policy,
            putaway_match_dates: config.putaway_match_dates,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
