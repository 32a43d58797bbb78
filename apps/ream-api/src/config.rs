//! # API Configuration
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults (serde default fns)                                        │
//! │  2. TOML file at $REAM_CONFIG (skipped if unset or missing)             │
//! │  3. REAM_* environment variables                                        │
//! │  4. validate()                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Config File
//! ```toml
//! [server]
//! bind_addr = "127.0.0.1:8080"
//!
//! [database]
//! path = "/var/lib/ream/ream.db"
//! max_connections = 5
//!
//! [inventory]
//! max_write_retries = 3
//! initial_backoff_ms = 10
//! max_backoff_ms = 200
//! delivery_days = 3
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ream_core::MAX_DELIVERY_DAYS;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "REAM_CONFIG";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path, or `:memory:`.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("ream.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Stock and order behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Retries after a compare-and-set write finds the rows changed.
    #[serde(default = "default_max_write_retries")]
    pub max_write_retries: u32,

    /// First retry delay (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound on a retry delay (milliseconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Days between order creation and the delivery date.
    #[serde(default = "default_delivery_days")]
    pub delivery_days: u32,
}

fn default_max_write_retries() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    10
}

fn default_max_backoff() -> u64 {
    200
}

fn default_delivery_days() -> u32 {
    ream_core::DEFAULT_DELIVERY_DAYS
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            max_write_retries: default_max_write_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            delivery_days: default_delivery_days(),
        }
    }
}

impl InventorySettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

// =============================================================================
// ApiConfig
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub inventory: InventorySettings,
}

impl ApiConfig {
    /// Loads configuration from file, environment, and defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads configuration using the path in `$REAM_CONFIG`.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        Self::load(std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
    }

    /// Parses a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.inventory.delivery_days == 0 {
            return Err(ConfigError::InvalidValue(
                "inventory.delivery_days must be greater than 0".into(),
            ));
        }

        if self.inventory.delivery_days > MAX_DELIVERY_DAYS {
            return Err(ConfigError::InvalidValue(format!(
                "inventory.delivery_days must not exceed {MAX_DELIVERY_DAYS}"
            )));
        }

        if self.inventory.initial_backoff_ms > self.inventory.max_backoff_ms {
            return Err(ConfigError::InvalidValue(
                "inventory.initial_backoff_ms must not exceed max_backoff_ms".into(),
            ));
        }

        Ok(())
    }

    /// Applies `REAM_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparsable values are ignored
    /// with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("REAM_BIND_ADDR") {
            debug!(bind_addr = %addr, "Overriding bind address from environment");
            self.server.bind_addr = addr;
        }

        if let Some(path) = lookup("REAM_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        override_parsed(&lookup, "REAM_DB_MAX_CONNECTIONS", &mut self.database.max_connections);
        override_parsed(&lookup, "REAM_MAX_WRITE_RETRIES", &mut self.inventory.max_write_retries);
        override_parsed(&lookup, "REAM_DELIVERY_DAYS", &mut self.inventory.delivery_days);
    }
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    let Some(raw) = lookup(key) else {
        return;
    };

    match raw.parse() {
        Ok(value) => {
            debug!(key, value = %raw, "Overriding setting from environment");
            *target = value;
        }
        Err(_) => warn!(key, value = %raw, "Ignoring unparsable environment override"),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.database.path, PathBuf::from("ream.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.inventory.max_write_retries, 3);
        assert_eq!(config.inventory.delivery_days, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ApiConfig::from_toml(
            r#"
            [inventory]
            delivery_days = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.inventory.delivery_days, 5);
        assert_eq!(config.inventory.max_backoff_ms, 200);
        assert_eq!(config.server, ServerSettings::default());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("REAM_BIND_ADDR", "127.0.0.1:9000"),
            ("REAM_DB_MAX_CONNECTIONS", "8"),
            ("REAM_DELIVERY_DAYS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = ApiConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.inventory.delivery_days, 3);
    }

    #[test]
    fn test_validation() {
        let mut config = ApiConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = ApiConfig::default();
        config.inventory.delivery_days = 0;
        assert!(config.validate().is_err());

        config.inventory.delivery_days = MAX_DELIVERY_DAYS;
        assert!(config.validate().is_ok());

        config.inventory.delivery_days = MAX_DELIVERY_DAYS + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(msg)) if msg.contains("delivery_days")
        ));

        // An environment override is held to the same bound.
        let mut config = ApiConfig::default();
        config.apply_overrides(|key| {
            (key == "REAM_DELIVERY_DAYS").then(|| "1000000000".to_string())
        });
        assert_eq!(config.inventory.delivery_days, 1_000_000_000);
        assert!(config.validate().is_err());

        assert!(ApiConfig::from_toml("[server]\nbind_addr = 5").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ApiConfig::load(Some(PathBuf::from("/nonexistent/ream.toml")));
        // Env overrides may apply, but loading never fails on a missing file.
        assert!(config.is_ok());
    }
}
