//! # Node Configuration
//!
//! TOML configuration for the provider node. Every field has a default, so an
//! empty file (or no file) is a valid configuration for local testing.
//!
//! ```toml
//! [server]
//! identifier = "provider-1"
//! data_dir = "/var/lib/mixnode"
//!
//! [logging]
//! disable = false
//! file = "node.log"        # relative to data_dir
//! level = "NOTICE"         # ERROR | WARNING | NOTICE | INFO | DEBUG
//!
//! [provider]
//! backend = "file"         # file | rocksdb | memory
//! user_db = "users.db"
//! spool = "spool.db"
//! max_username_len = 64
//! queue_capacity = 4096    # omit for an unbounded queue
//!
//! [debug]
//! generate_only = false
//! ```
//!
//! ## Environment Overrides
//!
//! `MX_DATA_DIR`, `MX_LOG_LEVEL` and `MX_IDENTIFIER` replace the matching
//! file values.

use std::fs;
use std::path::{Path, PathBuf};

use mx_01_user_db::UserDbConfig;
use mx_03_provider::{ProviderConfig, QueuePolicy};
use serde::{Deserialize, Serialize};
use shared_types::RECIPIENT_ID_LENGTH;
use thiserror::Error;

use crate::logging::LogLevel;

pub const ENV_DATA_DIR: &str = "MX_DATA_DIR";
pub const ENV_LOG_LEVEL: &str = "MX_LOG_LEVEL";
pub const ENV_IDENTIFIER: &str = "MX_IDENTIFIER";

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub provider: ProviderSection,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Human readable node name, used in logs.
    pub identifier: String,
    /// Keys, databases and (by default) logs live here.
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            identifier: "provider".to_string(),
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Discard all log output.
    pub disable: bool,
    /// Log to this file instead of stderr.
    pub file: Option<PathBuf>,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            disable: false,
            file: None,
            level: "NOTICE".to_string(),
        }
    }
}

/// Storage engine behind the user directory and the spool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Rocksdb,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSection {
    pub backend: StorageBackend,
    pub user_db: PathBuf,
    pub spool: PathBuf,
    pub max_username_len: usize,
    pub queue_capacity: Option<usize>,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            user_db: PathBuf::from("users.db"),
            spool: PathBuf::from("spool.db"),
            max_username_len: RECIPIENT_ID_LENGTH,
            queue_capacity: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebugConfig {
    /// Generate the node keys and exit.
    pub generate_only: bool,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `MX_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.server.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(id) = lookup(ENV_IDENTIFIER) {
            self.server.identifier = id;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.identifier.trim().is_empty() {
            return Err(ConfigError::Invalid("server.identifier is empty".into()));
        }
        if self.server.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("server.data_dir is empty".into()));
        }
        self.logging
            .level
            .parse::<LogLevel>()
            .map_err(ConfigError::Invalid)?;

        let max = self.provider.max_username_len;
        if max == 0 || max > RECIPIENT_ID_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "provider.max_username_len must be in 1..={}, got {}",
                RECIPIENT_ID_LENGTH, max
            )));
        }
        if self.provider.queue_capacity == Some(0) {
            return Err(ConfigError::Invalid(
                "provider.queue_capacity must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Resolve `path` against the data directory unless it is absolute.
    pub fn data_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.server.data_dir.join(path)
        }
    }

    pub fn user_db_config(&self) -> UserDbConfig {
        UserDbConfig {
            max_username_len: self.provider.max_username_len,
        }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::default()
            .with_queue_policy(QueuePolicy::from_capacity(self.provider.queue_capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = NodeConfig::parse("").unwrap();
        assert_eq!(config, NodeConfig::default());
        assert_eq!(config.provider.max_username_len, RECIPIENT_ID_LENGTH);
        assert_eq!(config.provider_config().queue_policy, QueuePolicy::Unbounded);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let config = NodeConfig::parse(
            r#"
            [server]
            identifier = "provider-7"
            data_dir = "/var/lib/mixnode"

            [logging]
            file = "node.log"
            level = "DEBUG"

            [provider]
            backend = "memory"
            max_username_len = 32
            queue_capacity = 128

            [debug]
            generate_only = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.identifier, "provider-7");
        assert_eq!(config.provider.backend, StorageBackend::Memory);
        assert_eq!(config.user_db_config().max_username_len, 32);
        assert_eq!(
            config.provider_config().queue_policy,
            QueuePolicy::Bounded { capacity: 128 }
        );
        assert!(config.debug.generate_only);
        assert_eq!(
            config.data_path(config.logging.file.as_deref().unwrap()),
            PathBuf::from("/var/lib/mixnode/node.log")
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = NodeConfig::parse("[server]\nport = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DATA_DIR, "/tmp/override"),
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_IDENTIFIER, "from-env"),
        ]
        .into_iter()
        .collect();

        let mut config = NodeConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.data_dir, PathBuf::from("/tmp/override"));
        assert_eq!(config.logging.level, "WARNING");
        assert_eq!(config.server.identifier, "from-env");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = NodeConfig::default();
        config.logging.level = "TRACE".into();
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.provider.max_username_len = RECIPIENT_ID_LENGTH + 1;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.provider.queue_capacity = Some(0);
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.server.identifier = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_absolute_paths_kept() {
        let config = NodeConfig::default();
        assert_eq!(
            config.data_path(Path::new("/abs/users.db")),
            PathBuf::from("/abs/users.db")
        );
        assert_eq!(
            config.data_path(Path::new("users.db")),
            PathBuf::from("./data/users.db")
        );
    }
}
