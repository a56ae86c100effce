//! Checker configuration (the `[checker]` table of tenecs.toml)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// How declarations are checked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Check declarations on worker threads
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Upper bound on concurrently running declaration workers
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-declaration wait before reporting a timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Stop at the first declaration error
    #[serde(default)]
    pub fail_fast: bool,

    /// Default tracing filter for the CLI
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_parallel() -> bool {
    true
}

fn default_max_workers() -> usize {
    num_cpus::get()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            max_workers: default_max_workers(),
            timeout_ms: default_timeout_ms(),
            fail_fast: false,
            log_level: default_log_level(),
        }
    }
}

/// Top level of tenecs.toml; other tables are ignored
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    checker: Option<CheckerConfig>,
}

impl CheckerConfig {
    /// Sequential checking, for tests and embedders
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse the `[checker]` table; a missing table yields the defaults
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        let config = file.checker.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::ValidationError("max_workers must be at least 1".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ValidationError("timeout_ms must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CheckerConfig::default();
        assert!(config.parallel);
        assert!(config.max_workers >= 1);
        assert_eq!(config.timeout_ms, 5000);
        assert!(!config.fail_fast);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_missing_table_uses_defaults() {
        let config = CheckerConfig::from_str("[other]\nkey = 1\n").unwrap();
        assert_eq!(config, CheckerConfig::default());
    }

    #[test]
    fn test_partial_table() {
        let config = CheckerConfig::from_str("[checker]\nparallel = false\ntimeout_ms = 250\n").unwrap();
        assert!(!config.parallel);
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = CheckerConfig::from_str("[checker]\nmax_workers = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_bad_toml() {
        let err = CheckerConfig::from_str("[checker\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
