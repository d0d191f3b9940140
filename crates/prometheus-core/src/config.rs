//! Configuration loading and typed config structures.
//!
//! Configuration is optional: an empty YAML document (or
//! [`PrometheusConfig::default`]) yields a working context that rejects
//! duplicate registrations and seeds drop resolution from the OS.
//!
//! ```yaml
//! registry:
//!   duplicate_policy: reject   # or: overwrite
//! drops:
//!   seed: 42                   # omit for OS-seeded randomness
//! logging:
//!   level: info
//! ```

use std::path::Path;

use serde::Deserialize;

/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "PROMETHEUS_LOG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration for a [`Prometheus`](crate::Prometheus) context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PrometheusConfig {
    /// Registry behavior.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Drop resolution.
    #[serde(default)]
    pub drops: DropsConfig,

    /// Logging configuration (consumed by binaries installing a subscriber).
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PrometheusConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `PROMETHEUS_LOG` overrides `logging.level` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml maps an empty document to unit, not to an empty mapping.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.logging.apply_env_overrides();
        Ok(config)
    }
}

/// What a registry does when an id is registered a second time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first registration and report the duplicate as an error.
    #[default]
    Reject,
    /// Replace the existing registration (last writer wins).
    Overwrite,
}

/// Registry configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RegistryConfig {
    /// Policy shared by the type and evolution registries.
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

/// Drop resolution configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DropsConfig {
    /// Seed for the drop RNG. `None` seeds from the operating system.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LoggingConfig {
    /// Apply the `PROMETHEUS_LOG` override, if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            if !level.trim().is_empty() {
                self.level = level;
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_rejects_duplicates() {
        let config = PrometheusConfig::default();
        assert_eq!(config.registry.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.drops.seed, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
registry:
  duplicate_policy: overwrite
drops:
  seed: 7
";
        let config = PrometheusConfig::parse(yaml).unwrap();
        assert_eq!(config.registry.duplicate_policy, DuplicatePolicy::Overwrite);
        assert_eq!(config.drops.seed, Some(7));
    }

    #[test]
    fn parse_empty_yaml() {
        let config = PrometheusConfig::parse("").unwrap();
        assert_eq!(config.registry, RegistryConfig::default());
        assert_eq!(config.drops, DropsConfig::default());
    }

    #[test]
    fn unknown_policy_is_an_error() {
        let config = PrometheusConfig::parse("registry:\n  duplicate_policy: merge\n");
        assert!(config.is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = PrometheusConfig::from_file(Path::new("/nonexistent/prometheus.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
