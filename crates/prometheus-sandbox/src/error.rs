//! Error types for the sandbox binary.

/// Top-level error for the sandbox binary.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: prometheus_core::ConfigError,
    },

    /// A registry or lifecycle operation failed.
    #[error("prometheus error: {source}")]
    Prometheus {
        /// The underlying registry error.
        #[from]
        source: prometheus_core::PrometheusError,
    },

    /// A drop rule in the garden content was malformed.
    #[error("drop rule error: {source}")]
    DropRule {
        /// The underlying validation error.
        #[from]
        source: prometheus_types::DropRuleError,
    },

    /// The demo reached a state it does not expect.
    #[error("scenario error: {message}")]
    Scenario {
        /// Description of what went wrong.
        message: String,
    },
}
