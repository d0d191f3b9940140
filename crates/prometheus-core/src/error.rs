//! Error types for the `prometheus-core` crate.
//!
//! Structural misuse (unknown ids, double kills, malformed registrations)
//! is reported through [`PrometheusError`]. "Cannot evolve right now" is not
//! an error: the evolution engine reports it as `Ok(None)`.

use prometheus_types::{DropRuleError, InstanceId};

/// Errors raised by the registries, the lifecycle manager, and the context.
#[derive(Debug, thiserror::Error)]
pub enum PrometheusError {
    /// The process-wide context was requested before [`init`](crate::Prometheus::init).
    #[error("prometheus is not initialized")]
    NotInitialized,

    /// [`init`](crate::Prometheus::init) was called more than once.
    #[error("prometheus is already initialized")]
    AlreadyInitialized,

    /// No entity type is registered under this id.
    #[error("no entity found for registry id: {0}")]
    UnknownType(String),

    /// No evolution condition is registered under this id.
    #[error("no evolution condition found for id: {0}")]
    UnknownEvolution(String),

    /// The entity was killed twice.
    #[error("entity {0} is already dead")]
    AlreadyDead(InstanceId),

    /// A type id was registered twice while duplicates are rejected.
    #[error("entity type already registered: {0}")]
    DuplicateType(String),

    /// An evolution id was registered twice while duplicates are rejected.
    #[error("evolution condition already registered: {0}")]
    DuplicateEvolution(String),

    /// A descriptor or entity operation received a malformed argument.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Description of what was rejected.
        reason: String,
    },

    /// A drop rule failed validation.
    #[error("invalid drop rule: {source}")]
    InvalidDrop {
        /// The underlying validation error.
        #[from]
        source: DropRuleError,
    },
}

impl PrometheusError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}
