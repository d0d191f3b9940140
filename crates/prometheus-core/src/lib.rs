//! Entity registry, lifecycle manager, and evolution engine for Prometheus.
//!
//! Game-world code registers entity *types* (an id, group tags, and a
//! factory) and evolution *conditions* (a predicate plus a target type),
//! then creates, kills, and evolves live instances through a [`Prometheus`]
//! context. Value types shared with callers live in `prometheus-types`.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration ([`PrometheusConfig`])
//! - [`context`] -- The context tying registries and lifecycle together ([`Prometheus`])
//! - [`drops`] -- Drop resolution and the [`DropSink`] callback
//! - [`entity`] -- Entity state, templates, payloads, and [`EntityHandle`]
//! - [`error`] -- Error types for all operations ([`PrometheusError`])
//! - [`evolution`] -- Evolution conditions, their registry, and the [`EvolutionEngine`]
//! - [`lifecycle`] -- Creation, death, and the live-instance index ([`EntityManager`])
//! - [`registrar`] -- Batch registration ([`Registrar`])
//! - [`registry`] -- The entity type registry ([`TypeRegistry`])

pub mod config;
pub mod context;
pub mod drops;
pub mod entity;
pub mod error;
pub mod evolution;
pub mod lifecycle;
pub mod registrar;
pub mod registry;

// Re-export primary types at crate root for convenience.
pub use config::{ConfigError, DuplicatePolicy, PrometheusConfig};
pub use context::Prometheus;
pub use drops::{DropSink, ResolvedDrop, resolve_drops};
pub use entity::{Entity, EntityHandle, EntityPayload, EntityTemplate};
pub use error::PrometheusError;
pub use evolution::{EvolutionCondition, EvolutionDescriptor, EvolutionEngine, EvolutionRegistry, can_evolve};
pub use lifecycle::EntityManager;
pub use registrar::{RegisterKind, Registrar, RegistrationSummary};
pub use registry::{EntityFactory, TypeDescriptor, TypeRegistry};
