//! Shared value types for the Prometheus entity registry.
//!
//! This crate holds the plain data that flows between the registries, the
//! lifecycle manager, and game-world code. It has no knowledge of live
//! entities or of the registries themselves.
//!
//! # Modules
//!
//! - [`ids`] -- UUID newtype identifying live entity instances
//! - [`stats`] -- Numeric stat values, stat blocks, and the [`StatSource`] capability
//! - [`drops`] -- Drop rules ([`EntityDrop`]) and drop tables

pub mod drops;
pub mod ids;
pub mod stats;

// Re-export all public types at crate root for convenience.
pub use drops::{DropRuleError, DropTable, EntityDrop};
pub use ids::InstanceId;
pub use stats::{StatBlock, StatSource, StatValue};
