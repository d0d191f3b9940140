//! Evolution: replacing a live entity with an instance of another type.
//!
//! - [`condition`] -- The [`EvolutionCondition`] strategy trait and its descriptor
//! - [`registry`] -- Condition ids mapped to condition factories ([`EvolutionRegistry`])
//! - [`engine`] -- Condition evaluation and the transition itself ([`EvolutionEngine`])

pub mod condition;
pub mod engine;
pub mod registry;

pub use condition::{ConditionFactory, EvolutionCondition, EvolutionDescriptor};
pub use engine::{EvolutionEngine, can_evolve};
pub use registry::EvolutionRegistry;
