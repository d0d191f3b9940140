//! Evolution conditions and their descriptors.

use std::sync::Arc;

use crate::entity::Entity;
use crate::error::PrometheusError;

/// A predicate plus a target type.
///
/// Conditions are stateless strategy objects: the registry builds a fresh
/// one for every evaluation.
pub trait EvolutionCondition: Send + Sync {
    /// Whether `entity` may evolve right now.
    fn can_evolve(&self, entity: &Entity) -> bool;

    /// Type id of the successor. `None` disables the evolution.
    fn target_type(&self) -> Option<&str>;
}

/// Factory producing a fresh condition for each evaluation.
pub type ConditionFactory = Arc<dyn Fn() -> Box<dyn EvolutionCondition> + Send + Sync>;

/// Registration record for an evolution condition.
#[derive(Clone)]
pub struct EvolutionDescriptor {
    id: Arc<str>,
    factory: ConditionFactory,
}

impl EvolutionDescriptor {
    /// Build a descriptor from a factory returning a concrete condition.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::InvalidArgument`] if `id` is blank.
    pub fn new<C, F>(id: impl Into<String>, factory: F) -> Result<Self, PrometheusError>
    where
        C: EvolutionCondition + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PrometheusError::invalid("evolution condition id cannot be blank"));
        }
        Ok(Self {
            id: Arc::from(id),
            factory: Arc::new(move || Box::new(factory()) as Box<dyn EvolutionCondition>),
        })
    }

    /// The condition id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Build a fresh condition.
    pub fn instantiate(&self) -> Box<dyn EvolutionCondition> {
        (self.factory)()
    }
}

impl core::fmt::Debug for EvolutionDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EvolutionDescriptor")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
