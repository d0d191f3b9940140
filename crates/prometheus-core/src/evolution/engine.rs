//! The evolution protocol.
//!
//! [`EvolutionEngine::evolve`] replaces nothing in place: it creates a new
//! instance of the condition's target type, carries stats and custom data
//! over from the old instance, records lineage, and links the old instance
//! to its successor. The old instance stays live until the caller retires
//! it.
//!
//! "Cannot evolve right now" (condition not offered, predicate false, no
//! target, entity dead) is reported as `Ok(None)`. Unregistered condition
//! or target ids are errors.

use prometheus_types::StatSource;
use tracing::debug;

use crate::entity::{Entity, EntityHandle};
use crate::error::PrometheusError;
use crate::evolution::condition::EvolutionCondition;
use crate::evolution::registry::EvolutionRegistry;
use crate::lifecycle::EntityManager;
use crate::registry::TypeRegistry;

/// Evaluate `condition` against `entity`. An absent condition never passes.
pub fn can_evolve(entity: &Entity, condition: Option<&dyn EvolutionCondition>) -> bool {
    condition.is_some_and(|c| c.can_evolve(entity))
}

/// Borrowed view over the registries and the lifecycle manager.
#[derive(Debug, Clone, Copy)]
pub struct EvolutionEngine<'a> {
    types: &'a TypeRegistry,
    evolutions: &'a EvolutionRegistry,
    entities: &'a EntityManager,
}

impl<'a> EvolutionEngine<'a> {
    /// Build an engine over the given registries and manager.
    pub const fn new(
        types: &'a TypeRegistry,
        evolutions: &'a EvolutionRegistry,
        entities: &'a EntityManager,
    ) -> Self {
        Self {
            types,
            evolutions,
            entities,
        }
    }

    /// The condition behind `condition_id`, if `entity` offers it.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::UnknownEvolution`] if the entity offers the
    /// id but nothing is registered under it.
    pub fn condition_for(
        &self,
        entity: &EntityHandle,
        condition_id: &str,
    ) -> Result<Option<Box<dyn EvolutionCondition>>, PrometheusError> {
        let offered = entity
            .read()
            .forward_evolutions()
            .iter()
            .any(|id| id == condition_id);
        if !offered {
            return Ok(None);
        }
        self.evolutions.resolve(condition_id).map(Some)
    }

    /// Whether `entity` could evolve through `condition_id` right now.
    ///
    /// # Errors
    ///
    /// Same as [`condition_for`](Self::condition_for).
    pub fn can_evolve_to(&self, entity: &EntityHandle, condition_id: &str) -> Result<bool, PrometheusError> {
        let condition = self.condition_for(entity, condition_id)?;
        let state = entity.read();
        Ok(state.is_alive() && can_evolve(&state, condition.as_deref()))
    }

    /// Evolve `entity` through `condition_id`.
    ///
    /// Returns the successor on success and `Ok(None)` when the evolution is
    /// not possible right now; in that case nothing was changed.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::UnknownEvolution`] if the offered condition
    /// is not registered and [`PrometheusError::UnknownType`] if its target
    /// type is not registered.
    pub fn evolve(
        &self,
        entity: &EntityHandle,
        condition_id: &str,
    ) -> Result<Option<EntityHandle>, PrometheusError> {
        let Some(condition) = self.condition_for(entity, condition_id)? else {
            debug!(
                instance_id = %entity.instance_id(),
                condition_id,
                "Evolution not offered"
            );
            return Ok(None);
        };

        {
            let state = entity.read();
            if !state.is_alive() || !can_evolve(&state, Some(&*condition)) {
                debug!(
                    instance_id = %entity.instance_id(),
                    condition_id,
                    "Evolution condition not met"
                );
                return Ok(None);
            }
        }

        let Some(target) = condition.target_type() else {
            return Ok(None);
        };

        // The successor is merged while still unindexed and unlocked, so the
        // payload hook only ever holds the predecessor's read lock.
        let mut successor = EntityManager::instantiate(self.types, target)?;
        {
            let old = entity.read();
            if let (Some(old_stats), Some(new_stats)) = (old.stats(), successor.stats_mut()) {
                new_stats.merge_stats(old_stats);
            }
            old.payload_dyn().merge_data(&mut successor);
            successor.inherit_lineage(old.backward_evolutions(), condition_id);
        }
        let successor = self.entities.admit(successor);
        entity.write().set_superseded_by(successor.instance_id());

        debug!(
            from_type = entity.type_id(),
            from_instance = %entity.instance_id(),
            to_type = successor.type_id(),
            to_instance = %successor.instance_id(),
            condition_id,
            "Entity evolved"
        );
        Ok(Some(successor))
    }
}
