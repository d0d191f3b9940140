//! Evolution registry: condition ids mapped to condition factories.
//!
//! Same ownership and duplicate handling as the type registry, in a
//! separate id namespace and without group indexing.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{info, warn};

use crate::config::DuplicatePolicy;
use crate::error::PrometheusError;
use crate::evolution::condition::{EvolutionCondition, EvolutionDescriptor};

/// Concurrent map of condition ids to descriptors.
#[derive(Debug)]
pub struct EvolutionRegistry {
    entries: DashMap<String, EvolutionDescriptor>,
    policy: DuplicatePolicy,
}

impl EvolutionRegistry {
    /// Create an empty registry with the given duplicate policy.
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
        }
    }

    /// Register a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::DuplicateEvolution`] if the id is taken and
    /// the policy is [`DuplicatePolicy::Reject`].
    pub fn register(&self, descriptor: EvolutionDescriptor) -> Result<(), PrometheusError> {
        let id = descriptor.id().to_owned();
        match (self.entries.entry(id.clone()), self.policy) {
            (Entry::Occupied(_), DuplicatePolicy::Reject) => {
                warn!(condition_id = id, "Rejected duplicate evolution registration");
                Err(PrometheusError::DuplicateEvolution(id))
            }
            (Entry::Occupied(mut slot), DuplicatePolicy::Overwrite) => {
                slot.insert(descriptor);
                info!(condition_id = id, "Evolution condition re-registered");
                Ok(())
            }
            (Entry::Vacant(slot), _) => {
                slot.insert(descriptor);
                info!(condition_id = id, "Evolution condition registered");
                Ok(())
            }
        }
    }

    /// Build a fresh condition for `condition_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::UnknownEvolution`] if nothing is registered
    /// under `condition_id`.
    pub fn resolve(&self, condition_id: &str) -> Result<Box<dyn EvolutionCondition>, PrometheusError> {
        // Clone out of the map so the factory runs without holding a shard lock.
        let descriptor = self
            .entries
            .get(condition_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| PrometheusError::UnknownEvolution(condition_id.to_owned()))?;
        Ok(descriptor.instantiate())
    }

    /// Whether `condition_id` is registered.
    pub fn contains(&self, condition_id: &str) -> bool {
        self.entries.contains_key(condition_id)
    }

    /// Number of registered conditions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no condition is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EvolutionRegistry {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::entity::Entity;

    struct Target(&'static str);

    impl EvolutionCondition for Target {
        fn can_evolve(&self, _entity: &Entity) -> bool {
            true
        }

        fn target_type(&self) -> Option<&str> {
            Some(self.0)
        }
    }

    fn descriptor(id: &str, target: &'static str) -> EvolutionDescriptor {
        EvolutionDescriptor::new(id, move || Target(target)).unwrap()
    }

    #[test]
    fn resolve_unknown_is_distinguished_error() {
        let registry = EvolutionRegistry::default();
        assert!(matches!(
            registry.resolve("bloom"),
            Err(PrometheusError::UnknownEvolution(id)) if id == "bloom"
        ));
    }

    #[test]
    fn resolve_builds_fresh_condition_each_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = EvolutionRegistry::default();
        let d = EvolutionDescriptor::new("bloom", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Target("flower")
        })
        .unwrap();
        registry.register(d).unwrap();

        for _ in 0..3 {
            let condition = registry.resolve("bloom").unwrap();
            assert_eq!(condition.target_type(), Some("flower"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn duplicate_policy_applies() {
        let strict = EvolutionRegistry::new(DuplicatePolicy::Reject);
        let (a, b) = (descriptor("bloom", "flower"), descriptor("bloom", "weed"));
        strict.register(a.clone()).unwrap();
        assert!(matches!(
            strict.register(b.clone()),
            Err(PrometheusError::DuplicateEvolution(_))
        ));
        assert_eq!(strict.resolve("bloom").unwrap().target_type(), Some("flower"));

        let lenient = EvolutionRegistry::new(DuplicatePolicy::Overwrite);
        lenient.register(a).unwrap();
        lenient.register(b).unwrap();
        assert_eq!(lenient.len(), 1);
        assert_eq!(lenient.resolve("bloom").unwrap().target_type(), Some("weed"));
    }
}
