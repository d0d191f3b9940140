//! The type registry: entity type ids mapped to descriptors.
//!
//! A [`TypeDescriptor`] is an immutable template consisting of the type id,
//! its group tags, and the factory producing fresh [`EntityTemplate`]s.
//! Descriptors are validated on construction and shared behind [`Arc`]
//! once registered.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{info, warn};

use crate::config::DuplicatePolicy;
use crate::entity::EntityTemplate;
use crate::error::PrometheusError;

/// Factory producing a fresh template for each new instance.
pub type EntityFactory = Arc<dyn Fn() -> EntityTemplate + Send + Sync>;

/// Whether `tags` holds every one of `wanted`. An empty query always matches.
pub(crate) fn contains_all(tags: &BTreeSet<String>, wanted: &[&str]) -> bool {
    wanted.iter().all(|g| tags.contains(*g))
}

/// Immutable description of an entity type.
#[derive(Clone)]
pub struct TypeDescriptor {
    id: Arc<str>,
    groups: Arc<BTreeSet<String>>,
    factory: EntityFactory,
}

impl TypeDescriptor {
    /// Build a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::InvalidArgument`] if `id` or any group
    /// name is blank.
    pub fn new<I, S, F>(id: impl Into<String>, groups: I, factory: F) -> Result<Self, PrometheusError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn() -> EntityTemplate + Send + Sync + 'static,
    {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PrometheusError::invalid("entity id cannot be blank"));
        }
        let groups: BTreeSet<String> = groups.into_iter().map(Into::into).collect();
        if groups.iter().any(|g| g.trim().is_empty()) {
            return Err(PrometheusError::invalid(format!(
                "entity {id} has a blank group name"
            )));
        }
        Ok(Self {
            id: Arc::from(id),
            groups: Arc::new(groups),
            factory: Arc::new(factory),
        })
    }

    /// The type id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Group tags of the type.
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Whether the type carries every one of `groups`.
    pub fn has_groups(&self, groups: &[&str]) -> bool {
        contains_all(&self.groups, groups)
    }

    /// Run the factory.
    pub fn instantiate(&self) -> EntityTemplate {
        (self.factory)()
    }

    pub(crate) fn shared_id(&self) -> Arc<str> {
        Arc::clone(&self.id)
    }

    pub(crate) fn shared_groups(&self) -> Arc<BTreeSet<String>> {
        Arc::clone(&self.groups)
    }
}

impl core::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("id", &self.id)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

/// Concurrent map of type ids to descriptors.
#[derive(Debug)]
pub struct TypeRegistry {
    entries: DashMap<String, Arc<TypeDescriptor>>,
    policy: DuplicatePolicy,
}

impl TypeRegistry {
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
    /// Returns [`PrometheusError::DuplicateType`] if the id is taken and the
    /// policy is [`DuplicatePolicy::Reject`].
    pub fn register(&self, descriptor: TypeDescriptor) -> Result<(), PrometheusError> {
        let id = descriptor.id().to_owned();
        match (self.entries.entry(id.clone()), self.policy) {
            (Entry::Occupied(_), DuplicatePolicy::Reject) => {
                warn!(type_id = id, "Rejected duplicate entity type registration");
                Err(PrometheusError::DuplicateType(id))
            }
            (Entry::Occupied(mut slot), DuplicatePolicy::Overwrite) => {
                slot.insert(Arc::new(descriptor));
                info!(type_id = id, "Entity type re-registered");
                Ok(())
            }
            (Entry::Vacant(slot), _) => {
                let groups = descriptor.groups().len();
                slot.insert(Arc::new(descriptor));
                info!(type_id = id, groups, "Entity type registered");
                Ok(())
            }
        }
    }

    /// Look up a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::UnknownType`] if nothing is registered
    /// under `id`.
    pub fn get(&self, id: &str) -> Result<Arc<TypeDescriptor>, PrometheusError> {
        self.entries
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| PrometheusError::UnknownType(id.to_owned()))
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Ids of every type carrying all of `groups`.
    pub fn types_in_groups(&self, groups: &[&str]) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|entry| entry.value().has_groups(groups))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Every registered id.
    pub fn ids(&self) -> BTreeSet<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}
