//! Entity lifecycle: creation, death, and the live-instance index.
//!
//! The [`EntityManager`] is the only way new instances enter the system and
//! the sole owner of the live-instance index. The index is a concurrent map,
//! so creation, removal, and snapshot queries may run from any thread
//! without external locking. Snapshots are weakly consistent: an instance
//! created or destroyed during a query may or may not appear in it.
//!
//! # Death
//!
//! [`EntityManager::kill`] runs three steps in a fixed order:
//!
//! 1. mark the entity dead (failing with [`PrometheusError::AlreadyDead`] on
//!    a second kill),
//! 2. resolve its drop table, if any, and hand each drop to the sink,
//! 3. remove it from the live-instance index.
//!
//! The sink therefore sees the entity as dead but can still find it (and
//! its siblings) through the index.

use std::collections::BTreeSet;

use dashmap::DashMap;
use parking_lot::Mutex;
use prometheus_types::{DropTable, InstanceId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::drops::{DropSink, ResolvedDrop, resolve_drops};
use crate::entity::{Entity, EntityHandle};
use crate::error::PrometheusError;
use crate::registry::TypeRegistry;

/// Owner of every live entity instance.
pub struct EntityManager {
    live: DashMap<InstanceId, EntityHandle>,
    rng: Mutex<StdRng>,
}

impl EntityManager {
    /// Create an empty manager.
    ///
    /// `drop_seed` seeds the RNG used by [`kill`](Self::kill); `None` seeds
    /// from the operating system.
    pub fn new(drop_seed: Option<u64>) -> Self {
        let rng = drop_seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            live: DashMap::new(),
            rng: Mutex::new(rng),
        }
    }

    /// Create a live instance of `type_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::UnknownType`] if the type is not registered.
    pub fn create(&self, types: &TypeRegistry, type_id: &str) -> Result<EntityHandle, PrometheusError> {
        let entity = Self::instantiate(types, type_id)?;
        Ok(self.admit(entity))
    }

    /// Build an unindexed entity with a fresh identity.
    pub(crate) fn instantiate(types: &TypeRegistry, type_id: &str) -> Result<Entity, PrometheusError> {
        let descriptor = types.get(type_id)?;
        Ok(Entity::from_template(
            descriptor.instantiate(),
            InstanceId::new(),
            descriptor.shared_id(),
            descriptor.shared_groups(),
        ))
    }

    /// Wrap `entity` in a handle and add it to the live-instance index.
    pub(crate) fn admit(&self, entity: Entity) -> EntityHandle {
        let handle = EntityHandle::new(entity);
        let instance_id = handle.instance_id();
        self.live.insert(instance_id, handle.clone());
        debug!(type_id = handle.type_id(), instance_id = %instance_id, "Entity created");
        handle
    }

    /// Kill a live entity, resolving its drops with the manager's RNG.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::AlreadyDead`] if the entity is already dead.
    pub fn kill(&self, entity: &EntityHandle, sink: &mut dyn DropSink) -> Result<(), PrometheusError> {
        self.kill_inner(entity, |table| resolve_drops(table, &mut *self.rng.lock()), sink)
    }

    /// Kill a live entity, resolving its drops with the given RNG.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::AlreadyDead`] if the entity is already dead.
    pub fn kill_with_rng<R: Rng + ?Sized>(
        &self,
        entity: &EntityHandle,
        rng: &mut R,
        sink: &mut dyn DropSink,
    ) -> Result<(), PrometheusError> {
        self.kill_inner(entity, |table| resolve_drops(table, rng), sink)
    }

    fn kill_inner(
        &self,
        entity: &EntityHandle,
        roll: impl FnOnce(&DropTable) -> Vec<ResolvedDrop>,
        sink: &mut dyn DropSink,
    ) -> Result<(), PrometheusError> {
        let instance_id = entity.instance_id();
        let drops = {
            let mut state = entity.write();
            if !state.mark_dead() {
                warn!(instance_id = %instance_id, "Entity killed twice");
                return Err(PrometheusError::AlreadyDead(instance_id));
            }
            state.drops().cloned()
        };

        // The entity lock is released here so the sink may inspect it.
        if let Some(table) = drops {
            for resolved in roll(&table) {
                debug!(
                    instance_id = %instance_id,
                    item_id = resolved.item_id,
                    quantity = resolved.quantity,
                    "Drop emitted"
                );
                sink.emit(&resolved.item_id, resolved.quantity);
            }
        }

        self.live.remove(&instance_id);
        debug!(type_id = entity.type_id(), instance_id = %instance_id, "Entity killed");
        Ok(())
    }

    /// Mark an entity dead and remove it without resolving drops.
    ///
    /// Used to retire an instance that has been superseded by evolution.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::AlreadyDead`] if the entity is already dead.
    pub fn retire(&self, entity: &EntityHandle) -> Result<(), PrometheusError> {
        let instance_id = entity.instance_id();
        if !entity.write().mark_dead() {
            return Err(PrometheusError::AlreadyDead(instance_id));
        }
        self.live.remove(&instance_id);
        debug!(type_id = entity.type_id(), instance_id = %instance_id, "Entity retired");
        Ok(())
    }

    /// Remove a dead entity from the index.
    ///
    /// Returns `false` if it was not indexed (removal is idempotent).
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::InvalidArgument`] if the entity is still
    /// alive; use [`kill`](Self::kill) or [`retire`](Self::retire) instead.
    pub fn destroy(&self, entity: &EntityHandle) -> Result<bool, PrometheusError> {
        if entity.is_alive() {
            return Err(PrometheusError::invalid(format!(
                "cannot destroy live entity {}",
                entity.instance_id()
            )));
        }
        let removed = self.live.remove(&entity.instance_id()).is_some();
        if removed {
            debug!(instance_id = %entity.instance_id(), "Entity destroyed");
        }
        Ok(removed)
    }

    /// Snapshot of every live instance, in instance-id order.
    pub fn live_instances(&self) -> Vec<EntityHandle> {
        self.collect(|_| true)
    }

    /// Live instances belonging to every one of `groups`.
    pub fn instances_in_groups(&self, groups: &[&str]) -> Vec<EntityHandle> {
        self.collect(|handle| handle.has_groups(groups))
    }

    /// Live instances of `type_id`.
    pub fn instances_of_type(&self, type_id: &str) -> Vec<EntityHandle> {
        self.collect(|handle| handle.type_id() == type_id)
    }

    /// Live instances of any of `type_ids`.
    pub fn instances_of_types(&self, type_ids: &[&str]) -> Vec<EntityHandle> {
        let wanted: BTreeSet<&str> = type_ids.iter().copied().collect();
        self.collect(|handle| wanted.contains(handle.type_id()))
    }

    /// Look up a live instance by id.
    pub fn instance_by_id(&self, instance_id: InstanceId) -> Option<EntityHandle> {
        self.live.get(&instance_id).map(|entry| entry.value().clone())
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no instance is live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn collect(&self, keep: impl Fn(&EntityHandle) -> bool) -> Vec<EntityHandle> {
        let mut handles: Vec<EntityHandle> = self
            .live
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        handles.sort_by_key(EntityHandle::instance_id);
        handles
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl core::fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EntityManager")
            .field("live", &self.live.len())
            .finish_non_exhaustive()
    }
}
