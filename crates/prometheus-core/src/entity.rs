//! Live entities, their templates, and shared handles.
//!
//! A type factory produces an [`EntityTemplate`]: the parts of an entity the
//! game defines (name, optional stats, drops, family, evolution edges, and a
//! custom payload). The lifecycle manager turns the template into an
//! [`Entity`] by stamping the identity fields, which can never be changed
//! afterwards, and wraps it in an [`EntityHandle`].
//!
//! Capabilities are optional components checked once at creation: an entity
//! without a stat block simply has `stats() == None`.

use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use prometheus_types::{DropTable, EntityDrop, InstanceId, StatBlock};

use crate::error::PrometheusError;
use crate::registry::contains_all;

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Game-defined state carried by an entity.
///
/// [`merge_data`](EntityPayload::merge_data) is the hook the evolution
/// engine calls on the predecessor's payload after stats were merged, to
/// carry over anything that is not a stat.
///
/// The hook runs while the predecessor is read-locked and before the
/// successor is indexed. It may read-lock any live entity but must not
/// write-lock the predecessor.
pub trait EntityPayload: Any + Send + Sync + core::fmt::Debug {
    /// Upcast for downcasting to the concrete payload type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete payload type.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Transfer custom data into the successor of an evolution.
    fn merge_data(&self, successor: &mut Entity) {
        let _ = successor;
    }
}

impl EntityPayload for () {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// What a type factory returns: everything about an entity except identity.
#[derive(Debug)]
pub struct EntityTemplate {
    name: String,
    stats: Option<StatBlock>,
    drops: Option<DropTable>,
    forward_evolutions: Vec<String>,
    children: Option<Vec<InstanceId>>,
    payload: Box<dyn EntityPayload>,
}

impl EntityTemplate {
    /// A bare template with no optional capabilities.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stats: None,
            drops: None,
            forward_evolutions: Vec::new(),
            children: None,
            payload: Box::new(()),
        }
    }

    /// Give the entity a stat block.
    #[must_use]
    pub fn with_stats(mut self, stats: StatBlock) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Give the entity a drop table.
    #[must_use]
    pub fn with_drops(mut self, drops: DropTable) -> Self {
        self.drops = Some(drops);
        self
    }

    /// Add one drop rule, creating the drop table if needed.
    #[must_use]
    pub fn with_drop(mut self, item_id: impl Into<String>, rule: EntityDrop) -> Self {
        self.drops
            .get_or_insert_with(DropTable::new)
            .insert(item_id.into(), rule);
        self
    }

    /// Set the evolution conditions this entity may pass through next.
    #[must_use]
    pub fn with_evolutions<I, S>(mut self, condition_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forward_evolutions = condition_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Give the entity the family capability (a list of children).
    #[must_use]
    pub fn with_family(mut self) -> Self {
        self.children.get_or_insert_with(Vec::new);
        self
    }

    /// Attach a custom payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl EntityPayload) -> Self {
        self.payload = Box::new(payload);
        self
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A live (or dead, but still referenced) entity instance.
#[derive(Debug)]
pub struct Entity {
    instance_id: InstanceId,
    type_id: Arc<str>,
    groups: Arc<BTreeSet<String>>,
    name: String,
    alive: bool,
    created_at: DateTime<Utc>,
    stats: Option<StatBlock>,
    drops: Option<DropTable>,
    forward_evolutions: Vec<String>,
    backward_evolutions: Vec<String>,
    children: Option<Vec<InstanceId>>,
    superseded_by: Option<InstanceId>,
    payload: Box<dyn EntityPayload>,
}

impl Entity {
    pub(crate) fn from_template(
        template: EntityTemplate,
        instance_id: InstanceId,
        type_id: Arc<str>,
        groups: Arc<BTreeSet<String>>,
    ) -> Self {
        Self {
            instance_id,
            type_id,
            groups,
            name: template.name,
            alive: true,
            created_at: Utc::now(),
            stats: template.stats,
            drops: template.drops,
            forward_evolutions: template.forward_evolutions,
            backward_evolutions: Vec::new(),
            children: template.children,
            superseded_by: None,
            payload: template.payload,
        }
    }

    /// Process-unique id stamped at creation.
    pub const fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// Id of the type this entity was created from.
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Groups of the type at creation time.
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Whether the entity belongs to every one of `groups`.
    pub fn has_groups(&self, groups: &[&str]) -> bool {
        contains_all(&self.groups, groups)
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `false` once the entity has been killed or retired.
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Wall-clock creation time.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Stat block, if the entity exposes stats.
    pub const fn stats(&self) -> Option<&StatBlock> {
        self.stats.as_ref()
    }

    /// Mutable stat block, if the entity exposes stats.
    pub const fn stats_mut(&mut self) -> Option<&mut StatBlock> {
        self.stats.as_mut()
    }

    /// Drop table, if the entity drops items on death.
    pub const fn drops(&self) -> Option<&DropTable> {
        self.drops.as_ref()
    }

    /// Condition ids this entity may evolve through next.
    pub fn forward_evolutions(&self) -> &[String] {
        &self.forward_evolutions
    }

    /// Condition ids already passed through, oldest first.
    pub fn backward_evolutions(&self) -> &[String] {
        &self.backward_evolutions
    }

    /// Make another evolution available.
    pub fn add_forward_evolution(&mut self, condition_id: impl Into<String>) {
        self.forward_evolutions.push(condition_id.into());
    }

    /// Children, if the entity has the family capability.
    pub fn children(&self) -> Option<&[InstanceId]> {
        self.children.as_deref()
    }

    /// Record a child.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::InvalidArgument`] if the entity has no
    /// family capability.
    pub fn add_child(&mut self, child: InstanceId) -> Result<(), PrometheusError> {
        match self.children.as_mut() {
            Some(children) => {
                children.push(child);
                Ok(())
            }
            None => Err(PrometheusError::invalid(format!(
                "entity {} ({}) has no family",
                self.instance_id, self.type_id
            ))),
        }
    }

    /// The instance that replaced this one through evolution, if any.
    pub const fn superseded_by(&self) -> Option<InstanceId> {
        self.superseded_by
    }

    /// Downcast the payload.
    pub fn payload<T: EntityPayload>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }

    /// Downcast the payload mutably.
    pub fn payload_mut<T: EntityPayload>(&mut self) -> Option<&mut T> {
        self.payload.as_any_mut().downcast_mut::<T>()
    }

    pub(crate) fn payload_dyn(&self) -> &dyn EntityPayload {
        self.payload.as_ref()
    }

    /// Flip to dead. Returns `false` if the entity was already dead.
    pub(crate) const fn mark_dead(&mut self) -> bool {
        let was_alive = self.alive;
        self.alive = false;
        was_alive
    }

    pub(crate) fn inherit_lineage(&mut self, predecessor: &[String], condition_id: &str) {
        let mut lineage = predecessor.to_vec();
        lineage.append(&mut self.backward_evolutions);
        lineage.push(condition_id.to_owned());
        self.backward_evolutions = lineage;
    }

    pub(crate) const fn set_superseded_by(&mut self, successor: InstanceId) {
        self.superseded_by = Some(successor);
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Shared reference to an entity.
///
/// Identity fields are copied out of the lock so filters over the
/// live-instance index never touch entity state. Mutable state sits behind
/// a per-entity lock; callers are expected to keep a single writer per
/// entity at a time.
#[derive(Clone)]
pub struct EntityHandle {
    instance_id: InstanceId,
    type_id: Arc<str>,
    groups: Arc<BTreeSet<String>>,
    state: Arc<RwLock<Entity>>,
}

impl EntityHandle {
    pub(crate) fn new(entity: Entity) -> Self {
        Self {
            instance_id: entity.instance_id,
            type_id: Arc::clone(&entity.type_id),
            groups: Arc::clone(&entity.groups),
            state: Arc::new(RwLock::new(entity)),
        }
    }

    /// Process-unique id of the entity.
    pub const fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// Type id of the entity.
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Groups of the entity.
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Whether the entity belongs to every one of `groups`.
    pub fn has_groups(&self, groups: &[&str]) -> bool {
        contains_all(&self.groups, groups)
    }

    /// Shorthand for `self.read().is_alive()`.
    pub fn is_alive(&self) -> bool {
        self.state.read().is_alive()
    }

    /// Lock the entity for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Entity> {
        self.state.read()
    }

    /// Lock the entity for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Entity> {
        self.state.write()
    }

    /// Whether both handles point at the same entity.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl core::fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EntityHandle")
            .field("instance_id", &self.instance_id)
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}
