//! Garden content: a seed that sprouts, grows into a tree, and bears fruit.
//!
//! The tree is the only type with a drop table and the family capability;
//! everything growing carries a [`Growth`] payload that survives each
//! evolution.

use std::any::Any;

use prometheus_core::{
    Entity, EntityPayload, EntityTemplate, EvolutionCondition, EvolutionDescriptor, Registrar,
    TypeDescriptor,
};
use prometheus_types::{EntityDrop, StatBlock};

use crate::error::SandboxError;

/// Water needed before a seed sprouts.
pub const SPROUT_WATER: u32 = 2;

/// Water needed before a sapling matures.
pub const MATURE_WATER: u32 = 5;

/// Custom state of every growing plant.
#[derive(Debug, Default)]
pub struct Growth {
    /// Total water received across all stages.
    pub water: u32,
}

impl EntityPayload for Growth {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn merge_data(&self, successor: &mut Entity) {
        if let Some(growth) = successor.payload_mut::<Self>() {
            growth.water = growth.water.saturating_add(self.water);
        }
    }
}

/// Passes once the plant has received `threshold` water.
struct Watered {
    threshold: u32,
    target: &'static str,
}

impl EvolutionCondition for Watered {
    fn can_evolve(&self, entity: &Entity) -> bool {
        entity
            .payload::<Growth>()
            .is_some_and(|g| g.water >= self.threshold)
    }

    fn target_type(&self) -> Option<&str> {
        Some(self.target)
    }
}

/// Queue every garden type and condition.
///
/// # Errors
///
/// Returns an error if a descriptor or drop rule is malformed.
pub fn registrar() -> Result<Registrar, SandboxError> {
    let stray_seeds = EntityDrop::new(0, 3, 0.5)?;

    let registrar = Registrar::new()
        .entity(TypeDescriptor::new("seed", ["plant"], || {
            EntityTemplate::new("Seed")
                .with_stats(StatBlock::new().with("hp", 1))
                .with_evolutions(["sprout"])
                .with_payload(Growth::default())
        })?)
        .entity(TypeDescriptor::new("sapling", ["plant"], || {
            EntityTemplate::new("Sapling")
                .with_stats(StatBlock::new().with("hp", 4).with("height", 0.5))
                .with_evolutions(["mature"])
                .with_payload(Growth::default())
        })?)
        .entity(TypeDescriptor::new("tree", ["plant", "harvestable"], move || {
            EntityTemplate::new("Tree")
                .with_stats(StatBlock::new().with("hp", 20).with("height", 4.0))
                .with_drop("fruit", EntityDrop::guaranteed(2))
                .with_drop("seed", stray_seeds)
                .with_family()
                .with_payload(Growth::default())
        })?)
        .evolution(EvolutionDescriptor::new("sprout", || Watered {
            threshold: SPROUT_WATER,
            target: "sapling",
        })?)
        .evolution(EvolutionDescriptor::new("mature", || Watered {
            threshold: MATURE_WATER,
            target: "tree",
        })?);
    Ok(registrar)
}
