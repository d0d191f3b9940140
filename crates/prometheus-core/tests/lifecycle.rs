//! End-to-end tests for registration, lifecycle, and evolution through a
//! [`Prometheus`] context.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::arithmetic_side_effects,
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use prometheus_core::{
    Entity, EntityHandle, EntityPayload, EntityTemplate, EvolutionCondition, EvolutionDescriptor, Prometheus,
    PrometheusConfig, PrometheusError, RegisterKind, Registrar, TypeDescriptor,
};
use prometheus_types::{EntityDrop, StatBlock, StatValue};
use rand::SeedableRng;
use rand::rngs::StdRng;

// =============================================================================
// Fixture: a tiny garden
// =============================================================================

/// Payload carried by seeds and flowers.
#[derive(Debug, Default)]
struct Garden {
    watered: u32,
}

impl EntityPayload for Garden {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn merge_data(&self, successor: &mut Entity) {
        if let Some(garden) = successor.payload_mut::<Self>() {
            garden.watered += self.watered;
        }
    }
}

/// Blooms once the seed has been watered at least twice.
struct Bloom;

impl EvolutionCondition for Bloom {
    fn can_evolve(&self, entity: &Entity) -> bool {
        entity.payload::<Garden>().is_some_and(|g| g.watered >= 2)
    }

    fn target_type(&self) -> Option<&str> {
        Some("flower")
    }
}

fn garden() -> Prometheus {
    let ctx = Prometheus::new(PrometheusConfig::default());
    Registrar::new()
        .entity(
            TypeDescriptor::new("seed", ["plant", "small"], || {
                EntityTemplate::new("Seed")
                    .with_stats(StatBlock::new().with("hp", 5))
                    .with_evolutions(["bloom"])
                    .with_payload(Garden::default())
            })
            .expect("seed descriptor"),
        )
        .entity(
            TypeDescriptor::new("flower", ["plant"], || {
                EntityTemplate::new("Flower")
                    .with_stats(StatBlock::new().with("hp", 10))
                    .with_drop("petal", EntityDrop::guaranteed(3))
                    .with_drop("pollen", EntityDrop::new(1, 4, 0.5).expect("pollen rule"))
                    .with_payload(Garden::default())
            })
            .expect("flower descriptor"),
        )
        .entity(TypeDescriptor::new("rock", ["mineral", "small"], || EntityTemplate::new("Rock")).expect("rock descriptor"))
        .evolution(EvolutionDescriptor::new("bloom", || Bloom).expect("bloom descriptor"))
        .apply(&ctx, RegisterKind::All)
        .expect("registration");
    ctx
}

// =============================================================================
// Creation and queries
// =============================================================================

#[test]
fn created_instances_have_unique_ids_and_are_indexed() {
    let ctx = garden();
    let handles: Vec<_> = (0..20).map(|_| ctx.create("seed").unwrap()).collect();

    let ids: BTreeSet<_> = handles.iter().map(EntityHandle::instance_id).collect();
    assert_eq!(ids.len(), 20);
    assert_eq!(ctx.entities().len(), 20);
    for handle in &handles {
        let found = ctx.entities().instance_by_id(handle.instance_id()).unwrap();
        assert!(found.ptr_eq(handle));
        assert!(handle.is_alive());
        assert_eq!(handle.type_id(), "seed");
    }
}

#[test]
fn unknown_type_is_an_error_and_creates_nothing() {
    let ctx = garden();
    let err = ctx.create("tree").unwrap_err();
    assert!(matches!(err, PrometheusError::UnknownType(ref id) if id == "tree"));
    assert_eq!(err.to_string(), "no entity found for registry id: tree");
    assert!(ctx.entities().is_empty());
}

#[test]
fn group_queries_require_every_group() {
    let ctx = garden();
    let seed = ctx.create("seed").unwrap();
    let flower = ctx.create("flower").unwrap();
    let rock = ctx.create("rock").unwrap();

    let small = ctx.entities().instances_in_groups(&["small"]);
    assert_eq!(small.len(), 2);

    let small_plants = ctx.entities().instances_in_groups(&["plant", "small"]);
    assert_eq!(small_plants.len(), 1);
    assert!(small_plants[0].ptr_eq(&seed));

    assert_eq!(ctx.entities().instances_in_groups(&[]).len(), 3);

    let flowers_and_rocks = ctx.entities().instances_of_types(&["flower", "rock"]);
    assert_eq!(flowers_and_rocks.len(), 2);
    assert!(flowers_and_rocks.iter().any(|h| h.ptr_eq(&flower)));
    assert!(flowers_and_rocks.iter().any(|h| h.ptr_eq(&rock)));

    assert_eq!(
        ctx.types().types_in_groups(&["plant"]),
        BTreeSet::from(["flower".to_owned(), "seed".to_owned()])
    );
}

// =============================================================================
// Death
// =============================================================================

#[test]
fn kill_emits_drops_then_unindexes() {
    let ctx = garden();
    let flower = ctx.create("flower").unwrap();
    let mut emitted: Vec<(String, u32)> = Vec::new();

    let mut sink = |item: &str, quantity: u32| emitted.push((item.to_owned(), quantity));
    ctx.kill(&flower, &mut sink).unwrap();

    assert!(!flower.is_alive());
    assert!(ctx.entities().instance_by_id(flower.instance_id()).is_none());
    assert!(emitted.contains(&("petal".to_owned(), 3)));
    for (item, quantity) in &emitted {
        if item == "pollen" {
            assert!((1..=4).contains(quantity));
        }
    }
}

#[test]
fn second_kill_is_already_dead() {
    let ctx = garden();
    let rock = ctx.create("rock").unwrap();
    let mut ignore = |_: &str, _: u32| {};
    ctx.kill(&rock, &mut ignore).unwrap();
    assert!(matches!(
        ctx.kill(&rock, &mut ignore),
        Err(PrometheusError::AlreadyDead(id)) if id == rock.instance_id()
    ));
}

#[test]
fn seeded_kills_are_reproducible() {
    let roll = || {
        let ctx = garden();
        let mut rng = StdRng::seed_from_u64(11);
        let mut emitted: Vec<(String, u32)> = Vec::new();
        for _ in 0..10 {
            let flower = ctx.create("flower").unwrap();
            let mut sink = |item: &str, quantity: u32| emitted.push((item.to_owned(), quantity));
            ctx.entities().kill_with_rng(&flower, &mut rng, &mut sink).unwrap();
        }
        emitted
    };
    assert_eq!(roll(), roll());
}

// =============================================================================
// Evolution
// =============================================================================

#[test]
fn seed_blooms_into_flower_once_watered() {
    let ctx = garden();
    let seed = ctx.create("seed").unwrap();

    assert!(ctx.evolve(&seed, "bloom").unwrap().is_none());
    assert!(!ctx.evolution_engine().can_evolve_to(&seed, "bloom").unwrap());

    seed.write().payload_mut::<Garden>().unwrap().watered = 2;
    assert!(ctx.evolution_engine().can_evolve_to(&seed, "bloom").unwrap());

    let flower = ctx.evolve(&seed, "bloom").unwrap().expect("successor");
    {
        let state = flower.read();
        assert_eq!(state.type_id(), "flower");
        assert_eq!(state.stats().unwrap().get("hp"), Some(StatValue::Integer(15)));
        assert_eq!(state.payload::<Garden>().unwrap().watered, 2);
        assert_eq!(state.backward_evolutions(), ["bloom".to_owned()]);
    }
    assert_eq!(seed.read().superseded_by(), Some(flower.instance_id()));

    // The predecessor stays live until the caller retires it.
    assert_eq!(ctx.entities().len(), 2);
    ctx.retire(&seed).unwrap();
    assert!(!seed.is_alive());
    assert_eq!(ctx.entities().live_instances().len(), 1);
    assert!(ctx.evolve(&seed, "bloom").unwrap().is_none());
}

#[test]
fn condition_not_offered_by_entity_is_a_no_op() {
    let ctx = garden();
    let rock = ctx.create("rock").unwrap();
    assert!(ctx.evolve(&rock, "bloom").unwrap().is_none());
    assert!(ctx.evolve(&rock, "unknown-condition").unwrap().is_none());
    assert!(rock.is_alive());
    assert!(rock.read().superseded_by().is_none());
    assert_eq!(ctx.entities().len(), 1);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn concurrent_create_kill_and_query() {
    let ctx = garden();
    let petals = AtomicUsize::new(0);
    let survivors = Mutex::new(Vec::new());

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let ctx = &ctx;
            let petals = &petals;
            let survivors = &survivors;
            scope.spawn(move || {
                for round in 0..50 {
                    let flower = ctx.create("flower").unwrap();
                    let _ = ctx.entities().instances_in_groups(&["plant"]);
                    if (worker + round) % 2 == 0 {
                        let mut sink = |item: &str, quantity: u32| {
                            if item == "petal" {
                                petals.fetch_add(quantity as usize, Ordering::Relaxed);
                            }
                        };
                        ctx.kill(&flower, &mut sink).unwrap();
                    } else {
                        survivors.lock().push(flower);
                    }
                }
            });
        }
    });

    let survivors = survivors.into_inner();
    assert_eq!(survivors.len(), 200);
    assert_eq!(ctx.entities().len(), 200);
    assert_eq!(petals.load(Ordering::Relaxed), 200 * 3);
    let live: BTreeSet<_> = ctx.entities().live_instances().iter().map(EntityHandle::instance_id).collect();
    assert!(survivors.iter().all(|h| live.contains(&h.instance_id())));
}

#[test]
fn shared_context_across_threads_via_arc() {
    let ctx = Arc::new(garden());
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    ctx.create("rock").unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(ctx.entities().instances_of_type("rock").len(), 100);
}
