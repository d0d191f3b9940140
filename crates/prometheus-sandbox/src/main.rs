//! Sandbox binary for the Prometheus entity registry.
//!
//! Runs one garden season end to end against the process-wide context and
//! logs every step.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `prometheus.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Initialize the process-wide context
//! 4. Register the garden content
//! 5. Plant, water, and evolve a seed into a tree
//! 6. Plant a child seed and harvest the tree
//! 7. Log the surviving population

mod error;
mod garden;

use std::path::Path;

use prometheus_core::{EntityHandle, Prometheus, PrometheusConfig, RegisterKind};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::SandboxError;
use crate::garden::Growth;

/// Default configuration file, relative to the working directory.
const CONFIG_PATH: &str = "prometheus.yaml";

/// Application entry point for the sandbox.
///
/// # Errors
///
/// Returns an error if configuration, registration, or any lifecycle step
/// fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        duplicate_policy = ?config.registry.duplicate_policy,
        drop_seed = ?config.drops.seed,
        "prometheus-sandbox starting"
    );

    // 3. Initialize the process-wide context.
    let ctx = Prometheus::init(config)?;

    // 4. Register the garden content.
    let summary = garden::registrar()?.apply(ctx, RegisterKind::All)?;
    info!(
        types = summary.types,
        evolutions = summary.evolutions,
        "Garden registered"
    );

    // 5. Grow a tree.
    let tree = grow_tree(ctx)?;

    // 6. Plant a child seed, then harvest.
    let child = ctx.create("seed")?;
    tree.write().add_child(child.instance_id())?;
    info!(
        tree = %tree.instance_id(),
        child = %child.instance_id(),
        "Child seed planted"
    );

    let mut harvest = |item: &str, quantity: u32| {
        info!(item, quantity, "Harvested");
    };
    ctx.kill(&tree, &mut harvest)?;

    // 7. Report the survivors.
    for survivor in ctx.entities().live_instances() {
        let state = survivor.read();
        info!(
            instance_id = %state.instance_id(),
            type_id = state.type_id(),
            name = state.name(),
            "Survivor"
        );
    }
    info!(live = ctx.entities().len(), "prometheus-sandbox finished");
    Ok(())
}

/// Load configuration from [`CONFIG_PATH`], falling back to defaults.
fn load_config() -> Result<PrometheusConfig, SandboxError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(PrometheusConfig::from_file(config_path)?)
    } else {
        Ok(PrometheusConfig::default())
    }
}

/// Water a fresh seed and push it through every evolution stage.
fn grow_tree(ctx: &Prometheus) -> Result<EntityHandle, SandboxError> {
    let mut current = ctx.create("seed")?;
    for condition_id in ["sprout", "mature"] {
        let successor = loop {
            if let Some(successor) = ctx.evolve(&current, condition_id)? {
                break successor;
            }
            let water = water(&current)?;
            info!(
                type_id = current.type_id(),
                water,
                "Watered"
            );
        };
        ctx.retire(&current)?;
        info!(
            from = current.type_id(),
            to = successor.type_id(),
            lineage = ?successor.read().backward_evolutions(),
            "Evolved"
        );
        current = successor;
    }
    Ok(current)
}

/// Give a plant one unit of water and return its new total.
fn water(plant: &EntityHandle) -> Result<u32, SandboxError> {
    let mut state = plant.write();
    let Some(growth) = state.payload_mut::<Growth>() else {
        warn!(type_id = plant.type_id(), "Plant has no growth payload");
        return Err(SandboxError::Scenario {
            message: format!("{} cannot be watered", plant.type_id()),
        });
    };
    growth.water = growth.water.saturating_add(1);
    Ok(growth.water)
}
