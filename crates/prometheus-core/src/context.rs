//! The [`Prometheus`] context: registries plus the lifecycle manager.
//!
//! A context is normally built once at startup with [`Prometheus::new`] and
//! passed to whatever needs it. Code that cannot thread a reference through
//! can instead install one process-wide context with [`Prometheus::init`]
//! and fetch it with [`Prometheus::global`].

use std::sync::OnceLock;

use tracing::info;

use crate::config::PrometheusConfig;
use crate::drops::DropSink;
use crate::entity::{EntityHandle, EntityTemplate};
use crate::error::PrometheusError;
use crate::evolution::{EvolutionCondition, EvolutionDescriptor, EvolutionEngine, EvolutionRegistry};
use crate::lifecycle::EntityManager;
use crate::registry::{TypeDescriptor, TypeRegistry};

static GLOBAL: OnceLock<Prometheus> = OnceLock::new();

/// Entity registry, evolution registry, and live-instance index.
#[derive(Debug)]
pub struct Prometheus {
    config: PrometheusConfig,
    types: TypeRegistry,
    evolutions: EvolutionRegistry,
    entities: EntityManager,
}

impl Prometheus {
    /// Build an explicit context.
    pub fn new(config: PrometheusConfig) -> Self {
        let policy = config.registry.duplicate_policy;
        let entities = EntityManager::new(config.drops.seed);
        Self {
            types: TypeRegistry::new(policy),
            evolutions: EvolutionRegistry::new(policy),
            entities,
            config,
        }
    }

    /// Install the process-wide context.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::AlreadyInitialized`] if a context was
    /// already installed; the existing one is left untouched.
    pub fn init(config: PrometheusConfig) -> Result<&'static Self, PrometheusError> {
        let mut installed = false;
        let context = GLOBAL.get_or_init(|| {
            installed = true;
            Self::new(config)
        });
        if installed {
            info!(
                duplicate_policy = ?context.config.registry.duplicate_policy,
                seeded_drops = context.config.drops.seed.is_some(),
                "Prometheus initialized"
            );
            Ok(context)
        } else {
            Err(PrometheusError::AlreadyInitialized)
        }
    }

    /// The process-wide context.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::NotInitialized`] before [`init`](Self::init).
    pub fn global() -> Result<&'static Self, PrometheusError> {
        GLOBAL.get().ok_or(PrometheusError::NotInitialized)
    }

    /// Configuration the context was built with.
    pub const fn config(&self) -> &PrometheusConfig {
        &self.config
    }

    /// The type registry.
    pub const fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// The evolution registry.
    pub const fn evolutions(&self) -> &EvolutionRegistry {
        &self.evolutions
    }

    /// The lifecycle manager and live-instance index.
    pub const fn entities(&self) -> &EntityManager {
        &self.entities
    }

    /// An evolution engine over this context.
    pub const fn evolution_engine(&self) -> EvolutionEngine<'_> {
        EvolutionEngine::new(&self.types, &self.evolutions, &self.entities)
    }

    /// Register an entity type.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::InvalidArgument`] for blank ids or groups
    /// and [`PrometheusError::DuplicateType`] for a rejected duplicate.
    pub fn register_type<I, S, F>(&self, id: &str, groups: I, factory: F) -> Result<(), PrometheusError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn() -> EntityTemplate + Send + Sync + 'static,
    {
        self.types.register(TypeDescriptor::new(id, groups, factory)?)
    }

    /// Register an evolution condition.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::InvalidArgument`] for a blank id and
    /// [`PrometheusError::DuplicateEvolution`] for a rejected duplicate.
    pub fn register_evolution<C, F>(&self, id: &str, factory: F) -> Result<(), PrometheusError>
    where
        C: EvolutionCondition + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.evolutions.register(EvolutionDescriptor::new(id, factory)?)
    }

    /// Create a live instance of `type_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::UnknownType`] if the type is not registered.
    pub fn create(&self, type_id: &str) -> Result<EntityHandle, PrometheusError> {
        self.entities.create(&self.types, type_id)
    }

    /// Kill a live entity. See [`EntityManager::kill`].
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::AlreadyDead`] if the entity is already dead.
    pub fn kill(&self, entity: &EntityHandle, sink: &mut dyn DropSink) -> Result<(), PrometheusError> {
        self.entities.kill(entity, sink)
    }

    /// Mark an entity dead and unindex it without resolving drops.
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::AlreadyDead`] if the entity is already dead.
    pub fn retire(&self, entity: &EntityHandle) -> Result<(), PrometheusError> {
        self.entities.retire(entity)
    }

    /// Evolve an entity. See [`EvolutionEngine::evolve`].
    ///
    /// # Errors
    ///
    /// Returns [`PrometheusError::UnknownEvolution`] or
    /// [`PrometheusError::UnknownType`] for unregistered ids.
    pub fn evolve(&self, entity: &EntityHandle, condition_id: &str) -> Result<Option<EntityHandle>, PrometheusError> {
        self.evolution_engine().evolve(entity, condition_id)
    }
}

impl Default for Prometheus {
    fn default() -> Self {
        Self::new(PrometheusConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;

    #[test]
    fn global_lifecycle() {
        // The only test touching the process-wide context.
        assert!(matches!(Prometheus::global(), Err(PrometheusError::NotInitialized)));
        let installed = Prometheus::init(PrometheusConfig::default()).unwrap();
        assert!(core::ptr::eq(installed, Prometheus::global().unwrap()));
        assert!(matches!(
            Prometheus::init(PrometheusConfig::default()),
            Err(PrometheusError::AlreadyInitialized)
        ));
    }

    #[test]
    fn context_applies_duplicate_policy_to_both_registries() {
        let mut config = PrometheusConfig::default();
        config.registry.duplicate_policy = DuplicatePolicy::Overwrite;
        let ctx = Prometheus::new(config);

        ctx.register_type("rock", ["mineral"], || EntityTemplate::new("Rock")).unwrap();
        ctx.register_type("rock", ["mineral"], || EntityTemplate::new("Boulder")).unwrap();
        assert_eq!(ctx.types().len(), 1);

        let rock = ctx.create("rock").unwrap();
        assert_eq!(rock.read().name(), "Boulder");
    }

    #[test]
    fn default_context_rejects_duplicates() {
        let ctx = Prometheus::default();
        ctx.register_type("rock", Vec::<String>::new(), || EntityTemplate::new("Rock")).unwrap();
        assert!(matches!(
            ctx.register_type("rock", Vec::<String>::new(), || EntityTemplate::new("Rock")),
            Err(PrometheusError::DuplicateType(_))
        ));
    }
}
