//! Batch registration.
//!
//! A [`Registrar`] collects type and evolution descriptors up front (usually
//! in one function per content module) and applies them to a context in a
//! single call, optionally restricted to one kind.

use tracing::info;

use crate::context::Prometheus;
use crate::error::PrometheusError;
use crate::evolution::EvolutionDescriptor;
use crate::registry::TypeDescriptor;

/// Which descriptors [`Registrar::apply`] registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterKind {
    /// Entity types only.
    Entity,
    /// Evolution conditions only.
    Evolution,
    /// Both.
    #[default]
    All,
}

impl RegisterKind {
    const fn includes_entities(self) -> bool {
        matches!(self, Self::Entity | Self::All)
    }

    const fn includes_evolutions(self) -> bool {
        matches!(self, Self::Evolution | Self::All)
    }
}

/// Counts of what one [`Registrar::apply`] call registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistrationSummary {
    /// Entity types registered.
    pub types: usize,
    /// Evolution conditions registered.
    pub evolutions: usize,
}

/// Ordered list of descriptors awaiting registration.
#[derive(Debug, Clone, Default)]
pub struct Registrar {
    types: Vec<TypeDescriptor>,
    evolutions: Vec<EvolutionDescriptor>,
}

impl Registrar {
    /// An empty registrar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entity type.
    #[must_use]
    pub fn entity(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    /// Queue an evolution condition.
    #[must_use]
    pub fn evolution(mut self, descriptor: EvolutionDescriptor) -> Self {
        self.evolutions.push(descriptor);
        self
    }

    /// Register the queued descriptors of `kind` into `ctx`, in queue order.
    ///
    /// Stops at the first failure; descriptors registered before it stay
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns the first registration error, typically
    /// [`PrometheusError::DuplicateType`] or
    /// [`PrometheusError::DuplicateEvolution`].
    pub fn apply(&self, ctx: &Prometheus, kind: RegisterKind) -> Result<RegistrationSummary, PrometheusError> {
        let mut summary = RegistrationSummary::default();
        if kind.includes_entities() {
            for descriptor in &self.types {
                ctx.types().register(descriptor.clone())?;
                summary.types = summary.types.saturating_add(1);
            }
        }
        if kind.includes_evolutions() {
            for descriptor in &self.evolutions {
                ctx.evolutions().register(descriptor.clone())?;
                summary.evolutions = summary.evolutions.saturating_add(1);
            }
        }
        info!(
            ?kind,
            types = summary.types,
            evolutions = summary.evolutions,
            "Registration applied"
        );
        Ok(summary)
    }
}
