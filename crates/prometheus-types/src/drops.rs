//! Drop rules for entities that leave items behind on death.
//!
//! An [`EntityDrop`] pairs an inclusive quantity range with the probability
//! that the drop happens at all. Rules are validated on construction, so an
//! invalid rule can never end up inside a [`DropTable`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Drop rules keyed by item identifier.
pub type DropTable = BTreeMap<String, EntityDrop>;

/// Errors raised while constructing a drop rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DropRuleError {
    /// The minimal quantity exceeds the maximal quantity.
    #[error("minimal quantity {min} cannot be greater than maximal quantity {max}")]
    InvertedRange {
        /// Requested minimal quantity.
        min: u32,
        /// Requested maximal quantity.
        max: u32,
    },

    /// The drop probability is outside `[0.0, 1.0]` (or NaN).
    #[error("drop chance must be between 0.0 and 1.0, got {0}")]
    ProbabilityOutOfRange(f64),
}

/// One drop rule: `min..=max` items with probability `probability`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDrop", into = "RawDrop")]
pub struct EntityDrop {
    min: u32,
    max: u32,
    probability: f64,
}

impl EntityDrop {
    /// Create a drop rule.
    ///
    /// # Errors
    ///
    /// Returns [`DropRuleError::InvertedRange`] if `min > max` and
    /// [`DropRuleError::ProbabilityOutOfRange`] if `probability` is not in
    /// `[0.0, 1.0]`. Both bounds are inclusive.
    pub fn new(min: u32, max: u32, probability: f64) -> Result<Self, DropRuleError> {
        if min > max {
            return Err(DropRuleError::InvertedRange { min, max });
        }
        if !(0.0..=1.0).contains(&probability) {
            return Err(DropRuleError::ProbabilityOutOfRange(probability));
        }
        Ok(Self {
            min,
            max,
            probability,
        })
    }

    /// Drop exactly `quantity` items with the given probability.
    pub fn fixed(quantity: u32, probability: f64) -> Result<Self, DropRuleError> {
        Self::new(quantity, quantity, probability)
    }

    /// Always drop exactly `quantity` items.
    pub const fn guaranteed(quantity: u32) -> Self {
        Self {
            min: quantity,
            max: quantity,
            probability: 1.0,
        }
    }

    /// Minimal quantity (inclusive).
    pub const fn min_quantity(&self) -> u32 {
        self.min
    }

    /// Maximal quantity (inclusive).
    pub const fn max_quantity(&self) -> u32 {
        self.max
    }

    /// Probability in `[0.0, 1.0]` that the drop happens.
    pub const fn probability(&self) -> f64 {
        self.probability
    }
}

/// Unvalidated wire shape, so deserialization goes through [`EntityDrop::new`].
#[derive(Serialize, Deserialize)]
struct RawDrop {
    min: u32,
    max: u32,
    probability: f64,
}

impl TryFrom<RawDrop> for EntityDrop {
    type Error = DropRuleError;

    fn try_from(raw: RawDrop) -> Result<Self, Self::Error> {
        Self::new(raw.min, raw.max, raw.probability)
    }
}

impl From<EntityDrop> for RawDrop {
    fn from(drop: EntityDrop) -> Self {
        Self {
            min: drop.min,
            max: drop.max,
            probability: drop.probability,
        }
    }
}
