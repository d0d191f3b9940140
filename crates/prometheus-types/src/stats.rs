//! Numeric stats and the stat-source capability.
//!
//! A [`StatBlock`] maps stat names to [`StatValue`]s. Values are either
//! integers or floating-point numbers; merging keeps integer arithmetic as
//! long as both sides are integral and switches to floating point as soon as
//! either side is not.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

/// A single stat value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    /// Whole-number stat (hit points, level, counts).
    Integer(i64),
    /// Fractional stat (speed multipliers, rates).
    Float(f64),
}

impl StatValue {
    /// Whether the value is stored as an integer.
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Integer(_))
    }

    /// The value widened to `f64`.
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(self) -> f64 {
        match self {
            Self::Integer(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    /// Add two values.
    ///
    /// Integer + integer stays integral (saturating at the `i64` bounds);
    /// any other combination is computed in floating point.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Self::Integer(a.saturating_add(b)),
            (a, b) => Self::Float(a.as_f64() + b.as_f64()),
        }
    }
}

impl From<i64> for StatValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for StatValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for StatValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for StatValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl core::fmt::Display for StatValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Named stats of one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatBlock {
    values: BTreeMap<String, StatValue>,
}

impl StatBlock {
    /// Create an empty stat block.
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<StatValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Look up a stat by name.
    pub fn get(&self, name: &str) -> Option<StatValue> {
        self.values.get(name).copied()
    }

    /// Set a stat, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<StatValue>) -> Option<StatValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Remove a stat.
    pub fn remove(&mut self, name: &str) -> Option<StatValue> {
        self.values.remove(name)
    }

    /// Number of stats.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the block holds no stats.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate stats in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, StatValue> {
        self.values.iter()
    }

    /// Additively merge `incoming` into this block.
    ///
    /// Keys absent here are inserted as-is; keys present on both sides are
    /// replaced by their sum (see [`StatValue::combine`]).
    pub fn merge(&mut self, incoming: &Self) {
        for (name, value) in &incoming.values {
            self.values
                .entry(name.clone())
                .and_modify(|current| *current = current.combine(*value))
                .or_insert(*value);
        }
    }

    /// Discard every stat and install exactly `incoming`.
    pub fn replace(&mut self, incoming: Self) {
        self.values = incoming.values;
    }
}

impl<'a> IntoIterator for &'a StatBlock {
    type Item = (&'a String, &'a StatValue);
    type IntoIter = btree_map::Iter<'a, String, StatValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl<K: Into<String>, V: Into<StatValue>> FromIterator<(K, V)> for StatBlock {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Capability of anything that exposes a stat block.
///
/// Implementors only supply access to their block; merge and replace come
/// for free and are what the evolution engine calls when carrying stats
/// from one instance to its successor.
pub trait StatSource {
    /// Current stats.
    fn stats(&self) -> &StatBlock;

    /// Mutable access to the current stats.
    fn stats_mut(&mut self) -> &mut StatBlock;

    /// Additively merge `incoming` into the current stats.
    fn merge_stats(&mut self, incoming: &StatBlock) {
        self.stats_mut().merge(incoming);
    }

    /// Replace the current stats with exactly `incoming`.
    fn replace_stats(&mut self, incoming: StatBlock) {
        self.stats_mut().replace(incoming);
    }
}

impl StatSource for StatBlock {
    fn stats(&self) -> &StatBlock {
        self
    }

    fn stats_mut(&mut self) -> &mut StatBlock {
        self
    }
}
