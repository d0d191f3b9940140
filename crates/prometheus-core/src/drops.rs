//! Drop resolution when an entity dies.
//!
//! Each rule of a [`DropTable`] is rolled once against its probability; a
//! successful roll draws a quantity uniformly from the rule's inclusive
//! range. How a drop materializes in the world is up to the [`DropSink`].

use prometheus_types::DropTable;
use rand::Rng;

/// One satisfied drop rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDrop {
    /// Item identifier from the drop table.
    pub item_id: String,
    /// Rolled quantity within the rule's range.
    pub quantity: u32,
}

/// Receiver of resolved drops.
///
/// Implemented for any `FnMut(&str, u32)`; annotate the closure parameters
/// (`|item: &str, quantity: u32| ..`) so the closure accepts any lifetime.
pub trait DropSink {
    /// Called once per satisfied drop rule.
    fn emit(&mut self, item_id: &str, quantity: u32);
}

impl<F: FnMut(&str, u32)> DropSink for F {
    fn emit(&mut self, item_id: &str, quantity: u32) {
        self(item_id, quantity);
    }
}

/// Roll every rule of `table` once.
///
/// Rules are visited in item-id order, so a seeded RNG gives reproducible
/// results.
pub fn resolve_drops<R: Rng + ?Sized>(table: &DropTable, rng: &mut R) -> Vec<ResolvedDrop> {
    table
        .iter()
        .filter_map(|(item_id, rule)| {
            if !rng.random_bool(rule.probability()) {
                return None;
            }
            let quantity = rng.random_range(rule.min_quantity()..=rule.max_quantity());
            Some(ResolvedDrop {
                item_id: item_id.clone(),
                quantity,
            })
        })
        .collect()
}
