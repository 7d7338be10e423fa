#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-type counters of plant instances available for placement.
//!
//! The ledger is the live source of truth for the session. Mutations apply
//! immediately and register the touched plant with a [`SyncBatcher`]; the
//! owner drains coalesced batches through [`InventoryLedger::tick`] or
//! [`InventoryLedger::flush`] and ships them to the remote store. Batches
//! carry each plant's latest quantity rather than a delta.

mod batcher;

use std::{collections::BTreeMap, time::Duration};

use iso_garden_core::{InventoryEntry, PlantId};
use tracing::debug;

pub use batcher::{SyncBatcher, DEFAULT_SYNC_WINDOW};

/// Quantity granted to each default plant when a ledger is created.
pub const DEFAULT_STOCK: u32 = 5;

/// Plants every gardener owns from the start.
pub const DEFAULT_PLANTS: [&str; 5] = ["sprout", "flower", "carnation", "lavander", "sakura"];

/// Whether placements are constrained by stock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StockPolicy {
    /// Placement requires at least one available instance.
    Limited,
    /// Anonymous sessions place freely; counters still move when they can.
    Unlimited,
}

/// Optimistic inventory ledger with debounced durability writes.
#[derive(Clone, Debug)]
pub struct InventoryLedger {
    quantities: BTreeMap<PlantId, u32>,
    granted: BTreeMap<PlantId, u64>,
    policy: StockPolicy,
    batcher: SyncBatcher,
}

impl InventoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new(policy: StockPolicy, window: Duration) -> Self {
        Self {
            quantities: BTreeMap::new(),
            granted: BTreeMap::new(),
            policy,
            batcher: SyncBatcher::new(window),
        }
    }

    /// Creates a ledger holding [`DEFAULT_STOCK`] of every default plant.
    #[must_use]
    pub fn with_defaults(policy: StockPolicy, window: Duration) -> Self {
        let mut ledger = Self::new(policy, window);
        for plant in DEFAULT_PLANTS {
            ledger.credit(&PlantId::from(plant), DEFAULT_STOCK);
        }
        ledger
    }

    /// Adds remotely stored quantities on top of the current stock without scheduling writes.
    pub fn merge_remote(&mut self, rows: &[InventoryEntry]) {
        for row in rows {
            self.credit(&row.plant, row.quantity);
        }
    }

    /// Stock policy in force.
    #[must_use]
    pub const fn policy(&self) -> StockPolicy {
        self.policy
    }

    /// Current available count; unknown plants report zero.
    #[must_use]
    pub fn quantity(&self, plant: &PlantId) -> u32 {
        self.quantities.get(plant).copied().unwrap_or(0)
    }

    /// Total instances ever granted for the plant.
    #[must_use]
    pub fn total_granted(&self, plant: &PlantId) -> u64 {
        self.granted.get(plant).copied().unwrap_or(0)
    }

    /// Reports whether a placement of the plant would be accepted.
    #[must_use]
    pub fn can_place(&self, plant: &PlantId) -> bool {
        self.policy == StockPolicy::Unlimited || self.quantity(plant) >= 1
    }

    /// Takes one instance for a placement.
    ///
    /// Under [`StockPolicy::Limited`] an empty counter rejects the request and
    /// nothing changes. Unlimited ledgers always accept and only reduce a
    /// counter that is above zero.
    pub fn decrement(&mut self, plant: &PlantId) -> bool {
        let current = self.quantity(plant);
        if current == 0 {
            return self.policy == StockPolicy::Unlimited;
        }
        let _ = self.quantities.insert(plant.clone(), current - 1);
        self.batcher.touch(plant);
        true
    }

    /// Returns one instance from a removed tile.
    pub fn restore(&mut self, plant: &PlantId) {
        let current = self.quantity(plant);
        let _ = self.quantities.insert(plant.clone(), current.saturating_add(1));
        self.batcher.touch(plant);
    }

    /// Grants additional instances, as purchases and growth rewards do.
    pub fn grant(&mut self, plant: &PlantId, amount: u32) {
        if amount == 0 {
            return;
        }
        self.credit(plant, amount);
        self.batcher.touch(plant);
    }

    /// Every counter, ordered by plant identifier.
    #[must_use]
    pub fn entries(&self) -> Vec<InventoryEntry> {
        self.quantities
            .iter()
            .map(|(plant, quantity)| InventoryEntry::new(plant.clone(), *quantity))
            .collect()
    }

    /// Advances the debounce timer, returning a batch once the window has elapsed.
    pub fn tick(&mut self, elapsed: Duration) -> Option<Vec<InventoryEntry>> {
        let touched = self.batcher.tick(elapsed)?;
        let batch = self.snapshot(touched);
        debug!(rows = batch.len(), "inventory batch ready");
        Some(batch)
    }

    /// Releases every pending write immediately; empty when nothing is pending.
    pub fn flush(&mut self) -> Vec<InventoryEntry> {
        let touched = self.batcher.flush();
        self.snapshot(touched)
    }

    /// Reports whether touched plants await a durability write.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.batcher.has_pending()
    }

    fn credit(&mut self, plant: &PlantId, amount: u32) {
        let quantity = self.quantities.entry(plant.clone()).or_insert(0);
        *quantity = quantity.saturating_add(amount);
        let granted = self.granted.entry(plant.clone()).or_insert(0);
        *granted = granted.saturating_add(u64::from(amount));
    }

    fn snapshot(&self, touched: impl IntoIterator<Item = PlantId>) -> Vec<InventoryEntry> {
        touched
            .into_iter()
            .map(|plant| {
                let quantity = self.quantity(&plant);
                InventoryEntry::new(plant, quantity)
            })
            .collect()
    }
}

impl Default for InventoryLedger {
    fn default() -> Self {
        Self::with_defaults(StockPolicy::Limited, DEFAULT_SYNC_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(750);

    fn sakura() -> PlantId {
        PlantId::from("sakura")
    }

    #[test]
    fn defaults_grant_five_of_each_starter_plant() {
        let ledger = InventoryLedger::default();
        for plant in DEFAULT_PLANTS {
            assert_eq!(ledger.quantity(&PlantId::from(plant)), DEFAULT_STOCK);
        }
        assert_eq!(ledger.quantity(&PlantId::from("pine")), 0);
        assert!(!ledger.has_pending());
    }

    #[test]
    fn remote_rows_add_on_top_of_defaults() {
        let mut ledger = InventoryLedger::default();
        ledger.merge_remote(&[
            InventoryEntry::new(sakura(), 2),
            InventoryEntry::new(PlantId::from("pine"), 1),
        ]);
        assert_eq!(ledger.quantity(&sakura()), 7);
        assert_eq!(ledger.quantity(&PlantId::from("pine")), 1);
        assert_eq!(ledger.total_granted(&sakura()), 7);
        assert!(!ledger.has_pending(), "merging must not schedule writes");
    }

    #[test]
    fn limited_decrement_rejects_empty_counters() {
        let mut ledger = InventoryLedger::new(StockPolicy::Limited, WINDOW);
        assert!(!ledger.decrement(&sakura()));
        assert_eq!(ledger.quantity(&sakura()), 0);
        assert!(!ledger.has_pending());
    }

    #[test]
    fn unlimited_decrement_always_succeeds_without_underflow() {
        let mut ledger = InventoryLedger::new(StockPolicy::Unlimited, WINDOW);
        assert!(ledger.can_place(&sakura()));
        assert!(ledger.decrement(&sakura()));
        assert_eq!(ledger.quantity(&sakura()), 0);
    }

    #[test]
    fn batches_carry_latest_quantities_not_deltas() {
        let mut ledger = InventoryLedger::default();
        assert!(ledger.decrement(&sakura()));
        assert!(ledger.decrement(&sakura()));
        ledger.restore(&sakura());
        assert_eq!(ledger.tick(Duration::from_millis(100)), None);

        let batch = ledger.tick(WINDOW).expect("window elapsed");
        assert_eq!(batch, vec![InventoryEntry::new(sakura(), 4)]);
        assert!(!ledger.has_pending());
    }

    #[test]
    fn flush_returns_every_touched_plant_once() {
        let mut ledger = InventoryLedger::default();
        let sprout = PlantId::from("sprout");
        assert!(ledger.decrement(&sprout));
        ledger.grant(&sakura(), 3);
        assert!(ledger.decrement(&sprout));

        let batch = ledger.flush();
        assert_eq!(
            batch,
            vec![
                InventoryEntry::new(sakura(), 8),
                InventoryEntry::new(sprout, 3)
            ]
        );
        assert!(ledger.flush().is_empty());
    }

    #[test]
    fn conservation_holds_for_every_short_operation_sequence() {
        // Operations: 0 = place sakura, 1 = remove sakura, 2 = grant sakura.
        for length in 0..=6u32 {
            for code in 0..3u32.pow(length) {
                let mut ledger = InventoryLedger::new(StockPolicy::Limited, WINDOW);
                ledger.grant(&sakura(), 2);
                let mut placed: u64 = 0;
                let mut remaining = code;
                for _ in 0..length {
                    match remaining % 3 {
                        0 => {
                            if ledger.decrement(&sakura()) {
                                placed += 1;
                            }
                        }
                        1 => {
                            if placed > 0 {
                                ledger.restore(&sakura());
                                placed -= 1;
                            }
                        }
                        _ => ledger.grant(&sakura(), 1),
                    }
                    remaining /= 3;
                    assert_eq!(
                        u64::from(ledger.quantity(&sakura())) + placed,
                        ledger.total_granted(&sakura()),
                        "sequence {code} of length {length} broke conservation"
                    );
                }
            }
        }
    }
}
