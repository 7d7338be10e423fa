#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative store of the tiles placed on the garden grid.
//!
//! The store owns every [`PlacedTile`] and keeps a cell index so that no two
//! tiles ever share a coordinate. Tiles picked up for dragging are parked in a
//! detached set: they keep their handle and stock but free their cell until
//! they are reinserted.

mod search;

use std::collections::{BTreeMap, HashMap};

use iso_garden_core::{
    GridCoord, MoveError, Occupancy, PersistedTile, PlacedTile, PlacementError, PlantId, TileId,
};
use iso_garden_inventory::InventoryLedger;
use thiserror::Error;
use tracing::debug;

/// Errors raised while returning a detached tile to the grid.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// No detached tile has the provided handle.
    #[error("tile {0} is not being dragged")]
    NotDetached(TileId),
    /// Neither the drop area nor the origin had room; the tile was discarded.
    #[error("no free cell for tile {} near {cell}", .tile.id)]
    Displaced {
        /// Tile that could not be reinserted.
        tile: PlacedTile,
        /// Cell the tile was dropped on.
        cell: GridCoord,
    },
}

/// How a dropped tile found its final cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropResolution {
    /// The drop cell was free.
    Exact,
    /// The drop cell was taken; the nearest free cell was used.
    Nearest,
    /// Nothing was free within the search radius; the tile went back to its origin.
    Origin,
}

/// Tile lifted out of the grid while it is dragged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetachedTile {
    /// Tile as it was before it was lifted.
    pub tile: PlacedTile,
    /// Cell the tile occupied before it was lifted.
    pub origin: GridCoord,
}

/// Outcome of returning a detached tile to the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reinsertion {
    /// Tile at its final position.
    pub tile: PlacedTile,
    /// Cell the tile occupied before it was lifted.
    pub origin: GridCoord,
    /// How the final cell was chosen.
    pub resolution: DropResolution,
}

/// Canonical, order-independent description of a layout used to detect unsaved edits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutSnapshot {
    rows: Vec<(i32, i32, PlantId)>,
}

impl LayoutSnapshot {
    /// Builds a snapshot from persisted rows.
    #[must_use]
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a PersistedTile>) -> Self {
        let mut rows: Vec<(i32, i32, PlantId)> = rows
            .into_iter()
            .map(|row| (row.grid_x, row.grid_y, row.plant_id.clone()))
            .collect();
        rows.sort();
        Self { rows }
    }

    /// Number of tiles described by the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Reports whether the snapshot describes an empty layout.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Authoritative set of placed tiles with an O(1) cell index.
#[derive(Clone, Debug, Default)]
pub struct LayoutStore {
    tiles: BTreeMap<TileId, PlacedTile>,
    index: HashMap<GridCoord, TileId>,
    detached: BTreeMap<TileId, DetachedTile>,
    next_tile_id: u32,
    dirty: bool,
}

impl LayoutStore {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole layout with the provided rows without touching any inventory.
    ///
    /// When several rows address the same cell the last one wins.
    pub fn load<'a>(&mut self, rows: impl IntoIterator<Item = &'a PersistedTile>) {
        self.tiles.clear();
        self.index.clear();
        self.detached.clear();
        for row in rows {
            let cell = row.cell();
            if let Some(previous) = self.index.get(&cell).copied() {
                let _ = self.tiles.remove(&previous);
            }
            let tile = PlacedTile::new(self.allocate_id(), row.plant_id.clone(), cell);
            self.insert(tile);
        }
        self.dirty = true;
    }

    /// Places a new tile, taking one instance from the ledger.
    ///
    /// Occupied cells are rejected before the ledger is consulted, so a
    /// rejection never changes stock.
    pub fn place(
        &mut self,
        plant: &PlantId,
        cell: GridCoord,
        ledger: &mut InventoryLedger,
    ) -> Result<PlacedTile, PlacementError> {
        if !self.is_free(cell) {
            return Err(PlacementError::Occupied);
        }
        if !ledger.decrement(plant) {
            return Err(PlacementError::OutOfStock);
        }
        let tile = PlacedTile::new(self.allocate_id(), plant.clone(), cell);
        self.insert(tile.clone());
        self.dirty = true;
        Ok(tile)
    }

    /// Removes the tile at `cell`, returning its instance to the ledger.
    pub fn remove(&mut self, cell: GridCoord, ledger: &mut InventoryLedger) -> Option<PlacedTile> {
        let id = self.index.remove(&cell)?;
        let tile = self.tiles.remove(&id)?;
        ledger.restore(&tile.plant);
        self.dirty = true;
        Some(tile)
    }

    /// Relocates a placed tile without touching stock, returning its previous cell.
    pub fn move_tile(&mut self, id: TileId, cell: GridCoord) -> Result<GridCoord, MoveError> {
        let origin = self
            .tiles
            .get(&id)
            .map(|tile| tile.cell)
            .ok_or(MoveError::MissingTile(id))?;
        if origin == cell {
            return Ok(origin);
        }
        if !self.is_free(cell) {
            return Err(MoveError::Occupied(cell));
        }
        let _ = self.index.remove(&origin);
        let _ = self.index.insert(cell, id);
        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.cell = cell;
        }
        self.dirty = true;
        Ok(origin)
    }

    /// Lifts the tile at `cell` out of the grid so it can be dragged.
    ///
    /// The cell becomes free; stock is untouched.
    pub fn detach(&mut self, cell: GridCoord) -> Option<PlacedTile> {
        let id = self.index.remove(&cell)?;
        let tile = self.tiles.remove(&id)?;
        let _ = self.detached.insert(
            id,
            DetachedTile {
                tile: tile.clone(),
                origin: cell,
            },
        );
        self.dirty = true;
        Some(tile)
    }

    /// Returns a detached tile to the grid at, or near, `drop_cell`.
    ///
    /// An occupied drop cell is resolved with [`LayoutStore::nearest_free`]
    /// within `search_radius`; when that finds nothing the tile snaps back to
    /// its origin. If the origin was taken in the meantime the tile is
    /// discarded and reported through [`LayoutError::Displaced`] so the caller
    /// can return its instance to the inventory.
    pub fn reinsert(
        &mut self,
        id: TileId,
        drop_cell: GridCoord,
        search_radius: u32,
    ) -> Result<Reinsertion, LayoutError> {
        let DetachedTile { tile, origin } = self
            .detached
            .remove(&id)
            .ok_or(LayoutError::NotDetached(id))?;
        self.dirty = true;

        let (cell, resolution) = if self.is_free(drop_cell) {
            (drop_cell, DropResolution::Exact)
        } else if let Some(cell) = self.nearest_free(drop_cell, search_radius) {
            (cell, DropResolution::Nearest)
        } else if self.is_free(origin) {
            debug!(tile = %id, cell = %drop_cell, "no room near drop; returning to origin");
            (origin, DropResolution::Origin)
        } else {
            return Err(LayoutError::Displaced {
                tile,
                cell: drop_cell,
            });
        };

        let tile = PlacedTile::new(tile.id, tile.plant, cell);
        self.insert(tile.clone());
        Ok(Reinsertion {
            tile,
            origin,
            resolution,
        })
    }

    /// Detached tile with the provided handle.
    #[must_use]
    pub fn detached(&self, id: TileId) -> Option<&DetachedTile> {
        self.detached.get(&id)
    }

    /// Handles of every detached tile.
    #[must_use]
    pub fn detached_ids(&self) -> Vec<TileId> {
        self.detached.keys().copied().collect()
    }

    /// First free cell at or around `center`, scanning Chebyshev rings up to `max_radius`.
    #[must_use]
    pub fn nearest_free(&self, center: GridCoord, max_radius: u32) -> Option<GridCoord> {
        search::nearest_free(center, max_radius, |cell| self.is_free(cell))
    }

    /// Removes every tile, detached ones included, returning one instance per tile.
    pub fn clear(&mut self, ledger: &mut InventoryLedger) -> Vec<PlacedTile> {
        let mut removed: Vec<PlacedTile> = std::mem::take(&mut self.tiles).into_values().collect();
        removed.extend(
            std::mem::take(&mut self.detached)
                .into_values()
                .map(|detached| detached.tile),
        );
        self.index.clear();
        for tile in &removed {
            ledger.restore(&tile.plant);
        }
        self.dirty = true;
        removed
    }

    /// Looks up a placed tile by handle.
    #[must_use]
    pub fn tile(&self, id: TileId) -> Option<&PlacedTile> {
        self.tiles.get(&id)
    }

    /// Placed tiles in handle order.
    pub fn tiles(&self) -> impl Iterator<Item = &PlacedTile> {
        self.tiles.values()
    }

    /// Number of placed tiles, excluding detached ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether no tile is placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of placed and detached tiles of the plant type.
    #[must_use]
    pub fn count_of(&self, plant: &PlantId) -> usize {
        self.tiles.values().filter(|tile| &tile.plant == plant).count()
            + self
                .detached
                .values()
                .filter(|detached| &detached.tile.plant == plant)
                .count()
    }

    /// Placed tiles in painter's order: ascending `x + y`, then ascending `x`.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&PlacedTile> {
        let mut ordered: Vec<&PlacedTile> = self.tiles.values().collect();
        ordered.sort_by_key(|tile| (tile.cell.depth(), tile.cell.x()));
        ordered
    }

    /// Persisted rows for every tile, detached tiles at their origin.
    #[must_use]
    pub fn persisted(&self) -> Vec<PersistedTile> {
        self.tiles
            .values()
            .map(PlacedTile::to_persisted)
            .chain(
                self.detached
                    .values()
                    .map(|detached| PersistedTile::new(detached.tile.plant.clone(), detached.origin)),
            )
            .collect()
    }

    /// Canonical snapshot of the layout, detached tiles counted at their origin.
    #[must_use]
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot::from_rows(&self.persisted())
    }

    /// Returns and clears the flag raised by every mutation.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    fn allocate_id(&mut self) -> TileId {
        let id = TileId::new(self.next_tile_id);
        self.next_tile_id = self.next_tile_id.wrapping_add(1);
        id
    }

    fn insert(&mut self, tile: PlacedTile) {
        let _ = self.index.insert(tile.cell, tile.id);
        let _ = self.tiles.insert(tile.id, tile);
    }
}

impl Occupancy for LayoutStore {
    fn occupant_at(&self, cell: GridCoord) -> Option<&PlacedTile> {
        self.index.get(&cell).and_then(|id| self.tiles.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_garden_inventory::StockPolicy;
    use std::time::Duration;

    fn ledger() -> InventoryLedger {
        InventoryLedger::with_defaults(StockPolicy::Limited, Duration::from_millis(750))
    }

    fn sakura() -> PlantId {
        PlantId::from("sakura")
    }

    #[test]
    fn placing_on_an_occupied_cell_is_rejected_before_stock_changes() {
        let mut store = LayoutStore::new();
        let mut ledger = ledger();
        let first = store
            .place(&sakura(), GridCoord::new(0, 0), &mut ledger)
            .expect("first placement");
        assert_eq!(
            store.place(&PlantId::from("sprout"), GridCoord::new(0, 0), &mut ledger),
            Err(PlacementError::Occupied)
        );
        assert_eq!(store.occupant_at(GridCoord::new(0, 0)), Some(&first));
        assert_eq!(ledger.quantity(&PlantId::from("sprout")), 5);
    }

    #[test]
    fn out_of_stock_placement_leaves_cell_free() {
        let mut store = LayoutStore::new();
        let mut ledger = ledger();
        let pine = PlantId::from("pine");
        assert_eq!(
            store.place(&pine, GridCoord::new(2, 2), &mut ledger),
            Err(PlacementError::OutOfStock)
        );
        assert!(store.is_free(GridCoord::new(2, 2)));
        assert!(!store.take_dirty());
    }

    #[test]
    fn removing_an_empty_cell_is_a_no_op() {
        let mut store = LayoutStore::new();
        let mut ledger = ledger();
        assert_eq!(store.remove(GridCoord::new(9, 9), &mut ledger), None);
        assert!(!store.take_dirty());
        assert!(!ledger.has_pending());
    }

    #[test]
    fn move_rejects_occupied_destinations_and_missing_tiles() {
        let mut store = LayoutStore::new();
        let mut ledger = ledger();
        let a = store
            .place(&sakura(), GridCoord::new(0, 0), &mut ledger)
            .expect("place a");
        let _ = store
            .place(&sakura(), GridCoord::new(1, 0), &mut ledger)
            .expect("place b");

        assert_eq!(
            store.move_tile(a.id, GridCoord::new(1, 0)),
            Err(MoveError::Occupied(GridCoord::new(1, 0)))
        );
        assert_eq!(
            store.move_tile(TileId::new(99), GridCoord::new(5, 5)),
            Err(MoveError::MissingTile(TileId::new(99)))
        );
        assert_eq!(store.move_tile(a.id, GridCoord::new(0, 3)), Ok(GridCoord::new(0, 0)));
        assert!(store.is_free(GridCoord::new(0, 0)));
        assert_eq!(
            store.occupant_at(GridCoord::new(0, 3)).map(|tile| tile.id),
            Some(a.id)
        );
        assert_eq!(ledger.quantity(&sakura()), 3, "moves never touch stock");
    }

    #[test]
    fn detached_tiles_free_their_cell_and_keep_stock() {
        let mut store = LayoutStore::new();
        let mut ledger = ledger();
        let tile = store
            .place(&sakura(), GridCoord::new(0, 0), &mut ledger)
            .expect("place");
        let lifted = store.detach(GridCoord::new(0, 0)).expect("detach");

        assert_eq!(lifted, tile);
        assert!(store.is_free(GridCoord::new(0, 0)));
        assert_eq!(store.count_of(&sakura()), 1);
        assert_eq!(ledger.quantity(&sakura()), 4);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn reinsert_snaps_back_to_origin_when_drop_area_is_full() {
        let mut store = LayoutStore::new();
        let mut ledger = InventoryLedger::new(StockPolicy::Unlimited, Duration::ZERO);
        let tile = store
            .place(&sakura(), GridCoord::new(10, 10), &mut ledger)
            .expect("place");
        let _ = store.place(&sakura(), GridCoord::new(0, 0), &mut ledger).expect("blocker");
        let _ = store.detach(tile.cell).expect("detach");

        let outcome = store
            .reinsert(tile.id, GridCoord::new(0, 0), 0)
            .expect("reinsert");
        assert_eq!(outcome.resolution, DropResolution::Origin);
        assert_eq!(outcome.tile.cell, GridCoord::new(10, 10));
        assert_eq!(outcome.tile.id, tile.id);
    }

    #[test]
    fn reinsert_reports_unknown_handles() {
        let mut store = LayoutStore::new();
        assert_eq!(
            store.reinsert(TileId::new(3), GridCoord::new(0, 0), 6),
            Err(LayoutError::NotDetached(TileId::new(3)))
        );
    }

    #[test]
    fn load_keeps_the_last_row_for_each_cell() {
        let mut store = LayoutStore::new();
        store.load(&[
            PersistedTile::new(PlantId::from("pine"), GridCoord::new(1, 1)),
            PersistedTile::new(PlantId::from("fire"), GridCoord::new(2, 1)),
            PersistedTile::new(PlantId::from("frost"), GridCoord::new(1, 1)),
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(
            store
                .occupant_at(GridCoord::new(1, 1))
                .map(|tile| tile.plant.clone()),
            Some(PlantId::from("frost"))
        );
    }

    #[test]
    fn paint_order_sorts_by_diagonal_sum() {
        let mut store = LayoutStore::new();
        store.load(&[
            PersistedTile::new(PlantId::from("pine"), GridCoord::new(3, 3)),
            PersistedTile::new(PlantId::from("pine"), GridCoord::new(2, -1)),
            PersistedTile::new(PlantId::from("pine"), GridCoord::new(-1, 2)),
            PersistedTile::new(PlantId::from("pine"), GridCoord::new(0, 0)),
        ]);
        let cells: Vec<GridCoord> = store.paint_order().iter().map(|tile| tile.cell).collect();
        assert_eq!(
            cells,
            vec![
                GridCoord::new(0, 0),
                GridCoord::new(-1, 2),
                GridCoord::new(2, -1),
                GridCoord::new(3, 3)
            ]
        );
    }

    #[test]
    fn clear_restores_one_instance_per_tile() {
        let mut store = LayoutStore::new();
        let mut ledger = ledger();
        for x in 0..3 {
            let _ = store
                .place(&sakura(), GridCoord::new(x, 0), &mut ledger)
                .expect("place");
        }
        let _ = store.detach(GridCoord::new(1, 0)).expect("detach");

        let removed = store.clear(&mut ledger);
        assert_eq!(removed.len(), 3);
        assert!(store.is_empty());
        assert!(store.detached_ids().is_empty());
        assert_eq!(ledger.quantity(&sakura()), 5);
    }

    #[test]
    fn snapshots_ignore_tile_handles_and_insertion_order() {
        let rows = [
            PersistedTile::new(PlantId::from("pine"), GridCoord::new(0, 1)),
            PersistedTile::new(PlantId::from("fire"), GridCoord::new(4, -2)),
        ];
        let mut forward = LayoutStore::new();
        forward.load(&rows);
        let mut backward = LayoutStore::new();
        backward.load(rows.iter().rev());
        assert_eq!(forward.snapshot(), backward.snapshot());
        assert_eq!(forward.snapshot(), LayoutSnapshot::from_rows(&rows));
    }
}
