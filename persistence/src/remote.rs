//! Remote layout and inventory stores.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use iso_garden_core::{GridCoord, InventoryEntry, PersistedTile, PlantId};
use serde::{Deserialize, Serialize};

use crate::{atomic::write_atomically, RemoteError};

/// Durable store shared across devices.
///
/// Every call may fail; callers treat failures as non-fatal.
pub trait RemoteStore: Send {
    /// Upserts a single tile at its coordinate.
    fn place_tile(&mut self, tile: &PersistedTile) -> Result<(), RemoteError>;

    /// Deletes the tile of the given type at its coordinate.
    fn remove_tile(&mut self, tile: &PersistedTile) -> Result<(), RemoteError>;

    /// Replaces the whole stored layout.
    fn sync_layout(&mut self, tiles: &[PersistedTile]) -> Result<(), RemoteError>;

    /// Deletes every stored tile.
    fn clear_layout(&mut self) -> Result<(), RemoteError>;

    /// Reads the whole stored layout.
    fn fetch_layout(&mut self) -> Result<Vec<PersistedTile>, RemoteError>;

    /// Reads the stored inventory rows.
    fn fetch_inventory(&mut self) -> Result<Vec<InventoryEntry>, RemoteError>;

    /// Upserts inventory rows, each carrying an absolute quantity.
    fn upsert_inventory(&mut self, rows: &[InventoryEntry]) -> Result<(), RemoteError>;
}

/// Stored state of a garden: tiles keyed by coordinate plus inventory counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    tiles: Vec<PersistedTile>,
    #[serde(default)]
    inventory: BTreeMap<PlantId, u32>,
}

impl Document {
    fn place(&mut self, tile: &PersistedTile) {
        let cell = tile.cell();
        self.tiles.retain(|existing| existing.cell() != cell);
        self.tiles.push(tile.clone());
    }

    fn remove(&mut self, tile: &PersistedTile) {
        let cell = tile.cell();
        self.tiles
            .retain(|existing| existing.cell() != cell || existing.plant_id != tile.plant_id);
    }

    fn upsert(&mut self, rows: &[InventoryEntry]) {
        for row in rows {
            let _ = self.inventory.insert(row.plant.clone(), row.quantity);
        }
    }

    fn inventory_rows(&self) -> Vec<InventoryEntry> {
        self.inventory
            .iter()
            .map(|(plant, quantity)| InventoryEntry::new(plant.clone(), *quantity))
            .collect()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    document: Document,
    offline: bool,
    calls: Vec<&'static str>,
}

/// In-process store whose clones share state; can be switched offline to inject failures.
#[derive(Clone, Debug, Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRemote {
    /// Creates an empty, reachable store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding the provided tiles and inventory.
    #[must_use]
    pub fn with_contents(tiles: Vec<PersistedTile>, inventory: &[InventoryEntry]) -> Self {
        let remote = Self::new();
        if let Ok(mut state) = remote.state.lock() {
            state.document.tiles = tiles;
            state.document.upsert(inventory);
        }
        remote
    }

    /// Makes every subsequent call fail (`false`) or succeed (`true`).
    pub fn set_online(&self, online: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.offline = !online;
        }
    }

    /// Stored tiles.
    #[must_use]
    pub fn tiles(&self) -> Vec<PersistedTile> {
        self.state
            .lock()
            .map(|state| state.document.tiles.clone())
            .unwrap_or_default()
    }

    /// Stored quantity of the plant type.
    #[must_use]
    pub fn quantity(&self, plant: &PlantId) -> Option<u32> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.document.inventory.get(plant).copied())
    }

    /// Names of the operations attempted so far, failed ones included.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    fn reach(&self, operation: &'static str) -> Result<MutexGuard<'_, MemoryState>, RemoteError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RemoteError::Unavailable("memory store lock poisoned".to_owned()))?;
        state.calls.push(operation);
        if state.offline {
            return Err(RemoteError::Unavailable("network unreachable".to_owned()));
        }
        Ok(state)
    }
}

impl RemoteStore for MemoryRemote {
    fn place_tile(&mut self, tile: &PersistedTile) -> Result<(), RemoteError> {
        self.reach("place_tile")?.document.place(tile);
        Ok(())
    }

    fn remove_tile(&mut self, tile: &PersistedTile) -> Result<(), RemoteError> {
        self.reach("remove_tile")?.document.remove(tile);
        Ok(())
    }

    fn sync_layout(&mut self, tiles: &[PersistedTile]) -> Result<(), RemoteError> {
        self.reach("sync_layout")?.document.tiles = tiles.to_vec();
        Ok(())
    }

    fn clear_layout(&mut self) -> Result<(), RemoteError> {
        self.reach("clear_layout")?.document.tiles.clear();
        Ok(())
    }

    fn fetch_layout(&mut self) -> Result<Vec<PersistedTile>, RemoteError> {
        Ok(self.reach("fetch_layout")?.document.tiles.clone())
    }

    fn fetch_inventory(&mut self) -> Result<Vec<InventoryEntry>, RemoteError> {
        Ok(self.reach("fetch_inventory")?.document.inventory_rows())
    }

    fn upsert_inventory(&mut self, rows: &[InventoryEntry]) -> Result<(), RemoteError> {
        self.reach("upsert_inventory")?.document.upsert(rows);
        Ok(())
    }
}

/// Store persisted as a JSON document on disk.
///
/// Every operation re-reads the document so several editors may share a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRemote {
    path: PathBuf,
}

impl FileRemote {
    /// Store backed by the file at `path`; the file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Document, RemoteError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Document::default()),
            Err(error) => Err(error.into()),
        }
    }

    fn update(&self, change: impl FnOnce(&mut Document)) -> Result<(), RemoteError> {
        let mut document = self.load()?;
        change(&mut document);
        let bytes = serde_json::to_vec_pretty(&document)?;
        write_atomically(&self.path, &bytes)?;
        Ok(())
    }
}

impl RemoteStore for FileRemote {
    fn place_tile(&mut self, tile: &PersistedTile) -> Result<(), RemoteError> {
        self.update(|document| document.place(tile))
    }

    fn remove_tile(&mut self, tile: &PersistedTile) -> Result<(), RemoteError> {
        self.update(|document| document.remove(tile))
    }

    fn sync_layout(&mut self, tiles: &[PersistedTile]) -> Result<(), RemoteError> {
        self.update(|document| document.tiles = tiles.to_vec())
    }

    fn clear_layout(&mut self) -> Result<(), RemoteError> {
        self.update(|document| document.tiles.clear())
    }

    fn fetch_layout(&mut self) -> Result<Vec<PersistedTile>, RemoteError> {
        Ok(self.load()?.tiles)
    }

    fn fetch_inventory(&mut self) -> Result<Vec<InventoryEntry>, RemoteError> {
        Ok(self.load()?.inventory_rows())
    }

    fn upsert_inventory(&mut self, rows: &[InventoryEntry]) -> Result<(), RemoteError> {
        self.update(|document| document.upsert(rows))
    }
}

/// Single remote write issued by the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteOp {
    /// Upsert one tile.
    PlaceTile(PersistedTile),
    /// Delete one tile.
    RemoveTile(PersistedTile),
    /// Overwrite the whole layout.
    SyncLayout(Vec<PersistedTile>),
    /// Delete every tile.
    ClearLayout,
    /// Upsert inventory counters.
    UpsertInventory(Vec<InventoryEntry>),
}

impl RemoteOp {
    /// Stable operation name used in logs and failure events.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PlaceTile(_) => "place_tile",
            Self::RemoveTile(_) => "remove_tile",
            Self::SyncLayout(_) => "sync_layout",
            Self::ClearLayout => "clear_layout",
            Self::UpsertInventory(_) => "upsert_inventory",
        }
    }

    /// Executes the operation against the store.
    pub fn apply(&self, store: &mut dyn RemoteStore) -> Result<(), RemoteError> {
        match self {
            Self::PlaceTile(tile) => store.place_tile(tile),
            Self::RemoveTile(tile) => store.remove_tile(tile),
            Self::SyncLayout(tiles) => store.sync_layout(tiles),
            Self::ClearLayout => store.clear_layout(),
            Self::UpsertInventory(rows) => store.upsert_inventory(rows),
        }
    }

    /// Coordinate touched by single-tile operations.
    #[must_use]
    pub fn cell(&self) -> Option<GridCoord> {
        match self {
            Self::PlaceTile(tile) | Self::RemoveTile(tile) => Some(tile.cell()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(plant: &str, x: i32, y: i32) -> PersistedTile {
        PersistedTile::new(PlantId::from(plant), GridCoord::new(x, y))
    }

    #[test]
    fn place_tile_upserts_by_coordinate() {
        let mut remote = MemoryRemote::new();
        remote.place_tile(&row("pine", 0, 0)).expect("place");
        remote.place_tile(&row("fire", 0, 0)).expect("replace");
        assert_eq!(remote.tiles(), vec![row("fire", 0, 0)]);
    }

    #[test]
    fn remove_tile_requires_matching_type() {
        let mut remote = MemoryRemote::with_contents(vec![row("pine", 1, 1)], &[]);
        remote.remove_tile(&row("fire", 1, 1)).expect("remove");
        assert_eq!(remote.tiles().len(), 1);
        remote.remove_tile(&row("pine", 1, 1)).expect("remove");
        assert!(remote.tiles().is_empty());
    }

    #[test]
    fn offline_store_fails_every_call_and_keeps_state() {
        let mut remote = MemoryRemote::with_contents(vec![row("pine", 1, 1)], &[]);
        remote.set_online(false);
        assert!(matches!(
            remote.clear_layout(),
            Err(RemoteError::Unavailable(_))
        ));
        assert!(remote.fetch_layout().is_err());
        assert_eq!(remote.tiles().len(), 1);
        assert_eq!(remote.calls(), vec!["clear_layout", "fetch_layout"]);
    }

    #[test]
    fn clones_share_state() {
        let remote = MemoryRemote::new();
        let mut writer = remote.clone();
        writer
            .upsert_inventory(&[InventoryEntry::new(PlantId::from("sakura"), 3)])
            .expect("upsert");
        assert_eq!(remote.quantity(&PlantId::from("sakura")), Some(3));
    }

    #[test]
    fn file_remote_persists_between_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("remote.json");

        let mut first = FileRemote::new(&path);
        assert!(first.fetch_layout().expect("empty fetch").is_empty());
        first.place_tile(&row("sakura", 2, 3)).expect("place");
        first
            .upsert_inventory(&[InventoryEntry::new(PlantId::from("sakura"), 4)])
            .expect("upsert");

        let mut second = FileRemote::new(&path);
        assert_eq!(second.fetch_layout().expect("fetch"), vec![row("sakura", 2, 3)]);
        assert_eq!(
            second.fetch_inventory().expect("inventory"),
            vec![InventoryEntry::new(PlantId::from("sakura"), 4)]
        );
    }

    #[test]
    fn file_remote_reports_corrupt_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("remote.json");
        fs::write(&path, b"[").expect("seed");
        assert!(matches!(
            FileRemote::new(&path).fetch_layout(),
            Err(RemoteError::Format(_))
        ));
    }

    #[test]
    fn ops_dispatch_to_matching_store_calls() {
        let mut remote = MemoryRemote::new();
        for op in [
            RemoteOp::PlaceTile(row("pine", 0, 0)),
            RemoteOp::RemoveTile(row("pine", 0, 0)),
            RemoteOp::SyncLayout(vec![row("fire", 1, 0)]),
            RemoteOp::ClearLayout,
            RemoteOp::UpsertInventory(Vec::new()),
        ] {
            op.apply(&mut remote).expect("apply");
        }
        let expected: Vec<&str> = vec![
            "place_tile",
            "remove_tile",
            "sync_layout",
            "clear_layout",
            "upsert_inventory",
        ];
        assert_eq!(remote.calls(), expected);
        assert_eq!(RemoteOp::ClearLayout.name(), "clear_layout");
    }
}
