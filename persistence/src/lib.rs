#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Durable storage for garden layouts.
//!
//! Two stores are involved: a remote [`RemoteStore`] that is authoritative
//! across devices and a per-profile [`LocalCache`] that survives offline
//! sessions. Loading prefers the remote copy, falls back to the cache and
//! finally to an empty layout; it never fails.

mod atomic;
mod cache;
mod error;
mod remote;
mod worker;

use std::collections::HashMap;

use iso_garden_core::{Camera, GridCoord, PersistedTile};
use tracing::{info, warn};

pub use cache::{CacheEnvelope, CameraHint, LocalCache, CACHE_VERSION};
pub use error::{CacheError, RemoteError};
pub use remote::{FileRemote, MemoryRemote, RemoteOp, RemoteStore};
pub use worker::{dispatch, RemoteOutcome, RemoteRequest, RemoteWorker};

/// Where a loaded layout came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutSource {
    /// The remote store returned a non-empty layout.
    Remote,
    /// The remote copy was unavailable or empty; the local cache was used.
    Cache,
    /// Neither store had a layout.
    Empty,
}

/// Layout adopted at start-up.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedLayout {
    /// Normalised rows, at most one per coordinate.
    pub tiles: Vec<PersistedTile>,
    /// Unsanitised camera hint from the cache, if the cache was used.
    pub camera: Option<Camera>,
    /// Store that provided the rows.
    pub source: LayoutSource,
}

/// Deduplicates rows by coordinate.
///
/// Each coordinate keeps the position of its first row and the contents of
/// its last row.
#[must_use]
pub fn normalize(rows: Vec<PersistedTile>) -> Vec<PersistedTile> {
    let mut positions: HashMap<GridCoord, usize> = HashMap::with_capacity(rows.len());
    let mut unique: Vec<PersistedTile> = Vec::with_capacity(rows.len());
    for row in rows {
        match positions.get(&row.cell()) {
            Some(&position) => unique[position] = row,
            None => {
                let _ = positions.insert(row.cell(), unique.len());
                unique.push(row);
            }
        }
    }
    unique
}

/// Loads the layout, trying the remote store, then the cache, then nothing.
///
/// An empty remote layout counts as absent. Failures are logged and never
/// surface to the caller.
pub fn load_layout(remote: Option<&mut dyn RemoteStore>, cache: &LocalCache) -> LoadedLayout {
    if let Some(remote) = remote {
        match remote.fetch_layout() {
            Ok(rows) if !rows.is_empty() => {
                let tiles = normalize(rows);
                info!(tiles = tiles.len(), "layout loaded from remote store");
                return LoadedLayout {
                    tiles,
                    camera: None,
                    source: LayoutSource::Remote,
                };
            }
            Ok(_) => info!("remote layout empty; trying local cache"),
            Err(error) => warn!(error = %error, "remote layout fetch failed; trying local cache"),
        }
    }

    match cache.read() {
        Ok(Some(envelope)) => {
            let tiles = normalize(envelope.tiles);
            info!(
                tiles = tiles.len(),
                path = %cache.path().display(),
                saved_at = %envelope.saved_at,
                "layout loaded from local cache"
            );
            LoadedLayout {
                tiles,
                camera: envelope.camera.map(CameraHint::to_camera),
                source: LayoutSource::Cache,
            }
        }
        Ok(None) => {
            info!("no stored layout; starting empty");
            empty()
        }
        Err(error) => {
            warn!(error = %error, "local cache unreadable; starting empty");
            empty()
        }
    }
}

fn empty() -> LoadedLayout {
    LoadedLayout {
        tiles: Vec::new(),
        camera: None,
        source: LayoutSource::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_garden_core::PlantId;

    fn row(plant: &str, x: i32, y: i32) -> PersistedTile {
        PersistedTile::new(PlantId::from(plant), GridCoord::new(x, y))
    }

    #[test]
    fn normalize_keeps_first_position_and_last_value() {
        let rows = vec![
            row("pine", 0, 0),
            row("fire", 1, 0),
            row("frost", 0, 0),
            row("palm", 2, 2),
        ];
        assert_eq!(
            normalize(rows),
            vec![row("frost", 0, 0), row("fire", 1, 0), row("palm", 2, 2)]
        );
    }

    #[test]
    fn remote_layout_wins_when_present() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = LocalCache::for_profile(dir.path(), Some("p"));
        cache
            .store(vec![row("pine", 9, 9)], Camera::default())
            .expect("seed cache");
        let mut remote = MemoryRemote::with_contents(vec![row("sakura", 0, 0)], &[]);

        let loaded = load_layout(Some(&mut remote), &cache);
        assert_eq!(loaded.source, LayoutSource::Remote);
        assert_eq!(loaded.tiles, vec![row("sakura", 0, 0)]);
        assert_eq!(loaded.camera, None);
    }

    #[test]
    fn empty_remote_layout_falls_back_to_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = LocalCache::for_profile(dir.path(), Some("p"));
        cache
            .store(vec![row("pine", 9, 9)], Camera::new(1.0, 2.0, 0.5))
            .expect("seed cache");
        let mut remote = MemoryRemote::new();

        let loaded = load_layout(Some(&mut remote), &cache);
        assert_eq!(loaded.source, LayoutSource::Cache);
        assert_eq!(loaded.camera, Some(Camera::new(1.0, 2.0, 0.5)));
    }

    #[test]
    fn unreadable_stores_yield_an_empty_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = LocalCache::for_profile(dir.path(), None);
        std::fs::write(cache.path(), b"garbage").expect("seed");
        let mut remote = MemoryRemote::new();
        remote.set_online(false);

        let loaded = load_layout(Some(&mut remote), &cache);
        assert_eq!(loaded.source, LayoutSource::Empty);
        assert!(loaded.tiles.is_empty());
    }
}
