//! Local fallback copy of the layout, one file per profile.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use iso_garden_core::{Camera, PersistedTile};
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{atomic::write_atomically, CacheError};

/// Envelope version written by this build.
pub const CACHE_VERSION: u32 = 2;

/// Camera as stored in the cache; components that were lost in transit are `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraHint {
    /// Horizontal pan offset.
    #[serde(default)]
    pub x: Option<f32>,
    /// Vertical pan offset.
    #[serde(default)]
    pub y: Option<f32>,
    /// Zoom factor.
    #[serde(default)]
    pub zoom: Option<f32>,
}

impl CameraHint {
    /// Camera with missing components set to NaN, ready for [`Camera::sanitized`].
    #[must_use]
    pub fn to_camera(self) -> Camera {
        Camera::new(
            self.x.unwrap_or(f32::NAN),
            self.y.unwrap_or(f32::NAN),
            self.zoom.unwrap_or(f32::NAN),
        )
    }
}

impl From<Camera> for CameraHint {
    fn from(camera: Camera) -> Self {
        Self {
            x: Some(camera.x),
            y: Some(camera.y),
            zoom: Some(camera.zoom),
        }
    }
}

/// Serialized cache document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    /// Format version.
    pub version: u32,
    /// RFC 3339 timestamp of the write.
    #[serde(rename = "savedAt")]
    pub saved_at: String,
    /// Every tile of the layout.
    pub tiles: Vec<PersistedTile>,
    /// View hint restored on load.
    #[serde(default)]
    pub camera: Option<CameraHint>,
}

impl CacheEnvelope {
    /// Builds a current-version envelope stamped with `saved_at`.
    pub fn new(
        tiles: Vec<PersistedTile>,
        camera: Camera,
        saved_at: OffsetDateTime,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            version: CACHE_VERSION,
            saved_at: saved_at.format(&Rfc3339)?,
            tiles,
            camera: Some(camera.into()),
        })
    }

    /// Parsed save timestamp, when it is well formed.
    #[must_use]
    pub fn saved_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.saved_at, &Rfc3339).ok()
    }
}

/// File-backed layout cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    /// Cache stored in `dir` for the profile; anonymous sessions share the `guest` file.
    #[must_use]
    pub fn for_profile(dir: impl AsRef<Path>, profile: Option<&str>) -> Self {
        let owner: String = profile
            .unwrap_or("guest")
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self {
            path: dir
                .as_ref()
                .join(format!("garden-layout-v1-{owner}.json")),
        }
    }

    /// Cache stored at an explicit path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the layout and camera stamped with the current time.
    pub fn store(&self, tiles: Vec<PersistedTile>, camera: Camera) -> Result<(), CacheError> {
        let envelope = CacheEnvelope::new(tiles, camera, OffsetDateTime::now_utc())?;
        self.write(&envelope)
    }

    /// Replaces the cache file with the envelope.
    pub fn write(&self, envelope: &CacheEnvelope) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(envelope)?;
        write_atomically(&self.path, &bytes).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Reads the cache file; a missing file yields `Ok(None)`.
    pub fn read(&self) -> Result<Option<CacheEnvelope>, CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let envelope: CacheEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version > CACHE_VERSION {
            return Err(CacheError::UnsupportedVersion {
                found: envelope.version,
                expected: CACHE_VERSION,
            });
        }
        Ok(Some(envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_garden_core::{GridCoord, PlantId};

    fn rows() -> Vec<PersistedTile> {
        vec![
            PersistedTile::new(PlantId::from("sakura"), GridCoord::new(0, 0)),
            PersistedTile::new(PlantId::from("pine"), GridCoord::new(-3, 2)),
        ]
    }

    #[test]
    fn profile_names_are_sanitised_into_file_names() {
        let cache = LocalCache::for_profile("cache", Some("user/../42"));
        assert_eq!(
            cache.path(),
            Path::new("cache/garden-layout-v1-user____42.json")
        );
        let guest = LocalCache::for_profile("cache", None);
        assert_eq!(guest.path(), Path::new("cache/garden-layout-v1-guest.json"));
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = LocalCache::for_profile(dir.path(), None);
        assert_eq!(cache.read().expect("read"), None);
    }

    #[test]
    fn stored_envelope_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = LocalCache::for_profile(dir.path(), Some("p1"));
        cache
            .store(rows(), Camera::new(12.0, -8.5, 2.0))
            .expect("store");

        let envelope = cache.read().expect("read").expect("present");
        assert_eq!(envelope.version, CACHE_VERSION);
        assert_eq!(envelope.tiles, rows());
        assert_eq!(
            envelope.camera.map(CameraHint::to_camera),
            Some(Camera::new(12.0, -8.5, 2.0))
        );
        assert!(envelope.saved_at().is_some(), "savedAt must be RFC 3339");
    }

    #[test]
    fn envelope_uses_camel_case_timestamp_key() {
        let envelope = CacheEnvelope::new(rows(), Camera::default(), OffsetDateTime::UNIX_EPOCH)
            .expect("envelope");
        let json = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(json["savedAt"], "1970-01-01T00:00:00Z");
        assert_eq!(json["version"], 2);
        assert_eq!(json["tiles"][0]["plant_id"], "sakura");
    }

    #[test]
    fn null_camera_components_survive_parsing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = LocalCache::for_profile(dir.path(), None);
        fs::write(
            cache.path(),
            r#"{"version":2,"savedAt":"x","tiles":[{"type":"fire","x":1,"y":2}],"camera":{"x":null,"y":5,"zoom":1.5}}"#,
        )
        .expect("seed");

        let envelope = cache.read().expect("read").expect("present");
        let camera = envelope.camera.expect("camera").to_camera();
        assert!(camera.x.is_nan());
        assert_eq!(camera.y, 5.0);
        assert_eq!(envelope.tiles[0].cell(), GridCoord::new(1, 2));
        assert_eq!(envelope.saved_at(), None);
    }

    #[test]
    fn newer_versions_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = LocalCache::for_profile(dir.path(), None);
        fs::write(cache.path(), r#"{"version":3,"savedAt":"","tiles":[]}"#).expect("seed");
        assert!(matches!(
            cache.read(),
            Err(CacheError::UnsupportedVersion { found: 3, .. })
        ));
    }

    #[test]
    fn corrupt_files_report_format_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = LocalCache::for_profile(dir.path(), None);
        fs::write(cache.path(), b"{not json").expect("seed");
        assert!(matches!(cache.read(), Err(CacheError::Format(_))));
    }
}
