//! `garden.toml` settings.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use iso_garden_core::{Camera, Viewport, ZoomLimits};
use iso_garden_persistence::LocalCache;
use iso_garden_session::{SessionSettings, DEFAULT_DROP_SEARCH_RADIUS};
use serde::Deserialize;
use thiserror::Error;

/// File read when no `--config` is given, if it exists.
pub(crate) const DEFAULT_CONFIG_PATH: &str = "garden.toml";

/// Errors raised while reading the configuration file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read configuration at {}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML or has unexpected keys.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The zoom bounds are unusable.
    #[error("zoom range {min}..={max} must be positive and ordered")]
    ZoomRange {
        /// Configured lower bound.
        min: f32,
        /// Configured upper bound.
        max: f32,
    },
}

/// Editor settings; every key is optional.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GardenConfig {
    pub(crate) camera: Camera,
    pub(crate) zoom_min: f32,
    pub(crate) zoom_max: f32,
    pub(crate) debounce_ms: u64,
    pub(crate) drop_search_radius: u32,
    pub(crate) profile: Option<String>,
    pub(crate) cache_dir: PathBuf,
    pub(crate) remote_file: Option<PathBuf>,
    pub(crate) manifest: PathBuf,
}

impl Default for GardenConfig {
    fn default() -> Self {
        let limits = ZoomLimits::default();
        Self {
            camera: Camera::default(),
            zoom_min: limits.min,
            zoom_max: limits.max,
            debounce_ms: 750,
            drop_search_radius: DEFAULT_DROP_SEARCH_RADIUS,
            profile: None,
            cache_dir: PathBuf::from(".garden-cache"),
            remote_file: None,
            manifest: PathBuf::from("assets/manifest.toml"),
        }
    }
}

impl GardenConfig {
    /// Reads `path`, or `garden.toml` when present, or falls back to defaults.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parses and validates configuration text.
    pub(crate) fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        if !(config.zoom_min > 0.0 && config.zoom_min <= config.zoom_max) {
            return Err(ConfigError::ZoomRange {
                min: config.zoom_min,
                max: config.zoom_max,
            });
        }
        Ok(config)
    }

    /// Session tunables derived from the file.
    pub(crate) fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            camera: self.camera,
            zoom_limits: ZoomLimits::new(self.zoom_min, self.zoom_max),
            viewport: Viewport::new(1280.0, 720.0),
            sync_window: Duration::from_millis(self.debounce_ms),
            drop_search_radius: self.drop_search_radius,
            profile: self.profile.clone(),
        }
    }

    /// Local cache file of the configured profile.
    pub(crate) fn local_cache(&self) -> LocalCache {
        LocalCache::for_profile(&self.cache_dir, self.profile.as_deref())
    }
}
