use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;

use crate::{AssetRef, Catalog};

/// Manifest format version understood by [`SpriteManifest::parse`].
pub const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Errors raised while validating a sprite manifest against the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The manifest is not valid TOML or does not match the expected shape.
    #[error("failed to parse sprite manifest: {0}")]
    Parse(#[from] toml::de::Error),
    /// The manifest declares a format version this build cannot read.
    #[error("unsupported sprite manifest version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version declared by the manifest.
        found: u32,
        /// Version supported by this build.
        expected: u32,
    },
    /// The manifest names an asset no tile type references.
    #[error("sprite manifest contains unexpected keys: {0}")]
    UnknownAsset(String),
    /// A catalog asset has no manifest entry.
    #[error("sprite manifest missing entry for `{0}`")]
    MissingAsset(AssetRef),
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    version: u32,
    sprites: HashMap<String, String>,
}

/// Validated mapping from catalog assets to image files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteManifest {
    entries: Vec<(AssetRef, PathBuf)>,
}

impl SpriteManifest {
    /// Reads and validates the manifest stored at `path`.
    ///
    /// Image paths are resolved relative to the manifest's directory.
    pub fn from_path(path: impl AsRef<Path>, catalog: &Catalog) -> anyhow::Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read sprite manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::parse(&contents, &base, catalog)
            .with_context(|| format!("invalid sprite manifest {}", manifest_path.display()))
    }

    /// Parses manifest text, requiring exactly one entry per catalog asset.
    ///
    /// Entries are returned in the catalog's asset order regardless of the
    /// order used in the file.
    pub fn parse(
        contents: &str,
        base_path: &Path,
        catalog: &Catalog,
    ) -> Result<Self, CatalogError> {
        let manifest: RawManifest = toml::from_str(contents)?;
        if manifest.version != SUPPORTED_MANIFEST_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                found: manifest.version,
                expected: SUPPORTED_MANIFEST_VERSION,
            });
        }

        let mut declared = manifest.sprites;
        let mut entries = Vec::with_capacity(declared.len());
        for asset in catalog.asset_refs() {
            let Some(relative) = declared.remove(asset.key()) else {
                return Err(CatalogError::MissingAsset(asset));
            };
            entries.push((asset, base_path.join(relative)));
        }

        if !declared.is_empty() {
            let mut unexpected: Vec<String> = declared.into_keys().collect();
            unexpected.sort();
            return Err(CatalogError::UnknownAsset(unexpected.join(", ")));
        }

        Ok(Self { entries })
    }

    /// Creates a manifest from explicit entries.
    #[must_use]
    pub fn from_entries(entries: Vec<(AssetRef, PathBuf)>) -> Self {
        Self { entries }
    }

    /// Asset and image path pairs in load order.
    #[must_use]
    pub fn entries(&self) -> &[(AssetRef, PathBuf)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE: &str = r#"
        version = 1

        [sprites]
        sakura = "plants/sakura.png"
        carnation = "plants/carnation.png"
        lavander = "plants/lavander.png"
    "#;

    #[test]
    fn manifest_resolves_paths_in_catalog_order() {
        let manifest = SpriteManifest::parse(COMPLETE, Path::new("assets"), &Catalog::builtin())
            .expect("manifest should parse");
        let keys: Vec<&str> = manifest
            .entries()
            .iter()
            .map(|(asset, _)| asset.key())
            .collect();
        assert_eq!(keys, vec!["carnation", "lavander", "sakura"]);
        assert_eq!(
            manifest.entries()[2].1,
            PathBuf::from("assets/plants/sakura.png")
        );
    }

    #[test]
    fn manifest_requires_every_catalog_asset() {
        let partial = r#"
            version = 1

            [sprites]
            carnation = "plants/carnation.png"
            lavander = "plants/lavander.png"
        "#;
        let result = SpriteManifest::parse(partial, Path::new("assets"), &Catalog::builtin());
        assert!(
            matches!(result, Err(CatalogError::MissingAsset(asset)) if asset.key() == "sakura"),
            "manifest without sakura should fail"
        );
    }

    #[test]
    fn manifest_rejects_unknown_keys() {
        let extra = format!("{COMPLETE}\n        cactus = \"plants/cactus.png\"\n");
        let result = SpriteManifest::parse(&extra, Path::new("assets"), &Catalog::builtin());
        assert!(
            matches!(result, Err(CatalogError::UnknownAsset(ref keys)) if keys == "cactus"),
            "unknown keys must be rejected, got {result:?}"
        );
    }

    #[test]
    fn manifest_rejects_future_versions() {
        let future = COMPLETE.replace("version = 1", "version = 2");
        let result = SpriteManifest::parse(&future, Path::new("assets"), &Catalog::builtin());
        assert!(matches!(
            result,
            Err(CatalogError::UnsupportedVersion {
                found: 2,
                expected: 1
            })
        ));
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let result = SpriteManifest::parse("version = [", Path::new("."), &Catalog::builtin());
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }
}
