use std::{collections::HashMap, path::Path};

use tracing::warn;

use crate::{AssetRef, SpriteManifest};

/// Images shared by every tile that references them, loaded once per asset.
///
/// Assets that fail to load are logged and left out; callers fall back to
/// colour fills or skip the layer.
#[derive(Debug)]
pub struct AssetCache<T> {
    assets: HashMap<AssetRef, T>,
}

impl<T> AssetCache<T> {
    /// Loads every manifest entry through `loader`, invoking it once per asset.
    pub fn load<F>(manifest: &SpriteManifest, mut loader: F) -> Self
    where
        F: FnMut(AssetRef, &Path) -> anyhow::Result<T>,
    {
        let mut assets = HashMap::with_capacity(manifest.entries().len());
        for (asset, path) in manifest.entries() {
            if assets.contains_key(asset) {
                continue;
            }
            match loader(*asset, path) {
                Ok(image) => {
                    let _ = assets.insert(*asset, image);
                }
                Err(error) => warn!(
                    asset = %asset,
                    path = %path.display(),
                    error = %format!("{error:#}"),
                    "sprite failed to load"
                ),
            }
        }
        Self { assets }
    }

    /// Shared image for the asset, when it loaded successfully.
    #[must_use]
    pub fn get(&self, asset: AssetRef) -> Option<&T> {
        self.assets.get(&asset)
    }

    /// Reports whether the asset is available.
    #[must_use]
    pub fn contains(&self, asset: AssetRef) -> bool {
        self.assets.contains_key(&asset)
    }

    /// Number of loaded assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Reports whether no asset loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self {
            assets: HashMap::new(),
        }
    }
}
