use std::{fs, path::Path};

use anyhow::{Context, Result};
use glam::Vec2;
use iso_garden_catalog::{AssetCache, AssetRef, SpriteManifest};
use iso_garden_rendering::PlantDraw;
use macroquad::{
    color::Color,
    math::Vec2 as MacroquadVec2,
    texture::{self, DrawTextureParams, Texture2D},
};
use tracing::debug;

/// Textures of every sprite that loaded, shared by all tiles using them.
#[derive(Debug, Default)]
pub(crate) struct SpriteAtlas {
    textures: AssetCache<Texture2D>,
}

impl SpriteAtlas {
    /// Loads every image named by the manifest from disk.
    pub(crate) fn load(manifest: &SpriteManifest) -> Self {
        Self::with_loader(manifest, default_loader)
    }

    fn with_loader<F>(manifest: &SpriteManifest, loader: F) -> Self
    where
        F: FnMut(AssetRef, &Path) -> Result<Texture2D>,
    {
        Self {
            textures: AssetCache::load(manifest, loader),
        }
    }

    /// Number of textures held.
    pub(crate) fn len(&self) -> usize {
        self.textures.len()
    }

    /// Draws the plant's sprite layers in order and reports whether any was drawn.
    pub(crate) fn draw_plant(&self, plant: &PlantDraw) -> bool {
        let mut drawn = false;
        for layer in &plant.layers {
            let Some(texture) = self.textures.get(layer.asset) else {
                continue;
            };
            let size = Vec2::new(texture.width(), texture.height());
            match plant.fit(size, layer) {
                Ok(rect) => {
                    texture::draw_texture_ex(
                        *texture,
                        rect.x,
                        rect.y,
                        Color::new(1.0, 1.0, 1.0, layer.opacity),
                        DrawTextureParams {
                            dest_size: Some(MacroquadVec2::new(rect.width, rect.height)),
                            ..DrawTextureParams::default()
                        },
                    );
                    drawn = true;
                }
                Err(error) => debug!(%error, "sprite layer skipped"),
            }
        }
        drawn
    }
}

fn default_loader(_asset: AssetRef, path: &Path) -> Result<Texture2D> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read sprite asset at {}", path.display()))?;
    Ok(Texture2D::from_file_with_format(&bytes, None))
}
