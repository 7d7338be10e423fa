#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Static catalog of plant tile types and the render metadata attached to them.
//!
//! Tile types are defined once at start-up and never mutated. Sprites refer to
//! shared image assets through [`AssetRef`] keys; the images themselves live in
//! an [`AssetCache`], loaded once per key and shared read-only by every tile
//! that references them.

mod cache;
mod manifest;

use std::fmt;

use iso_garden_core::PlantId;

pub use cache::AssetCache;
pub use manifest::{CatalogError, SpriteManifest, SUPPORTED_MANIFEST_VERSION};

/// Nominal width of a grid cell at zoom 1.0, in pixels.
pub const CELL_WIDTH: f32 = 64.0;
/// Nominal height of a grid cell at zoom 1.0, in pixels.
pub const CELL_HEIGHT: f32 = 38.0;
/// Nominal depth of the ground block drawn under each tile, in pixels.
pub const CELL_DEPTH: f32 = 30.0;
/// Image scale used when neither the sprite nor its tile type specify one.
pub const DEFAULT_IMAGE_SCALE: f32 = 1.22;

/// Key of a shared image asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetRef(&'static str);

impl AssetRef {
    /// Creates an asset key.
    #[must_use]
    pub const fn new(key: &'static str) -> Self {
        Self(key)
    }

    /// Name used for the asset in sprite manifests.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Opaque RGB colour used for tile types without image sprites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl Rgb {
    /// Creates a colour from byte channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// One image layer of a tile type.
///
/// Unset fields fall back to the owning [`TileType`], then to engine defaults.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    /// Image drawn by the layer.
    pub asset: AssetRef,
    /// Scale applied when fitting the image into the cell.
    pub scale: Option<f32>,
    /// Upward shift in nominal pixels.
    pub y_offset: Option<f32>,
    /// Stacking order among the type's layers; declaration order when unset.
    pub z_index: Option<i32>,
    /// Layer opacity in the range 0.0..=1.0.
    pub opacity: Option<f32>,
}

/// Sprite layer with every fallback resolved, ready to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteLayer {
    /// Image drawn by the layer.
    pub asset: AssetRef,
    /// Scale applied when fitting the image into the cell.
    pub image_scale: f32,
    /// Upward shift in nominal pixels.
    pub y_offset: f32,
    /// Final opacity including any preview alpha.
    pub opacity: f32,
}

/// Immutable catalog entry describing how a plant type is drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct TileType {
    /// Stable identifier used by layouts and inventories.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Image layers, in declaration order.
    pub sprites: &'static [Sprite],
    /// Fill colour used when no sprite can be drawn.
    pub color: Option<Rgb>,
    /// Type-level image scale fallback.
    pub image_scale: Option<f32>,
    /// Type-level vertical offset fallback.
    pub y_offset: Option<f32>,
    /// Type-level opacity fallback.
    pub opacity: Option<f32>,
}

impl TileType {
    /// Identifier of the type as a [`PlantId`].
    #[must_use]
    pub fn plant_id(&self) -> PlantId {
        PlantId::new(self.id)
    }

    /// Resolves the type's sprite layers in paint order, multiplying opacity by `alpha`.
    ///
    /// Layers are ordered by `z_index`, using the declaration index for layers
    /// without one; ties keep declaration order.
    #[must_use]
    pub fn layers(&self, alpha: f32) -> Vec<SpriteLayer> {
        let mut ordered: Vec<(i32, SpriteLayer)> = self
            .sprites
            .iter()
            .enumerate()
            .map(|(index, sprite)| {
                let fallback_order = i32::try_from(index).unwrap_or(i32::MAX);
                (
                    sprite.z_index.unwrap_or(fallback_order),
                    self.resolve(sprite, alpha),
                )
            })
            .collect();
        ordered.sort_by_key(|(order, _)| *order);
        ordered.into_iter().map(|(_, layer)| layer).collect()
    }

    /// Resolves the last declared sprite with an explicit opacity, used for drag previews.
    #[must_use]
    pub fn top_layer(&self, opacity: f32) -> Option<SpriteLayer> {
        self.sprites.last().map(|sprite| SpriteLayer {
            opacity,
            ..self.resolve(sprite, 1.0)
        })
    }

    fn resolve(&self, sprite: &Sprite, alpha: f32) -> SpriteLayer {
        SpriteLayer {
            asset: sprite.asset,
            image_scale: sprite
                .scale
                .or(self.image_scale)
                .unwrap_or(DEFAULT_IMAGE_SCALE),
            y_offset: sprite.y_offset.or(self.y_offset).unwrap_or(0.0),
            opacity: sprite.opacity.or(self.opacity).unwrap_or(1.0) * alpha,
        }
    }
}

const CARNATION: AssetRef = AssetRef::new("carnation");
const LAVANDER: AssetRef = AssetRef::new("lavander");
const SAKURA: AssetRef = AssetRef::new("sakura");

const CARNATION_SPRITES: [Sprite; 1] = [Sprite {
    asset: CARNATION,
    scale: Some(1.28),
    y_offset: Some(25.0),
    z_index: Some(2),
    opacity: Some(1.0),
}];
const LAVANDER_SPRITES: [Sprite; 1] = [Sprite {
    asset: LAVANDER,
    scale: Some(1.30),
    y_offset: Some(28.0),
    z_index: Some(2),
    opacity: Some(1.0),
}];
const SAKURA_SPRITES: [Sprite; 1] = [Sprite {
    asset: SAKURA,
    scale: Some(1.20),
    y_offset: Some(24.0),
    z_index: Some(2),
    opacity: Some(1.0),
}];

const fn colored(id: &'static str, name: &'static str, color: Rgb) -> TileType {
    TileType {
        id,
        name,
        sprites: &[],
        color: Some(color),
        image_scale: None,
        y_offset: None,
        opacity: None,
    }
}

const fn illustrated(
    id: &'static str,
    name: &'static str,
    sprites: &'static [Sprite],
    image_scale: f32,
    y_offset: f32,
) -> TileType {
    TileType {
        id,
        name,
        sprites,
        color: None,
        image_scale: Some(image_scale),
        y_offset: Some(y_offset),
        opacity: Some(1.0),
    }
}

const BUILTIN_TYPES: [TileType; 10] = [
    colored("sprout", "Sprout", Rgb::new(0x22, 0xc5, 0x5e)),
    colored("flower", "Bloom", Rgb::new(0xf9, 0x73, 0x16)),
    colored("pine", "Pine", Rgb::new(0x0e, 0xa5, 0xa4)),
    colored("palm", "Tropical Palm", Rgb::new(0x65, 0xa3, 0x0d)),
    colored("forest", "Ancient Oak", Rgb::new(0x15, 0x80, 0x3d)),
    colored("frost", "Frost Fern", Rgb::new(0x38, 0xbd, 0xf8)),
    colored("fire", "Ember Root", Rgb::new(0xef, 0x44, 0x44)),
    illustrated("carnation", "Carnation", &CARNATION_SPRITES, 1.24, 3.0),
    illustrated("lavander", "Lavender", &LAVANDER_SPRITES, 1.70, 14.0),
    illustrated("sakura", "Sakura", &SAKURA_SPRITES, 1.34, 5.0),
];

/// Ordered registry of every tile type known to the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    types: Vec<TileType>,
}

impl Catalog {
    /// Catalog containing the built-in plant types, in shop order.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_types(BUILTIN_TYPES.to_vec())
    }

    /// Creates a catalog from explicit types; later duplicates of an id are dropped.
    #[must_use]
    pub fn from_types(types: Vec<TileType>) -> Self {
        let mut unique: Vec<TileType> = Vec::with_capacity(types.len());
        for tile_type in types {
            if unique.iter().all(|existing| existing.id != tile_type.id) {
                unique.push(tile_type);
            }
        }
        Self { types: unique }
    }

    /// Looks up a tile type by identifier.
    #[must_use]
    pub fn get(&self, plant: &PlantId) -> Option<&TileType> {
        self.types.iter().find(|tile_type| tile_type.id == plant.as_str())
    }

    /// Reports whether the catalog knows the identifier.
    #[must_use]
    pub fn contains(&self, plant: &PlantId) -> bool {
        self.get(plant).is_some()
    }

    /// Iterator over the tile types in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &TileType> {
        self.types.iter()
    }

    /// Every asset referenced by the catalog, each listed once in first-use order.
    #[must_use]
    pub fn asset_refs(&self) -> Vec<AssetRef> {
        let mut assets: Vec<AssetRef> = Vec::new();
        for sprite in self.types.iter().flat_map(|tile_type| tile_type.sprites) {
            if !assets.contains(&sprite.asset) {
                assets.push(sprite.asset);
            }
        }
        assets
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYERED: [Sprite; 3] = [
        Sprite {
            asset: AssetRef::new("canopy"),
            scale: None,
            y_offset: None,
            z_index: Some(5),
            opacity: Some(0.5),
        },
        Sprite {
            asset: AssetRef::new("trunk"),
            scale: Some(2.0),
            y_offset: Some(1.0),
            z_index: None,
            opacity: None,
        },
        Sprite {
            asset: AssetRef::new("shadow"),
            scale: None,
            y_offset: None,
            z_index: Some(0),
            opacity: None,
        },
    ];

    fn layered_type() -> TileType {
        TileType {
            id: "layered",
            name: "Layered",
            sprites: &LAYERED,
            color: None,
            image_scale: Some(1.5),
            y_offset: None,
            opacity: None,
        }
    }

    #[test]
    fn builtin_catalog_lists_every_plant_once() {
        let catalog = Catalog::builtin();
        let ids: Vec<&str> = catalog.iter().map(|tile_type| tile_type.id).collect();
        assert_eq!(
            ids,
            vec![
                "sprout",
                "flower",
                "pine",
                "palm",
                "forest",
                "frost",
                "fire",
                "carnation",
                "lavander",
                "sakura"
            ]
        );
    }

    #[test]
    fn every_builtin_type_has_something_to_draw() {
        for tile_type in Catalog::builtin().iter() {
            assert!(
                tile_type.color.is_some() || !tile_type.sprites.is_empty(),
                "{} has neither sprites nor a colour",
                tile_type.id
            );
        }
    }

    #[test]
    fn layers_follow_z_index_with_declaration_fallback() {
        let layers = layered_type().layers(1.0);
        let order: Vec<&str> = layers.iter().map(|layer| layer.asset.key()).collect();
        assert_eq!(order, vec!["shadow", "trunk", "canopy"]);
    }

    #[test]
    fn layers_resolve_fallbacks_and_apply_alpha() {
        let layers = layered_type().layers(0.5);
        let canopy = layers
            .iter()
            .find(|layer| layer.asset.key() == "canopy")
            .expect("canopy layer");
        assert_eq!(canopy.image_scale, 1.5);
        assert_eq!(canopy.y_offset, 0.0);
        assert_eq!(canopy.opacity, 0.25);

        let trunk = layers
            .iter()
            .find(|layer| layer.asset.key() == "trunk")
            .expect("trunk layer");
        assert_eq!(trunk.image_scale, 2.0);
        assert_eq!(trunk.opacity, 0.5);
    }

    #[test]
    fn default_image_scale_applies_without_any_override() {
        let bare = TileType {
            image_scale: None,
            ..layered_type()
        };
        let shadow = bare
            .layers(1.0)
            .into_iter()
            .find(|layer| layer.asset.key() == "shadow")
            .expect("shadow layer");
        assert_eq!(shadow.image_scale, DEFAULT_IMAGE_SCALE);
    }

    #[test]
    fn top_layer_uses_last_declared_sprite() {
        let top = layered_type().top_layer(0.85).expect("top layer");
        assert_eq!(top.asset.key(), "shadow");
        assert_eq!(top.opacity, 0.85);
        assert!(Catalog::builtin()
            .get(&PlantId::from("pine"))
            .and_then(|tile_type| tile_type.top_layer(0.85))
            .is_none());
    }

    #[test]
    fn asset_refs_are_deduplicated() {
        let catalog = Catalog::from_types(vec![
            layered_type(),
            TileType {
                id: "twin",
                ..layered_type()
            },
        ]);
        assert_eq!(catalog.asset_refs().len(), 3);
    }

    #[test]
    fn from_types_keeps_first_definition_of_an_id() {
        let catalog = Catalog::from_types(vec![
            layered_type(),
            TileType {
                name: "Imposter",
                ..layered_type()
            },
        ]);
        assert_eq!(catalog.iter().count(), 1);
        assert_eq!(
            catalog
                .get(&PlantId::from("layered"))
                .map(|tile_type| tile_type.name),
            Some("Layered")
        );
    }
}
