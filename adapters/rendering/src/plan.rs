//! Backend-agnostic description of a single frame.

use glam::Vec2;
use iso_garden_catalog::{Catalog, SpriteLayer, TileType};
use iso_garden_core::{GridCoord, PlantId, ScreenPoint};
use iso_garden_projection::Projection;

use crate::{Color, RenderingError, Scene, SceneTile};

/// Top of the background gradient.
pub const BACKGROUND_TOP: Color = Color::from_rgb_u8(0x07, 0x15, 0x20);
/// Bottom of the background gradient.
pub const BACKGROUND_BOTTOM: Color = Color::from_rgb_u8(0x02, 0x05, 0x08);
/// Stroke of the grid diamonds.
pub const GRID_LINE: Color = Color::new(1.0, 1.0, 1.0, 0.05);
/// Top face gradient start of a ground block.
pub const GROUND_TOP_LIGHT: Color = Color::from_rgb_u8(0x5d, 0xd8, 0x7a);
/// Top face gradient end of a ground block.
pub const GROUND_TOP_DARK: Color = Color::from_rgb_u8(0x2e, 0x8c, 0x45);
/// Right face of a ground block.
pub const GROUND_RIGHT: Color = Color::from_rgb_u8(0x7a, 0x4e, 0x28);
/// Left face of a ground block.
pub const GROUND_LEFT: Color = Color::from_rgb_u8(0x4a, 0x2e, 0x14);
/// Additive fill over the hovered cell.
pub const HOVER_HIGHLIGHT: Color = Color::new(1.0, 1.0, 1.0, 0.035);

const PLACED_FILL_ALPHA: f32 = 0.6;
const GHOST_ALPHA: f32 = 0.5;
const PREVIEW_FILL_ALPHA: f32 = 0.4;
const DRAG_ALPHA: f32 = 0.85;

/// Screen-space diamond of one cell, anchored at its top vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Diamond {
    /// Top vertex.
    pub top: Vec2,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Diamond {
    /// Diamond of `cell` under the projection.
    #[must_use]
    pub fn of(projection: &Projection, cell: GridCoord) -> Self {
        let ScreenPoint { x, y } = projection.world_to_screen(cell);
        Self {
            top: Vec2::new(x, y),
            width: projection.cell_width(),
            height: projection.cell_height(),
        }
    }

    /// Vertices clockwise from the top: top, right, bottom, left.
    #[must_use]
    pub fn corners(&self) -> [Vec2; 4] {
        let half = Vec2::new(self.width / 2.0, self.height / 2.0);
        [
            self.top,
            self.top + half,
            self.top + Vec2::new(0.0, self.height),
            self.top + Vec2::new(-half.x, half.y),
        ]
    }
}

/// Destination rectangle of a fitted sprite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

/// Plant drawn on a cell: sprite layers, with a colour fill used when none of them can be drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct PlantDraw {
    /// Cell the plant stands on.
    pub diamond: Diamond,
    /// Height of the ground block under the plant.
    pub depth: f32,
    /// Camera zoom, applied to sprite offsets.
    pub zoom: f32,
    /// Sprite layers in paint order.
    pub layers: Vec<SpriteLayer>,
    /// Diamond fill drawn when no layer was painted.
    pub fallback: Option<Color>,
}

impl PlantDraw {
    /// Fits a texture of `texture` pixels for `layer` into the cell's block, keeping its aspect ratio.
    ///
    /// The image is centred on the top vertex, scaled by the layer's image
    /// scale and raised by its offset times the zoom.
    pub fn fit(&self, texture: Vec2, layer: &SpriteLayer) -> Result<SpriteRect, RenderingError> {
        if !(texture.x > 0.0 && texture.y > 0.0) {
            return Err(RenderingError::DegenerateTexture {
                asset: layer.asset.key(),
                width: texture.x,
                height: texture.y,
            });
        }
        let target = Vec2::new(self.diamond.width, self.diamond.height + self.depth);
        let aspect = texture.x / texture.y;
        let (width, height) = if aspect > target.x / target.y {
            let width = target.x * layer.image_scale;
            (width, width / aspect)
        } else {
            let height = target.y * layer.image_scale;
            (height * aspect, height)
        };
        Ok(SpriteRect {
            x: self.diamond.top.x - width / 2.0,
            y: self.diamond.top.y - height / 2.0 - layer.y_offset * self.zoom,
            width,
            height,
        })
    }
}

/// Single painting step.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Vertical gradient over the whole surface.
    Background {
        /// Colour at the top edge.
        top: Color,
        /// Colour at the bottom edge.
        bottom: Color,
    },
    /// One stroked grid diamond.
    GridLine {
        /// Stroked cell.
        diamond: Diamond,
        /// Stroke colour.
        color: Color,
    },
    /// Earth block under a tile or preview.
    GroundBlock {
        /// Top face.
        diamond: Diamond,
        /// Height of the side faces.
        depth: f32,
    },
    /// Plant sprites or colour fill.
    Plant(PlantDraw),
    /// Additive fill over a cell.
    Highlight {
        /// Highlighted cell.
        diamond: Diamond,
        /// Fill colour, blended additively.
        color: Color,
    },
}

/// Button of the inventory sidebar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SidebarEntry {
    /// Plant the button selects.
    pub plant: PlantId,
    /// Label text.
    pub name: String,
    /// Badge value; `None` hides the badge.
    pub quantity: Option<u32>,
    /// Set on the current selection.
    pub selected: bool,
    /// Cleared when the plant is out of stock.
    pub enabled: bool,
}

/// Widgets painted above the garden.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlay {
    /// Screen anchor of an open removal prompt, at the centre of the cell.
    pub removal_prompt: Option<Vec2>,
    /// Status text.
    pub status: Option<String>,
    /// Inventory sidebar; `None` hides it.
    pub sidebar: Option<Vec<SidebarEntry>>,
    /// Set while the clear confirmation is open.
    pub clear_prompt: bool,
}

/// Ordered painting steps for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FramePlan {
    ops: Vec<DrawOp>,
    overlay: Overlay,
}

impl FramePlan {
    /// Steps in painting order.
    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Widgets drawn after every step.
    #[must_use]
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Reports whether nothing is painted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Lays out every painting step of the scene.
///
/// Order: background, grid, placed tiles back to front, placement ghost,
/// hover highlight, drag preview. Sidebar labels come from the catalog.
#[must_use]
pub fn plan_frame(scene: &Scene, catalog: &Catalog) -> FramePlan {
    let projection = scene.projection();
    let depth = projection.cell_depth();
    let zoom = projection.camera().zoom;
    let mut ops = vec![DrawOp::Background {
        top: BACKGROUND_TOP,
        bottom: BACKGROUND_BOTTOM,
    }];

    ops.extend(
        projection
            .visible_cells()
            .into_iter()
            .map(|cell| DrawOp::GridLine {
                diamond: Diamond::of(&projection, cell),
                color: GRID_LINE,
            }),
    );

    let mut tiles: Vec<&SceneTile> = scene.tiles.iter().collect();
    tiles.sort_by_key(|tile| (tile.cell.depth(), tile.cell.x()));
    for tile in tiles {
        let diamond = Diamond::of(&projection, tile.cell);
        ops.push(DrawOp::GroundBlock { diamond, depth });
        if let Some(tile_type) = catalog.get(&tile.plant) {
            ops.push(DrawOp::Plant(PlantDraw {
                diamond,
                depth,
                zoom,
                layers: tile_type.layers(1.0),
                fallback: fill(tile_type, PLACED_FILL_ALPHA),
            }));
        }
    }

    if let Some(ghost) = &scene.ghost {
        let diamond = Diamond::of(&projection, ghost.cell);
        ops.push(DrawOp::GroundBlock { diamond, depth });
        if let Some(tile_type) = catalog.get(&ghost.plant) {
            ops.push(DrawOp::Plant(PlantDraw {
                diamond,
                depth,
                zoom,
                layers: tile_type.layers(GHOST_ALPHA),
                fallback: fill(tile_type, PREVIEW_FILL_ALPHA),
            }));
        }
    }

    if let Some(cell) = scene.hovered {
        ops.push(DrawOp::Highlight {
            diamond: Diamond::of(&projection, cell),
            color: HOVER_HIGHLIGHT,
        });
    }

    if let Some(dragged) = &scene.drag_preview {
        let diamond = Diamond::of(&projection, dragged.cell);
        ops.push(DrawOp::GroundBlock { diamond, depth });
        if let Some(tile_type) = catalog.get(&dragged.plant) {
            ops.push(DrawOp::Plant(PlantDraw {
                diamond,
                depth,
                zoom,
                layers: tile_type.top_layer(DRAG_ALPHA).into_iter().collect(),
                fallback: fill(tile_type, PREVIEW_FILL_ALPHA),
            }));
        }
    }

    let overlay = Overlay {
        removal_prompt: scene.removal_prompt.map(|cell| {
            let diamond = Diamond::of(&projection, cell);
            diamond.top + Vec2::new(0.0, diamond.height / 2.0)
        }),
        status: scene.status.clone(),
        sidebar: scene.inventory.as_ref().map(|slots| {
            slots
                .iter()
                .map(|slot| SidebarEntry {
                    plant: slot.plant.clone(),
                    name: catalog.get(&slot.plant).map_or_else(
                        || slot.plant.to_string(),
                        |tile_type| tile_type.name.to_owned(),
                    ),
                    quantity: slot.quantity,
                    selected: slot.selected,
                    enabled: slot.quantity.map_or(true, |quantity| quantity > 0),
                })
                .collect()
        }),
        clear_prompt: scene.clear_prompt,
    };

    FramePlan { ops, overlay }
}

fn fill(tile_type: &TileType, alpha: f32) -> Option<Color> {
    tile_type
        .color
        .map(|rgb| Color::from_rgb_u8(rgb.red, rgb.green, rgb.blue).with_alpha(alpha))
}
