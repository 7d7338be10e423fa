#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rendering contracts shared by garden adapters.
//!
//! Adapters describe what is on screen as a [`Scene`], turn it into an ordered
//! [`FramePlan`] with [`plan_frame`] and paint the plan with whatever graphics
//! API they wrap. [`RenderLoop`] keeps the last plan around so frames with no
//! state changes are repainted without being replanned.

mod frame_loop;
mod plan;

use std::time::Duration;

use anyhow::Result as AnyResult;
use iso_garden_catalog::SpriteManifest;
use iso_garden_core::{Camera, GridCoord, InputEvent, PlantId, Viewport};
use iso_garden_projection::Projection;
use thiserror::Error;

pub use frame_loop::RenderLoop;
pub use plan::{
    plan_frame, Diamond, DrawOp, FramePlan, Overlay, PlantDraw, SidebarEntry, SpriteRect,
    BACKGROUND_BOTTOM,
    BACKGROUND_TOP, GRID_LINE, GROUND_LEFT, GROUND_RIGHT, GROUND_TOP_DARK, GROUND_TOP_LIGHT,
    HOVER_HIGHLIGHT,
};

/// RGBA color used when presenting a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with its alpha replaced, clamped to 0.0..=1.0.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Linear blend towards `other`; `amount` 0.0 keeps `self`, 1.0 yields `other`.
    #[must_use]
    pub fn mix(self, other: Self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let blend = |from: f32, to: f32| from + (to - from) * amount;
        Self {
            red: blend(self.red, other.red),
            green: blend(self.green, other.green),
            blue: blend(self.blue, other.blue),
            alpha: blend(self.alpha, other.alpha),
        }
    }
}

/// A plant shown on a cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneTile {
    /// Tile type drawn.
    pub plant: PlantId,
    /// Cell the plant stands on.
    pub cell: GridCoord,
}

impl SceneTile {
    /// Creates a scene tile.
    #[must_use]
    pub fn new(plant: PlantId, cell: GridCoord) -> Self {
        Self { plant, cell }
    }
}

/// One plant listed in the inventory sidebar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventorySlot {
    /// Listed plant.
    pub plant: PlantId,
    /// Remaining stock; `None` when stock is unlimited.
    pub quantity: Option<u32>,
    /// Set on the plant used for new placements.
    pub selected: bool,
}

/// Everything visible in one frame of the garden editor.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Camera the frame is seen through.
    pub camera: Camera,
    /// Drawable surface size.
    pub viewport: Viewport,
    /// Tiles on the grid, in any order.
    pub tiles: Vec<SceneTile>,
    /// Cell under the pointer.
    pub hovered: Option<GridCoord>,
    /// Translucent preview of what a click would place.
    pub ghost: Option<SceneTile>,
    /// Tile following the pointer while it is dragged.
    pub drag_preview: Option<SceneTile>,
    /// Cell whose removal awaits confirmation.
    pub removal_prompt: Option<GridCoord>,
    /// One-line status shown over the garden.
    pub status: Option<String>,
    /// Inventory sidebar entries; `None` hides the sidebar.
    pub inventory: Option<Vec<InventorySlot>>,
    /// Set while clearing the garden awaits confirmation.
    pub clear_prompt: bool,
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new(camera: Camera, viewport: Viewport) -> Self {
        Self {
            camera,
            viewport,
            tiles: Vec::new(),
            hovered: None,
            ghost: None,
            drag_preview: None,
            removal_prompt: None,
            status: None,
            inventory: None,
            clear_prompt: false,
        }
    }

    /// Projection of the scene's camera and viewport.
    #[must_use]
    pub fn projection(&self) -> Projection {
        Projection::new(self.camera, self.viewport)
    }
}

/// Input gathered by an adapter during one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Wall time since the previous frame.
    pub elapsed: Duration,
    /// Normalized input, in arrival order.
    pub events: Vec<InputEvent>,
    /// Set on the last frame, after the window was asked to close.
    pub closing: bool,
}

/// Describes how the garden should be presented.
#[derive(Clone, Debug)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Image files to load; `None` draws every plant with its colour fill.
    pub sprites: Option<SpriteManifest>,
}

impl Presentation {
    /// Constructs a new presentation descriptor without sprites.
    #[must_use]
    pub fn new<T>(window_title: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            sprites: None,
        }
    }

    /// Attaches sprite images to the presentation.
    #[must_use]
    pub fn with_sprites(mut self, sprites: SpriteManifest) -> Self {
        self.sprites = Some(sprites);
        self
    }
}

/// Rendering backend capable of presenting the garden.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// `update` runs once per frame with the input gathered since the last
    /// frame and refreshes the render loop's plan before it is painted. A
    /// failing update is logged and the previous plan is painted again.
    fn run<F>(self, presentation: Presentation, update: F) -> AnyResult<()>
    where
        F: FnMut(FrameInput, &mut RenderLoop) -> AnyResult<()> + 'static;
}

/// Errors raised while laying out a frame.
#[derive(Debug, Error, PartialEq)]
pub enum RenderingError {
    /// A sprite image has no area, so it cannot be fitted into a cell.
    #[error("sprite `{asset}` has degenerate size {width}x{height}")]
    DegenerateTexture {
        /// Asset the image was loaded for.
        asset: &'static str,
        /// Reported image width.
        width: f32,
        /// Reported image height.
        height: f32,
    },
}
