#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the isometric garden engine.
//!
//! This crate defines the message surface that connects adapters, the pure
//! interaction system and the authoritative editing session. Adapters translate
//! raw device input into [`InputEvent`] values, the interaction system turns
//! those into [`Command`] values, the session applies commands to the layout,
//! inventory and camera, and finally broadcasts [`Event`] values that adapters
//! may surface to the player.

mod input;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use input::{InputEvent, Key, Modifiers, PointerButton, ScreenPoint, WheelUnit};

/// Location of a single cell on the unbounded isometric grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    x: i32,
    y: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position along the grid's x axis.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Position along the grid's y axis.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Diagonal sum used as the painter's-algorithm depth key.
    ///
    /// Cells with a smaller depth lie further from the viewer and must be
    /// painted first.
    #[must_use]
    pub const fn depth(&self) -> i64 {
        self.x as i64 + self.y as i64
    }

    /// Returns the coordinate shifted by the provided offsets.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Chebyshev (king-move) distance between two cells.
    #[must_use]
    pub fn chebyshev_distance(self, other: GridCoord) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Opaque handle assigned to a placed tile by the layout store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Identifier of a plant type registered in the tile catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlantId(String);

impl PlantId {
    /// Creates a plant identifier from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for PlantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tile placed on the grid by the player.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlacedTile {
    /// Handle allocated by the layout store.
    pub id: TileId,
    /// Plant type rendered on the tile.
    pub plant: PlantId,
    /// Cell the tile occupies.
    pub cell: GridCoord,
}

impl PlacedTile {
    /// Creates a new placed tile descriptor.
    #[must_use]
    pub fn new(id: TileId, plant: PlantId, cell: GridCoord) -> Self {
        Self { id, plant, cell }
    }

    /// Converts the tile into its persisted row representation.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedTile {
        PersistedTile::new(self.plant.clone(), self.cell)
    }
}

/// Read access to the occupancy of grid cells.
pub trait Occupancy {
    /// Returns the tile occupying the provided cell, if any.
    fn occupant_at(&self, cell: GridCoord) -> Option<&PlacedTile>;

    /// Reports whether the provided cell is free for placement.
    fn is_free(&self, cell: GridCoord) -> bool {
        self.occupant_at(cell).is_none()
    }
}

/// Inclusive zoom range accepted by the camera.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    /// Smallest permitted zoom factor.
    pub min: f32,
    /// Largest permitted zoom factor.
    pub max: f32,
}

impl ZoomLimits {
    /// Creates a zoom range, swapping the bounds when provided in reverse.
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Clamps the requested zoom into the range.
    ///
    /// A NaN request keeps `fallback` (itself clamped), so the result is
    /// always a member of the range.
    #[must_use]
    pub fn clamp(&self, requested: f32, fallback: f32) -> f32 {
        let value = if requested.is_nan() {
            fallback
        } else {
            requested
        };
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Reports whether the provided zoom lies within the range.
    #[must_use]
    pub fn contains(&self, zoom: f32) -> bool {
        zoom >= self.min && zoom <= self.max
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: 0.4, max: 3.0 }
    }
}

/// Pan offset and zoom factor of the editing view.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Horizontal pan offset in screen pixels.
    pub x: f32,
    /// Vertical pan offset in screen pixels.
    pub y: f32,
    /// Zoom factor applied to the nominal cell size.
    pub zoom: f32,
}

impl Camera {
    /// Creates a camera with explicit offset and zoom.
    #[must_use]
    pub const fn new(x: f32, y: f32, zoom: f32) -> Self {
        Self { x, y, zoom }
    }

    /// Replaces non-finite components with the provided defaults and clamps the zoom.
    ///
    /// Cached cameras are view hints only, so anything unusable is silently
    /// replaced rather than rejected.
    #[must_use]
    pub fn sanitized(self, defaults: Camera, limits: ZoomLimits) -> Self {
        let x = if self.x.is_finite() { self.x } else { defaults.x };
        let y = if self.y.is_finite() { self.y } else { defaults.y };
        let zoom = if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom
        } else {
            defaults.zoom
        };
        Self {
            x,
            y,
            zoom: limits.clamp(zoom, defaults.zoom),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(0.0, 30.0, 1.2)
    }
}

/// Pixel dimensions of the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Viewport {
    /// Surface width in pixels.
    pub width: f32,
    /// Surface height in pixels.
    pub height: f32,
}

impl Viewport {
    /// Creates a viewport descriptor.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Centre of the surface in screen pixels.
    #[must_use]
    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Available quantity of a single plant type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Plant type the entry counts.
    #[serde(rename = "typeId", alias = "item_id")]
    pub plant: PlantId,
    /// Number of instances available for placement.
    pub quantity: u32,
}

impl InventoryEntry {
    /// Creates a new inventory entry.
    #[must_use]
    pub fn new(plant: PlantId, quantity: u32) -> Self {
        Self { plant, quantity }
    }
}

/// Wire representation of a placed tile shared by the remote store and the local cache.
///
/// Older cache records used `type`/`x`/`y` keys, which are accepted as aliases.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersistedTile {
    /// Plant type placed at the coordinate.
    #[serde(alias = "type")]
    pub plant_id: PlantId,
    /// Grid x coordinate.
    #[serde(alias = "x")]
    pub grid_x: i32,
    /// Grid y coordinate.
    #[serde(alias = "y")]
    pub grid_y: i32,
}

impl PersistedTile {
    /// Creates a persisted row for the provided plant and cell.
    #[must_use]
    pub fn new(plant_id: PlantId, cell: GridCoord) -> Self {
        Self {
            plant_id,
            grid_x: cell.x(),
            grid_y: cell.y(),
        }
    }

    /// Cell addressed by the row.
    #[must_use]
    pub const fn cell(&self) -> GridCoord {
        GridCoord::new(self.grid_x, self.grid_y)
    }
}

/// Reasons a placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The requested cell already holds a tile.
    #[error("cell is already occupied")]
    Occupied,
    /// No instances of the requested plant type remain in the inventory.
    #[error("no instances left in the inventory")]
    OutOfStock,
}

/// Reasons a move request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum MoveError {
    /// No tile with the provided handle exists in the layout.
    #[error("tile {0} is not part of the layout")]
    MissingTile(TileId),
    /// The destination cell already holds a different tile.
    #[error("destination {0} is already occupied")]
    Occupied(GridCoord),
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Places a new tile of the given plant type, consuming one inventory instance.
    PlaceTile {
        /// Plant type to place.
        plant: PlantId,
        /// Cell that should receive the tile.
        cell: GridCoord,
    },
    /// Lifts the tile at the cell out of the layout so it can be dragged.
    DetachTile {
        /// Cell holding the tile to lift.
        cell: GridCoord,
    },
    /// Drops a previously detached tile at, or near, the provided cell.
    DropTile {
        /// Handle of the detached tile.
        tile: TileId,
        /// Cell under the pointer when the tile was released.
        cell: GridCoord,
    },
    /// Removes the tile at the cell and returns it to the inventory.
    RemoveTile {
        /// Cell holding the tile to remove.
        cell: GridCoord,
    },
    /// Removes every tile and returns all of them to the inventory.
    ClearLayout,
    /// Moves the camera pan offset to an absolute position.
    SetCameraOffset {
        /// New horizontal offset in pixels.
        x: f32,
        /// New vertical offset in pixels.
        y: f32,
    },
    /// Changes the zoom while keeping the world point under `anchor` fixed on screen.
    ZoomAt {
        /// Requested zoom factor before clamping.
        zoom: f32,
        /// Screen position that must remain stationary.
        anchor: ScreenPoint,
    },
    /// Changes the plant type used for new placements.
    SelectPlant {
        /// Plant type to select.
        plant: PlantId,
    },
    /// Updates the drawing surface dimensions.
    ResizeViewport {
        /// New surface width in pixels.
        width: f32,
        /// New surface height in pixels.
        height: f32,
    },
    /// Flushes debounced inventory writes and saves the layout immediately.
    ForceSave,
    /// Marks the view as changed without mutating any owned data.
    RequestRedraw,
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new tile was placed.
    TilePlaced {
        /// Tile that entered the layout.
        tile: PlacedTile,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Plant type requested for placement.
        plant: PlantId,
        /// Cell provided in the request.
        cell: GridCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tile was lifted out of the layout for dragging.
    TileDetached {
        /// Tile that was lifted.
        tile: PlacedTile,
    },
    /// Confirms that a dragged tile was put back into the layout.
    TileDropped {
        /// Tile at its final position.
        tile: PlacedTile,
        /// Cell the tile occupied before it was lifted.
        origin: GridCoord,
    },
    /// Confirms that a tile was removed and its instance returned.
    TileRemoved {
        /// Tile that left the layout.
        tile: PlacedTile,
    },
    /// Confirms that the whole layout was cleared.
    LayoutCleared {
        /// Number of tiles returned to the inventory.
        restored: usize,
    },
    /// Reports the latest available quantity of a plant type.
    InventoryChanged {
        /// Plant type whose quantity changed.
        plant: PlantId,
        /// Quantity after the change.
        quantity: u32,
    },
    /// Announces that the plant type used for new placements changed.
    SelectionChanged {
        /// Newly selected plant type.
        plant: PlantId,
    },
    /// Announces that the camera moved or zoomed.
    CameraChanged {
        /// Camera after the change.
        camera: Camera,
    },
    /// Announces that a manual save was written locally and sent to the remote store.
    SaveStarted,
    /// Confirms that the remote store accepted a manual save.
    SaveSucceeded,
    /// Reports that a manual save did not reach the remote store.
    SaveFailed {
        /// Human readable failure description.
        reason: String,
    },
    /// Reports that a background remote write failed.
    RemoteWriteFailed {
        /// Name of the remote operation that failed.
        operation: &'static str,
        /// Human readable failure description.
        reason: String,
    },
}
