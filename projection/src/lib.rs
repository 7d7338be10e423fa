#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Isometric projection between grid cells and screen pixels.
//!
//! A cell `(gx, gy)` is anchored at the top vertex of its diamond:
//!
//! ```text
//! sx = (gx - gy) * cell_w / 2 + camera.x + viewport.width / 2
//! sy = (gx + gy) * cell_h / 2 + camera.y + viewport.height / 2
//! ```
//!
//! where `cell_w` and `cell_h` are the nominal cell dimensions multiplied by
//! the camera zoom. All intermediate arithmetic runs in `f64` so the inverse
//! recovers integer cells exactly across the whole editable range.

use glam::DVec2;
use iso_garden_catalog::{CELL_DEPTH, CELL_HEIGHT, CELL_WIDTH};
use iso_garden_core::{Camera, GridCoord, ScreenPoint, Viewport, WheelUnit, ZoomLimits};

/// Zoom change per pixel of wheel delta.
pub const WHEEL_ZOOM_STEP: f32 = 0.0018;
/// Pixels represented by one line of a line-mode wheel delta.
pub const WHEEL_LINE_HEIGHT: f32 = 30.0;
/// Extra cells painted beyond the viewport-derived grid radius.
pub const GRID_MARGIN: i32 = 6;

/// Projection for a fixed camera and viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    camera: Camera,
    viewport: Viewport,
}

impl Projection {
    /// Creates a projection for the provided camera and viewport.
    #[must_use]
    pub const fn new(camera: Camera, viewport: Viewport) -> Self {
        Self { camera, viewport }
    }

    /// Camera used by the projection.
    #[must_use]
    pub const fn camera(&self) -> Camera {
        self.camera
    }

    /// Viewport used by the projection.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Zoomed cell width, in pixels.
    #[must_use]
    pub fn cell_width(&self) -> f32 {
        CELL_WIDTH * self.camera.zoom
    }

    /// Zoomed cell height, in pixels.
    #[must_use]
    pub fn cell_height(&self) -> f32 {
        CELL_HEIGHT * self.camera.zoom
    }

    /// Zoomed ground-block depth, in pixels.
    #[must_use]
    pub fn cell_depth(&self) -> f32 {
        CELL_DEPTH * self.camera.zoom
    }

    fn half_cell(&self) -> DVec2 {
        DVec2::new(f64::from(CELL_WIDTH), f64::from(CELL_HEIGHT)) * f64::from(self.camera.zoom)
            / 2.0
    }

    fn origin(&self) -> DVec2 {
        DVec2::new(
            f64::from(self.camera.x) + f64::from(self.viewport.width) / 2.0,
            f64::from(self.camera.y) + f64::from(self.viewport.height) / 2.0,
        )
    }

    /// Screen position of the top vertex of the cell's diamond.
    #[must_use]
    pub fn world_to_screen(&self, cell: GridCoord) -> ScreenPoint {
        let half = self.half_cell();
        let gx = f64::from(cell.x());
        let gy = f64::from(cell.y());
        let screen = DVec2::new((gx - gy) * half.x, (gx + gy) * half.y) + self.origin();
        ScreenPoint::new(screen.x as f32, screen.y as f32)
    }

    /// Fractional grid position under a screen point.
    #[must_use]
    pub fn screen_to_grid(&self, point: ScreenPoint) -> DVec2 {
        let half = self.half_cell();
        let offset = DVec2::new(f64::from(point.x), f64::from(point.y)) - self.origin();
        let along_x = offset.x / half.x;
        let along_y = offset.y / half.y;
        DVec2::new((along_y + along_x) / 2.0, (along_y - along_x) / 2.0)
    }

    /// Cell whose anchor is nearest to the screen point.
    ///
    /// Each axis rounds with `floor(v + 0.5)`, so exact half-way values
    /// resolve toward positive infinity.
    #[must_use]
    pub fn screen_to_world(&self, point: ScreenPoint) -> GridCoord {
        let grid = self.screen_to_grid(point);
        GridCoord::new(round_half_up(grid.x), round_half_up(grid.y))
    }

    /// Cells whose diamonds intersect the viewport extended by one cell on each side.
    ///
    /// The candidate square spans `ceil(max(W, H) / min(cell_w, cell_h)) + 6`
    /// cells around the cell under the viewport centre. Cells are listed in
    /// row-major order over the candidate square.
    #[must_use]
    pub fn visible_cells(&self) -> Vec<GridCoord> {
        let cell_w = self.cell_width();
        let cell_h = self.cell_height();
        let smallest = cell_w.min(cell_h);
        if !(smallest > 0.0) {
            return Vec::new();
        }
        let width = self.viewport.width;
        let height = self.viewport.height;
        let span = (width.max(height) / smallest).ceil();
        let range = if span.is_finite() {
            (span as i32).saturating_add(GRID_MARGIN)
        } else {
            GRID_MARGIN
        };
        let center = self.screen_to_world(self.viewport.center());

        let mut cells = Vec::new();
        for dx in -range..=range {
            for dy in -range..=range {
                let cell = center.offset(dx, dy);
                let anchor = self.world_to_screen(cell);
                if anchor.x < -cell_w
                    || anchor.x > width + cell_w
                    || anchor.y < -cell_h
                    || anchor.y > height + cell_h
                {
                    continue;
                }
                cells.push(cell);
            }
        }
        cells
    }
}

fn round_half_up(value: f64) -> i32 {
    let rounded = (value + 0.5).floor();
    rounded.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

/// Camera zoomed to `requested` (clamped) while the world point under `anchor` stays put.
#[must_use]
pub fn zoom_at(
    camera: Camera,
    viewport: Viewport,
    requested: f32,
    anchor: ScreenPoint,
    limits: ZoomLimits,
) -> Camera {
    let zoom = limits.clamp(requested, camera.zoom);
    if !(camera.zoom > 0.0) || zoom == camera.zoom {
        return Camera::new(camera.x, camera.y, zoom);
    }
    let ratio = f64::from(zoom) / f64::from(camera.zoom);
    let anchor = DVec2::new(f64::from(anchor.x), f64::from(anchor.y));
    let center = DVec2::new(
        f64::from(viewport.width) / 2.0,
        f64::from(viewport.height) / 2.0,
    );
    let offset = DVec2::new(f64::from(camera.x), f64::from(camera.y));
    let relative = anchor - offset - center;
    let moved = anchor - center - relative * ratio;
    Camera::new(moved.x as f32, moved.y as f32, zoom)
}

/// Zoom requested by a wheel delta, before clamping.
#[must_use]
pub fn wheel_zoom(current: f32, delta_y: f32, unit: WheelUnit) -> f32 {
    let pixels = match unit {
        WheelUnit::Pixel => delta_y,
        WheelUnit::Line => delta_y * WHEEL_LINE_HEIGHT,
    };
    current - pixels * WHEEL_ZOOM_STEP
}

/// Camera offset after dragging from `start` to `current` with the camera at `origin`.
#[must_use]
pub fn pan(origin: Camera, start: ScreenPoint, current: ScreenPoint) -> (f32, f32) {
    (
        origin.x + (current.x - start.x),
        origin.y + (current.y - start.y),
    )
}

/// Zoom requested by a pinch gesture, before clamping.
///
/// Degenerate start distances keep the starting zoom.
#[must_use]
pub fn pinch_zoom(start_zoom: f32, start_distance: f32, distance: f32) -> f32 {
    if start_distance > f32::EPSILON && distance.is_finite() {
        start_zoom * distance / start_distance
    } else {
        start_zoom
    }
}
