//! Device-independent input events consumed by the interaction system.

use crate::PlantId;

/// Position on the drawing surface measured in pixels from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ScreenPoint {
    /// Horizontal pixel position.
    pub x: f32,
    /// Vertical pixel position.
    pub y: f32,
}

impl ScreenPoint {
    /// Creates a new screen point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: ScreenPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Point halfway between two points.
    #[must_use]
    pub fn midpoint(self, other: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Pointer buttons distinguished by the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Main button: picks up, drags and places tiles.
    Primary,
    /// Context button: pans, or opens the removal prompt when clicked on a tile.
    Secondary,
    /// Wheel button: pans.
    Middle,
}

/// Unit reported alongside a wheel delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WheelUnit {
    /// Delta measured in pixels (touchpads, smooth wheels).
    Pixel,
    /// Delta measured in text lines (notched wheels).
    Line,
}

/// Keys the editor reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Forward delete.
    Delete,
    /// Backspace.
    Backspace,
    /// `[` selects the previous plant type.
    LeftBracket,
    /// `]` selects the next plant type.
    RightBracket,
    /// Left arrow selects the previous plant type.
    ArrowLeft,
    /// Right arrow selects the next plant type.
    ArrowRight,
    /// Held to turn primary-button drags into pans.
    Space,
    /// `S`, which saves together with a command modifier.
    S,
}

/// Modifier keys held while a key was pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Control key.
    pub ctrl: bool,
    /// Command / super key.
    pub meta: bool,
}

impl Modifiers {
    /// Reports whether the platform command modifier (Ctrl or Cmd) is held.
    #[must_use]
    pub const fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Raw input delivered by an adapter, in the order it was observed.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// A pointer button was pressed.
    PointerDown {
        /// Pointer position when the press happened.
        position: ScreenPoint,
        /// Button that was pressed.
        button: PointerButton,
    },
    /// The pointer moved.
    PointerMove {
        /// New pointer position.
        position: ScreenPoint,
    },
    /// A pointer button was released.
    PointerUp {
        /// Pointer position when the release happened.
        position: ScreenPoint,
        /// Button that was released.
        button: PointerButton,
    },
    /// The wheel scrolled.
    Wheel {
        /// Pointer position used as the zoom anchor.
        position: ScreenPoint,
        /// Vertical scroll delta; positive values zoom out.
        delta_y: f32,
        /// Unit of `delta_y`.
        unit: WheelUnit,
    },
    /// A key was pressed.
    KeyDown {
        /// Key that was pressed.
        key: Key,
        /// Modifier keys held at the time.
        modifiers: Modifiers,
        /// Whether the press is an auto-repeat.
        repeat: bool,
    },
    /// A key was released.
    KeyUp {
        /// Key that was released.
        key: Key,
    },
    /// One or more touches began.
    TouchStart {
        /// Every active touch point.
        touches: Vec<ScreenPoint>,
    },
    /// Active touches moved.
    TouchMove {
        /// Every active touch point.
        touches: Vec<ScreenPoint>,
    },
    /// All touches ended.
    TouchEnd,
    /// The player confirmed the open removal prompt.
    ConfirmRemoval,
    /// The player dismissed the open removal prompt.
    DismissRemoval,
    /// The player chose a plant in the inventory list.
    PickPlant {
        /// Plant that was chosen.
        plant: PlantId,
    },
    /// The player asked to clear the garden; a confirmation opens first.
    RequestClear,
    /// The player confirmed clearing the garden.
    ConfirmClear,
    /// The player kept the garden as it is.
    DismissClear,
    /// The player pressed the save button.
    RequestSave,
    /// The drawing surface changed size.
    Resize {
        /// New surface width in pixels.
        width: f32,
        /// New surface height in pixels.
        height: f32,
    },
}
