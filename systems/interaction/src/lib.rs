#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure interaction system translating raw input into garden commands.
//!
//! Every input event is handled by [`transition`], a pure function of the
//! current [`InteractionState`], the event and a read-only
//! [`InteractionContext`]. The system never mutates the layout, the inventory
//! or the camera itself; it emits [`Command`] values that the session applies
//! in order.

use iso_garden_core::{
    Camera, Command, GridCoord, InputEvent, Key, Modifiers, Occupancy, PlantId, PointerButton,
    ScreenPoint, TileId,
};
use iso_garden_projection::{pan, pinch_zoom, wheel_zoom, Projection};

/// Maximum pointer travel, in pixels, for a secondary press to count as a click.
pub const CLICK_SLOP: f32 = 4.0;

/// Source that started a pan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PanTrigger {
    /// A pointer button, possibly combined with the held space bar.
    Button(PointerButton),
    /// A single-finger touch drag.
    Touch,
}

/// Pointer and camera state captured when a pan starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanAnchor {
    /// Pointer position when the pan started.
    pub pointer: ScreenPoint,
    /// Camera when the pan started.
    pub camera: Camera,
    /// Input that started the pan.
    pub trigger: PanTrigger,
    /// Largest distance the pointer has moved away from `pointer`.
    pub travel: f32,
}

/// Finger spread and zoom captured when a pinch starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchAnchor {
    /// Distance between the two touches when the pinch started.
    pub distance: f32,
    /// Camera zoom when the pinch started.
    pub zoom: f32,
}

/// Exclusive gesture currently in progress.
#[derive(Clone, Debug, PartialEq)]
pub enum InteractionMode {
    /// No pointer activity has been observed yet, or touches just ended.
    Idle,
    /// The pointer rests over a cell with no button held.
    Hovering(GridCoord),
    /// The camera follows the pointer.
    Panning(PanAnchor),
    /// Two touches scale the zoom.
    Pinching(PinchAnchor),
    /// A new tile of the plant type follows the pointer; nothing is placed yet.
    DraggingNew {
        /// Plant type that will be placed on release.
        plant: PlantId,
    },
    /// A tile lifted out of the layout follows the pointer.
    DraggingExisting {
        /// Handle of the lifted tile.
        tile: TileId,
        /// Plant type of the lifted tile.
        plant: PlantId,
        /// Cell the tile occupied before it was lifted.
        origin: GridCoord,
    },
}

/// Transient, process-local interaction state.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionState {
    mode: InteractionMode,
    hovered: Option<GridCoord>,
    space_held: bool,
    removal_prompt: Option<GridCoord>,
    clear_prompt: bool,
}

impl InteractionState {
    /// Creates an idle state with nothing hovered.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: InteractionMode::Idle,
            hovered: None,
            space_held: false,
            removal_prompt: None,
            clear_prompt: false,
        }
    }

    /// Gesture in progress.
    #[must_use]
    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    /// Cell under the pointer, if the pointer has been seen.
    #[must_use]
    pub const fn hovered(&self) -> Option<GridCoord> {
        self.hovered
    }

    /// Reports whether the space bar is held.
    #[must_use]
    pub const fn space_held(&self) -> bool {
        self.space_held
    }

    /// Cell whose removal awaits confirmation.
    #[must_use]
    pub const fn removal_prompt(&self) -> Option<GridCoord> {
        self.removal_prompt
    }

    /// Reports whether clearing the whole garden awaits confirmation.
    #[must_use]
    pub const fn clear_prompt(&self) -> bool {
        self.clear_prompt
    }

    /// Plant type following the pointer during a drag.
    #[must_use]
    pub fn dragged_plant(&self) -> Option<&PlantId> {
        match &self.mode {
            InteractionMode::DraggingNew { plant }
            | InteractionMode::DraggingExisting { plant, .. } => Some(plant),
            _ => None,
        }
    }

    /// Reports whether a tile is being dragged.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragged_plant().is_some()
    }
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the session consulted while handling an event.
#[derive(Clone, Copy)]
pub struct InteractionContext<'a> {
    /// Projection for the current camera and viewport.
    pub projection: Projection,
    /// Plant type used for new placements.
    pub selected: Option<&'a PlantId>,
    /// Plant types the selection may cycle through, in display order.
    pub selectable: &'a [PlantId],
    /// Occupancy of the layout, excluding lifted tiles.
    pub occupancy: &'a dyn Occupancy,
}

/// Computes the state after `event` together with the commands it produces.
#[must_use]
pub fn transition(
    state: &InteractionState,
    event: &InputEvent,
    context: &InteractionContext<'_>,
) -> (InteractionState, Vec<Command>) {
    let mut next = state.clone();
    let mut commands = Vec::new();
    next.apply(event, context, &mut commands);
    (next, commands)
}

impl InteractionState {
    fn apply(&mut self, event: &InputEvent, context: &InteractionContext<'_>, out: &mut Vec<Command>) {
        match event {
            InputEvent::PointerDown { position, button } => {
                self.pointer_down(*position, *button, context, out)
            }
            InputEvent::PointerMove { position } => self.pointer_move(*position, context, out),
            InputEvent::PointerUp { position, button } => {
                self.pointer_up(*position, *button, context, out)
            }
            InputEvent::Wheel {
                position,
                delta_y,
                unit,
            } => {
                let zoom = wheel_zoom(context.projection.camera().zoom, *delta_y, *unit);
                out.push(Command::ZoomAt {
                    zoom,
                    anchor: *position,
                });
            }
            InputEvent::KeyDown {
                key,
                modifiers,
                repeat,
            } => self.key_down(*key, *modifiers, *repeat, context, out),
            InputEvent::KeyUp { key } => {
                if *key == Key::Space {
                    self.space_held = false;
                }
            }
            InputEvent::TouchStart { touches } => {
                if self.touch_may_start() {
                    self.touch_start(touches, context);
                }
            }
            InputEvent::TouchMove { touches } => self.touch_move(touches, context, out),
            InputEvent::TouchEnd => {
                if matches!(
                    self.mode,
                    InteractionMode::Pinching(_)
                        | InteractionMode::Panning(PanAnchor {
                            trigger: PanTrigger::Touch,
                            ..
                        })
                ) {
                    self.mode = InteractionMode::Idle;
                }
            }
            InputEvent::ConfirmRemoval => {
                if let Some(cell) = self.removal_prompt.take() {
                    out.push(Command::RemoveTile { cell });
                }
            }
            InputEvent::DismissRemoval => self.removal_prompt = None,
            InputEvent::PickPlant { plant } => {
                if !self.is_dragging() && context.selectable.contains(plant) {
                    out.push(Command::SelectPlant {
                        plant: plant.clone(),
                    });
                }
            }
            InputEvent::RequestClear => {
                if !self.gesture_active() {
                    self.removal_prompt = None;
                    self.clear_prompt = true;
                }
            }
            InputEvent::ConfirmClear => {
                if std::mem::take(&mut self.clear_prompt) {
                    out.push(Command::ClearLayout);
                }
            }
            InputEvent::DismissClear => self.clear_prompt = false,
            InputEvent::RequestSave => out.push(Command::ForceSave),
            InputEvent::Resize { width, height } => out.push(Command::ResizeViewport {
                width: *width,
                height: *height,
            }),
        }
    }

    fn gesture_active(&self) -> bool {
        !matches!(
            self.mode,
            InteractionMode::Idle | InteractionMode::Hovering(_)
        )
    }

    /// Touches may replace an idle state or another touch gesture, never a pointer gesture.
    fn touch_may_start(&self) -> bool {
        match &self.mode {
            InteractionMode::Idle | InteractionMode::Hovering(_) | InteractionMode::Pinching(_) => {
                true
            }
            InteractionMode::Panning(anchor) => anchor.trigger == PanTrigger::Touch,
            InteractionMode::DraggingNew { .. } | InteractionMode::DraggingExisting { .. } => false,
        }
    }

    fn pointer_down(
        &mut self,
        position: ScreenPoint,
        button: PointerButton,
        context: &InteractionContext<'_>,
        out: &mut Vec<Command>,
    ) {
        self.removal_prompt = None;
        self.clear_prompt = false;
        if self.gesture_active() {
            return;
        }
        let cell = context.projection.screen_to_world(position);
        self.hovered = Some(cell);

        let pans = match button {
            PointerButton::Secondary | PointerButton::Middle => true,
            PointerButton::Primary => self.space_held,
        };
        if pans {
            self.mode = InteractionMode::Panning(PanAnchor {
                pointer: position,
                camera: context.projection.camera(),
                trigger: PanTrigger::Button(button),
                travel: 0.0,
            });
            return;
        }

        if let Some(tile) = context.occupancy.occupant_at(cell) {
            self.mode = InteractionMode::DraggingExisting {
                tile: tile.id,
                plant: tile.plant.clone(),
                origin: cell,
            };
            out.push(Command::DetachTile { cell });
        } else if let Some(plant) = context.selected {
            self.mode = InteractionMode::DraggingNew {
                plant: plant.clone(),
            };
            out.push(Command::RequestRedraw);
        } else {
            self.mode = InteractionMode::Hovering(cell);
        }
    }

    fn pointer_move(
        &mut self,
        position: ScreenPoint,
        context: &InteractionContext<'_>,
        out: &mut Vec<Command>,
    ) {
        let cell = context.projection.screen_to_world(position);
        let hover_changed = self.hovered != Some(cell);
        self.hovered = Some(cell);

        if let InteractionMode::Panning(anchor) = &mut self.mode {
            anchor.travel = anchor.travel.max(anchor.pointer.distance(position));
            let (x, y) = pan(anchor.camera, anchor.pointer, position);
            out.push(Command::SetCameraOffset { x, y });
            return;
        }
        if !self.gesture_active() {
            self.mode = InteractionMode::Hovering(cell);
        }
        if hover_changed {
            out.push(Command::RequestRedraw);
        }
    }

    fn pointer_up(
        &mut self,
        position: ScreenPoint,
        button: PointerButton,
        context: &InteractionContext<'_>,
        out: &mut Vec<Command>,
    ) {
        let cell = context.projection.screen_to_world(position);
        match &self.mode {
            InteractionMode::Panning(anchor) if anchor.trigger == PanTrigger::Button(button) => {
                let clicked = button == PointerButton::Secondary
                    && anchor.travel.max(anchor.pointer.distance(position)) < CLICK_SLOP;
                if clicked && !context.occupancy.is_free(cell) {
                    self.removal_prompt = Some(cell);
                }
            }
            InteractionMode::DraggingNew { plant } if button == PointerButton::Primary => {
                if context.occupancy.is_free(cell) {
                    out.push(Command::PlaceTile {
                        plant: plant.clone(),
                        cell,
                    });
                } else {
                    out.push(Command::RequestRedraw);
                }
            }
            InteractionMode::DraggingExisting { tile, .. } if button == PointerButton::Primary => {
                out.push(Command::DropTile { tile: *tile, cell });
            }
            _ => return,
        }
        self.hovered = Some(cell);
        self.mode = InteractionMode::Hovering(cell);
    }

    fn key_down(
        &mut self,
        key: Key,
        modifiers: Modifiers,
        repeat: bool,
        context: &InteractionContext<'_>,
        out: &mut Vec<Command>,
    ) {
        match key {
            Key::Space => self.space_held = true,
            Key::S => {
                if modifiers.command() && !repeat {
                    out.push(Command::ForceSave);
                }
            }
            Key::Delete | Key::Backspace => {
                if let Some(cell) = self.hovered {
                    if !context.occupancy.is_free(cell) {
                        out.push(Command::RemoveTile { cell });
                    }
                }
            }
            Key::LeftBracket | Key::ArrowLeft => cycle(context, false, out),
            Key::RightBracket | Key::ArrowRight => cycle(context, true, out),
        }
    }

    fn touch_start(&mut self, touches: &[ScreenPoint], context: &InteractionContext<'_>) {
        self.removal_prompt = None;
        self.clear_prompt = false;
        match touches {
            [only] => {
                self.mode = InteractionMode::Panning(PanAnchor {
                    pointer: *only,
                    camera: context.projection.camera(),
                    trigger: PanTrigger::Touch,
                    travel: 0.0,
                });
            }
            [first, second, ..] => {
                self.mode = InteractionMode::Pinching(PinchAnchor {
                    distance: first.distance(*second),
                    zoom: context.projection.camera().zoom,
                });
            }
            [] => {}
        }
    }

    fn touch_move(
        &mut self,
        touches: &[ScreenPoint],
        context: &InteractionContext<'_>,
        out: &mut Vec<Command>,
    ) {
        let pinch_joined = matches!(
            (&self.mode, touches),
            (
                InteractionMode::Panning(PanAnchor {
                    trigger: PanTrigger::Touch,
                    ..
                }),
                [_, _, ..]
            )
        );
        if pinch_joined {
            self.touch_start(touches, context);
            return;
        }
        match (&mut self.mode, touches) {
            (InteractionMode::Panning(anchor), [only]) if anchor.trigger == PanTrigger::Touch => {
                anchor.travel = anchor.travel.max(anchor.pointer.distance(*only));
                let (x, y) = pan(anchor.camera, anchor.pointer, *only);
                out.push(Command::SetCameraOffset { x, y });
            }
            (InteractionMode::Pinching(anchor), [first, second, ..]) => {
                out.push(Command::ZoomAt {
                    zoom: pinch_zoom(anchor.zoom, anchor.distance, first.distance(*second)),
                    anchor: first.midpoint(*second),
                });
            }
            _ => {}
        }
    }
}

fn cycle(context: &InteractionContext<'_>, forward: bool, out: &mut Vec<Command>) {
    let count = context.selectable.len();
    if count == 0 {
        return;
    }
    let current = context
        .selected
        .and_then(|selected| context.selectable.iter().position(|plant| plant == selected));
    let next = match (current, forward) {
        (Some(index), true) => (index + 1) % count,
        (Some(index), false) => (index + count - 1) % count,
        (None, true) => 0,
        (None, false) => count - 1,
    };
    out.push(Command::SelectPlant {
        plant: context.selectable[next].clone(),
    });
}

/// Stateful wrapper that feeds events through [`transition`].
#[derive(Clone, Debug, Default)]
pub struct Interaction {
    state: InteractionState,
}

impl Interaction {
    /// Creates an interaction system in the idle state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: InteractionState::new(),
        }
    }

    /// Current interaction state.
    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Consumes one input event and appends the resulting commands to `out`.
    pub fn handle(
        &mut self,
        event: &InputEvent,
        context: &InteractionContext<'_>,
        out: &mut Vec<Command>,
    ) {
        let (next, commands) = transition(&self.state, event, context);
        self.state = next;
        out.extend(commands);
    }

    /// Abandons any gesture in progress, returning the state that was active.
    ///
    /// The hovered cell and held keys are kept.
    pub fn cancel(&mut self) -> InteractionMode {
        let fallback = match self.state.hovered {
            Some(cell) => InteractionMode::Hovering(cell),
            None => InteractionMode::Idle,
        };
        std::mem::replace(&mut self.state.mode, fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_garden_core::{PlacedTile, Viewport};
    use std::collections::HashMap;

    #[derive(Default)]
    struct Grid {
        tiles: HashMap<GridCoord, PlacedTile>,
    }

    impl Occupancy for Grid {
        fn occupant_at(&self, cell: GridCoord) -> Option<&PlacedTile> {
            self.tiles.get(&cell)
        }
    }

    fn projection() -> Projection {
        Projection::new(Camera::new(0.0, 0.0, 1.0), Viewport::new(0.0, 0.0))
    }

    #[test]
    fn cycling_wraps_in_both_directions() {
        let grid = Grid::default();
        let plants = [PlantId::from("a"), PlantId::from("b"), PlantId::from("c")];
        let context = InteractionContext {
            projection: projection(),
            selected: Some(&plants[2]),
            selectable: &plants,
            occupancy: &grid,
        };

        let mut out = Vec::new();
        cycle(&context, true, &mut out);
        cycle(&context, false, &mut out);
        assert_eq!(
            out,
            vec![
                Command::SelectPlant {
                    plant: plants[0].clone()
                },
                Command::SelectPlant {
                    plant: plants[1].clone()
                },
            ]
        );
    }

    #[test]
    fn cycling_without_selectable_plants_is_silent() {
        let grid = Grid::default();
        let context = InteractionContext {
            projection: projection(),
            selected: None,
            selectable: &[],
            occupancy: &grid,
        };
        let mut out = Vec::new();
        cycle(&context, true, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn cancel_returns_the_abandoned_gesture() {
        let grid = Grid::default();
        let plant = PlantId::from("sakura");
        let context = InteractionContext {
            projection: projection(),
            selected: Some(&plant),
            selectable: std::slice::from_ref(&plant),
            occupancy: &grid,
        };
        let mut interaction = Interaction::new();
        let mut out = Vec::new();
        interaction.handle(
            &InputEvent::PointerDown {
                position: ScreenPoint::new(0.0, 0.0),
                button: PointerButton::Primary,
            },
            &context,
            &mut out,
        );

        assert_eq!(
            interaction.cancel(),
            InteractionMode::DraggingNew {
                plant: plant.clone()
            }
        );
        assert_eq!(
            interaction.state().mode(),
            &InteractionMode::Hovering(GridCoord::new(0, 0))
        );
    }
}
