//! Translation of macroquad's polled input state into editor events.

use glam::Vec2;
use iso_garden_core::{InputEvent, Key, Modifiers, PointerButton, ScreenPoint, WheelUnit};
use iso_garden_rendering::Overlay;
use macroquad::input::{
    is_key_down, is_key_pressed, is_key_released, is_mouse_button_pressed,
    is_mouse_button_released, mouse_position, mouse_wheel, touches, KeyCode, MouseButton,
    TouchPhase,
};

use crate::ui::{clear_prompt_contains, prompt_contains, sidebar_contains};

const BUTTONS: [(MouseButton, PointerButton); 3] = [
    (MouseButton::Left, PointerButton::Primary),
    (MouseButton::Right, PointerButton::Secondary),
    (MouseButton::Middle, PointerButton::Middle),
];

const KEYS: [(KeyCode, Key); 8] = [
    (KeyCode::Delete, Key::Delete),
    (KeyCode::Backspace, Key::Backspace),
    (KeyCode::LeftBracket, Key::LeftBracket),
    (KeyCode::RightBracket, Key::RightBracket),
    (KeyCode::Left, Key::ArrowLeft),
    (KeyCode::Right, Key::ArrowRight),
    (KeyCode::Space, Key::Space),
    (KeyCode::S, Key::S),
];

/// Device state sampled once per frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawInput {
    /// Mouse position.
    pub pointer: ScreenPoint,
    /// Buttons pressed since the previous frame.
    pub pressed: Vec<PointerButton>,
    /// Buttons released since the previous frame.
    pub released: Vec<PointerButton>,
    /// Wheel movement in notches; positive scrolls up.
    pub wheel_y: f32,
    /// Keys pressed since the previous frame.
    pub keys_pressed: Vec<Key>,
    /// Keys released since the previous frame.
    pub keys_released: Vec<Key>,
    /// Modifiers held this frame.
    pub modifiers: Modifiers,
    /// Active touch points.
    pub touches: Vec<ScreenPoint>,
    /// Surface size in pixels.
    pub surface: (f32, f32),
    /// Enter was pressed.
    pub confirm: bool,
    /// Escape was pressed.
    pub dismiss: bool,
}

impl RawInput {
    /// Samples macroquad's input state for the current frame.
    pub fn poll() -> Self {
        let (x, y) = mouse_position();
        let (_, wheel_y) = mouse_wheel();
        let buttons = |check: fn(MouseButton) -> bool| -> Vec<PointerButton> {
            BUTTONS
                .iter()
                .filter(|(code, _)| check(*code))
                .map(|(_, button)| *button)
                .collect()
        };
        let keys = |check: fn(KeyCode) -> bool| -> Vec<Key> {
            KEYS.iter()
                .filter(|(code, _)| check(*code))
                .map(|(_, key)| *key)
                .collect()
        };
        let active_touches = touches()
            .into_iter()
            .filter(|touch| !matches!(touch.phase, TouchPhase::Ended | TouchPhase::Cancelled))
            .map(|touch| ScreenPoint::new(touch.position.x, touch.position.y))
            .collect();

        Self {
            pointer: ScreenPoint::new(x, y),
            pressed: buttons(is_mouse_button_pressed),
            released: buttons(is_mouse_button_released),
            wheel_y,
            keys_pressed: keys(is_key_pressed),
            keys_released: keys(is_key_released),
            modifiers: Modifiers {
                ctrl: is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl),
                meta: is_key_down(KeyCode::LeftSuper) || is_key_down(KeyCode::RightSuper),
            },
            touches: active_touches,
            surface: (
                macroquad::window::screen_width(),
                macroquad::window::screen_height(),
            ),
            confirm: is_key_pressed(KeyCode::Enter),
            dismiss: is_key_pressed(KeyCode::Escape),
        }
    }
}

/// Turns successive [`RawInput`] samples into editor events.
///
/// Only changes are reported: the pointer position, touch set and surface
/// size are compared against the previous sample.
#[derive(Debug, Default)]
pub struct InputTranslator {
    pointer: Option<ScreenPoint>,
    surface: Option<(f32, f32)>,
    touches: Vec<ScreenPoint>,
}

impl InputTranslator {
    /// Creates a translator that reports the first sample in full.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events describing the change from the previous sample.
    ///
    /// Button presses over the sidebar or an open prompt belong to those
    /// widgets and are not forwarded to the garden. Enter and Escape answer
    /// whichever prompt is open.
    pub fn translate(&mut self, raw: &RawInput, overlay: &Overlay) -> Vec<InputEvent> {
        let mut events = Vec::new();

        if self.surface != Some(raw.surface) {
            self.surface = Some(raw.surface);
            events.push(InputEvent::Resize {
                width: raw.surface.0,
                height: raw.surface.1,
            });
        }

        if raw.touches != self.touches {
            if raw.touches.is_empty() {
                events.push(InputEvent::TouchEnd);
            } else if self.touches.is_empty() {
                events.push(InputEvent::TouchStart {
                    touches: raw.touches.clone(),
                });
            } else {
                events.push(InputEvent::TouchMove {
                    touches: raw.touches.clone(),
                });
            }
            self.touches = raw.touches.clone();
        }

        let position = raw.pointer;
        if self.pointer != Some(position) {
            self.pointer = Some(position);
            events.push(InputEvent::PointerMove { position });
        }

        let point = Vec2::new(position.x, position.y);
        let over_widget = overlay
            .removal_prompt
            .is_some_and(|anchor| prompt_contains(anchor, point))
            || (overlay.sidebar.is_some() && sidebar_contains(point))
            || (overlay.clear_prompt
                && clear_prompt_contains(Vec2::new(raw.surface.0, raw.surface.1), point));
        if !over_widget {
            events.extend(
                raw.pressed
                    .iter()
                    .map(|&button| InputEvent::PointerDown { position, button }),
            );
        }
        events.extend(
            raw.released
                .iter()
                .map(|&button| InputEvent::PointerUp { position, button }),
        );

        if raw.wheel_y != 0.0 {
            events.push(InputEvent::Wheel {
                position,
                delta_y: -raw.wheel_y,
                unit: WheelUnit::Line,
            });
        }

        events.extend(raw.keys_pressed.iter().map(|&key| InputEvent::KeyDown {
            key,
            modifiers: raw.modifiers,
            repeat: false,
        }));
        events.extend(
            raw.keys_released
                .iter()
                .map(|&key| InputEvent::KeyUp { key }),
        );

        if overlay.clear_prompt {
            if raw.confirm {
                events.push(InputEvent::ConfirmClear);
            } else if raw.dismiss {
                events.push(InputEvent::DismissClear);
            }
        } else if overlay.removal_prompt.is_some() {
            if raw.confirm {
                events.push(InputEvent::ConfirmRemoval);
            } else if raw.dismiss {
                events.push(InputEvent::DismissRemoval);
            }
        }

        events
    }
}
