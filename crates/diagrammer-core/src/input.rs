//! Pointer and keyboard input types, plus the running input state.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    /// Ctrl, Cmd or Shift: the click adds to (toggles) the selection.
    pub fn is_additive(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Pointer events in screen coordinates.
///
/// `Click` is synthesized by the host after a down/up pair on the same
/// target, mirroring the DOM event sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Click {
        position: Point,
        button: MouseButton,
    },
    /// Positive `delta.y` scrolls up (zooms in).
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Click { position, .. }
            | PointerEvent::Scroll { position, .. } => *position,
        }
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

/// Tracks pointer position, held buttons and modifiers between events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current pointer position in screen coordinates.
    pub pointer_position: Point,
    /// Pointer position before the last event.
    pub previous_pointer_position: Point,
    pressed_buttons: HashSet<MouseButton>,
    pub modifiers: Modifiers,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        self.previous_pointer_position = self.pointer_position;
        self.pointer_position = event.position();
        match event {
            PointerEvent::Down { button, .. } => {
                self.pressed_buttons.insert(*button);
            }
            PointerEvent::Up { button, .. } => {
                self.pressed_buttons.remove(button);
            }
            PointerEvent::Move { .. } | PointerEvent::Click { .. } | PointerEvent::Scroll { .. } => {}
        }
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Pointer movement since the previous event.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_position - self.previous_pointer_position
    }

    /// Forget held buttons, e.g. when the model is replaced mid-gesture.
    pub fn release_all(&mut self) {
        self.pressed_buttons.clear();
    }
}
