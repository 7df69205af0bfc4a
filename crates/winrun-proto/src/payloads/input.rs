//! Input injection payloads.

use serde::{Deserialize, Serialize};
use winrun_core::WindowId;

/// A single mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    /// Primary (usually left) button.
    Left,
    /// Secondary (usually right) button.
    Right,
    /// Middle/wheel button.
    Middle,
}

/// The action a mouse event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseAction {
    /// Cursor moved, no buttons involved.
    Move,
    /// A button was pressed.
    ButtonDown(MouseButton),
    /// A button was released.
    ButtonUp(MouseButton),
    /// Scroll wheel moved; `delta` is positive for up/away from the user.
    Wheel {
        /// Signed scroll amount, in wheel notches.
        delta: i32,
    },
}

/// Host injects a mouse event into a tracked window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseInput {
    /// Window the event targets.
    pub window_id: WindowId,
    /// Horizontal position within the window, in pixels.
    pub x: i32,
    /// Vertical position within the window, in pixels.
    pub y: i32,
    /// What happened.
    pub action: MouseAction,
}

/// Host injects a keyboard event into a tracked window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardInput {
    /// Window the event targets.
    pub window_id: WindowId,
    /// Virtual key code, platform-defined.
    pub virtual_key: u32,
    /// Whether this is a key-down (`true`) or key-up (`false`) event.
    pub key_down: bool,
    /// Modifier keys held during the event, as a bitmask (shift=1, ctrl=2, alt=4, meta=8).
    pub modifiers: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_input_round_trips_through_json() {
        let input = MouseInput {
            window_id: WindowId::new(1),
            x: 10,
            y: 20,
            action: MouseAction::ButtonDown(MouseButton::Left),
        };
        let json = serde_json::to_string(&input).expect("serialize");
        let back: MouseInput = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(input, back);
    }
}
