//! Double-buffered keyboard and mouse state.
//!
//! The window backend feeds [`InputEvent`]s into an [`InputContext`] as it
//! drains the OS queue. [`InputContext::advance`] is called exactly once per
//! event pull, before the new events are applied, so "pressed" and
//! "released" compare the latest snapshot against the one before it.

use std::fmt;

/// Keyboard key identifier.
///
/// The backend maps platform key codes into these variants; keys with no
/// variant are dropped.
#[rustfmt::skip]
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    // Common control keys
    Escape, Enter, Tab, Backspace, Space,

    Insert, Delete, Home, End, PageUp, PageDown,

    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,

    // Modifiers as keys
    Shift, Control, Alt, Meta,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,
}

impl Key {
    /// Number of distinct keys.
    pub const COUNT: usize = Self::F12 as usize + 1;

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Wheel button.
    Middle,
    /// Secondary button.
    Right,
}

impl MouseButton {
    /// Number of tracked buttons.
    pub const COUNT: usize = 3;

    fn index(self) -> usize {
        self as usize
    }
}

/// A key or button transition reported by the window backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InputEvent {
    /// A key went down or up.
    Key { key: Key, down: bool },
    /// A mouse button went down or up.
    MouseButton { button: MouseButton, down: bool },
    /// Window lost focus. Everything held is released.
    FocusLost,
}

/// Current and previous keyboard/mouse snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputContext {
    curr_keys: [bool; Key::COUNT],
    last_keys: [bool; Key::COUNT],
    curr_buttons: [bool; MouseButton::COUNT],
    last_buttons: [bool; MouseButton::COUNT],
}

impl Default for InputContext {
    fn default() -> Self {
        Self {
            curr_keys: [false; Key::COUNT],
            last_keys: [false; Key::COUNT],
            curr_buttons: [false; MouseButton::COUNT],
            last_buttons: [false; MouseButton::COUNT],
        }
    }
}

impl InputContext {
    /// All keys and buttons up in both snapshots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame: the current snapshot becomes the previous one.
    pub fn advance(&mut self) {
        self.last_keys = self.curr_keys;
        self.last_buttons = self.curr_buttons;
    }

    /// Update the current snapshot from one backend event.
    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { key, down } => self.curr_keys[key.index()] = down,
            InputEvent::MouseButton { button, down } => {
                self.curr_buttons[button.index()] = down;
            }
            InputEvent::FocusLost => {
                self.curr_keys = [false; Key::COUNT];
                self.curr_buttons = [false; MouseButton::COUNT];
            }
        }
    }

    /// Down in the current snapshot.
    #[must_use]
    pub fn key_down(&self, key: Key) -> bool {
        self.curr_keys[key.index()]
    }

    /// Up in the current snapshot.
    #[must_use]
    pub fn key_up(&self, key: Key) -> bool {
        !self.curr_keys[key.index()]
    }

    /// Down now, up in the previous snapshot.
    #[must_use]
    pub fn key_pressed(&self, key: Key) -> bool {
        self.curr_keys[key.index()] && !self.last_keys[key.index()]
    }

    /// Up now, down in the previous snapshot.
    #[must_use]
    pub fn key_released(&self, key: Key) -> bool {
        !self.curr_keys[key.index()] && self.last_keys[key.index()]
    }

    /// Down in the current snapshot.
    #[must_use]
    pub fn mouse_button_down(&self, button: MouseButton) -> bool {
        self.curr_buttons[button.index()]
    }

    /// Up in the current snapshot.
    #[must_use]
    pub fn mouse_button_up(&self, button: MouseButton) -> bool {
        !self.curr_buttons[button.index()]
    }

    /// Down now, up in the previous snapshot.
    #[must_use]
    pub fn mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.curr_buttons[button.index()] && !self.last_buttons[button.index()]
    }

    /// Up now, down in the previous snapshot.
    #[must_use]
    pub fn mouse_button_released(&self, button: MouseButton) -> bool {
        !self.curr_buttons[button.index()] && self.last_buttons[button.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run one frame with the key held or not, returning (down, up, pressed, released).
    fn frame(input: &mut InputContext, down: bool) -> (bool, bool, bool, bool) {
        input.advance();
        input.apply(InputEvent::Key { key: Key::Space, down });
        (
            input.key_down(Key::Space),
            input.key_up(Key::Space),
            input.key_pressed(Key::Space),
            input.key_released(Key::Space),
        )
    }

    #[test]
    fn pressed_and_released_are_edge_triggered() {
        let mut input = InputContext::new();
        assert_eq!(frame(&mut input, true), (true, false, true, false));
        assert_eq!(frame(&mut input, true), (true, false, false, false));
        assert_eq!(frame(&mut input, false), (false, true, false, true));
        assert_eq!(frame(&mut input, false), (false, true, false, false));
    }

    #[test]
    fn mouse_buttons_are_double_buffered_too() {
        let mut input = InputContext::new();
        input.advance();
        input.apply(InputEvent::MouseButton {
            button: MouseButton::Left,
            down: true,
        });
        assert!(input.mouse_button_pressed(MouseButton::Left));
        assert!(input.mouse_button_down(MouseButton::Left));
        assert!(input.mouse_button_up(MouseButton::Right));

        input.advance();
        assert!(!input.mouse_button_pressed(MouseButton::Left));
        assert!(input.mouse_button_down(MouseButton::Left));

        input.advance();
        input.apply(InputEvent::MouseButton {
            button: MouseButton::Left,
            down: false,
        });
        assert!(input.mouse_button_released(MouseButton::Left));
    }

    #[test]
    fn press_and_release_within_one_frame_reports_neither_edge() {
        let mut input = InputContext::new();
        input.advance();
        input.apply(InputEvent::Key { key: Key::A, down: true });
        input.apply(InputEvent::Key { key: Key::A, down: false });
        assert!(!input.key_pressed(Key::A));
        assert!(!input.key_released(Key::A));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut input = InputContext::new();
        input.apply(InputEvent::Key { key: Key::W, down: true });
        input.apply(InputEvent::MouseButton {
            button: MouseButton::Right,
            down: true,
        });
        input.advance();
        input.apply(InputEvent::FocusLost);
        assert!(input.key_released(Key::W));
        assert!(input.mouse_button_released(MouseButton::Right));
    }

    #[test]
    fn last_key_is_in_range() {
        assert_eq!(Key::COUNT, 67);
        let mut input = InputContext::new();
        input.apply(InputEvent::Key { key: Key::F12, down: true });
        assert!(input.key_down(Key::F12));
    }
}
