//! Input controller
//!
//! Raw keyboard, mouse and touch events are folded into a single
//! `InputIntent`. Events only ever overwrite the intent; the step function
//! reads it once per tick, so input never mutates the simulation directly.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Keys the games care about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Fire,
    Restart,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Self {
        match key {
            "ArrowLeft" | "a" | "A" => Key::Left,
            "ArrowRight" | "d" | "D" => Key::Right,
            "ArrowUp" | "w" | "W" => Key::Up,
            "ArrowDown" | "s" | "S" => Key::Down,
            " " | "Spacebar" | "Enter" => Key::Fire,
            "r" | "R" => Key::Restart,
            _ => Key::Other,
        }
    }
}

/// How a page-wide key listener treats one `keydown`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRouting {
    /// Leave it to the page (typing into a form, keys the games ignore)
    Ignore,
    /// Feed the game and keep the browser's default action
    Forward(Key),
    /// Feed the game and suppress the default action (page scrolling)
    Capture(Key),
}

/// Decide what a window-level `keydown` does with `dom_key`.
///
/// Keys typed into an editable element never reach the game. Only the keys
/// that scroll the page (arrows, space) have their default suppressed, so
/// letters and Enter still work in the rest of the page.
pub fn route_key(dom_key: &str, target_editable: bool) -> KeyRouting {
    if target_editable {
        return KeyRouting::Ignore;
    }
    match Key::from_dom(dom_key) {
        Key::Other => KeyRouting::Ignore,
        key if scrolls_page(dom_key) => KeyRouting::Capture(key),
        key => KeyRouting::Forward(key),
    }
}

fn scrolls_page(dom_key: &str) -> bool {
    matches!(
        dom_key,
        "ArrowLeft" | "ArrowRight" | "ArrowUp" | "ArrowDown" | " " | "Spacebar"
    )
}

/// A platform input event, already converted to playfield coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    KeyDown(Key),
    KeyUp(Key),
    PointerMove { x: f32, y: f32 },
    PointerDown { x: f32, y: f32 },
    PointerUp,
    TouchStart { x: f32, y: f32 },
    TouchMove { x: f32, y: f32 },
    TouchEnd,
}

/// Latest user-control signal, consumed once per tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputIntent {
    /// -1.0 = left, 1.0 = right
    pub horizontal: f32,
    /// -1.0 = up, 1.0 = down
    pub vertical: f32,
    /// Last pointer/touch position (unclamped)
    pub pointer: Option<Vec2>,
    /// Aim angle in radians from +x (y down), derived from the pointer
    pub aim: Option<f32>,
    /// One-shot: fire / launch
    pub fire: bool,
    /// One-shot: restart after game over
    pub restart: bool,
}

/// Folds raw events into an `InputIntent`
#[derive(Debug, Clone, Default)]
pub struct InputController {
    intent: InputIntent,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    aim_origin: Option<Vec2>,
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the aim angle is measured from (e.g. a launcher position)
    pub fn set_aim_origin(&mut self, origin: Vec2) {
        self.aim_origin = Some(origin);
    }

    /// Current intent without consuming one-shot flags
    pub fn intent(&self) -> &InputIntent {
        &self.intent
    }

    /// Apply one raw event. Events with non-finite coordinates are dropped.
    pub fn handle(&mut self, event: &RawInput) {
        match *event {
            RawInput::KeyDown(key) => self.set_key(key, true),
            RawInput::KeyUp(key) => self.set_key(key, false),
            RawInput::PointerMove { x, y } | RawInput::TouchMove { x, y } => {
                self.set_pointer(x, y);
            }
            RawInput::PointerDown { x, y } | RawInput::TouchStart { x, y } => {
                if self.set_pointer(x, y) {
                    self.intent.fire = true;
                }
            }
            RawInput::PointerUp | RawInput::TouchEnd => {}
        }
    }

    /// Intent for this tick; clears the one-shot flags
    pub fn take(&mut self) -> InputIntent {
        let intent = self.intent.clone();
        self.intent.fire = false;
        self.intent.restart = false;
        intent
    }

    /// Forget held keys and pointer (restart, focus loss)
    pub fn reset(&mut self) {
        let origin = self.aim_origin;
        *self = Self::default();
        self.aim_origin = origin;
    }

    fn set_key(&mut self, key: Key, down: bool) {
        match key {
            Key::Left => self.left = down,
            Key::Right => self.right = down,
            Key::Up => self.up = down,
            Key::Down => self.down = down,
            Key::Fire => {
                if down {
                    self.intent.fire = true;
                }
            }
            Key::Restart => {
                if down {
                    self.intent.restart = true;
                }
            }
            Key::Other => {}
        }
        self.intent.horizontal = axis(self.left, self.right);
        self.intent.vertical = axis(self.up, self.down);
        // Keyboard steering takes over from a stale pointer
        if matches!(key, Key::Left | Key::Right | Key::Up | Key::Down) && down {
            self.intent.pointer = None;
        }
    }

    fn set_pointer(&mut self, x: f32, y: f32) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        let pos = Vec2::new(x, y);
        self.intent.pointer = Some(pos);
        if let Some(origin) = self.aim_origin {
            let delta = pos - origin;
            if delta.length_squared() > f32::EPSILON {
                self.intent.aim = Some(delta.y.atan2(delta.x));
            }
        }
        true
    }
}

fn axis(negative: bool, positive: bool) -> f32 {
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_in_forms_is_ignored() {
        for key in ["s", "w", "d", "r", "Enter", " ", "ArrowLeft"] {
            assert_eq!(route_key(key, true), KeyRouting::Ignore);
        }
    }

    #[test]
    fn test_only_scrolling_keys_are_captured() {
        assert_eq!(route_key("ArrowUp", false), KeyRouting::Capture(Key::Up));
        assert_eq!(route_key(" ", false), KeyRouting::Capture(Key::Fire));
        assert_eq!(route_key("s", false), KeyRouting::Forward(Key::Down));
        assert_eq!(route_key("r", false), KeyRouting::Forward(Key::Restart));
        assert_eq!(route_key("Enter", false), KeyRouting::Forward(Key::Fire));
        assert_eq!(route_key("q", false), KeyRouting::Ignore);
        assert_eq!(route_key("Tab", false), KeyRouting::Ignore);
    }

    #[test]
    fn test_keys_set_axes() {
        let mut input = InputController::new();
        input.handle(&RawInput::KeyDown(Key::Left));
        assert_eq!(input.intent().horizontal, -1.0);
        input.handle(&RawInput::KeyDown(Key::Right));
        assert_eq!(input.intent().horizontal, 0.0);
        input.handle(&RawInput::KeyUp(Key::Left));
        assert_eq!(input.intent().horizontal, 1.0);
    }

    #[test]
    fn test_fire_is_one_shot() {
        let mut input = InputController::new();
        input.handle(&RawInput::KeyDown(Key::Fire));
        assert!(input.take().fire);
        assert!(!input.take().fire);
    }

    #[test]
    fn test_pointer_last_write_wins() {
        let mut input = InputController::new();
        input.handle(&RawInput::PointerMove { x: 10.0, y: 20.0 });
        input.handle(&RawInput::TouchMove { x: 30.0, y: 40.0 });
        assert_eq!(input.intent().pointer, Some(Vec2::new(30.0, 40.0)));
    }

    #[test]
    fn test_invalid_coordinates_ignored() {
        let mut input = InputController::new();
        input.handle(&RawInput::PointerMove { x: 10.0, y: 20.0 });
        input.handle(&RawInput::TouchStart {
            x: f32::NAN,
            y: 5.0,
        });
        let intent = input.take();
        assert_eq!(intent.pointer, Some(Vec2::new(10.0, 20.0)));
        assert!(!intent.fire);
    }

    #[test]
    fn test_out_of_range_pointer_not_clamped() {
        let mut input = InputController::new();
        input.handle(&RawInput::PointerMove {
            x: -500.0,
            y: 9000.0,
        });
        assert_eq!(input.intent().pointer, Some(Vec2::new(-500.0, 9000.0)));
    }

    #[test]
    fn test_aim_from_origin() {
        let mut input = InputController::new();
        input.set_aim_origin(Vec2::new(100.0, 100.0));
        input.handle(&RawInput::PointerMove { x: 100.0, y: 0.0 });
        let aim = input.intent().aim.unwrap_or_default();
        assert!((aim + std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_dom_key_mapping() {
        assert_eq!(Key::from_dom("ArrowLeft"), Key::Left);
        assert_eq!(Key::from_dom(" "), Key::Fire);
        assert_eq!(Key::from_dom("r"), Key::Restart);
        assert_eq!(Key::from_dom("F5"), Key::Other);
    }
}
