//! Held-action tracking for keyboard and touch
//!
//! Raw device events arrive between ticks and only ever write here. The
//! simulation reads membership once per tick and never waits for input.

use serde::{Deserialize, Serialize};

/// Logical player intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    /// Start, restart, flap
    Confirm,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::MoveUp,
        Action::MoveDown,
        Action::Confirm,
    ];

    #[inline]
    fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Map a `KeyboardEvent.code` to an action
    pub fn from_key_code(code: &str) -> Option<Self> {
        match code {
            "ArrowLeft" | "KeyA" => Some(Action::MoveLeft),
            "ArrowRight" | "KeyD" => Some(Action::MoveRight),
            "ArrowUp" | "KeyW" => Some(Action::MoveUp),
            "ArrowDown" | "KeyS" => Some(Action::MoveDown),
            "Space" | "Enter" | "NumpadEnter" => Some(Action::Confirm),
            _ => None,
        }
    }

    /// Horizontal touch zone: left half moves left, right half moves right
    pub fn from_touch_x(x: f32, surface_width: f32) -> Self {
        if x < surface_width / 2.0 {
            Action::MoveLeft
        } else {
            Action::MoveRight
        }
    }
}

/// Returns true when a DOM event target accepts typed text.
///
/// Key events aimed at these targets must not drive the game.
pub fn is_text_entry(tag_name: &str, content_editable: bool) -> bool {
    content_editable
        || tag_name.eq_ignore_ascii_case("input")
        || tag_name.eq_ignore_ascii_case("textarea")
        || tag_name.eq_ignore_ascii_case("select")
}

/// Set of currently held actions.
///
/// Keyboard holds and the pointer hold are tracked separately so lifting a
/// finger never cancels a key that is still down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputTracker {
    keys: u8,
    pointer: Option<Action>,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an action as held
    pub fn activate(&mut self, action: Action) {
        self.keys |= action.bit();
    }

    /// Release an action. Releasing something never activated is a no-op.
    pub fn deactivate(&mut self, action: Action) {
        self.keys &= !action.bit();
    }

    /// Pointer/touch press or drag; replaces any previous pointer hold
    pub fn pointer_hold(&mut self, action: Action) {
        self.pointer = Some(action);
    }

    /// Pointer/touch lifted
    pub fn pointer_release(&mut self) {
        self.pointer = None;
    }

    pub fn is_active(&self, action: Action) -> bool {
        self.keys & action.bit() != 0 || self.pointer == Some(action)
    }

    /// Handle a key-down by `KeyboardEvent.code`.
    ///
    /// Returns the mapped action, or `None` if the key is unmapped or the
    /// event targeted a text-entry control.
    pub fn key_down(&mut self, code: &str, from_text_entry: bool) -> Option<Action> {
        if from_text_entry {
            return None;
        }
        let action = Action::from_key_code(code)?;
        self.activate(action);
        Some(action)
    }

    /// Handle a key-up by `KeyboardEvent.code`
    pub fn key_up(&mut self, code: &str, from_text_entry: bool) -> Option<Action> {
        if from_text_entry {
            return None;
        }
        let action = Action::from_key_code(code)?;
        self.deactivate(action);
        Some(action)
    }

    /// Drop every hold (restart, focus loss)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Currently held actions in declaration order
    pub fn active(&self) -> impl Iterator<Item = Action> + '_ {
        Action::ALL.into_iter().filter(|a| self.is_active(*a))
    }
}
