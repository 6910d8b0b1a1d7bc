//! Input snapshots
//!
//! Hosts feed raw key codes (DOM `KeyboardEvent.code` names) into a
//! [`KeyboardState`]; the session polls one [`TickInput`] per frame.

use std::collections::HashSet;

use crate::sim::TickInput;

/// Anything that can produce one input snapshot per tick
pub trait InputSource {
    fn poll(&mut self) -> TickInput;
}

/// Held-key tracker with an edge-triggered pause
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: HashSet<String>,
    pause_pending: bool,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, code: &str) {
        // Auto-repeat must not toggle pause twice
        if self.held.insert(code.to_string()) && matches!(code, "KeyP" | "Escape") {
            self.pause_pending = true;
        }
    }

    pub fn key_up(&mut self, code: &str) {
        self.held.remove(code);
    }

    pub fn is_held(&self, code: &str) -> bool {
        self.held.contains(code)
    }

    fn any_held(&self, codes: &[&str]) -> bool {
        codes.iter().any(|code| self.is_held(code))
    }

    /// Release everything (focus lost)
    pub fn clear(&mut self) {
        self.held.clear();
        self.pause_pending = false;
    }
}

impl InputSource for KeyboardState {
    fn poll(&mut self) -> TickInput {
        TickInput {
            left: self.any_held(&["ArrowLeft", "KeyA"]),
            right: self.any_held(&["ArrowRight", "KeyD"]),
            up: self.any_held(&["ArrowUp", "KeyW"]),
            down: self.any_held(&["ArrowDown", "KeyS"]),
            fire: self.is_held("Space"),
            pause: std::mem::take(&mut self.pause_pending),
        }
    }
}
