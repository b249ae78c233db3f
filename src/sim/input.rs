//! Input events and the per-frame key state seen by drives

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Keys the runtime knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
    Char(char),
}

/// One input event from the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Window closed or equivalent
    Quit,
}

/// Keys currently held, plus this frame's events
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
    events: Vec<InputEvent>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget last frame's events; held keys stay held
    pub fn begin_frame(&mut self) {
        self.events.clear();
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(k) => {
                self.held.insert(k);
            }
            InputEvent::KeyUp(k) => {
                self.held.remove(&k);
            }
            InputEvent::Quit => {}
        }
        self.events.push(event);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Went down during this frame
    pub fn pressed(&self, key: Key) -> bool {
        self.events.contains(&InputEvent::KeyDown(key))
    }

    /// Came up during this frame
    pub fn released(&self, key: Key) -> bool {
        self.events.contains(&InputEvent::KeyUp(key))
    }

    pub fn quit_requested(&self) -> bool {
        self.events.contains(&InputEvent::Quit)
    }

    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }
}
