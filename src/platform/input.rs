//! Input sources: where a frame's input events come from

use std::collections::VecDeque;

use crate::error::Result;
use crate::sim::InputEvent;

pub trait InputSource {
    /// Everything that happened since the last poll
    fn poll(&mut self) -> Vec<InputEvent>;
}

/// Never produces anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInput;

impl InputSource for NullInput {
    fn poll(&mut self) -> Vec<InputEvent> {
        Vec::new()
    }
}

/// Replays a fixed script, one entry per frame; empty once the script runs out
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    frames: VecDeque<Vec<InputEvent>>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = Vec<InputEvent>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Load a script saved as a JSON array of per-frame event arrays
    pub fn from_json(json: &str) -> Result<Self> {
        let frames: Vec<Vec<InputEvent>> = serde_json::from_str(json)?;
        Ok(Self::new(frames))
    }

    /// Add `n` quiet frames
    pub fn idle(mut self, n: usize) -> Self {
        self.frames.extend((0..n).map(|_| Vec::new()));
        self
    }

    pub fn then(mut self, events: Vec<InputEvent>) -> Self {
        self.frames.push_back(events);
        self
    }

    pub fn then_quit(self) -> Self {
        self.then(vec![InputEvent::Quit])
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Vec<InputEvent> {
        self.frames.pop_front().unwrap_or_default()
    }
}
