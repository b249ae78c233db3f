//! Error types for simulation setup and usage

use thiserror::Error;

use crate::geometry::{Rect, Size};

/// Errors surfaced to callers of the simulation entry points
#[derive(Debug, Error)]
pub enum SimError {
    /// `run` was asked for an interactive session with no display and no step budget
    #[error("display is not open, so a maximum step count must be given to run()")]
    HeadlessWithoutBudget,
    /// A step rate of zero Hz can neither integrate nor be reconciled with wall time
    #[error("step rate must be at least 1 Hz, got {0}")]
    InvalidStepRate(u32),
    /// A camera bound region cannot hold the whole viewport
    #[error("camera bound {bounds:?} is smaller than the {viewport:?} viewport")]
    CameraBoundsTooSmall { bounds: Rect, viewport: Size },
    /// A layered append found no leaf list to land in
    #[error("layered object list has no leaf layer to receive the object")]
    NoLeafLayer,
    /// `remove` was asked for an item that is not a member
    #[error("item is not present in the tracker list")]
    NotPresent,
    /// A layer index outside the object collection
    #[error("no layer at index {0}")]
    UnknownLayer(usize),
    /// Malformed settings file
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
    /// Settings file could not be read or written
    #[error("settings i/o: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
