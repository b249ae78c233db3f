//! Object collections
//!
//! - `tracker`: a sequence with identity-keyed membership and counts
//! - `layered`: a tree of trackers presenting one flat, draw-ordered sequence

pub mod layered;
pub mod tracker;

pub use layered::{LayeredList, Node};
pub use tracker::{Identity, Tracked, TrackerList};
