//! Gyre - a 2D action-game runtime
//!
//! Core modules:
//! - `sim`: Fixed-timestep simulation (rigid bodies, collision dispatch, game objects, drives)
//! - `collections`: Identity-tracked and layered object collections
//! - `geometry`: 2D points, sizes, lines and rotatable rects
//! - `drives`: Stock drives (magnets, camera follow, avatar, debug text)
//! - `renderer`: Canvas boundary consumed by an external renderer
//! - `platform`: Frame clock, input sources and the interactive frontend
//! - `settings`: Data-driven simulation configuration

pub mod collections;
pub mod drives;
pub mod error;
pub mod geometry;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{Result, SimError};
pub use geometry::{Line, Point, Rect, Size};
pub use settings::SimSettings;

use std::f64::consts::TAU;

/// Simulation configuration constants
pub mod consts {
    /// Physics steps per simulated second
    pub const DEFAULT_STEP_RATE_HZ: u32 = 100;
    /// Frame cap for the interactive loop; no point going above the step rate
    pub const DEFAULT_MAX_FPS: u32 = 100;

    /// Solver passes over all joints per step
    pub const SOLVER_ITERATIONS: usize = 10;
    /// Global error reduction parameter
    pub const DEFAULT_ERP: f64 = 0.2;
    /// Global constraint force mixing
    pub const DEFAULT_CFM: f64 = 1e-5;

    /// Contact joint restitution
    pub const CONTACT_BOUNCE: f64 = 0.5;
    /// Contact joint friction coefficient (effectively unbounded)
    pub const CONTACT_MU: f64 = 5000.0;
    /// Minimum incoming speed (m/s) before a contact bounces
    pub const BOUNCE_VELOCITY: f64 = 0.2;
    /// Penetration allowed before position correction kicks in (meters)
    pub const CONTACT_SLOP: f64 = 0.001;

    /// Angles smaller than this (revolutions) are treated as no rotation
    pub const ANGLE_EPSILON: f64 = 0.000001;
    /// Componentwise tolerance for `Point::near_to`
    pub const NEAR_TOLERANCE: f64 = 0.0001;

    /// Top-level slots in the standard object layering
    pub const LAYER_COUNT: usize = 7;

    /// Default visible area in game meters (4x3 display)
    pub const VIEWPORT_WIDTH: f64 = 4.0;
    pub const VIEWPORT_HEIGHT: f64 = 3.0;
    /// Screen pixels per game meter
    pub const PIXELS_PER_METER: f64 = 256.0;
}

/// Convert clockwise revolutions to counter-clockwise radians
#[inline]
pub fn rev2rad(ang: f64) -> f64 {
    -TAU * ang
}

/// Convert counter-clockwise radians to clockwise revolutions
#[inline]
pub fn rad2rev(rad: f64) -> f64 {
    -rad / TAU
}

/// Convert clockwise revolutions to clockwise degrees
#[inline]
pub fn rev2deg(ang: f64) -> f64 {
    360.0 * ang
}

/// Wrap an angle in revolutions to [0, 1)
#[inline]
pub fn wrap_revolutions(ang: f64) -> f64 {
    let wrapped = ang.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}
