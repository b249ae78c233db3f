//! Drawing boundary
//!
//! The simulation never talks to a graphics API. Drives draw through the
//! `Canvas` trait, in meters, under a matrix stack managed with `push`/`pop`;
//! a backend maps that onto whatever it renders with.

pub mod camera;
pub mod recording;

pub use camera::Camera;
pub use recording::{DrawCommand, RecordingCanvas};

use crate::geometry::Point;

/// RGBA, each channel 0.0 - 1.0
pub type Color = [f32; 4];

pub mod colors {
    use super::Color;

    pub const WHITE: Color = [1.0, 1.0, 1.0, 1.0];
    pub const BLACK: Color = [0.0, 0.0, 0.0, 1.0];
    pub const RED: Color = [1.0, 0.2, 0.2, 1.0];
    pub const GREEN: Color = [0.2, 0.8, 0.4, 1.0];
    pub const BLUE: Color = [0.2, 0.4, 1.0, 1.0];
    pub const YELLOW: Color = [1.0, 0.8, 0.2, 1.0];
    /// Geom outlines and other debug overlays
    pub const DEBUG: Color = [0.4, 1.0, 0.4, 0.8];
}

/// A 2D drawing surface with a transform stack
pub trait Canvas {
    /// Save the current transform
    fn push(&mut self);
    /// Restore the last saved transform
    fn pop(&mut self);
    fn translate(&mut self, offset: Point);
    /// Rotate by clockwise revolutions
    fn rotate(&mut self, ang: f64);

    fn circle(&mut self, cen: Point, radius: f64, color: Color);
    fn polygon(&mut self, points: &[Point], color: Color);
    fn line(&mut self, a: Point, b: Point, color: Color);
    fn text(&mut self, at: Point, text: &str, color: Color);
}

/// Draws nothing. Used when a frame must be driven without any output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCanvas;

impl Canvas for NullCanvas {
    fn push(&mut self) {}
    fn pop(&mut self) {}
    fn translate(&mut self, _offset: Point) {}
    fn rotate(&mut self, _ang: f64) {}
    fn circle(&mut self, _cen: Point, _radius: f64, _color: Color) {}
    fn polygon(&mut self, _points: &[Point], _color: Color) {}
    fn line(&mut self, _a: Point, _b: Point, _color: Color) {}
    fn text(&mut self, _at: Point, _text: &str, _color: Color) {}
}
