//! A canvas that records what was drawn, already transformed into world space

use glam::DAffine2;

use super::{Canvas, Color};
use crate::geometry::Point;

/// One drawing call, with positions resolved through the transform stack
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Circle { cen: Point, radius: f64, color: Color },
    Polygon { points: Vec<Point>, color: Color },
    Line { a: Point, b: Point, color: Color },
    Text { at: Point, text: String, color: Color },
}

/// Records draw calls; useful headless and in tests
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,
    current: DAffine2,
    stack: Vec<DAffine2>,
    /// `pop` calls with nothing to restore
    unbalanced_pops: usize,
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            current: DAffine2::IDENTITY,
            stack: Vec::new(),
            unbalanced_pops: 0,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Saved transforms not yet restored
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// True if every `push` so far has been matched by a `pop`
    pub fn balanced(&self) -> bool {
        self.stack.is_empty() && self.unbalanced_pops == 0
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn map(&self, p: Point) -> Point {
        self.current.transform_point2(p.into()).into()
    }

    /// Scale of the current transform, for radii
    fn scale(&self) -> f64 {
        self.current.matrix2.x_axis.length()
    }
}

impl Canvas for RecordingCanvas {
    fn push(&mut self) {
        self.stack.push(self.current);
    }

    fn pop(&mut self) {
        match self.stack.pop() {
            Some(t) => self.current = t,
            None => self.unbalanced_pops += 1,
        }
    }

    fn translate(&mut self, offset: Point) {
        self.current = self.current * DAffine2::from_translation(offset.into());
    }

    fn rotate(&mut self, ang: f64) {
        // y points down, so a clockwise turn is a positive angle here
        self.current = self.current * DAffine2::from_angle(std::f64::consts::TAU * ang);
    }

    fn circle(&mut self, cen: Point, radius: f64, color: Color) {
        let cmd = DrawCommand::Circle {
            cen: self.map(cen),
            radius: radius * self.scale(),
            color,
        };
        self.commands.push(cmd);
    }

    fn polygon(&mut self, points: &[Point], color: Color) {
        let points = points.iter().map(|p| self.map(*p)).collect();
        self.commands.push(DrawCommand::Polygon { points, color });
    }

    fn line(&mut self, a: Point, b: Point, color: Color) {
        let cmd = DrawCommand::Line {
            a: self.map(a),
            b: self.map(b),
            color,
        };
        self.commands.push(cmd);
    }

    fn text(&mut self, at: Point, text: &str, color: Color) {
        let cmd = DrawCommand::Text {
            at: self.map(at),
            text: text.to_string(),
            color,
        };
        self.commands.push(cmd);
    }
}
