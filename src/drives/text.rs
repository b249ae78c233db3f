//! Debug text

use crate::geometry::Point;
use crate::renderer::{Color, colors};
use crate::sim::drive::{DrawContext, Drive};
use crate::sim::gameobj::GameObj;

/// Draws a fixed string just above the object
#[derive(Debug, Clone)]
pub struct DDebugText {
    pub text: String,
    pub color: Color,
    pub offset: Point,
}

impl DDebugText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: colors::BLACK,
            offset: Point::new(0.0, -0.25),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

impl Drive for DDebugText {
    fn draw(&mut self, _obj: &GameObj, ctx: &mut DrawContext<'_>) {
        ctx.canvas.text(self.offset, &self.text, self.color);
    }
}
