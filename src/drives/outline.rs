//! Geom outlines

use crate::geometry::{Point, Size};
use crate::renderer::{Color, colors};
use crate::sim::drive::{DrawContext, Drive};
use crate::sim::gameobj::GameObj;
use crate::sim::physics::Shape;

/// Draws the outline of the object's geom, if it has one
#[derive(Debug, Clone)]
pub struct DGeomOutline {
    pub color: Color,
}

impl Default for DGeomOutline {
    fn default() -> Self {
        Self { color: colors::DEBUG }
    }
}

impl Drive for DGeomOutline {
    fn draw(&mut self, obj: &GameObj, ctx: &mut DrawContext<'_>) {
        let Some(geom) = obj.geom().and_then(|g| ctx.world.geom(g)) else {
            return;
        };
        // The canvas is already at the object's pose
        match geom.shape {
            Shape::Sphere { radius } => ctx.canvas.circle(Point::ZERO, radius, self.color),
            Shape::Box { size } => {
                let s = Size::new(size.x, size.y);
                ctx.canvas.polygon(&[s.tl(), s.tr(), s.br(), s.bl()], self.color);
            }
        }
    }
}
