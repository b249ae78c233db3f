//! The player's avatar
//!
//! Arrow keys push gently every step. Holding the charge key stops cruising;
//! letting go of it while a direction is held fires one strong boost.

use crate::geometry::Point;
use crate::renderer::colors;
use crate::sim::drive::{DrawContext, Drive, StepContext};
use crate::sim::gameobj::GameObj;
use crate::sim::input::{InputState, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarAnim {
    Float,
    Boost,
    Charge,
}

impl AvatarAnim {
    pub fn label(self) -> &'static str {
        match self {
            AvatarAnim::Float => "float",
            AvatarAnim::Boost => "float-boost",
            AvatarAnim::Charge => "float-charge",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DAvatar {
    /// Force of a released charge
    pub charge_push: f64,
    /// Force per step while cruising
    pub cruise_push: f64,
    pub charge_key: Key,
    pub radius: f64,
    anim: AvatarAnim,
}

impl Default for DAvatar {
    fn default() -> Self {
        Self {
            charge_push: 60.0,
            cruise_push: 1.0,
            charge_key: Key::Char('c'),
            radius: 0.5,
            anim: AvatarAnim::Float,
        }
    }
}

impl DAvatar {
    pub fn anim(&self) -> AvatarAnim {
        self.anim
    }

    /// Direction the arrow keys point, each component -1, 0 or 1
    fn direction(input: &InputState) -> Point {
        let mut dir = Point::ZERO;
        if input.is_held(Key::Up) {
            dir.y = -1.0;
        }
        if input.is_held(Key::Left) {
            dir.x = -1.0;
        }
        if input.is_held(Key::Down) {
            dir.y = 1.0;
        }
        if input.is_held(Key::Right) {
            dir.x = 1.0;
        }
        dir
    }
}

impl Drive for DAvatar {
    fn step(&mut self, obj: &mut GameObj, ctx: &mut StepContext<'_>) {
        let dir = Self::direction(ctx.input);
        if ctx.input.is_held(self.charge_key) {
            self.anim = AvatarAnim::Charge;
            return;
        }
        if dir == Point::ZERO {
            self.anim = AvatarAnim::Float;
            return;
        }
        self.anim = AvatarAnim::Boost;
        let push = if ctx.input.released(self.charge_key) {
            log::debug!("{:?} boost toward {:?}", obj.id(), dir);
            self.charge_push
        } else {
            self.cruise_push
        };
        obj.add_force(ctx.world, dir.to_length(push));
    }

    fn draw(&mut self, _obj: &GameObj, ctx: &mut DrawContext<'_>) {
        let color = match self.anim {
            AvatarAnim::Float => colors::BLUE,
            AvatarAnim::Boost => colors::GREEN,
            AvatarAnim::Charge => colors::YELLOW,
        };
        ctx.canvas.circle(Point::ZERO, self.radius, color);
        ctx.canvas.line(Point::ZERO, Point::new(self.radius, 0.0), colors::WHITE);
    }
}
