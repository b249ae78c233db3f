//! Magnets: forces pushing or pulling every body from a point, line or rect
//!
//! `pow` is the force applied per step; negative pulls. `loss` is force lost
//! per meter of distance, and never carries `pow` past zero. With `gravity`
//! set the force scales with the target's mass, so every body accelerates
//! alike. A `rad` of zero or less means unlimited range.

use crate::geometry::{Line, Point, Rect, Size};
use crate::sim::drive::{Drive, StepContext};
use crate::sim::gameobj::GameObj;

/// Force emanating from `source` acting on a body of `target_mass` at `target`
pub fn mag_force(source: Point, target: Point, target_mass: f64, pow: f64, loss: f64, grav: bool) -> Point {
    let mut force = pow;
    if loss != 0.0 {
        let diff = source.dist_to(target) * loss;
        force += if pow > 0.0 { -diff } else { diff };
        if (force > 0.0) != (pow > 0.0) {
            return Point::ZERO;
        }
    }
    if grav {
        force *= target_mass;
    }
    let dir = (target.y - source.y).atan2(target.x - source.x);
    Point::new(force * dir.cos(), force * dir.sin())
}

/// Strength and reach shared by every magnet shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub pow: f64,
    pub rad: f64,
    pub loss: f64,
    pub gravity: bool,
}

impl Field {
    pub fn new(pow: f64) -> Self {
        Self {
            pow,
            rad: 0.0,
            loss: 0.0,
            gravity: false,
        }
    }

    pub fn with_radius(mut self, rad: f64) -> Self {
        self.rad = rad;
        self
    }

    pub fn with_loss(mut self, loss: f64) -> Self {
        self.loss = loss;
        self
    }

    pub fn gravity(mut self) -> Self {
        self.gravity = true;
        self
    }

    /// Push every body except `own`'s, using `nearest` to find where on the
    /// magnet each body is pulled from
    fn apply(&self, own: &GameObj, ctx: &mut StepContext<'_>, nearest: impl Fn(Point) -> Point) {
        let own_body = own.body();
        for (handle, body) in ctx.world.bodies_mut() {
            if Some(handle) == own_body {
                continue;
            }
            let target = Point::from_3d(body.pos);
            let source = nearest(target);
            if self.rad > 0.0 && self.rad < source.dist_to(target) {
                continue;
            }
            let f = mag_force(source, target, body.mass.mass, self.pow, self.loss, self.gravity);
            body.add_force(f.fake_3d());
        }
    }
}

/// Magnet at the object's position
#[derive(Debug, Clone)]
pub struct DMagnet {
    pub field: Field,
}

impl DMagnet {
    pub fn new(field: Field) -> Self {
        Self { field }
    }
}

impl Drive for DMagnet {
    fn step(&mut self, obj: &mut GameObj, ctx: &mut StepContext<'_>) {
        let pos = obj.pos();
        self.field.apply(obj, ctx, |_| pos);
    }
}

/// Magnet along a segment through the object, from `pos + end` to `pos - end`,
/// turning with the object
#[derive(Debug, Clone)]
pub struct DLineMagnet {
    pub field: Field,
    pub end: Point,
}

impl DLineMagnet {
    pub fn new(field: Field, end: Point) -> Self {
        Self { field, end }
    }
}

impl Drive for DLineMagnet {
    fn step(&mut self, obj: &mut GameObj, ctx: &mut StepContext<'_>) {
        let (pos, ang) = (obj.pos(), obj.ang());
        let line = Line::new((pos + self.end).rot(pos, ang), (pos - self.end).rot(pos, ang));
        self.field.apply(obj, ctx, |p| line.nearest_pt_to(p));
    }
}

/// Magnet filling a rect of `size` centered on the object, turning with it
#[derive(Debug, Clone)]
pub struct DRectMagnet {
    pub field: Field,
    pub size: Size,
}

impl DRectMagnet {
    pub fn new(field: Field, size: Size) -> Self {
        Self { field, size }
    }
}

impl Drive for DRectMagnet {
    fn step(&mut self, obj: &mut GameObj, ctx: &mut StepContext<'_>) {
        let rect = Rect::rotated(obj.pos(), self.size, obj.ang());
        self.field.apply(obj, ctx, |p| rect.nearest_pt_to(p));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::CollisionRecords;
    use crate::sim::input::InputState;
    use crate::sim::physics::{Mass, PhysicsWorld};

    fn close(a: Point, b: Point) -> bool {
        (a - b).mag() < 1e-9
    }

    #[test]
    fn test_mag_force_direction_and_loss() {
        let src = Point::ZERO;
        assert!(close(mag_force(src, Point::new(2.0, 0.0), 1.0, 3.0, 0.0, false), Point::new(3.0, 0.0)));
        // Pulling points back at the source
        assert!(close(mag_force(src, Point::new(0.0, 2.0), 1.0, -3.0, 0.0, false), Point::new(0.0, -3.0)));
        // 2 m at 1/m loss leaves 1 of 3
        assert!(close(mag_force(src, Point::new(2.0, 0.0), 1.0, 3.0, 1.0, false), Point::new(1.0, 0.0)));
        assert!(close(mag_force(src, Point::new(2.0, 0.0), 1.0, -3.0, 1.0, false), Point::new(-1.0, 0.0)));
        // Loss never flips the sign
        assert_eq!(mag_force(src, Point::new(5.0, 0.0), 1.0, 3.0, 1.0, false), Point::ZERO);
        assert_eq!(mag_force(src, Point::new(5.0, 0.0), 1.0, -3.0, 1.0, false), Point::ZERO);
        // Gravity scales with mass
        assert!(close(mag_force(src, Point::new(2.0, 0.0), 4.0, 3.0, 0.0, true), Point::new(12.0, 0.0)));
    }

    fn world_with_body_at(pos: Point) -> (PhysicsWorld, crate::sim::physics::BodyHandle) {
        let mut world = PhysicsWorld::default();
        let b = world.create_body(Mass::sphere_total(2.0, 0.5));
        world.body_mut(b).unwrap().pos = pos.fake_3d();
        (world, b)
    }

    fn step_drive(drive: &mut dyn Drive, obj: &mut GameObj, world: &mut PhysicsWorld) {
        let records = CollisionRecords::new();
        let input = InputState::new();
        let mut commands = Vec::new();
        let mut ctx = StepContext::new(world, &records, &input, 0.01, 0, &mut commands);
        drive.step(obj, &mut ctx);
    }

    #[test]
    fn test_point_magnet_range_and_self() {
        let (mut world, b) = world_with_body_at(Point::new(3.0, 0.0));
        let mut magnet = GameObj::untethered(Point::ZERO, 0.0);

        step_drive(&mut DMagnet::new(Field::new(-1.0).with_radius(2.0)), &mut magnet, &mut world);
        assert_eq!(world.body(b).unwrap().force(), glam::DVec3::ZERO);

        step_drive(&mut DMagnet::new(Field::new(-1.0).with_radius(4.0)), &mut magnet, &mut world);
        assert!((world.body(b).unwrap().force().x + 1.0).abs() < 1e-9);

        // A magnet with a body leaves its own body alone
        let own = world.create_body(Mass::default());
        let mut tethered = GameObj::new(&mut world, Point::ZERO, 0.0, Some(own), None);
        step_drive(&mut DMagnet::new(Field::new(5.0)), &mut tethered, &mut world);
        assert_eq!(world.body(own).unwrap().force(), glam::DVec3::ZERO);
    }

    #[test]
    fn test_line_magnet_pulls_from_nearest_point() {
        let (mut world, b) = world_with_body_at(Point::new(0.5, 2.0));
        // Horizontal segment from (-1, 0) to (1, 0)
        let mut magnet = GameObj::untethered(Point::ZERO, 0.0);
        step_drive(&mut DLineMagnet::new(Field::new(2.0), Point::new(1.0, 0.0)), &mut magnet, &mut world);
        let f = world.body(b).unwrap().force();
        assert!(f.x.abs() < 1e-9 && (f.y - 2.0).abs() < 1e-9, "{f:?}");
    }

    #[test]
    fn test_rect_magnet_turns_with_object() {
        let (mut world, b) = world_with_body_at(Point::new(0.0, 3.0));
        // A 4 x 0.5 bar turned a quarter reaches 2 m down
        let mut magnet = GameObj::untethered(Point::ZERO, 0.25);
        let mut drive = DRectMagnet::new(Field::new(1.0).with_radius(1.5), Size::new(4.0, 0.5));
        step_drive(&mut drive, &mut magnet, &mut world);
        let f = world.body(b).unwrap().force();
        assert!((f.y - 1.0).abs() < 1e-9, "{f:?}");

        magnet.set_ang(&mut world, 0.0);
        world.body_mut(b).unwrap().clear_accumulators();
        step_drive(&mut drive, &mut magnet, &mut world);
        assert_eq!(world.body(b).unwrap().force(), glam::DVec3::ZERO);
    }
}
