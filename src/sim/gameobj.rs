//! Game objects
//!
//! A `GameObj` couples a logical pose (position plus angle in clockwise
//! revolutions) with an optional physics body and an optional collision geom,
//! and keeps all three in agreement. Setting the pose writes through to the
//! body (or to the geom when there is no body); `sync` reads the pose back out
//! of the body after each physics step and flattens out any motion that left
//! the plane.
//!
//! The object owns its body and geom. They are destroyed when replaced and
//! when the object is destroyed.

use std::f64::consts::TAU;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{DMat3, DVec3};

use super::drive::{Drive, DrawContext, DriveSlot, StepContext};
use super::limbed::LimbSet;
use super::physics::{BodyHandle, GeomHandle, PhysicsWorld};
use crate::collections::{Identity, Tracked};
use crate::consts::ANGLE_EPSILON;
use crate::geometry::Point;
use crate::wrap_revolutions;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique object identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(u64);

impl ObjId {
    fn next() -> Self {
        ObjId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Which physics handles an object carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tether {
    /// Free-standing pose; neither moves under force nor collides
    Untethered,
    /// Collides but never moves under force
    GeomOnly,
    /// Moves under force, never collides
    BodyOnly,
    /// Moves under force and collides
    BodyAndGeom,
}

/// Rotation for an angle in clockwise revolutions.
///
/// The world is right-handed about +z with +y pointing down the screen, so a
/// positive turn about z is clockwise on screen.
pub fn ang_to_rotation(ang: f64) -> DMat3 {
    DMat3::from_rotation_z(TAU * ang)
}

/// Angle in clockwise revolutions, in [0, 1), of a rotation about z.
///
/// The cosine alone cannot tell a turn from its mirror image, so the sign of
/// the sine picks the half turn.
pub fn rotation_to_ang(rot: &DMat3) -> f64 {
    let cos = rot.x_axis.x.clamp(-1.0, 1.0);
    let sin = rot.x_axis.y;
    let mut theta = cos.acos();
    if sin < 0.0 {
        theta = -theta;
    }
    wrap_revolutions(theta / TAU)
}

/// An entity: pose, optional body and geom, and an ordered list of drives
#[derive(Debug)]
pub struct GameObj {
    id: ObjId,
    pos: Point,
    ang: f64,
    body: Option<BodyHandle>,
    geom: Option<GeomHandle>,
    drives: Vec<DriveSlot>,
    pub(crate) limbs: Option<Box<LimbSet>>,
}

impl From<ObjId> for Identity {
    fn from(id: ObjId) -> Self {
        Identity(id.0)
    }
}

impl Tracked for GameObj {
    fn identity(&self) -> Identity {
        Identity(self.id.0)
    }
}

impl GameObj {
    /// An object with no body or geom
    pub fn untethered(pos: Point, ang: f64) -> Self {
        Self {
            id: ObjId::next(),
            pos,
            ang: wrap_revolutions(ang),
            body: None,
            geom: None,
            drives: Vec::new(),
            limbs: None,
        }
    }

    /// Build an object around an optional body and geom.
    ///
    /// The given pose wins over whatever pose the body or geom carried.
    pub fn new(
        world: &mut PhysicsWorld,
        pos: Point,
        ang: f64,
        body: Option<BodyHandle>,
        geom: Option<GeomHandle>,
    ) -> Self {
        let mut obj = Self::untethered(pos, ang);
        obj.set_body(world, body);
        obj.set_geom(world, geom);
        obj.set_pos(world, pos);
        obj.set_ang(world, ang);
        obj
    }

    pub fn id(&self) -> ObjId {
        self.id
    }

    pub fn pos(&self) -> Point {
        self.pos
    }

    pub fn ang(&self) -> f64 {
        self.ang
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub fn geom(&self) -> Option<GeomHandle> {
        self.geom
    }

    pub fn tether(&self) -> Tether {
        match (self.body, self.geom) {
            (None, None) => Tether::Untethered,
            (None, Some(_)) => Tether::GeomOnly,
            (Some(_), None) => Tether::BodyOnly,
            (Some(_), Some(_)) => Tether::BodyAndGeom,
        }
    }

    pub fn is_limbed(&self) -> bool {
        self.limbs.is_some()
    }

    // --- Pose ---

    pub fn set_pos(&mut self, world: &mut PhysicsWorld, pos: Point) {
        self.pos = pos;
        if let Some(b) = self.body {
            if let Some(body) = world.body_mut(b) {
                body.pos = pos.fake_3d();
            }
        } else if let Some(g) = self.geom {
            world.set_geom_position(g, pos.fake_3d());
        }
    }

    /// Set the angle, wrapped into [0, 1)
    pub fn set_ang(&mut self, world: &mut PhysicsWorld, ang: f64) {
        self.ang = wrap_revolutions(ang);
        let rot = ang_to_rotation(self.ang);
        if let Some(b) = self.body {
            if let Some(body) = world.body_mut(b) {
                body.rot = rot;
            }
        } else if let Some(g) = self.geom {
            world.set_geom_rotation(g, rot);
        }
    }

    fn fetch(&mut self, pos: DVec3, rot: &DMat3) {
        self.pos = Point::from_3d(pos);
        self.ang = rotation_to_ang(rot);
    }

    fn fetch_from_body(&mut self, world: &PhysicsWorld, b: BodyHandle) {
        if let Some(body) = world.body(b) {
            let (pos, rot) = (body.pos, body.rot);
            self.fetch(pos, &rot);
        }
    }

    fn fetch_from_geom(&mut self, world: &PhysicsWorld, g: GeomHandle) {
        if let Some((pos, rot)) = world.geom_pose(g) {
            self.fetch(pos, &rot);
        }
    }

    /// Replace the body. The old body is destroyed.
    ///
    /// The pose is taken from the new body and copied onto the geom, which
    /// then rides the new body.
    pub fn set_body(&mut self, world: &mut PhysicsWorld, body: Option<BodyHandle>) {
        if body == self.body {
            return;
        }
        if let Some(g) = self.geom {
            world.set_geom_body(g, None);
        }
        if let Some(old) = self.body.take() {
            world.destroy_body(old);
        }
        self.body = body;
        if let Some(b) = body {
            self.fetch_from_body(world, b);
            if let Some(g) = self.geom {
                world.set_geom_position(g, self.pos.fake_3d());
                world.set_geom_rotation(g, ang_to_rotation(self.ang));
            }
        }
        if let Some(g) = self.geom {
            world.set_geom_body(g, self.body);
        }
        log::trace!("{:?} tether now {:?}", self.id, self.tether());
    }

    /// Replace the geom. The old geom leaves its space and is destroyed.
    ///
    /// The pose is taken from the new geom; with a body present the body is
    /// moved there and the geom attached to it.
    pub fn set_geom(&mut self, world: &mut PhysicsWorld, geom: Option<GeomHandle>) {
        if geom == self.geom {
            return;
        }
        if let Some(old) = self.geom.take() {
            world.destroy_geom(old);
        }
        self.geom = geom;
        if let Some(g) = geom {
            self.fetch_from_geom(world, g);
            if let Some(b) = self.body {
                if let Some(body) = world.body_mut(b) {
                    body.pos = self.pos.fake_3d();
                    body.rot = ang_to_rotation(self.ang);
                }
                world.set_geom_body(g, Some(b));
            }
        }
        log::trace!("{:?} tether now {:?}", self.id, self.tether());
    }

    /// Pull the pose out of the physics world after a step.
    ///
    /// With a body: cancel out-of-plane velocity, read the pose, and write it
    /// back flattened so body and geom cannot drift apart. With only a geom:
    /// read the pose from the geom. Limbs sync after their parent.
    pub fn sync(&mut self, world: &mut PhysicsWorld) {
        if let Some(b) = self.body {
            if let Some(body) = world.body_mut(b) {
                body.lin_vel.z = 0.0;
                body.ang_vel = DVec3::new(0.0, 0.0, body.ang_vel.z);
                let (pos, rot) = (body.pos, body.rot);
                self.fetch(pos, &rot);
                body.pos = self.pos.fake_3d();
                body.rot = ang_to_rotation(self.ang);
            }
        } else if let Some(g) = self.geom {
            self.fetch_from_geom(world, g);
        }
        if let Some(limbs) = self.limbs.as_mut() {
            limbs.sync(world);
        }
    }

    /// Stop all linear and angular motion
    pub fn freeze(&self, world: &mut PhysicsWorld) {
        if let Some(body) = self.body.and_then(|b| world.body_mut(b)) {
            body.lin_vel = DVec3::ZERO;
            body.ang_vel = DVec3::ZERO;
        }
    }

    /// Push the body with a force through its center for the next step
    pub fn add_force(&self, world: &mut PhysicsWorld, force: Point) {
        if let Some(body) = self.body.and_then(|b| world.body_mut(b)) {
            body.add_force(force.fake_3d());
        }
    }

    /// In-plane velocity, zero without a body
    pub fn velocity(&self, world: &PhysicsWorld) -> Point {
        self.body
            .and_then(|b| world.body(b))
            .map_or(Point::ZERO, |body| Point::from_3d(body.lin_vel))
    }

    /// `(x, y) ang` with three decimals
    pub fn info(&self) -> String {
        format!("({:.3}, {:.3}) {:.3}", self.pos.x, self.pos.y, self.ang)
    }

    /// Release everything this object holds in the world: geom (leaving its
    /// space), body, and any limbs with their hinges and space
    pub fn destroy(&mut self, world: &mut PhysicsWorld) {
        if let Some(mut limbs) = self.limbs.take() {
            limbs.destroy(world);
        }
        if let Some(g) = self.geom.take() {
            world.destroy_geom(g);
        }
        if let Some(b) = self.body.take() {
            world.destroy_body(b);
        }
        log::debug!("{:?} destroyed", self.id);
    }

    // --- Drives ---

    /// Append a drive with default switches; returns its index
    pub fn add_drive(&mut self, drive: impl Drive + 'static) -> usize {
        self.push_drive(DriveSlot::new(drive))
    }

    /// Append a configured drive slot; returns its index
    pub fn push_drive(&mut self, slot: DriveSlot) -> usize {
        self.drives.push(slot);
        self.drives.len() - 1
    }

    pub fn drives(&self) -> &[DriveSlot] {
        &self.drives
    }

    pub fn drive_mut(&mut self, index: usize) -> Option<&mut DriveSlot> {
        self.drives.get_mut(index)
    }

    /// Run `f` over every drive slot in order, with the object available.
    ///
    /// Slots are moved out for the duration; drives added meanwhile are
    /// appended after the existing ones and first run in the next phase.
    fn each_drive(&mut self, mut f: impl FnMut(&mut DriveSlot, &mut GameObj)) {
        let mut taken = std::mem::take(&mut self.drives);
        for slot in &mut taken {
            f(slot, self);
        }
        let added = std::mem::replace(&mut self.drives, taken);
        self.drives.extend(added);
    }

    /// Step phase: own drives, then limbs, then post-limb drives
    pub fn step(&mut self, ctx: &mut StepContext<'_>) {
        self.each_drive(|slot, obj| slot.run_step(obj, ctx));
        if let Some(mut limbs) = self.limbs.take() {
            limbs.step(self, ctx);
            self.limbs = Some(limbs);
        }
    }

    /// Predraw phase, cascading like `step`
    pub fn predraw(&mut self, ctx: &mut DrawContext<'_>) {
        self.each_drive(|slot, obj| slot.run_predraw(obj, ctx));
        if let Some(mut limbs) = self.limbs.take() {
            limbs.predraw(self, ctx);
            self.limbs = Some(limbs);
        }
    }

    /// Draw phase: drives run with the canvas moved to the object's pose
    pub fn draw(&mut self, ctx: &mut DrawContext<'_>) {
        self.in_frame(ctx, |obj, ctx| obj.each_drive(|slot, obj| slot.run_draw(obj, ctx)));
        if let Some(mut limbs) = self.limbs.take() {
            limbs.draw(self, ctx);
            self.limbs = Some(limbs);
        }
    }

    /// Run `f` with the canvas translated to the object and rotated by its angle
    pub(crate) fn in_frame(&mut self, ctx: &mut DrawContext<'_>, f: impl FnOnce(&mut GameObj, &mut DrawContext<'_>)) {
        ctx.canvas.push();
        ctx.canvas.translate(self.pos);
        if self.ang > ANGLE_EPSILON {
            ctx.canvas.rotate(self.ang);
        }
        f(self, ctx);
        ctx.canvas.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{Camera, DrawCommand, RecordingCanvas, colors};
    use crate::sim::collision::CollisionRecords;
    use crate::sim::input::InputState;
    use crate::sim::physics::{Mass, Shape};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ang_close(a: f64, b: f64) -> bool {
        let d = (a - b).abs();
        d.min(1.0 - d) < 1e-6
    }

    fn tethered(world: &mut PhysicsWorld, pos: Point, ang: f64) -> GameObj {
        let space = world.create_space(None);
        let body = world.create_body(Mass::sphere(1.0, 0.5));
        let geom = world.create_geom(Shape::Box { size: DVec3::new(1.0, 0.5, 1.0) }, Some(space));
        GameObj::new(world, pos, ang, Some(body), Some(geom))
    }

    fn assert_body_geom_agree(world: &PhysicsWorld, obj: &GameObj) {
        let body = world.body(obj.body().unwrap()).unwrap();
        let (gpos, grot) = world.geom_pose(obj.geom().unwrap()).unwrap();
        assert!((body.pos - gpos).length() < 1e-9);
        assert!((body.rot.x_axis - grot.x_axis).length() < 1e-9);
        assert!(Point::from_3d(body.pos).near_to(obj.pos()));
        assert!(ang_close(rotation_to_ang(&body.rot), obj.ang()));
    }

    #[test]
    fn test_rotation_sign_disambiguation() {
        // Same cosine, opposite sines
        let quarter = ang_to_rotation(0.25);
        let three_quarters = ang_to_rotation(0.75);
        assert!((quarter.x_axis.x - three_quarters.x_axis.x).abs() < 1e-12);
        assert!(quarter.x_axis.y > 0.0 && three_quarters.x_axis.y < 0.0);

        assert!((rotation_to_ang(&quarter) - 0.25).abs() < 1e-9);
        assert!((rotation_to_ang(&three_quarters) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_boundaries() {
        for ang in [0.0, 1e-7, 0.9999999, 0.4999999, 0.5, 0.5000001] {
            let back = rotation_to_ang(&ang_to_rotation(ang));
            assert!(ang_close(back, ang), "{ang} came back as {back}");
            assert!((0.0..1.0).contains(&back));
        }
    }

    #[test]
    fn test_pose_round_trip_through_body_and_geom() {
        let mut world = PhysicsWorld::default();
        for ang in [0.0, 0.1, 0.25, 0.5, 0.75, 0.999] {
            let mut obj = tethered(&mut world, Point::new(1.5, -2.0), 0.0);
            obj.set_ang(&mut world, ang);
            obj.sync(&mut world);
            assert!(obj.pos().near_to(Point::new(1.5, -2.0)));
            assert!(ang_close(obj.ang(), ang), "{ang} came back as {}", obj.ang());
            assert_body_geom_agree(&world, &obj);
        }
    }

    #[test]
    fn test_set_ang_wraps() {
        let mut world = PhysicsWorld::default();
        let mut obj = GameObj::untethered(Point::ZERO, 0.0);
        obj.set_ang(&mut world, 1.25);
        assert!((obj.ang() - 0.25).abs() < 1e-12);
        obj.set_ang(&mut world, -0.25);
        assert!((obj.ang() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_given_pose_overrides_handles() {
        let mut world = PhysicsWorld::default();
        let body = world.create_body(Mass::default());
        world.body_mut(body).unwrap().pos = DVec3::new(9.0, 9.0, 0.0);
        let geom = world.create_geom(Shape::Sphere { radius: 0.5 }, None);
        let obj = GameObj::new(&mut world, Point::new(1.0, 2.0), 0.125, Some(body), Some(geom));
        assert_eq!(obj.tether(), Tether::BodyAndGeom);
        assert_eq!(world.geom_position(geom), Some(DVec3::new(1.0, 2.0, 0.0)));
        assert_body_geom_agree(&world, &obj);
    }

    #[test]
    fn test_tether_transitions() {
        let mut world = PhysicsWorld::default();
        let mut obj = GameObj::untethered(Point::new(3.0, 0.0), 0.0);
        assert_eq!(obj.tether(), Tether::Untethered);

        let geom = world.create_geom(Shape::Sphere { radius: 0.5 }, None);
        world.set_geom_position(geom, DVec3::new(4.0, 0.0, 0.0));
        obj.set_geom(&mut world, Some(geom));
        assert_eq!(obj.tether(), Tether::GeomOnly);
        // Pose comes from the new geom
        assert!(obj.pos().near_to(Point::new(4.0, 0.0)));
        obj.set_pos(&mut world, Point::new(5.0, 0.0));
        assert_eq!(world.geom_position(geom), Some(DVec3::new(5.0, 0.0, 0.0)));

        let body = world.create_body(Mass::default());
        world.body_mut(body).unwrap().pos = DVec3::new(6.0, 1.0, 0.0);
        obj.set_body(&mut world, Some(body));
        assert_eq!(obj.tether(), Tether::BodyAndGeom);
        assert!(obj.pos().near_to(Point::new(6.0, 1.0)));
        assert_eq!(world.geom(geom).unwrap().body(), Some(body));
        assert_body_geom_agree(&world, &obj);

        // Replacing the body destroys the old one and keeps the geom riding
        let body2 = world.create_body(Mass::default());
        obj.set_body(&mut world, Some(body2));
        assert!(world.body(body).is_none());
        assert_eq!(world.geom(geom).unwrap().body(), Some(body2));

        obj.set_geom(&mut world, None);
        assert!(world.geom(geom).is_none());
        assert_eq!(obj.tether(), Tether::BodyOnly);
    }

    #[test]
    fn test_sync_flattens_motion() {
        let mut world = PhysicsWorld::default();
        let mut obj = tethered(&mut world, Point::ZERO, 0.3);
        let b = obj.body().unwrap();
        {
            let body = world.body_mut(b).unwrap();
            body.lin_vel = DVec3::new(1.0, 2.0, 3.0);
            body.ang_vel = DVec3::new(0.5, 0.5, 1.0);
            body.pos.z = 0.7;
        }
        obj.sync(&mut world);
        let body = world.body(b).unwrap();
        assert_eq!(body.lin_vel, DVec3::new(1.0, 2.0, 0.0));
        assert_eq!(body.ang_vel, DVec3::new(0.0, 0.0, 1.0));
        assert_eq!(body.pos.z, 0.0);
        assert_body_geom_agree(&world, &obj);
    }

    #[test]
    fn test_freeze_info_and_destroy() {
        let mut world = PhysicsWorld::default();
        let mut obj = tethered(&mut world, Point::new(1.0, 2.0), 0.5);
        obj.add_force(&mut world, Point::new(1.0, 0.0));
        world.body_mut(obj.body().unwrap()).unwrap().lin_vel = DVec3::X;
        obj.freeze(&mut world);
        assert_eq!(obj.velocity(&world), Point::ZERO);
        assert_eq!(obj.info(), "(1.000, 2.000) 0.500");

        let (geoms, bodies) = (world.geom_count(), world.body_count());
        obj.destroy(&mut world);
        assert_eq!(world.geom_count(), geoms - 1);
        assert_eq!(world.body_count(), bodies - 1);
        assert_eq!(obj.tether(), Tether::Untethered);
    }

    #[derive(Debug)]
    struct Recorder {
        tag: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Drive for Recorder {
        fn step(&mut self, obj: &mut GameObj, ctx: &mut StepContext<'_>) {
            // Each drive sees the position left by the one before it
            self.log.borrow_mut().push(format!("{}:{:.1}", self.tag, obj.pos().x));
            let next = obj.pos() + Point::new(1.0, 0.0);
            obj.set_pos(ctx.world, next);
        }

        fn draw(&mut self, _obj: &GameObj, ctx: &mut DrawContext<'_>) {
            ctx.canvas.circle(Point::ZERO, 0.1, colors::WHITE);
        }
    }

    #[test]
    fn test_drives_run_in_order_and_see_earlier_changes() {
        let mut world = PhysicsWorld::default();
        let records = CollisionRecords::new();
        let input = InputState::new();
        let mut commands = Vec::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let mut obj = GameObj::untethered(Point::ZERO, 0.0);
        obj.add_drive(Recorder { tag: "a", log: log.clone() });
        obj.add_drive(Recorder { tag: "b", log: log.clone() });
        let mut ctx = StepContext::new(&mut world, &records, &input, 0.01, 0, &mut commands);
        obj.step(&mut ctx);
        assert_eq!(*log.borrow(), vec!["a:0.0", "b:1.0"]);
        assert!(obj.pos().near_to(Point::new(2.0, 0.0)));
    }

    #[test]
    fn test_draw_places_drives_at_object() {
        let world = PhysicsWorld::default();
        let mut obj = GameObj::untethered(Point::new(2.0, 3.0), 0.0);
        obj.add_drive(Recorder {
            tag: "a",
            log: Rc::new(RefCell::new(Vec::new())),
        });
        let mut canvas = RecordingCanvas::new();
        let mut camera = Camera::default();
        let mut ctx = DrawContext {
            canvas: &mut canvas,
            camera: &mut camera,
            world: &world,
            frame_secs: 0.0,
        };
        obj.draw(&mut ctx);
        assert!(matches!(
            canvas.commands()[0],
            DrawCommand::Circle { cen, .. } if cen.near_to(Point::new(2.0, 3.0))
        ));
        assert!(canvas.balanced());
    }

    proptest! {
        #[test]
        fn prop_pose_round_trip(x in -100.0f64..100.0, y in -100.0f64..100.0, ang in 0.0f64..1.0) {
            let mut world = PhysicsWorld::default();
            let mut obj = tethered(&mut world, Point::new(x, y), ang);
            obj.sync(&mut world);
            prop_assert!(obj.pos().near_to(Point::new(x, y)));
            prop_assert!(ang_close(obj.ang(), ang));
        }

        #[test]
        fn prop_body_and_geom_agree_through_steps(
            pushes in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0, -3.0f64..3.0), 1..20),
            ang in 0.0f64..1.0,
        ) {
            let mut world = PhysicsWorld::default();
            let mut obj = tethered(&mut world, Point::new(1.0, -1.0), ang);
            let body = obj.body().unwrap();
            for (fx, fy, spin) in pushes {
                obj.add_force(&mut world, Point::new(fx, fy));
                // Out-of-plane spin that sync has to cancel
                world.body_mut(body).unwrap().ang_vel += DVec3::new(spin, -spin, spin);
                world.quick_step(0.01);
                obj.sync(&mut world);
                assert_body_geom_agree(&world, &obj);
            }
        }
    }
}
