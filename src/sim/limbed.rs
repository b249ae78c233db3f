//! Objects with hinged limbs
//!
//! A limbed object gets its own collision space, nested inside the space it
//! lives in, holding its geom and the geoms of its limbs. Limbs hang off the
//! parent by hinges. Every phase cascades: the parent's drives, then each
//! limb, then the parent's post-limb drives (for pieces that must draw on
//! top of the limbs).

use super::drive::{Drive, DrawContext, DriveSlot, StepContext};
use super::gameobj::GameObj;
use super::physics::{JointHandle, PhysicsWorld, SpaceHandle};
use crate::geometry::Point;

#[derive(Debug)]
pub struct Limb {
    pub obj: GameObj,
    /// None when either side has no body to hinge
    pub hinge: Option<JointHandle>,
}

#[derive(Debug)]
pub struct LimbSet {
    space: SpaceHandle,
    limbs: Vec<Limb>,
    post_drives: Vec<DriveSlot>,
}

impl LimbSet {
    pub fn space(&self) -> SpaceHandle {
        self.space
    }

    pub fn limbs(&self) -> &[Limb] {
        &self.limbs
    }

    pub fn limb_mut(&mut self, index: usize) -> Option<&mut Limb> {
        self.limbs.get_mut(index)
    }

    pub fn post_drives(&self) -> &[DriveSlot] {
        &self.post_drives
    }

    pub(crate) fn sync(&mut self, world: &mut PhysicsWorld) {
        for limb in &mut self.limbs {
            limb.obj.sync(world);
        }
    }

    pub(crate) fn step(&mut self, parent: &mut GameObj, ctx: &mut StepContext<'_>) {
        for limb in &mut self.limbs {
            limb.obj.step(ctx);
        }
        for slot in &mut self.post_drives {
            slot.run_step(parent, ctx);
        }
    }

    pub(crate) fn predraw(&mut self, parent: &mut GameObj, ctx: &mut DrawContext<'_>) {
        for limb in &mut self.limbs {
            limb.obj.predraw(ctx);
        }
        for slot in &mut self.post_drives {
            slot.run_predraw(parent, ctx);
        }
    }

    pub(crate) fn draw(&mut self, parent: &mut GameObj, ctx: &mut DrawContext<'_>) {
        for limb in &mut self.limbs {
            limb.obj.draw(ctx);
        }
        let post = &mut self.post_drives;
        if post.is_empty() {
            return;
        }
        parent.in_frame(ctx, |obj, ctx| {
            for slot in post.iter_mut() {
                slot.run_draw(obj, ctx);
            }
        });
    }

    pub(crate) fn destroy(&mut self, world: &mut PhysicsWorld) {
        for mut limb in self.limbs.drain(..) {
            if let Some(j) = limb.hinge.take() {
                world.destroy_joint(j);
            }
            limb.obj.destroy(world);
        }
        world.destroy_space(self.space);
    }
}

impl GameObj {
    /// Give this object a collision space of its own inside `parent`, and move
    /// its geom there. Returns the new space; calling it again returns the
    /// existing one.
    pub fn make_limbed(&mut self, world: &mut PhysicsWorld, parent: SpaceHandle) -> SpaceHandle {
        if let Some(limbs) = &self.limbs {
            return limbs.space;
        }
        let space = world.create_space(Some(parent));
        if let Some(g) = self.geom() {
            world.space_add(space, g.into());
        }
        self.limbs = Some(Box::new(LimbSet {
            space,
            limbs: Vec::new(),
            post_drives: Vec::new(),
        }));
        space
    }

    pub fn limb_set(&self) -> Option<&LimbSet> {
        self.limbs.as_deref()
    }

    pub fn limb_set_mut(&mut self) -> Option<&mut LimbSet> {
        self.limbs.as_deref_mut()
    }

    /// Attach `limb` by a hinge at `offset` from this object's center, in
    /// this object's rotated frame. The limb's geom joins the limb space.
    ///
    /// Returns the limb's index, or `None` if this object was never made
    /// limbed (the limb is destroyed in that case).
    pub fn add_limb(&mut self, world: &mut PhysicsWorld, mut limb: GameObj, offset: Point) -> Option<usize> {
        let anchor = self.pos() + offset.rot(Point::ZERO, self.ang());
        let (id, parent_body) = (self.id(), self.body());
        let Some(set) = self.limbs.as_mut() else {
            log::warn!("{:?} is not limbed; dropping limb {:?}", id, limb.id());
            limb.destroy(world);
            return None;
        };
        if let Some(g) = limb.geom() {
            world.space_add(set.space, g.into());
        }
        let hinge = limb
            .body()
            .and_then(|b| world.create_hinge(b, parent_body, anchor.fake_3d()));
        set.limbs.push(Limb { obj: limb, hinge });
        Some(set.limbs.len() - 1)
    }

    /// Add a drive that runs after the limbs in every phase.
    ///
    /// Returns its index, or `None` if this object is not limbed.
    pub fn add_post_drive(&mut self, drive: impl Drive + 'static) -> Option<usize> {
        let set = self.limbs.as_mut()?;
        set.post_drives.push(DriveSlot::new(drive));
        Some(set.post_drives.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{Camera, DrawCommand, RecordingCanvas, colors};
    use crate::sim::collision::{CollProps, CollisionRecords};
    use crate::sim::input::InputState;
    use crate::sim::physics::{Mass, Shape};
    use glam::DVec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug)]
    struct Mark {
        tag: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Drive for Mark {
        fn step(&mut self, _obj: &mut GameObj, _ctx: &mut StepContext<'_>) {
            self.log.borrow_mut().push(self.tag);
        }

        fn draw(&mut self, _obj: &GameObj, ctx: &mut DrawContext<'_>) {
            ctx.canvas.text(Point::ZERO, self.tag, colors::WHITE);
        }
    }

    fn boxy(world: &mut PhysicsWorld, pos: Point) -> GameObj {
        let body = world.create_body(Mass::cuboid(1.0, DVec3::new(1.0, 1.0, 1.0)));
        let geom = world.create_geom(Shape::Box { size: DVec3::ONE }, None);
        world.geom_mut(geom).unwrap().props = Some(CollProps::default());
        GameObj::new(world, pos, 0.0, Some(body), Some(geom))
    }

    #[test]
    fn test_limb_space_and_hinge() {
        let mut world = PhysicsWorld::default();
        let outer = world.create_space(None);
        let mut parent = boxy(&mut world, Point::ZERO);
        let space = parent.make_limbed(&mut world, outer);
        assert_eq!(parent.make_limbed(&mut world, outer), space);
        assert_eq!(world.space(space).unwrap().parent(), Some(outer));
        assert_eq!(world.geom(parent.geom().unwrap()).unwrap().space(), Some(space));

        let arm = boxy(&mut world, Point::new(1.0, 0.0));
        let arm_geom = arm.geom().unwrap();
        let idx = parent.add_limb(&mut world, arm, Point::new(0.5, 0.0)).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(world.geom(arm_geom).unwrap().space(), Some(space));
        assert!(parent.limb_set().unwrap().limbs()[0].hinge.is_some());
        assert_eq!(world.joint_count(), 1);

        parent.destroy(&mut world);
        assert_eq!(world.joint_count(), 0);
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.geom_count(), 0);
        assert!(world.space(space).is_none());
    }

    #[test]
    fn test_unlimbed_parent_rejects_limb() {
        let mut world = PhysicsWorld::default();
        let mut parent = boxy(&mut world, Point::ZERO);
        let arm = boxy(&mut world, Point::new(1.0, 0.0));
        assert_eq!(parent.add_limb(&mut world, arm, Point::ZERO), None);
        assert_eq!(world.body_count(), 1);
        assert_eq!(parent.add_post_drive(Mark { tag: "x", log: Rc::default() }), None);
    }

    #[test]
    fn test_phases_cascade_through_limbs() {
        let mut world = PhysicsWorld::default();
        let outer = world.create_space(None);
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut parent = GameObj::untethered(Point::new(1.0, 1.0), 0.0);
        parent.make_limbed(&mut world, outer);
        parent.add_drive(Mark { tag: "body", log: log.clone() });
        let mut arm = GameObj::untethered(Point::new(2.0, 1.0), 0.0);
        arm.add_drive(Mark { tag: "arm", log: log.clone() });
        parent.add_limb(&mut world, arm, Point::new(1.0, 0.0));
        parent.add_post_drive(Mark { tag: "screw", log: log.clone() });

        let records = CollisionRecords::new();
        let input = InputState::new();
        let mut commands = Vec::new();
        let mut ctx = StepContext::new(&mut world, &records, &input, 0.01, 0, &mut commands);
        parent.step(&mut ctx);
        assert_eq!(*log.borrow(), vec!["body", "arm", "screw"]);

        let mut canvas = RecordingCanvas::new();
        let mut camera = Camera::default();
        let mut dctx = DrawContext {
            canvas: &mut canvas,
            camera: &mut camera,
            world: &world,
            frame_secs: 0.0,
        };
        parent.draw(&mut dctx);
        let texts: Vec<&str> = canvas.texts().collect();
        assert_eq!(texts, vec!["body", "arm", "screw"]);
        // The post-limb drive draws back in the parent's frame
        assert!(matches!(
            &canvas.commands()[2],
            DrawCommand::Text { at, .. } if at.near_to(Point::new(1.0, 1.0))
        ));
        assert!(canvas.balanced());
    }

    #[test]
    fn test_limb_hangs_from_parent() {
        let mut world = PhysicsWorld::default();
        world.set_gravity(DVec3::new(0.0, 9.8, 0.0));
        let outer = world.create_space(None);
        let mut parent = GameObj::untethered(Point::ZERO, 0.0);
        parent.make_limbed(&mut world, outer);
        let arm = boxy(&mut world, Point::new(1.0, 0.0));
        parent.add_limb(&mut world, arm, Point::ZERO);
        for _ in 0..200 {
            world.quick_step(0.01);
            parent.sync(&mut world);
        }
        let arm = &parent.limb_set().unwrap().limbs()[0].obj;
        assert!((arm.pos().mag() - 1.0).abs() < 0.05, "arm at {:?}", arm.pos());
    }
}
