//! Rigid-body world
//!
//! A small 3D engine used in one plane: bodies, collision geoms grouped into
//! (possibly nested) spaces, and joints. Everything is addressed by
//! generational handles, so a stale handle is detected instead of aliasing a
//! newer object. The simulation keeps itself two-dimensional by cancelling
//! out-of-plane drift after each step.

pub mod body;
pub mod geom;
pub mod joint;
pub mod narrow;

pub use body::{Body, Mass};
pub use geom::{Aabb, Collidable, Geom, Shape, Space};
pub use joint::{ContactParams, Joint, JointGroup};
pub use narrow::{ContactGeom, MAX_CONTACTS};

use glam::{DMat3, DVec3};
use slotmap::{SlotMap, new_key_type};

use crate::settings::SimSettings;
use body::orthonormalize;
use joint::SolverConfig;
use narrow::Placed;

new_key_type! {
    pub struct BodyHandle;
    pub struct GeomHandle;
    pub struct SpaceHandle;
    pub struct JointHandle;
}

/// Owner of every body, geom, space and joint
#[derive(Debug)]
pub struct PhysicsWorld {
    bodies: SlotMap<BodyHandle, Body>,
    geoms: SlotMap<GeomHandle, Geom>,
    spaces: SlotMap<SpaceHandle, Space>,
    joints: SlotMap<JointHandle, Joint>,
    gravity: DVec3,
    iterations: usize,
    erp: f64,
    cfm: f64,
    next_seq: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(&SimSettings::default())
    }
}

impl PhysicsWorld {
    pub fn new(settings: &SimSettings) -> Self {
        Self {
            bodies: SlotMap::with_key(),
            geoms: SlotMap::with_key(),
            spaces: SlotMap::with_key(),
            joints: SlotMap::with_key(),
            gravity: settings.gravity.fake_3d(),
            iterations: settings.solver_iterations,
            erp: settings.erp,
            cfm: settings.cfm,
            next_seq: 0,
        }
    }

    pub fn gravity(&self) -> DVec3 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: DVec3) {
        self.gravity = gravity;
    }

    // --- Bodies ---

    pub fn create_body(&mut self, mass: Mass) -> BodyHandle {
        self.bodies.insert(Body::new(mass))
    }

    /// Body with the mass of a solid sphere
    pub fn sphere_body(&mut self, density: f64, radius: f64) -> BodyHandle {
        self.create_body(Mass::sphere(density, radius))
    }

    /// Body with the mass of a solid box
    pub fn box_body(&mut self, density: f64, size: DVec3) -> BodyHandle {
        self.create_body(Mass::cuboid(density, size))
    }

    /// Destroy a body. Geoms riding on it stay where they are, bodiless, and
    /// persistent joints attached to it are destroyed too.
    pub fn destroy_body(&mut self, handle: BodyHandle) {
        if !self.bodies.contains_key(handle) {
            return;
        }
        let riders: Vec<GeomHandle> = self
            .geoms
            .iter()
            .filter(|(_, g)| g.body == Some(handle))
            .map(|(h, _)| h)
            .collect();
        for g in riders {
            self.set_geom_body(g, None);
        }
        self.joints.retain(|_, j| !j.bodies().contains(&Some(handle)));
        self.bodies.remove(handle);
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter()
    }

    pub fn bodies_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut Body)> {
        self.bodies.iter_mut()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // --- Geoms ---

    /// Create a geom, optionally inserting it into a space
    pub fn create_geom(&mut self, shape: Shape, space: Option<SpaceHandle>) -> GeomHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        let handle = self.geoms.insert(Geom::new(shape, seq));
        if let Some(space) = space {
            self.space_add(space, handle.into());
        }
        handle
    }

    /// Remove a geom from its space and destroy it
    pub fn destroy_geom(&mut self, handle: GeomHandle) {
        self.space_remove(handle.into());
        self.geoms.remove(handle);
    }

    pub fn geom(&self, handle: GeomHandle) -> Option<&Geom> {
        self.geoms.get(handle)
    }

    pub fn geom_mut(&mut self, handle: GeomHandle) -> Option<&mut Geom> {
        self.geoms.get_mut(handle)
    }

    pub fn geom_count(&self) -> usize {
        self.geoms.len()
    }

    /// Attach a geom to a body, or detach it with `None`.
    ///
    /// A detached geom keeps the pose it had while riding the body.
    pub fn set_geom_body(&mut self, handle: GeomHandle, body: Option<BodyHandle>) {
        let pose = self.geom_pose(handle);
        let Some(geom) = self.geoms.get_mut(handle) else {
            return;
        };
        if let Some((pos, rot)) = pose {
            geom.pos = pos;
            geom.rot = rot;
        }
        geom.body = body.filter(|b| self.bodies.contains_key(*b));
    }

    /// World position and rotation, taken from the body when attached
    pub fn geom_pose(&self, handle: GeomHandle) -> Option<(DVec3, DMat3)> {
        let geom = self.geoms.get(handle)?;
        match geom.body.and_then(|b| self.bodies.get(b)) {
            Some(body) => Some((body.pos, body.rot)),
            None => Some((geom.pos, geom.rot)),
        }
    }

    pub fn geom_position(&self, handle: GeomHandle) -> Option<DVec3> {
        self.geom_pose(handle).map(|(p, _)| p)
    }

    pub fn geom_rotation(&self, handle: GeomHandle) -> Option<DMat3> {
        self.geom_pose(handle).map(|(_, r)| r)
    }

    /// Move a geom; an attached geom moves its body with it
    pub fn set_geom_position(&mut self, handle: GeomHandle, pos: DVec3) {
        let Some(geom) = self.geoms.get_mut(handle) else {
            return;
        };
        match geom.body.and_then(|b| self.bodies.get_mut(b)) {
            Some(body) => body.pos = pos,
            None => geom.pos = pos,
        }
    }

    pub fn set_geom_rotation(&mut self, handle: GeomHandle, rot: DMat3) {
        let Some(geom) = self.geoms.get_mut(handle) else {
            return;
        };
        let rot = orthonormalize(rot);
        match geom.body.and_then(|b| self.bodies.get_mut(b)) {
            Some(body) => body.rot = rot,
            None => geom.rot = rot,
        }
    }

    fn geom_aabb(&self, handle: GeomHandle) -> Option<Aabb> {
        let geom = self.geoms.get(handle)?;
        let (pos, rot) = self.geom_pose(handle)?;
        Some(Aabb::of_shape(&geom.shape, pos, &rot))
    }

    // --- Spaces ---

    pub fn create_space(&mut self, parent: Option<SpaceHandle>) -> SpaceHandle {
        let handle = self.spaces.insert(Space::default());
        if let Some(parent) = parent {
            self.space_add(parent, handle.into());
        }
        handle
    }

    /// Destroy a space. Its members are released, not destroyed.
    pub fn destroy_space(&mut self, handle: SpaceHandle) {
        self.space_remove(handle.into());
        let Some(space) = self.spaces.remove(handle) else {
            return;
        };
        for member in space.members {
            match member {
                Collidable::Geom(g) => {
                    if let Some(geom) = self.geoms.get_mut(g) {
                        geom.space = None;
                    }
                }
                Collidable::Space(s) => {
                    if let Some(sub) = self.spaces.get_mut(s) {
                        sub.parent = None;
                    }
                }
            }
        }
    }

    pub fn space(&self, handle: SpaceHandle) -> Option<&Space> {
        self.spaces.get(handle)
    }

    /// Add a collidable to a space, leaving any space it was in before
    pub fn space_add(&mut self, space: SpaceHandle, item: Collidable) {
        if !self.spaces.contains_key(space) || item == Collidable::Space(space) {
            return;
        }
        self.space_remove(item);
        match item {
            Collidable::Geom(g) => match self.geoms.get_mut(g) {
                Some(geom) => geom.space = Some(space),
                None => return,
            },
            Collidable::Space(s) => match self.spaces.get_mut(s) {
                Some(sub) => sub.parent = Some(space),
                None => return,
            },
        }
        if let Some(sp) = self.spaces.get_mut(space) {
            sp.members.push(item);
        }
    }

    /// Take a collidable out of whatever space holds it
    pub fn space_remove(&mut self, item: Collidable) {
        let owner = match item {
            Collidable::Geom(g) => self.geoms.get_mut(g).and_then(|x| x.space.take()),
            Collidable::Space(s) => self.spaces.get_mut(s).and_then(|x| x.parent.take()),
        };
        if let Some(sp) = owner.and_then(|o| self.spaces.get_mut(o)) {
            sp.members.retain(|m| *m != item);
        }
    }

    /// Bounds of a geom, or of everything inside a space
    pub fn bounds(&self, item: Collidable) -> Option<Aabb> {
        match item {
            Collidable::Geom(g) => self.geom_aabb(g),
            Collidable::Space(s) => self
                .spaces
                .get(s)?
                .members
                .iter()
                .filter_map(|m| self.bounds(*m))
                .reduce(|a, b| a.union(&b)),
        }
    }

    fn share_body(&self, a: Collidable, b: Collidable) -> bool {
        match (a, b) {
            (Collidable::Geom(a), Collidable::Geom(b)) => {
                let body = |g| self.geoms.get(g).and_then(|x: &Geom| x.body);
                matches!((body(a), body(b)), (Some(x), Some(y)) if x == y)
            }
            _ => false,
        }
    }

    fn may_touch(&self, a: Collidable, b: Collidable) -> bool {
        if self.share_body(a, b) {
            return false;
        }
        match (self.bounds(a), self.bounds(b)) {
            (Some(x), Some(y)) => x.overlaps(&y),
            _ => false,
        }
    }

    /// Potentially touching pairs among the direct members of one space
    pub fn space_pairs(&self, space: SpaceHandle) -> Vec<(Collidable, Collidable)> {
        let Some(sp) = self.spaces.get(space) else {
            return Vec::new();
        };
        let mut pairs = Vec::new();
        for (i, a) in sp.members.iter().enumerate() {
            for b in &sp.members[i + 1..] {
                if self.may_touch(*a, *b) {
                    pairs.push((*a, *b));
                }
            }
        }
        pairs
    }

    /// Potentially touching pairs between two collidables.
    ///
    /// A space on the left is opened one level and each member tested against
    /// the right side; otherwise a space on the right is opened. Two geoms
    /// give at most the pair itself.
    pub fn cross_pairs(&self, a: Collidable, b: Collidable) -> Vec<(Collidable, Collidable)> {
        if a == b {
            return Vec::new();
        }
        match (a, b) {
            (Collidable::Space(s), _) => self.members(s).filter(|m| self.may_touch(*m, b)).map(|m| (m, b)).collect(),
            (_, Collidable::Space(s)) => self.members(s).filter(|m| self.may_touch(a, *m)).map(|m| (a, m)).collect(),
            _ if self.may_touch(a, b) => vec![(a, b)],
            _ => Vec::new(),
        }
    }

    fn members(&self, space: SpaceHandle) -> impl Iterator<Item = Collidable> + '_ {
        self.spaces
            .get(space)
            .map(|s| s.members.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
    }

    /// Exact contacts between two geoms, at most `MAX_CONTACTS`
    pub fn collide(&self, a: GeomHandle, b: GeomHandle) -> Vec<ContactGeom> {
        let (Some(ga), Some(gb)) = (self.geoms.get(a), self.geoms.get(b)) else {
            return Vec::new();
        };
        let (Some((pa, ra)), Some((pb, rb))) = (self.geom_pose(a), self.geom_pose(b)) else {
            return Vec::new();
        };
        narrow::collide(
            Placed {
                shape: &ga.shape,
                pos: pa,
                rot: ra,
            },
            Placed {
                shape: &gb.shape,
                pos: pb,
                rot: rb,
            },
        )
    }

    // --- Joints ---

    /// Create a one-step contact joint in `group`
    pub fn create_contact(
        &mut self,
        group: &mut JointGroup,
        contact: ContactGeom,
        params: ContactParams,
        bodies: [Option<BodyHandle>; 2],
    ) -> JointHandle {
        let handle = self.joints.insert(Joint::Contact {
            contact,
            params,
            bodies,
        });
        group.joints.push(handle);
        handle
    }

    /// Destroy every joint in a group
    pub fn empty_group(&mut self, group: JointGroup) {
        for j in group.joints {
            self.joints.remove(j);
        }
    }

    /// Hinge about the z axis through a world-space anchor.
    ///
    /// With `b2 == None` the first body is pinned to the static world.
    pub fn create_hinge(&mut self, b1: BodyHandle, b2: Option<BodyHandle>, anchor: DVec3) -> Option<JointHandle> {
        let local = |b: &Body| b.rot.transpose() * (anchor - b.pos);
        let a1 = local(self.bodies.get(b1)?);
        let a2 = match b2 {
            Some(b) => local(self.bodies.get(b)?),
            None => anchor,
        };
        Some(self.joints.insert(Joint::Hinge {
            bodies: [Some(b1), b2],
            anchors: [a1, a2],
        }))
    }

    pub fn destroy_joint(&mut self, handle: JointHandle) {
        self.joints.remove(handle);
    }

    pub fn joint(&self, handle: JointHandle) -> Option<&Joint> {
        self.joints.get(handle)
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    // --- Stepping ---

    /// Advance the world by `dt`: apply forces and gravity, solve joints,
    /// integrate, then clear force accumulators
    pub(crate) fn quick_step(&mut self, dt: f64) {
        for body in self.bodies.values_mut() {
            let im = body.mass.inv_mass();
            if im > 0.0 {
                body.lin_vel += (self.gravity + body.force * im) * dt;
            }
            body.ang_vel += body.inv_inertia_world() * body.torque * dt;
        }
        joint::solve(
            &mut self.bodies,
            &self.joints,
            SolverConfig {
                iterations: self.iterations,
                erp: self.erp,
                cfm: self.cfm,
            },
            dt,
        );
        for body in self.bodies.values_mut() {
            body.integrate(dt);
            body.clear_accumulators();
        }
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.joints.clear();
        self.geoms.clear();
        self.spaces.clear();
        self.bodies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(&SimSettings::default())
    }

    #[test]
    fn test_geom_follows_body() {
        let mut w = world();
        let b = w.create_body(Mass::default());
        let g = w.create_geom(Shape::Sphere { radius: 1.0 }, None);
        w.set_geom_body(g, Some(b));
        w.body_mut(b).unwrap().pos = DVec3::new(3.0, 4.0, 0.0);
        assert_eq!(w.geom_position(g), Some(DVec3::new(3.0, 4.0, 0.0)));

        w.set_geom_position(g, DVec3::new(1.0, 1.0, 0.0));
        assert_eq!(w.body(b).unwrap().pos, DVec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_detach_keeps_pose() {
        let mut w = world();
        let b = w.create_body(Mass::default());
        let g = w.create_geom(Shape::Sphere { radius: 1.0 }, None);
        w.set_geom_body(g, Some(b));
        w.body_mut(b).unwrap().pos = DVec3::new(2.0, 0.0, 0.0);
        w.destroy_body(b);
        assert!(w.geom(g).unwrap().body().is_none());
        assert_eq!(w.geom_position(g), Some(DVec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_space_membership_is_exclusive() {
        let mut w = world();
        let s1 = w.create_space(None);
        let s2 = w.create_space(None);
        let g = w.create_geom(Shape::Sphere { radius: 1.0 }, Some(s1));
        w.space_add(s2, g.into());
        assert!(w.space(s1).unwrap().members().is_empty());
        assert_eq!(w.space(s2).unwrap().members(), &[Collidable::Geom(g)]);
        assert_eq!(w.geom(g).unwrap().space(), Some(s2));

        w.destroy_geom(g);
        assert!(w.space(s2).unwrap().members().is_empty());
    }

    #[test]
    fn test_broad_phase_culls_and_skips_shared_body() {
        let mut w = world();
        let s = w.create_space(None);
        let a = w.create_geom(Shape::Sphere { radius: 1.0 }, Some(s));
        let b = w.create_geom(Shape::Sphere { radius: 1.0 }, Some(s));
        let far = w.create_geom(Shape::Sphere { radius: 1.0 }, Some(s));
        w.set_geom_position(b, DVec3::new(1.5, 0.0, 0.0));
        w.set_geom_position(far, DVec3::new(10.0, 0.0, 0.0));
        assert_eq!(w.space_pairs(s), vec![(Collidable::Geom(a), Collidable::Geom(b))]);

        let body = w.create_body(Mass::default());
        w.set_geom_body(a, Some(body));
        w.set_geom_body(b, Some(body));
        assert!(w.space_pairs(s).is_empty());
    }

    #[test]
    fn test_cross_pairs_open_nested_spaces() {
        let mut w = world();
        let outer = w.create_space(None);
        let inner = w.create_space(Some(outer));
        let g_in = w.create_geom(Shape::Sphere { radius: 1.0 }, Some(inner));
        let other = w.create_space(None);
        let g_other = w.create_geom(Shape::Sphere { radius: 1.0 }, Some(other));

        let top = w.cross_pairs(outer.into(), other.into());
        assert_eq!(top, vec![(Collidable::Space(inner), Collidable::Space(other))]);
        let next = w.cross_pairs(inner.into(), other.into());
        assert_eq!(next, vec![(Collidable::Geom(g_in), Collidable::Space(other))]);
        let last = w.cross_pairs(g_in.into(), other.into());
        assert_eq!(last, vec![(Collidable::Geom(g_in), Collidable::Geom(g_other))]);
    }

    #[test]
    fn test_gravity_and_force_integration() {
        let mut w = world();
        w.set_gravity(DVec3::new(0.0, 10.0, 0.0));
        let b = w.create_body(Mass::sphere_total(2.0, 1.0));
        w.body_mut(b).unwrap().add_force(DVec3::new(4.0, 0.0, 0.0));
        w.quick_step(0.5);
        let body = w.body(b).unwrap();
        assert!((body.lin_vel.x - 1.0).abs() < 1e-12);
        assert!((body.lin_vel.y - 5.0).abs() < 1e-12);
        assert!((body.pos.y - 2.5).abs() < 1e-12);
        assert_eq!(body.force(), DVec3::ZERO);
    }

    #[test]
    fn test_contact_against_static_world_stops_fall() {
        let mut w = world();
        let b = w.create_body(Mass::sphere(1.0, 0.5));
        w.body_mut(b).unwrap().lin_vel = DVec3::new(0.0, 0.1, 0.0);
        let mut group = JointGroup::new();
        let contact = ContactGeom {
            pos: DVec3::new(0.0, 0.5, 0.0),
            normal: DVec3::new(0.0, -1.0, 0.0),
            depth: 0.0,
        };
        w.create_contact(&mut group, contact, ContactParams::default(), [Some(b), None]);
        w.quick_step(0.01);
        assert!(w.body(b).unwrap().lin_vel.y.abs() < 1e-3);
        w.empty_group(group);
        assert_eq!(w.joint_count(), 0);
    }

    #[test]
    fn test_hinge_holds_anchor() {
        let mut w = world();
        w.set_gravity(DVec3::new(0.0, 9.8, 0.0));
        let b = w.create_body(Mass::sphere(1.0, 0.25));
        w.body_mut(b).unwrap().pos = DVec3::new(1.0, 0.0, 0.0);
        w.create_hinge(b, None, DVec3::ZERO).unwrap();
        for _ in 0..200 {
            w.quick_step(0.01);
        }
        // Swinging pendulum keeps its length
        let len = w.body(b).unwrap().pos.truncate().length();
        assert!((len - 1.0).abs() < 0.05, "pendulum length drifted to {len}");
    }
}
