//! Collision dispatch and contact resolution
//!
//! Walks space hierarchies pair by pair. A pair of geoms that both carry
//! `CollProps` is resolved: contacts are recorded for both sides and, if both
//! sides push, contact joints are created according to their priorities.
//! A space (or a geom with props) facing another space is opened and walked
//! recursively, so nested groups such as a limbed object's own space need no
//! special casing.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::physics::{
    BodyHandle, Collidable, ContactGeom, ContactParams, GeomHandle, JointGroup, PhysicsWorld, SpaceHandle,
};
use crate::geometry::Point;

/// Per-geom collision behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollProps {
    /// Create contact joints at intersections. Both sides must agree.
    pub intersec_push: bool,
    /// Higher priority pushes lower priority without being pushed back
    pub intersec_pri: i32,
}

impl Default for CollProps {
    fn default() -> Self {
        Self {
            intersec_push: true,
            intersec_pri: 1,
        }
    }
}

impl CollProps {
    /// Records contacts but never pushes
    pub fn ghost() -> Self {
        Self {
            intersec_push: false,
            ..Self::default()
        }
    }

    pub fn with_priority(intersec_pri: i32) -> Self {
        Self {
            intersec_pri,
            ..Self::default()
        }
    }
}

/// Which bodies a pushing contact acts on, seen from "this" geom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushRule {
    /// Equal priority: both bodies
    Mutual,
    /// This side outranks the other: only the other body moves
    PushOther,
    /// The other side outranks this: only this body moves
    PushThis,
}

/// The push rule for a pair, or `None` if either side does not push
pub fn push_rule(this: &CollProps, other: &CollProps) -> Option<PushRule> {
    if !(this.intersec_push && other.intersec_push) {
        return None;
    }
    Some(match this.intersec_pri.cmp(&other.intersec_pri) {
        std::cmp::Ordering::Equal => PushRule::Mutual,
        std::cmp::Ordering::Greater => PushRule::PushOther,
        std::cmp::Ordering::Less => PushRule::PushThis,
    })
}

impl PushRule {
    /// Joint attachment as `[this side, other side]`
    pub fn attach(self, this: Option<BodyHandle>, other: Option<BodyHandle>) -> [Option<BodyHandle>; 2] {
        match self {
            PushRule::Mutual => [this, other],
            PushRule::PushOther => [None, other],
            PushRule::PushThis => [this, None],
        }
    }
}

/// One geom's view of a collision with another geom during this step
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEntry {
    pub other: GeomHandle,
    pub contacts: Vec<Point>,
    /// Centroid of `contacts`
    pub average: Point,
}

/// This step's collisions, keyed by geom. Cleared before every step.
#[derive(Debug, Default)]
pub struct CollisionRecords {
    entries: HashMap<GeomHandle, Vec<CollisionEntry>>,
}

impl CollisionRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Record a collision on both geoms, each pointing at the other
    pub fn record(&mut self, a: GeomHandle, b: GeomHandle, contacts: &[ContactGeom]) {
        if contacts.is_empty() {
            return;
        }
        let points: Vec<Point> = contacts.iter().map(|c| Point::from_3d(c.pos)).collect();
        let sum = points.iter().fold(Point::ZERO, |acc, p| acc + *p);
        let average = sum / points.len() as f64;
        for (this, other) in [(a, b), (b, a)] {
            self.entries.entry(this).or_default().push(CollisionEntry {
                other,
                contacts: points.clone(),
                average,
            });
        }
    }

    /// Everything `geom` touched this step
    pub fn for_geom(&self, geom: GeomHandle) -> &[CollisionEntry] {
        self.entries.get(&geom).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn touched(&self, a: GeomHandle, b: GeomHandle) -> bool {
        self.for_geom(a).iter().any(|e| e.other == b)
    }

    /// Number of geoms with at least one collision
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GeomHandle, &[CollisionEntry])> {
        self.entries.iter().map(|(g, e)| (*g, e.as_slice()))
    }
}

/// Counters from one dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub pairs: usize,
    pub contacts: usize,
    pub joints: usize,
}

/// One step's collision walk
pub struct Dispatcher<'a> {
    world: &'a mut PhysicsWorld,
    group: &'a mut JointGroup,
    records: &'a mut CollisionRecords,
    params: ContactParams,
    resolved: HashSet<(GeomHandle, GeomHandle)>,
    stats: DispatchStats,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        world: &'a mut PhysicsWorld,
        group: &'a mut JointGroup,
        records: &'a mut CollisionRecords,
        params: ContactParams,
    ) -> Self {
        Self {
            world,
            group,
            records,
            params,
            resolved: HashSet::new(),
            stats: DispatchStats::default(),
        }
    }

    /// Collide the members of one space with each other
    pub fn within(&mut self, space: SpaceHandle) {
        for (a, b) in self.world.space_pairs(space) {
            self.dispatch(a, b);
        }
    }

    /// Collide two collidables (geoms or spaces) with each other
    pub fn between(&mut self, a: Collidable, b: Collidable) {
        for (x, y) in self.world.cross_pairs(a, b) {
            self.dispatch(x, y);
        }
    }

    pub fn finish(self) -> DispatchStats {
        self.stats
    }

    fn props(&self, c: Collidable) -> Option<CollProps> {
        match c {
            Collidable::Geom(g) => self.world.geom(g).and_then(|g| g.props),
            Collidable::Space(_) => None,
        }
    }

    fn dispatch(&mut self, a: Collidable, b: Collidable) {
        let (pa, pb) = (self.props(a), self.props(b));
        match (a, b) {
            (Collidable::Geom(ga), Collidable::Geom(gb)) if pa.is_some() && pb.is_some() => {
                self.resolve(ga, gb);
            }
            _ => {
                let open = |c: Collidable, p: Option<CollProps>| matches!(c, Collidable::Space(_)) || p.is_some();
                if open(a, pa) && open(b, pb) {
                    self.between(a, b);
                }
            }
        }
    }

    /// Resolve one geom pair, at most once per step in a fixed orientation
    fn resolve(&mut self, g1: GeomHandle, g2: GeomHandle) {
        let seq = |g| self.world.geom(g).map_or(u64::MAX, |x| x.seq());
        // The older geom is always "this", whichever order the walk found them in
        let (this, other) = if seq(g1) <= seq(g2) { (g1, g2) } else { (g2, g1) };
        if !self.resolved.insert((this, other)) {
            return;
        }
        let (Some(g_this), Some(g_other)) = (self.world.geom(this), self.world.geom(other)) else {
            return;
        };
        let (Some(p_this), Some(p_other)) = (g_this.props, g_other.props) else {
            return;
        };
        let bodies = (g_this.body(), g_other.body());

        self.stats.pairs += 1;
        let contacts = self.world.collide(this, other);
        if contacts.is_empty() {
            return;
        }
        self.stats.contacts += contacts.len();
        self.records.record(this, other, &contacts);

        let Some(rule) = push_rule(&p_this, &p_other) else {
            return;
        };
        let attach = rule.attach(bodies.0, bodies.1);
        if attach == [None, None] {
            return;
        }
        for contact in contacts {
            self.world.create_contact(self.group, contact, self.params, attach);
            self.stats.joints += 1;
        }
    }
}
