//! Joints and the velocity solver
//!
//! Contact joints live for one step inside a `JointGroup`; hinges persist
//! until destroyed. Every joint becomes one or more scalar constraint rows
//! solved with projected Gauss-Seidel over accumulated impulses.

use glam::{DMat3, DVec3};
use slotmap::{SecondaryMap, SlotMap};

use super::narrow::ContactGeom;
use super::{Body, BodyHandle, JointHandle};
use crate::consts::{CONTACT_BOUNCE, CONTACT_MU, CONTACT_SLOP};
use crate::settings::SimSettings;

/// Surface parameters shared by every contact joint in a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactParams {
    /// Restitution, 0 (dead) to 1 (fully elastic)
    pub bounce: f64,
    /// Minimum approach speed before a contact bounces
    pub bounce_vel: f64,
    /// Friction limit as a force
    pub mu: f64,
}

impl Default for ContactParams {
    fn default() -> Self {
        Self {
            bounce: CONTACT_BOUNCE,
            bounce_vel: crate::consts::BOUNCE_VELOCITY,
            mu: CONTACT_MU,
        }
    }
}

impl ContactParams {
    pub fn from_settings(settings: &SimSettings) -> Self {
        Self {
            bounce: settings.contact_bounce,
            bounce_vel: settings.bounce_velocity,
            mu: settings.contact_mu,
        }
    }
}

/// A constraint between up to two bodies; a missing body is the static world
#[derive(Debug, Clone)]
pub enum Joint {
    /// Non-penetration plus friction at one contact point. Body 0 sits on the
    /// side the contact normal points toward.
    Contact {
        contact: ContactGeom,
        params: ContactParams,
        bodies: [Option<BodyHandle>; 2],
    },
    /// Pins two points together, leaving rotation about z free. Each anchor is
    /// body-local for an attached body and a world point otherwise.
    Hinge {
        bodies: [Option<BodyHandle>; 2],
        anchors: [DVec3; 2],
    },
}

impl Joint {
    pub fn bodies(&self) -> [Option<BodyHandle>; 2] {
        match self {
            Joint::Contact { bodies, .. } | Joint::Hinge { bodies, .. } => *bodies,
        }
    }

    pub fn is_contact(&self) -> bool {
        matches!(self, Joint::Contact { .. })
    }
}

/// Joints created together and destroyed together
#[derive(Debug, Default)]
pub struct JointGroup {
    pub(crate) joints: Vec<JointHandle>,
}

impl JointGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn handles(&self) -> &[JointHandle] {
        &self.joints
    }
}

/// Solver parameters
#[derive(Debug, Clone, Copy)]
pub(crate) struct SolverConfig {
    pub iterations: usize,
    pub erp: f64,
    pub cfm: f64,
}

/// Velocity state copied out of a body for the duration of a solve
#[derive(Debug, Clone, Copy)]
struct SolverBody {
    pos: DVec3,
    rot: DMat3,
    v: DVec3,
    w: DVec3,
    im: f64,
    ii: DMat3,
}

#[derive(Debug, Clone, Copy)]
struct Row {
    bodies: [Option<usize>; 2],
    r: [DVec3; 2],
    dir: DVec3,
    /// Inverse of the effective mass plus softness
    denom: f64,
    target: f64,
    lo: f64,
    hi: f64,
    acc: f64,
}

/// Angular-plus-linear inverse mass seen along `dir` at offset `r`
fn eff_inv_mass(sb: &SolverBody, r: DVec3, dir: DVec3) -> f64 {
    let rn = r.cross(dir);
    sb.im + rn.dot(sb.ii * rn)
}

fn point_vel(sb: Option<&SolverBody>, r: DVec3) -> DVec3 {
    sb.map_or(DVec3::ZERO, |b| b.v + b.w.cross(r))
}

struct Solver {
    bodies: Vec<SolverBody>,
    rows: Vec<Row>,
    softness: f64,
}

impl Solver {
    fn body(&self, i: Option<usize>) -> Option<&SolverBody> {
        i.and_then(|i| self.bodies.get(i))
    }

    /// Offset from a body's center to a world point, or the point itself for the static world
    fn offset(&self, i: Option<usize>, p: DVec3) -> DVec3 {
        self.body(i).map_or(p, |b| p - b.pos)
    }

    fn rel_vel(&self, row: &Row) -> f64 {
        let v0 = point_vel(self.body(row.bodies[0]), row.r[0]);
        let v1 = point_vel(self.body(row.bodies[1]), row.r[1]);
        row.dir.dot(v0 - v1)
    }

    fn push_row(&mut self, bodies: [Option<usize>; 2], r: [DVec3; 2], dir: DVec3, target: f64) -> usize {
        let k: f64 = (0..2)
            .filter_map(|s| self.body(bodies[s]).map(|b| eff_inv_mass(b, r[s], dir)))
            .sum();
        self.rows.push(Row {
            bodies,
            r,
            dir,
            denom: k + self.softness,
            target,
            lo: f64::NEG_INFINITY,
            hi: f64::INFINITY,
            acc: 0.0,
        });
        self.rows.len() - 1
    }

    fn apply(&mut self, row: &Row, impulse: f64) {
        let p = row.dir * impulse;
        for (side, sign) in [(0, 1.0), (1, -1.0)] {
            if let Some(b) = row.bodies[side].and_then(|i| self.bodies.get_mut(i)) {
                b.v += p * (sign * b.im);
                b.w += b.ii * row.r[side].cross(p * sign);
            }
        }
    }

    fn iterate(&mut self) {
        for i in 0..self.rows.len() {
            let mut row = self.rows[i];
            if row.denom <= 0.0 {
                continue;
            }
            let jv = self.rel_vel(&row);
            let delta = -(jv - row.target + self.softness * row.acc) / row.denom;
            let new_acc = (row.acc + delta).clamp(row.lo, row.hi);
            let applied = new_acc - row.acc;
            row.acc = new_acc;
            self.rows[i] = row;
            self.apply(&row, applied);
        }
    }
}

/// Solve all joints for one step and write the corrected velocities back
pub(crate) fn solve(
    bodies: &mut SlotMap<BodyHandle, Body>,
    joints: &SlotMap<JointHandle, Joint>,
    cfg: SolverConfig,
    dt: f64,
) {
    if joints.is_empty() || dt <= 0.0 {
        return;
    }
    let mut index: SecondaryMap<BodyHandle, usize> = SecondaryMap::new();
    let mut solver = Solver {
        bodies: Vec::with_capacity(bodies.len()),
        rows: Vec::new(),
        softness: cfg.cfm / dt,
    };
    for (h, b) in bodies.iter() {
        index.insert(h, solver.bodies.len());
        solver.bodies.push(SolverBody {
            pos: b.pos,
            rot: b.rot,
            v: b.lin_vel,
            w: b.ang_vel,
            im: b.mass.inv_mass(),
            ii: b.inv_inertia_world(),
        });
    }
    let slot = |h: Option<BodyHandle>| h.and_then(|h| index.get(h).copied());

    for joint in joints.values() {
        match joint {
            Joint::Contact {
                contact,
                params,
                bodies: jb,
            } => {
                let b = [slot(jb[0]), slot(jb[1])];
                if b[0].is_none() && b[1].is_none() {
                    continue;
                }
                let r = [solver.offset(b[0], contact.pos), solver.offset(b[1], contact.pos)];
                let n = contact.normal;

                let normal = solver.push_row(b, r, n, 0.0);
                let approach = solver.rel_vel(&solver.rows[normal]);
                let mut target = cfg.erp * (contact.depth - CONTACT_SLOP).max(0.0) / dt;
                if -approach > params.bounce_vel {
                    target = target.max(-params.bounce * approach);
                }
                let row = &mut solver.rows[normal];
                row.target = target;
                row.lo = 0.0;

                // Friction is limited as a force, so the impulse bound scales with dt
                let tangent = DVec3::new(-n.y, n.x, 0.0);
                let limit = params.mu * dt;
                let fr = solver.push_row(b, r, tangent, 0.0);
                let row = &mut solver.rows[fr];
                row.lo = -limit;
                row.hi = limit;
            }
            Joint::Hinge {
                bodies: jb,
                anchors,
            } => {
                let b = [slot(jb[0]), slot(jb[1])];
                if b[0].is_none() && b[1].is_none() {
                    continue;
                }
                let world = |s: usize| match solver.body(b[s]) {
                    Some(sb) => sb.rot * anchors[s],
                    None => anchors[s],
                };
                let r = [world(0), world(1)];
                let p0 = solver.body(b[0]).map_or(r[0], |sb| sb.pos + r[0]);
                let p1 = solver.body(b[1]).map_or(r[1], |sb| sb.pos + r[1]);
                let err = p0 - p1;
                for dir in [DVec3::X, DVec3::Y] {
                    solver.push_row(b, r, dir, -cfg.erp * err.dot(dir) / dt);
                }
            }
        }
    }

    for _ in 0..cfg.iterations {
        solver.iterate();
    }

    for (h, b) in bodies.iter_mut() {
        if let Some(sb) = index.get(h).and_then(|&i| solver.bodies.get(i)) {
            b.lin_vel = sb.v;
            b.ang_vel = sb.w;
        }
    }
}
