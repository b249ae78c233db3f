//! Narrow phase: exact contact points between two placed shapes
//!
//! Everything is computed in the xy plane. Contact normals point from the
//! second shape toward the first, so pushing the first shape along the normal
//! separates the pair.

use glam::{DMat3, DVec2, DVec3};

use super::geom::Shape;

/// Upper bound on contacts reported for one pair
pub const MAX_CONTACTS: usize = 4;

/// One contact point between two geoms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactGeom {
    pub pos: DVec3,
    /// Unit normal pointing from the second geom toward the first
    pub normal: DVec3,
    pub depth: f64,
}

/// A shape at a world pose
#[derive(Debug, Clone, Copy)]
pub struct Placed<'a> {
    pub shape: &'a Shape,
    pub pos: DVec3,
    pub rot: DMat3,
}

/// Oriented rectangle in the plane
#[derive(Debug, Clone, Copy)]
struct Obb {
    cen: DVec2,
    axes: [DVec2; 2],
    half: [f64; 2],
}

impl Obb {
    fn new(pos: DVec3, rot: &DMat3, size: DVec3) -> Self {
        Self {
            cen: pos.truncate(),
            axes: [
                rot.x_axis.truncate().normalize_or(DVec2::X),
                rot.y_axis.truncate().normalize_or(DVec2::Y),
            ],
            half: [size.x * 0.5, size.y * 0.5],
        }
    }

    fn corners(&self) -> [DVec2; 4] {
        let u = self.axes[0] * self.half[0];
        let v = self.axes[1] * self.half[1];
        [
            self.cen + u + v,
            self.cen - u + v,
            self.cen - u - v,
            self.cen + u - v,
        ]
    }

    /// The four outward face normals with their face offsets from the center
    fn faces(&self) -> [(DVec2, f64); 4] {
        [
            (self.axes[0], self.half[0]),
            (-self.axes[0], self.half[0]),
            (self.axes[1], self.half[1]),
            (-self.axes[1], self.half[1]),
        ]
    }

    /// Largest separation of `other` from any face of this box, with that face
    fn max_separation(&self, other: &Obb) -> (f64, DVec2, f64) {
        let corners = other.corners();
        let mut best = (f64::NEG_INFINITY, DVec2::X, 0.0);
        for (n, off) in self.faces() {
            let sep = corners
                .iter()
                .map(|c| n.dot(*c - self.cen) - off)
                .fold(f64::INFINITY, f64::min);
            if sep > best.0 {
                best = (sep, n, off);
            }
        }
        best
    }
}

/// Contact points between two placed shapes, empty if they do not touch
pub fn collide(a: Placed<'_>, b: Placed<'_>) -> Vec<ContactGeom> {
    match (*a.shape, *b.shape) {
        (Shape::Sphere { radius: ra }, Shape::Sphere { radius: rb }) => {
            sphere_sphere(a.pos, ra, b.pos, rb).into_iter().collect()
        }
        (Shape::Sphere { radius }, Shape::Box { size }) => {
            sphere_box(a.pos, radius, &Obb::new(b.pos, &b.rot, size))
                .into_iter()
                .collect()
        }
        (Shape::Box { size }, Shape::Sphere { radius }) => {
            sphere_box(b.pos, radius, &Obb::new(a.pos, &a.rot, size))
                .into_iter()
                .map(flip)
                .collect()
        }
        (Shape::Box { size: sa }, Shape::Box { size: sb }) => {
            box_box(&Obb::new(a.pos, &a.rot, sa), &Obb::new(b.pos, &b.rot, sb))
        }
    }
}

fn flip(c: ContactGeom) -> ContactGeom {
    ContactGeom {
        normal: -c.normal,
        ..c
    }
}

fn contact(pos: DVec2, normal: DVec2, depth: f64) -> ContactGeom {
    ContactGeom {
        pos: pos.extend(0.0),
        normal: normal.extend(0.0),
        depth,
    }
}

fn sphere_sphere(pa: DVec3, ra: f64, pb: DVec3, rb: f64) -> Option<ContactGeom> {
    let d = pa.truncate() - pb.truncate();
    let dist = d.length();
    if dist > ra + rb {
        return None;
    }
    // Concentric spheres get an arbitrary but fixed normal
    let n = if dist > 0.0 { d / dist } else { DVec2::X };
    let depth = ra + rb - dist;
    Some(contact(pb.truncate() + n * (rb - depth * 0.5), n, depth))
}

/// Normal points from the box toward the sphere
fn sphere_box(ps: DVec3, r: f64, obb: &Obb) -> Option<ContactGeom> {
    let rel = ps.truncate() - obb.cen;
    let local = DVec2::new(rel.dot(obb.axes[0]), rel.dot(obb.axes[1]));
    let clamped = DVec2::new(
        local.x.clamp(-obb.half[0], obb.half[0]),
        local.y.clamp(-obb.half[1], obb.half[1]),
    );
    let to_world = |v: DVec2| obb.axes[0] * v.x + obb.axes[1] * v.y;

    if clamped != local {
        let diff = local - clamped;
        let dist = diff.length();
        if dist > r {
            return None;
        }
        let n = to_world(diff / dist);
        return Some(contact(obb.cen + to_world(clamped), n, r - dist));
    }

    // Center is inside the box: push out through the nearest face
    let dx = obb.half[0] - local.x.abs();
    let dy = obb.half[1] - local.y.abs();
    let (n_local, face_pt, depth) = if dx < dy {
        let s = local.x.signum();
        (DVec2::new(s, 0.0), DVec2::new(s * obb.half[0], local.y), dx + r)
    } else {
        let s = local.y.signum();
        (DVec2::new(0.0, s), DVec2::new(local.x, s * obb.half[1]), dy + r)
    };
    Some(contact(obb.cen + to_world(face_pt), to_world(n_local), depth))
}

/// Keep the part of a segment on the inner side of a plane `n . x <= offset`
fn clip_segment(seg: [DVec2; 2], n: DVec2, offset: f64) -> Option<[DVec2; 2]> {
    let d0 = n.dot(seg[0]) - offset;
    let d1 = n.dot(seg[1]) - offset;
    let mut out = Vec::with_capacity(2);
    if d0 <= 0.0 {
        out.push(seg[0]);
    }
    if d1 <= 0.0 {
        out.push(seg[1]);
    }
    if d0 * d1 < 0.0 {
        let t = d0 / (d0 - d1);
        out.push(seg[0] + (seg[1] - seg[0]) * t);
    }
    match out.as_slice() {
        [p, q, ..] => Some([*p, *q]),
        _ => None,
    }
}

/// Separating-axis test, then clip the incident face against the reference face
fn box_box(a: &Obb, b: &Obb) -> Vec<ContactGeom> {
    let (sep_a, n_a, off_a) = a.max_separation(b);
    if sep_a > 0.0 {
        return Vec::new();
    }
    let (sep_b, n_b, off_b) = b.max_separation(a);
    if sep_b > 0.0 {
        return Vec::new();
    }

    // Prefer `a` as reference unless `b` is clearly better, so the choice does
    // not flicker between frames for near-equal separations
    let a_is_ref = sep_b <= 0.98 * sep_a + 0.001;
    let (reference, incident, n, off) = if a_is_ref {
        (a, b, n_a, off_a)
    } else {
        (b, a, n_b, off_b)
    };

    // Incident face: the one most anti-parallel to the reference normal
    let inc_corners = incident.corners();
    let mut best = (f64::INFINITY, [inc_corners[0], inc_corners[1]]);
    for i in 0..4 {
        let p = inc_corners[i];
        let q = inc_corners[(i + 1) % 4];
        let edge = q - p;
        let face_n = DVec2::new(edge.y, -edge.x).normalize_or_zero();
        // Orient the edge normal away from the box center
        let out_n = if face_n.dot((p + q) * 0.5 - incident.cen) < 0.0 { -face_n } else { face_n };
        let d = out_n.dot(n);
        if d < best.0 {
            best = (d, [p, q]);
        }
    }

    let tangent = DVec2::new(-n.y, n.x);
    let half_t = if n.dot(reference.axes[0]).abs() > 0.5 {
        reference.half[1]
    } else {
        reference.half[0]
    };
    let t_off = tangent.dot(reference.cen);
    let Some(seg) = clip_segment(best.1, tangent, t_off + half_t) else {
        return Vec::new();
    };
    let Some(seg) = clip_segment(seg, -tangent, -t_off + half_t) else {
        return Vec::new();
    };

    let normal = if a_is_ref { -n } else { n };
    let face_off = n.dot(reference.cen) + off;
    seg.iter()
        .filter_map(|p| {
            let sep = n.dot(*p) - face_off;
            (sep <= 0.0).then(|| contact(*p - n * (sep * 0.5), normal, -sep))
        })
        .take(MAX_CONTACTS)
        .collect()
}
