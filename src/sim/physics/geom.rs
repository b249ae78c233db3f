//! Collision geometry and spaces

use glam::{DMat3, DVec2, DVec3};

use super::{BodyHandle, GeomHandle, SpaceHandle};
use crate::sim::collision::CollProps;

/// Collision shape in body-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { radius: f64 },
    /// Full side lengths; the z side is nominal since everything lives in one plane
    Box { size: DVec3 },
}

/// A collision geometry. When attached to a body its pose follows the body.
#[derive(Debug, Clone)]
pub struct Geom {
    pub shape: Shape,
    /// Present iff the geom takes part in collision dispatch
    pub props: Option<CollProps>,
    pub(crate) body: Option<BodyHandle>,
    pub(crate) space: Option<SpaceHandle>,
    pub(crate) pos: DVec3,
    pub(crate) rot: DMat3,
    pub(crate) seq: u64,
}

impl Geom {
    pub(crate) fn new(shape: Shape, seq: u64) -> Self {
        Self {
            shape,
            props: None,
            body: None,
            space: None,
            pos: DVec3::ZERO,
            rot: DMat3::IDENTITY,
            seq,
        }
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub fn space(&self) -> Option<SpaceHandle> {
        self.space
    }

    /// Creation order; stable for the life of the geom
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Something a space can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collidable {
    Geom(GeomHandle),
    Space(SpaceHandle),
}

impl From<GeomHandle> for Collidable {
    fn from(g: GeomHandle) -> Self {
        Collidable::Geom(g)
    }
}

impl From<SpaceHandle> for Collidable {
    fn from(s: SpaceHandle) -> Self {
        Collidable::Space(s)
    }
}

/// An ordered group of collidables. Membership is not ownership.
#[derive(Debug, Clone, Default)]
pub struct Space {
    pub(crate) members: Vec<Collidable>,
    pub(crate) parent: Option<SpaceHandle>,
}

impl Space {
    pub fn members(&self) -> &[Collidable] {
        &self.members
    }

    pub fn parent(&self) -> Option<SpaceHandle> {
        self.parent
    }
}

/// Axis-aligned bounds in the plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec2,
    pub max: DVec2,
}

impl Aabb {
    pub fn of_shape(shape: &Shape, pos: DVec3, rot: &DMat3) -> Self {
        let cen = pos.truncate();
        let half = match *shape {
            Shape::Sphere { radius } => DVec2::splat(radius),
            Shape::Box { size } => {
                let h = size.truncate() * 0.5;
                let x = rot.x_axis.truncate().abs() * h.x;
                let y = rot.y_axis.truncate().abs() * h.y;
                x + y
            }
        };
        Self {
            min: cen - half,
            max: cen + half,
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotated_box_bounds() {
        let shape = Shape::Box {
            size: DVec3::new(2.0, 2.0, 1.0),
        };
        let rot = DMat3::from_rotation_z(std::f64::consts::FRAC_PI_4);
        let aabb = Aabb::of_shape(&shape, DVec3::ZERO, &rot);
        let r = 2.0_f64.sqrt();
        assert!((aabb.max.x - r).abs() < 1e-9);
        assert!((aabb.min.y + r).abs() < 1e-9);
    }

    #[test]
    fn test_overlap_and_union() {
        let a = Aabb::of_shape(&Shape::Sphere { radius: 1.0 }, DVec3::ZERO, &DMat3::IDENTITY);
        let b = Aabb::of_shape(
            &Shape::Sphere { radius: 1.0 },
            DVec3::new(1.5, 0.0, 0.0),
            &DMat3::IDENTITY,
        );
        let c = Aabb::of_shape(
            &Shape::Sphere { radius: 0.1 },
            DVec3::new(5.0, 0.0, 0.0),
            &DMat3::IDENTITY,
        );
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(a.union(&c).overlaps(&b));
    }
}
