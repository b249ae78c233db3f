//! Geom molds: how an object's collision shape follows from its size

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::collision::CollProps;
use super::physics::{GeomHandle, Mass, PhysicsWorld, Shape, SpaceHandle};
use crate::geometry::Size;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GeomMold {
    /// A circle whose radius is `radius_factor` times the mean of width and height
    Circle { radius_factor: f64 },
    /// A box the size of the object, one meter deep
    Box,
}

impl Default for GeomMold {
    fn default() -> Self {
        GeomMold::Circle { radius_factor: 0.5 }
    }
}

impl GeomMold {
    pub fn shape(&self, size: Size) -> Shape {
        match *self {
            GeomMold::Circle { radius_factor } => Shape::Sphere {
                radius: radius_factor * (size.w + size.h) / 2.0,
            },
            GeomMold::Box => Shape::Box {
                size: DVec3::new(size.w, size.h, 1.0),
            },
        }
    }

    /// Mass of a body filling this mold at `density`
    pub fn mass(&self, size: Size, density: f64) -> Mass {
        match self.shape(size) {
            Shape::Sphere { radius } => Mass::sphere(density, radius),
            Shape::Box { size } => Mass::cuboid(density, size),
        }
    }

    /// Create a geom for an object of `size`, optionally in `space`.
    ///
    /// `props` of `None` leaves the geom out of collision dispatch.
    pub fn make_geom(
        &self,
        world: &mut PhysicsWorld,
        size: Size,
        space: Option<SpaceHandle>,
        props: Option<CollProps>,
    ) -> GeomHandle {
        let handle = world.create_geom(self.shape(size), space);
        if let Some(geom) = world.geom_mut(handle) {
            geom.props = props;
        }
        handle
    }
}
