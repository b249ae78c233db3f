//! Rigid bodies and mass properties

use glam::{DMat3, DVec3};

/// Mass and body-frame principal moments of inertia
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mass {
    pub mass: f64,
    pub inertia: DVec3,
}

impl Default for Mass {
    /// A unit-mass unit sphere, which is what a freshly created body starts with
    fn default() -> Self {
        Self::sphere_total(1.0, 1.0)
    }
}

impl Mass {
    /// Solid sphere of the given density
    pub fn sphere(density: f64, radius: f64) -> Self {
        let mass = density * 4.0 / 3.0 * std::f64::consts::PI * radius.powi(3);
        Self::sphere_total(mass, radius)
    }

    /// Solid sphere with a known total mass
    pub fn sphere_total(mass: f64, radius: f64) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self {
            mass,
            inertia: DVec3::splat(i),
        }
    }

    /// Solid box of the given density and side lengths
    pub fn cuboid(density: f64, size: DVec3) -> Self {
        let mass = density * size.x * size.y * size.z;
        let sq = size * size;
        Self {
            mass,
            inertia: DVec3::new(sq.y + sq.z, sq.x + sq.z, sq.x + sq.y) * (mass / 12.0),
        }
    }

    pub fn inv_mass(&self) -> f64 {
        if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 }
    }

    fn inv_inertia(&self) -> DVec3 {
        let inv = |i: f64| if i > 0.0 { 1.0 / i } else { 0.0 };
        DVec3::new(inv(self.inertia.x), inv(self.inertia.y), inv(self.inertia.z))
    }
}

/// A dynamic rigid body. Static scenery has no body at all.
#[derive(Debug, Clone)]
pub struct Body {
    pub pos: DVec3,
    pub rot: DMat3,
    pub lin_vel: DVec3,
    pub ang_vel: DVec3,
    pub mass: Mass,
    pub(crate) force: DVec3,
    pub(crate) torque: DVec3,
}

impl Body {
    pub fn new(mass: Mass) -> Self {
        Self {
            pos: DVec3::ZERO,
            rot: DMat3::IDENTITY,
            lin_vel: DVec3::ZERO,
            ang_vel: DVec3::ZERO,
            mass,
            force: DVec3::ZERO,
            torque: DVec3::ZERO,
        }
    }

    /// Accumulate a force through the center of mass, applied at the next step
    pub fn add_force(&mut self, f: DVec3) {
        self.force += f;
    }

    /// Accumulate a force applied at a world-space point
    pub fn add_force_at_pos(&mut self, f: DVec3, p: DVec3) {
        self.force += f;
        self.torque += (p - self.pos).cross(f);
    }

    pub fn add_torque(&mut self, t: DVec3) {
        self.torque += t;
    }

    pub fn force(&self) -> DVec3 {
        self.force
    }

    /// World-space velocity of a world-space point on the body
    pub fn point_vel(&self, p: DVec3) -> DVec3 {
        self.lin_vel + self.ang_vel.cross(p - self.pos)
    }

    /// Inverse inertia tensor in world coordinates
    pub fn inv_inertia_world(&self) -> DMat3 {
        self.rot * DMat3::from_diagonal(self.mass.inv_inertia()) * self.rot.transpose()
    }

    pub(crate) fn clear_accumulators(&mut self) {
        self.force = DVec3::ZERO;
        self.torque = DVec3::ZERO;
    }

    /// Advance position and orientation by one step at the current velocities
    pub(crate) fn integrate(&mut self, dt: f64) {
        self.pos += self.lin_vel * dt;
        let w = self.ang_vel.length();
        if w > 0.0 {
            let turn = DMat3::from_axis_angle(self.ang_vel / w, w * dt);
            self.rot = orthonormalize(turn * self.rot);
        }
    }
}

/// Gram-Schmidt on the columns, so rounding never skews the rotation
pub(crate) fn orthonormalize(m: DMat3) -> DMat3 {
    let x = m.x_axis.normalize_or(DVec3::X);
    let y = (m.y_axis - x * x.dot(m.y_axis)).normalize_or(DVec3::Y);
    let z = x.cross(y);
    DMat3::from_cols(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_mass() {
        let m = Mass::sphere(1.0, 0.5);
        assert!((m.mass - 0.5235987755982988).abs() < 1e-12);
        assert!((m.inertia.z - 0.4 * m.mass * 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_cuboid_mass() {
        let m = Mass::cuboid(2.0, DVec3::new(1.0, 2.0, 1.0));
        assert!((m.mass - 4.0).abs() < 1e-12);
        assert!((m.inertia.z - 4.0 / 12.0 * 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_force_at_pos_makes_torque() {
        let mut body = Body::new(Mass::default());
        body.add_force_at_pos(DVec3::new(0.0, 1.0, 0.0), DVec3::new(1.0, 0.0, 0.0));
        assert!((body.torque.z - 1.0).abs() < 1e-12);
        body.clear_accumulators();
        assert_eq!(body.force(), DVec3::ZERO);
    }

    #[test]
    fn test_integrate_spins_in_plane() {
        let mut body = Body::new(Mass::default());
        body.ang_vel = DVec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        body.lin_vel = DVec3::new(1.0, 0.0, 0.0);
        body.integrate(1.0);
        assert!((body.pos.x - 1.0).abs() < 1e-12);
        // +x axis turned a quarter turn counter-clockwise onto +y
        assert!(body.rot.x_axis.x.abs() < 1e-9);
        assert!((body.rot.x_axis.y - 1.0).abs() < 1e-9);
        assert!((body.rot.determinant() - 1.0).abs() < 1e-9);
    }
}
