//! 2D value types: points, sizes, line segments and rotatable rects
//!
//! Units are game meters. The y axis points down the screen, and angles are
//! clockwise revolutions, so a positive angle turns +x toward +y.

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::consts::{ANGLE_EPSILON, NEAR_TOLERANCE};
use crate::rev2rad;

/// A point (or offset) in two-dimensional space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance from the origin
    #[inline]
    pub fn mag(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn dist_to(self, other: Point) -> f64 {
        (self - other).mag()
    }

    /// Angle from the origin to this point, in clockwise revolutions
    pub fn ang(self) -> f64 {
        Point::ZERO.ang_to(self)
    }

    /// Angle from this point to another in clockwise revolutions.
    ///
    /// Zero when `other` is directly to the right.
    pub fn ang_to(self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x) / std::f64::consts::TAU
    }

    /// Same direction from the origin, scaled to `len`.
    ///
    /// A zero length gives the zero vector, and the zero vector stays zero.
    pub fn to_length(self, len: f64) -> Point {
        if len == 0.0 {
            return Point::ZERO;
        }
        let old = self.mag();
        if old == 0.0 {
            return self;
        }
        self * (len / old)
    }

    /// This point rotated around `cen` by `ang` clockwise revolutions.
    ///
    /// Works in polar form about the center: radius and bearing are taken
    /// from `cen`, the bearing is advanced, and the point is rebuilt.
    pub fn rot(self, cen: Point, ang: f64) -> Point {
        if ang.abs() < ANGLE_EPSILON {
            return self;
        }
        let a = rev2rad(ang);
        let h = cen.dist_to(self);
        let b = rev2rad(cen.ang_to(self));
        Point::new(h * (a + b).cos() + cen.x, -h * (a + b).sin() + cen.y)
    }

    /// True if both components are within `NEAR_TOLERANCE`
    pub fn near_to(self, other: Point) -> bool {
        (self.x - other.x).abs() < NEAR_TOLERANCE && (self.y - other.y).abs() < NEAR_TOLERANCE
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// (x, y, 0) for handing to the physics world
    #[inline]
    pub fn fake_3d(self) -> DVec3 {
        DVec3::new(self.x, self.y, 0.0)
    }

    /// Drops the z component
    #[inline]
    pub fn from_3d(v: DVec3) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<DVec2> for Point {
    fn from(v: DVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Point> for DVec2 {
    fn from(p: Point) -> Self {
        DVec2::new(p.x, p.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<f64> for Point {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Div<f64> for Point {
    type Output = Point;
    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Width and height of something in two-dimensional space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub const fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    pub fn area(self) -> f64 {
        self.w * self.h
    }

    /// True if a rect of this size can hold `other` without rotation
    pub fn fits(self, other: Size) -> bool {
        self.w >= other.w && self.h >= other.h
    }

    // Corners of a rect of this size centered at the origin
    pub fn tl(self) -> Point {
        Point::new(-self.w / 2.0, -self.h / 2.0)
    }
    pub fn tr(self) -> Point {
        Point::new(self.w / 2.0, -self.h / 2.0)
    }
    pub fn bl(self) -> Point {
        Point::new(-self.w / 2.0, self.h / 2.0)
    }
    pub fn br(self) -> Point {
        Point::new(self.w / 2.0, self.h / 2.0)
    }
}

impl Add for Size {
    type Output = Size;
    fn add(self, rhs: Size) -> Size {
        Size::new(self.w + rhs.w, self.h + rhs.h)
    }
}

impl Sub for Size {
    type Output = Size;
    fn sub(self, rhs: Size) -> Size {
        Size::new(self.w - rhs.w, self.h - rhs.h)
    }
}

impl Mul<f64> for Size {
    type Output = Size;
    fn mul(self, rhs: f64) -> Size {
        Size::new(self.w * rhs, self.h * rhs)
    }
}

impl Div<f64> for Size {
    type Output = Size;
    fn div(self, rhs: f64) -> Size {
        Size::new(self.w / rhs, self.h / rhs)
    }
}

impl From<Size> for DVec2 {
    fn from(s: Size) -> Self {
        DVec2::new(s.w, s.h)
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub a: Point,
    pub b: Point,
}

impl Line {
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Nearest point on the segment to an arbitrary point
    pub fn nearest_pt_to(&self, p: Point) -> Point {
        let ab = self.b - self.a;
        let len_sq = ab.dot(ab);
        if len_sq == 0.0 {
            return self.a; // Degenerate segment
        }
        let u = ((p - self.a).dot(ab) / len_sq).clamp(0.0, 1.0);
        self.a + ab * u
    }
}

/// A rectangle, possibly rotated about its center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub cen: Point,
    pub size: Size,
    /// Clockwise revolutions
    pub ang: f64,
}

impl Rect {
    pub const fn new(cen: Point, size: Size) -> Self {
        Self { cen, size, ang: 0.0 }
    }

    pub const fn rotated(cen: Point, size: Size, ang: f64) -> Self {
        Self { cen, size, ang }
    }

    pub fn tl(&self) -> Point {
        (self.cen + self.size.tl()).rot(self.cen, self.ang)
    }
    pub fn tr(&self) -> Point {
        (self.cen + self.size.tr()).rot(self.cen, self.ang)
    }
    pub fn bl(&self) -> Point {
        (self.cen + self.size.bl()).rot(self.cen, self.ang)
    }
    pub fn br(&self) -> Point {
        (self.cen + self.size.br()).rot(self.cen, self.ang)
    }

    /// Corners in clockwise order, starting top left
    pub fn corners(&self) -> [Point; 4] {
        [self.tl(), self.tr(), self.br(), self.bl()]
    }

    /// Sides in clockwise order, starting with the top
    pub fn sides(&self) -> [Line; 4] {
        let c = self.corners();
        [
            Line::new(c[0], c[1]),
            Line::new(c[1], c[2]),
            Line::new(c[2], c[3]),
            Line::new(c[3], c[0]),
        ]
    }

    /// True if the point is inside (or on the edge of) the rect
    pub fn contains(&self, p: Point) -> bool {
        // Undo the rect's rotation on the point, then test against the axis-aligned rect
        let local = p.rot(self.cen, -self.ang) - self.cen;
        local.x.abs() <= self.size.w / 2.0 && local.y.abs() <= self.size.h / 2.0
    }

    /// Nearest point in the rect to an arbitrary point (the point itself if inside)
    pub fn nearest_pt_to(&self, p: Point) -> Point {
        if self.contains(p) {
            return p;
        }
        let mut nearest = p;
        let mut best = f64::INFINITY;
        for side in self.sides() {
            let cand = side.nearest_pt_to(p);
            let d = cand.dist_to(p);
            if d < best {
                best = d;
                nearest = cand;
            }
        }
        nearest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_rot_quarter_turn_is_clockwise_on_screen() {
        // +x turns toward +y (down the screen)
        let p = Point::new(1.0, 0.0).rot(Point::ZERO, 0.25);
        assert!(close(p, Point::new(0.0, 1.0)), "{p:?}");

        let p = Point::new(3.0, 2.0).rot(Point::new(2.0, 2.0), 0.5);
        assert!(close(p, Point::new(1.0, 2.0)), "{p:?}");
    }

    #[test]
    fn test_rot_tiny_angle_is_identity() {
        let p = Point::new(1.5, -2.0);
        assert_eq!(p.rot(Point::new(9.0, 9.0), 1e-9), p);
    }

    #[test]
    fn test_ang_to() {
        assert!((Point::ZERO.ang_to(Point::new(0.0, 1.0)) - 0.25).abs() < 1e-12);
        assert!(Point::ZERO.ang_to(Point::new(5.0, 0.0)).abs() < 1e-12);
    }

    #[test]
    fn test_to_length() {
        let v = Point::new(3.0, 4.0).to_length(10.0);
        assert!(close(v, Point::new(6.0, 8.0)));
        assert_eq!(Point::new(3.0, 4.0).to_length(0.0), Point::ZERO);
        assert_eq!(Point::ZERO.to_length(5.0), Point::ZERO);
    }

    #[test]
    fn test_line_nearest() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!(close(line.nearest_pt_to(Point::new(4.0, 3.0)), Point::new(4.0, 0.0)));
        assert!(close(line.nearest_pt_to(Point::new(-4.0, 3.0)), Point::ZERO));
        assert!(close(line.nearest_pt_to(Point::new(14.0, -3.0)), Point::new(10.0, 0.0)));

        let degenerate = Line::new(Point::new(1.0, 1.0), Point::new(1.0, 1.0));
        assert_eq!(degenerate.nearest_pt_to(Point::new(5.0, 5.0)), Point::new(1.0, 1.0));
    }

    #[test]
    fn test_rect_contains_and_nearest() {
        let rect = Rect::new(Point::new(0.0, 0.0), Size::new(4.0, 2.0));
        assert!(rect.contains(Point::new(1.9, 0.9)));
        assert!(!rect.contains(Point::new(2.1, 0.0)));

        let inside = Point::new(0.5, 0.5);
        assert_eq!(rect.nearest_pt_to(inside), inside);
        assert!(close(rect.nearest_pt_to(Point::new(5.0, 0.5)), Point::new(2.0, 0.5)));
        assert!(close(rect.nearest_pt_to(Point::new(5.0, 5.0)), Point::new(2.0, 1.0)));
    }

    #[test]
    fn test_rotated_rect_contains() {
        // A 4x2 rect turned a quarter is 2 wide and 4 tall
        let rect = Rect::rotated(Point::ZERO, Size::new(4.0, 2.0), 0.25);
        assert!(rect.contains(Point::new(0.0, 1.9)));
        assert!(!rect.contains(Point::new(1.9, 0.0)));
    }

    #[test]
    fn test_size_fits() {
        assert!(Size::new(4.0, 3.0).fits(Size::new(4.0, 3.0)));
        assert!(!Size::new(3.9, 10.0).fits(Size::new(4.0, 3.0)));
    }
}
