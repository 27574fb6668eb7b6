//! Integer and floating-point point types.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::line::Line;
use crate::{SCALED_EPSILON, SCALING_FACTOR};

/// A point in 2D real-world space (mm).
pub type Pointf = nalgebra::Point2<f64>;

/// A point in 3D real-world space (mm).
pub type Pointf3 = nalgebra::Point3<f64>;

/// A vector in 2D real-world space.
pub type Vectorf = nalgebra::Vector2<f64>;

/// A vector in 3D real-world space.
pub type Vectorf3 = nalgebra::Vector3<f64>;

/// A point in the fixed-point integer coordinate space.
///
/// Equality is exact. Arithmetic on coordinates stays in `i64`; the
/// orientation predicate [`Point::ccw`] widens to `i128` so the determinant
/// cannot overflow for any representable coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Scaled X coordinate.
    pub x: i64,
    /// Scaled Y coordinate.
    pub y: i64,
}

impl Point {
    /// Create a point from scaled integer coordinates.
    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Create a point by scaling real-world coordinates into counts.
    pub fn new_scale(x: f64, y: f64) -> Self {
        Self {
            x: (x / SCALING_FACTOR).round() as i64,
            y: (y / SCALING_FACTOR).round() as i64,
        }
    }

    /// Round a floating position in scaled units to the nearest count.
    pub fn from_scaled(x: f64, y: f64) -> Self {
        Self {
            x: x.round() as i64,
            y: y.round() as i64,
        }
    }

    /// This point's coordinates unscaled back to mm.
    pub fn to_unscaled(self) -> Pointf {
        Pointf::new(self.x as f64 * SCALING_FACTOR, self.y as f64 * SCALING_FACTOR)
    }

    /// Move by the given deltas.
    pub fn translate(&mut self, dx: i64, dy: i64) {
        self.x += dx;
        self.y += dy;
    }

    /// Rotate about the origin by `angle` radians.
    pub fn rotate(&mut self, angle: f64) {
        let (s, c) = angle.sin_cos();
        let cur_x = self.x as f64;
        let cur_y = self.y as f64;
        self.x = (c * cur_x - s * cur_y).round() as i64;
        self.y = (c * cur_y + s * cur_x).round() as i64;
    }

    /// Rotate about `center` by `angle` radians.
    pub fn rotate_about(&mut self, angle: f64, center: Point) {
        let (s, c) = angle.sin_cos();
        let dx = (self.x - center.x) as f64;
        let dy = (self.y - center.y) as f64;
        self.x = center.x + (c * dx - s * dy).round() as i64;
        self.y = center.y + (c * dy + s * dx).round() as i64;
    }

    /// True when both coordinates are within [`SCALED_EPSILON`] of `other`.
    pub fn coincides_with_epsilon(&self, other: &Point) -> bool {
        (self.x - other.x).abs() < SCALED_EPSILON && (self.y - other.y).abs() < SCALED_EPSILON
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        self.distance_to_sq(other).sqrt()
    }

    /// Squared euclidean distance to another point.
    pub fn distance_to_sq(&self, other: &Point) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx * dx + dy * dy
    }

    /// Distance to the closest point of a segment.
    ///
    /// A degenerate segment collapses to point distance instead of dividing
    /// by a zero squared length.
    pub fn distance_to_line(&self, line: &Line) -> f64 {
        let dx = (line.b.x - line.a.x) as f64;
        let dy = (line.b.y - line.a.y) as f64;
        let l2 = dx * dx + dy * dy;
        if l2 == 0.0 {
            return self.distance_to(&line.a);
        }
        // Parametric projection onto the infinite line, clamped to the segment.
        let t = ((self.x - line.a.x) as f64 * dx + (self.y - line.a.y) as f64 * dy) / l2;
        if t < 0.0 {
            return self.distance_to(&line.a);
        }
        if t > 1.0 {
            return self.distance_to(&line.b);
        }
        let proj = Point::from_scaled(line.a.x as f64 + t * dx, line.a.y as f64 + t * dy);
        self.distance_to(&proj)
    }

    /// Perpendicular distance to the infinite line through `line`.
    pub fn perp_distance_to(&self, line: &Line) -> f64 {
        if line.a == line.b {
            return self.distance_to(&line.a);
        }
        let n = (line.b.x - line.a.x) as f64 * (line.a.y - self.y) as f64
            - (line.a.x - self.x) as f64 * (line.b.y - line.a.y) as f64;
        n.abs() / line.length()
    }

    /// Orientation determinant of the triangle `(p1, p2, self)`.
    ///
    /// Positive for a counter-clockwise turn, negative for clockwise, zero
    /// for collinear. Computed in `i128`: the products can reach
    /// `2 * max(|coord|)^2`, which does not fit an `i64` for large scaled
    /// coordinates.
    pub fn ccw(&self, p1: &Point, p2: &Point) -> i128 {
        (p2.x - p1.x) as i128 * (self.y - p1.y) as i128
            - (p2.y - p1.y) as i128 * (self.x - p1.x) as i128
    }

    /// CCW angle from `self->p1` to `self->p2`, normalized into `(0, 2π]`.
    pub fn ccw_angle(&self, p1: &Point, p2: &Point) -> f64 {
        let angle = ((p1.x - self.x) as f64).atan2((p1.y - self.y) as f64)
            - ((p2.x - self.x) as f64).atan2((p2.y - self.y) as f64);
        if angle <= 0.0 {
            angle + 2.0 * std::f64::consts::PI
        } else {
            angle
        }
    }

    /// Index of the nearest point in `points`, or `None` when empty.
    pub fn nearest_point_index(&self, points: &[Point]) -> Option<usize> {
        let mut idx = None;
        let mut best = f64::INFINITY;
        for (i, p) in points.iter().enumerate() {
            // Partial-sum early out on the X term.
            let dx = (self.x - p.x) as f64;
            let mut d = dx * dx;
            if d > best {
                continue;
            }
            let dy = (self.y - p.y) as f64;
            d += dy * dy;
            if d > best {
                continue;
            }
            idx = Some(i);
            best = d;
            if best == 0.0 {
                break;
            }
        }
        idx
    }

    /// Projection of this point onto a segment (clamped to its endpoints).
    pub fn projection_onto_line(&self, line: &Line) -> Point {
        if line.a == line.b {
            return line.a;
        }
        let dx = (line.b.x - line.a.x) as f64;
        let dy = (line.b.y - line.a.y) as f64;
        let theta = ((line.b.x - self.x) as f64 * dx + (line.b.y - self.y) as f64 * dy)
            / (dx * dx + dy * dy);
        if (0.0..=1.0).contains(&theta) {
            return Point::from_scaled(
                theta * line.a.x as f64 + (1.0 - theta) * line.b.x as f64,
                theta * line.a.y as f64 + (1.0 - theta) * line.b.y as f64,
            );
        }
        if self.distance_to(&line.a) < self.distance_to(&line.b) {
            line.a
        } else {
            line.b
        }
    }

    /// Point at `percent` of the way from `self` to `p2`.
    pub fn interpolate(&self, percent: f64, p2: &Point) -> Point {
        Point::from_scaled(
            self.x as f64 * (1.0 - percent) + p2.x as f64 * percent,
            self.y as f64 * (1.0 - percent) + p2.y as f64 * percent,
        )
    }

    /// Align this point to a grid of the given spacing, anchored at `base`.
    ///
    /// The aligned coordinate is never greater than the original one, also
    /// for negative coordinates.
    pub fn align_to_grid(&mut self, spacing: Point, base: Point) {
        fn align(coord: i64, spacing: i64) -> i64 {
            debug_assert!(spacing > 0);
            if coord < 0 {
                ((coord - spacing + 1) / spacing) * spacing
            } else {
                (coord / spacing) * spacing
            }
        }
        self.x = base.x + align(self.x - base.x, spacing.x);
        self.y = base.y + align(self.y - base.y, spacing.y);
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<Point> for f64 {
    type Output = Point;
    fn mul(self, rhs: Point) -> Point {
        Point::from_scaled(self * rhs.x as f64, self * rhs.y as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale;

    #[test]
    fn test_ccw_antisymmetric() {
        let p = Point::new(0, 0);
        let p1 = Point::new(10, 0);
        let p2 = Point::new(0, 10);
        assert_eq!(p.ccw(&p1, &p2), -p.ccw(&p2, &p1));
        assert!(p.ccw(&p1, &p2) != 0);
    }

    #[test]
    fn test_ccw_no_overflow_on_large_coords() {
        // Coordinates near the range of a 300mm bed scaled by 1e6 and beyond.
        let big = scale(3000.0);
        let p = Point::new(-big, -big);
        let p1 = Point::new(big, -big);
        let p2 = Point::new(big, big);
        // The CCW triangle (p, p1, p2) spans the whole range and must stay
        // positive; the determinant is 4 * big^2, past i64.
        assert!(p2.ccw(&p, &p1) > 0);
        assert_eq!(p2.ccw(&p, &p1), 4 * big as i128 * big as i128);
    }

    #[test]
    fn test_ccw_collinear() {
        let p = Point::new(500, 500);
        assert_eq!(p.ccw(&Point::new(0, 0), &Point::new(1000, 1000)), 0);
    }

    #[test]
    fn test_distance_to_degenerate_line() {
        let p = Point::new(10, 0);
        let degenerate = Line::new(Point::new(0, 0), Point::new(0, 0));
        assert_eq!(p.distance_to_line(&degenerate), 10.0);
    }

    #[test]
    fn test_distance_to_line_clamps() {
        let line = Line::new(Point::new(0, 0), Point::new(100, 0));
        assert_eq!(Point::new(50, 30).distance_to_line(&line), 30.0);
        assert_eq!(Point::new(-40, 0).distance_to_line(&line), 40.0);
        assert_eq!(Point::new(140, 30).distance_to_line(&line), 50.0);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let mut p = Point::new(100, 0);
        p.rotate(std::f64::consts::FRAC_PI_2);
        assert_eq!(p, Point::new(0, 100));
    }

    #[test]
    fn test_rotate_about_center() {
        let mut p = Point::new(20, 10);
        p.rotate_about(std::f64::consts::PI, Point::new(10, 10));
        assert_eq!(p, Point::new(0, 10));
    }

    #[test]
    fn test_nearest_point_index() {
        let points = vec![Point::new(100, 100), Point::new(10, 5), Point::new(-50, 0)];
        let idx = Point::new(0, 0).nearest_point_index(&points);
        assert_eq!(idx, Some(1));
        assert_eq!(Point::new(0, 0).nearest_point_index(&[]), None);
    }

    #[test]
    fn test_projection_onto_line() {
        let line = Line::new(Point::new(0, 0), Point::new(100, 0));
        assert_eq!(Point::new(30, 40).projection_onto_line(&line), Point::new(30, 0));
        assert_eq!(Point::new(-30, 40).projection_onto_line(&line), Point::new(0, 0));
    }

    #[test]
    fn test_interpolate_endpoints() {
        let a = Point::new(0, 0);
        let b = Point::new(100, 50);
        assert_eq!(a.interpolate(0.0, &b), a);
        assert_eq!(a.interpolate(1.0, &b), b);
        assert_eq!(a.interpolate(0.5, &b), Point::new(50, 25));
    }

    #[test]
    fn test_align_to_grid() {
        let mut p = Point::new(57, -13);
        p.align_to_grid(Point::new(10, 10), Point::new(0, 0));
        assert_eq!(p, Point::new(50, -20));
    }
}
