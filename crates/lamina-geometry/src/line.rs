//! Directed 2D segments in the scaled coordinate space.

use serde::{Deserialize, Serialize};

use crate::point::Point;

/// An ordered pair of points forming a directed segment.
///
/// Direction matters: the sign of cross products against this line depends
/// on which endpoint is `a`. The segment is degenerate when `a == b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Start point.
    pub a: Point,
    /// End point.
    pub b: Point,
}

impl Line {
    /// Create a segment from `a` to `b`.
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Segment length.
    pub fn length(&self) -> f64 {
        self.a.distance_to(&self.b)
    }

    /// Midpoint of the segment.
    pub fn midpoint(&self) -> Point {
        Point::new((self.a.x + self.b.x) / 2, (self.a.y + self.b.y) / 2)
    }

    /// The vector from `a` to `b`.
    pub fn vector(&self) -> Point {
        self.b - self.a
    }

    /// Direction angle in radians.
    pub fn direction(&self) -> f64 {
        ((self.b.y - self.a.y) as f64).atan2((self.b.x - self.a.x) as f64)
    }

    /// True when both endpoints coincide.
    pub fn is_degenerate(&self) -> bool {
        self.a == self.b
    }

    /// Swap the endpoints in place.
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.a, &mut self.b);
    }

    /// Distance from `point` to the closest point of this segment.
    pub fn distance_to(&self, point: &Point) -> f64 {
        point.distance_to_line(self)
    }

    /// Orientation of `point` relative to this directed line.
    pub fn ccw(&self, point: &Point) -> i128 {
        point.ccw(&self.a, &self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_midpoint() {
        let line = Line::new(Point::new(0, 0), Point::new(30, 40));
        assert_eq!(line.length(), 50.0);
        assert_eq!(line.midpoint(), Point::new(15, 20));
    }

    #[test]
    fn test_degenerate() {
        let line = Line::new(Point::new(5, 5), Point::new(5, 5));
        assert!(line.is_degenerate());
        assert_eq!(line.length(), 0.0);
    }

    #[test]
    fn test_ccw_depends_on_direction() {
        let line = Line::new(Point::new(0, 0), Point::new(100, 0));
        let p = Point::new(50, 10);
        let mut reversed = line;
        reversed.reverse();
        assert_eq!(line.ccw(&p), -reversed.ccw(&p));
    }
}
