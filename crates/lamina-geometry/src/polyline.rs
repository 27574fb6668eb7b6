//! Open sequences of scaled points.

use serde::{Deserialize, Serialize};

use crate::bounding::BoundingBox;
use crate::line::Line;
use crate::point::Point;
use crate::simplify::douglas_peucker;
use crate::SCALED_EPSILON;

/// An ordered, open sequence of points.
///
/// Insertion order is significant. Adjacent duplicate points can be
/// collapsed with [`Polyline::remove_duplicate_points`]; non-adjacent
/// duplicates are deliberately preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polyline {
    /// The path's points, in order.
    pub points: Vec<Point>,
}

impl Polyline {
    /// Create a polyline from points.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the path has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First point. Panics on an empty path, which is a caller bug.
    pub fn first_point(&self) -> Point {
        self.points[0]
    }

    /// Last point. Panics on an empty path, which is a caller bug.
    pub fn last_point(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// The segments between consecutive points.
    pub fn lines(&self) -> Vec<Line> {
        self.points
            .windows(2)
            .map(|w| Line::new(w[0], w[1]))
            .collect()
    }

    /// Sum of segment lengths.
    pub fn length(&self) -> f64 {
        self.lines().iter().map(Line::length).sum()
    }

    /// Bounding box of all points.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Reverse the point order in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Append a point.
    pub fn append(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Translate all points by the given deltas.
    pub fn translate(&mut self, dx: i64, dy: i64) {
        for p in &mut self.points {
            p.translate(dx, dy);
        }
    }

    /// Rotate all points about the origin.
    pub fn rotate(&mut self, angle: f64) {
        for p in &mut self.points {
            p.rotate(angle);
        }
    }

    /// Scale all coordinates by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for p in &mut self.points {
            p.x = (p.x as f64 * factor).round() as i64;
            p.y = (p.y as f64 * factor).round() as i64;
        }
    }

    /// Index of the first point exactly equal to `point`.
    pub fn find_point(&self, point: &Point) -> Option<usize> {
        self.points.iter().position(|p| p == point)
    }

    /// Index of the point closest to `point`.
    pub fn closest_point_index(&self, point: &Point) -> Option<usize> {
        point.nearest_point_index(&self.points)
    }

    /// True when `point` lies on the path within [`SCALED_EPSILON`].
    pub fn has_boundary_point(&self, point: &Point) -> bool {
        let proj = self.projection_of(point);
        point.distance_to(&proj) < SCALED_EPSILON as f64
    }

    /// Closest point of the path to `point`.
    pub fn projection_of(&self, point: &Point) -> Point {
        let mut best = self.first_point();
        let mut best_dist = point.distance_to(&best);
        for line in self.lines() {
            let candidate = point.projection_onto_line(&line);
            let d = point.distance_to(&candidate);
            if d < best_dist {
                best = candidate;
                best_dist = d;
            }
        }
        best
    }

    /// True when any two consecutive points coincide exactly.
    pub fn has_duplicate_points(&self) -> bool {
        self.points.windows(2).any(|w| w[0] == w[1])
    }

    /// Collapse runs of consecutive identical points.
    ///
    /// Only adjacent duplicates are removed; returns whether anything changed.
    pub fn remove_duplicate_points(&mut self) -> bool {
        let before = self.points.len();
        self.points.dedup();
        self.points.len() != before
    }

    /// Simplify with Douglas-Peucker, keeping both endpoints.
    pub fn simplify(&mut self, tolerance: f64) {
        if self.points.len() > 2 {
            self.points = douglas_peucker(&self.points, tolerance);
        }
    }

    /// Simplify with Visvalingam-Whyatt; `tolerance` is an area in scaled
    /// units squared.
    pub fn simplify_visvalingam(&mut self, tolerance: f64) {
        if self.points.len() > 2 {
            self.points = crate::simplify::visvalingam(&self.points, tolerance);
        }
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag() -> Polyline {
        Polyline::new(vec![
            Point::new(0, 0),
            Point::new(100, 100),
            Point::new(200, 0),
            Point::new(300, 100),
        ])
    }

    #[test]
    fn test_length() {
        let p = Polyline::new(vec![Point::new(0, 0), Point::new(30, 40), Point::new(30, 140)]);
        assert_eq!(p.length(), 150.0);
    }

    #[test]
    fn test_lines_count() {
        assert_eq!(zigzag().lines().len(), 3);
    }

    #[test]
    fn test_remove_duplicate_points_adjacent_only() {
        // Non-adjacent duplicates must survive untouched.
        let mut p = Polyline::new(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(0, 0),
        ]);
        assert!(!p.has_duplicate_points());
        assert!(!p.remove_duplicate_points());
        assert_eq!(p.len(), 3);

        let mut q = Polyline::new(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 0),
            Point::new(20, 0),
        ]);
        assert!(q.has_duplicate_points());
        assert!(q.remove_duplicate_points());
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn test_has_boundary_point() {
        let p = Polyline::new(vec![Point::new(0, 0), Point::new(1000, 0)]);
        assert!(p.has_boundary_point(&Point::new(500, 0)));
        assert!(p.has_boundary_point(&Point::new(500, 50)));
        assert!(!p.has_boundary_point(&Point::new(500, 5000)));
    }

    #[test]
    fn test_closest_point_index() {
        assert_eq!(zigzag().closest_point_index(&Point::new(190, 10)), Some(2));
    }
}
