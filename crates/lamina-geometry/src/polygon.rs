//! Closed polygons in the scaled coordinate space.

use serde::{Deserialize, Serialize};

use crate::bounding::BoundingBox;
use crate::line::Line;
use crate::point::Point;
use crate::simplify::douglas_peucker;
use crate::SCALED_EPSILON;

/// A closed polygon.
///
/// The edge from the last point back to the first is real even though it is
/// not stored. A valid polygon has at least three distinct points;
/// [`Polygon::remove_collinear_points`] may shrink it below that and callers
/// must check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertices in order; the closing edge is implicit.
    pub points: Vec<Point>,
}

impl Polygon {
    /// Create a polygon from points.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the polygon has enough distinct points to enclose area.
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 3
    }

    /// First vertex. Panics on an empty polygon, which is a caller bug.
    pub fn first_point(&self) -> Point {
        self.points[0]
    }

    /// All edges including the implicit closing edge.
    pub fn lines(&self) -> Vec<Line> {
        let n = self.points.len();
        if n < 2 {
            return Vec::new();
        }
        let mut lines: Vec<Line> = self
            .points
            .windows(2)
            .map(|w| Line::new(w[0], w[1]))
            .collect();
        lines.push(Line::new(self.points[n - 1], self.points[0]));
        lines
    }

    /// Perimeter length including the closing edge.
    pub fn length(&self) -> f64 {
        self.lines().iter().map(Line::length).sum()
    }

    /// Signed shoelace area in scaled units squared.
    ///
    /// Positive for counter-clockwise winding. Accumulated in `i128` before
    /// converting, so large contours cannot overflow.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc: i128 = 0;
        for i in 0..n {
            let p = &self.points[i];
            let q = &self.points[(i + 1) % n];
            acc += p.x as i128 * q.y as i128 - q.x as i128 * p.y as i128;
        }
        acc as f64 / 2.0
    }

    /// True for counter-clockwise winding.
    pub fn is_counter_clockwise(&self) -> bool {
        self.area() > 0.0
    }

    /// Reverse the winding order in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Force counter-clockwise winding; returns whether the order changed.
    pub fn make_counter_clockwise(&mut self) -> bool {
        if !self.is_counter_clockwise() {
            self.reverse();
            true
        } else {
            false
        }
    }

    /// Force clockwise winding; returns whether the order changed.
    pub fn make_clockwise(&mut self) -> bool {
        if self.is_counter_clockwise() {
            self.reverse();
            true
        } else {
            false
        }
    }

    /// Bounding box of all vertices.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Ray-casting point-in-polygon test.
    ///
    /// Points exactly on the boundary may land on either side; slicing only
    /// uses this for strictly nested loops.
    pub fn contains(&self, point: &Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = &self.points[i];
            let pj = &self.points[j];
            if (pi.y > point.y) != (pj.y > point.y) {
                let slope_x = pj.x as f64
                    + (point.y - pj.y) as f64 * (pi.x - pj.x) as f64 / (pi.y - pj.y) as f64;
                if (point.x as f64) < slope_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Index of the first vertex exactly equal to `point`.
    pub fn find_point(&self, point: &Point) -> Option<usize> {
        self.points.iter().position(|p| p == point)
    }

    /// Index of the vertex closest to `point`.
    pub fn closest_point_index(&self, point: &Point) -> Option<usize> {
        point.nearest_point_index(&self.points)
    }

    /// True when `point` lies on the boundary, closing edge included,
    /// within [`SCALED_EPSILON`].
    pub fn has_boundary_point(&self, point: &Point) -> bool {
        self.lines()
            .iter()
            .any(|line| point.distance_to_line(line) < SCALED_EPSILON as f64)
    }

    /// Area-weighted centroid.
    pub fn centroid(&self) -> Point {
        let area = self.area();
        if area == 0.0 {
            return self.first_point();
        }
        let n = self.points.len();
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let p = &self.points[i];
            let q = &self.points[(i + 1) % n];
            let cross = p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
            cx += (p.x + q.x) as f64 * cross;
            cy += (p.y + q.y) as f64 * cross;
        }
        Point::from_scaled(cx / (6.0 * area), cy / (6.0 * area))
    }

    /// Translate all vertices by the given deltas.
    pub fn translate(&mut self, dx: i64, dy: i64) {
        for p in &mut self.points {
            p.translate(dx, dy);
        }
    }

    /// Rotate all vertices about the origin.
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

    /// True when any two consecutive vertices coincide exactly.
    pub fn has_duplicate_points(&self) -> bool {
        self.points.windows(2).any(|w| w[0] == w[1])
    }

    /// Collapse runs of consecutive identical vertices.
    pub fn remove_duplicate_points(&mut self) -> bool {
        let before = self.points.len();
        self.points.dedup();
        self.points.len() != before
    }

    /// Drop vertices collinear with both neighbors (closing edge included).
    ///
    /// The result may have fewer than three points.
    pub fn remove_collinear_points(&mut self) {
        if self.points.len() < 3 {
            return;
        }
        let points = std::mem::take(&mut self.points);
        let n = points.len();
        for i in 0..n {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            if points[i].ccw(&prev, &next) != 0 {
                self.points.push(points[i]);
            }
        }
    }

    /// Simplify with Douglas-Peucker, treating the polygon as a closed path.
    ///
    /// Returns an empty result when simplification collapses the contour
    /// below three points.
    pub fn simplify(&self, tolerance: f64) -> Option<Polygon> {
        let mut closed = self.points.clone();
        if closed.is_empty() {
            return None;
        }
        closed.push(closed[0]);
        let mut simplified = douglas_peucker(&closed, tolerance);
        simplified.pop();
        if simplified.len() >= 3 {
            Some(Polygon::new(simplified))
        } else {
            None
        }
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

/// A contour with zero or more holes.
///
/// The contour winds counter-clockwise and holes clockwise, matching the
/// orientation the slicer emits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExPolygon {
    /// Outer boundary, counter-clockwise.
    pub contour: Polygon,
    /// Holes, clockwise.
    pub holes: Vec<Polygon>,
}

impl ExPolygon {
    /// An expolygon with no holes.
    pub fn from_contour(contour: Polygon) -> Self {
        Self {
            contour,
            holes: Vec::new(),
        }
    }

    /// Contour area minus hole areas.
    pub fn area(&self) -> f64 {
        // Holes are clockwise, so their signed areas are negative already.
        self.contour.area() + self.holes.iter().map(Polygon::area).sum::<f64>()
    }

    /// True when `point` is inside the contour but not inside any hole.
    pub fn contains(&self, point: &Point) -> bool {
        self.contour.contains(point) && !self.holes.iter().any(|h| h.contains(point))
    }

    /// Bounding box of the contour.
    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ])
    }

    #[test]
    fn test_area_and_winding() {
        let sq = square(100);
        assert_eq!(sq.area(), 10_000.0);
        assert!(sq.is_counter_clockwise());
        let mut cw = sq.clone();
        cw.reverse();
        assert_eq!(cw.area(), -10_000.0);
        assert!(!cw.is_counter_clockwise());
    }

    #[test]
    fn test_perimeter_includes_closing_edge() {
        assert_eq!(square(100).length(), 400.0);
        assert_eq!(square(100).lines().len(), 4);
    }

    #[test]
    fn test_has_boundary_point_closing_edge() {
        let sq = square(1000);
        // Midpoint of the stored last edge and of the implicit closing edge.
        assert!(sq.has_boundary_point(&Point::new(500, 1000)));
        assert!(sq.has_boundary_point(&Point::new(0, 500)));
        assert!(!sq.has_boundary_point(&Point::new(500, 500)));
        assert_eq!(sq.find_point(&Point::new(1000, 1000)), Some(2));
        assert_eq!(sq.closest_point_index(&Point::new(10, 990)), Some(3));
    }

    #[test]
    fn test_contains() {
        let sq = square(100);
        assert!(sq.contains(&Point::new(50, 50)));
        assert!(!sq.contains(&Point::new(150, 50)));
        assert!(!sq.contains(&Point::new(-1, 50)));
    }

    #[test]
    fn test_centroid_of_square() {
        assert_eq!(square(100).centroid(), Point::new(50, 50));
    }

    #[test]
    fn test_remove_collinear_points() {
        let mut p = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(50, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
        ]);
        p.remove_collinear_points();
        assert_eq!(p.len(), 4);
        assert_eq!(p.area(), 10_000.0);
    }

    #[test]
    fn test_remove_collinear_can_invalidate() {
        // A fully collinear "polygon" collapses to nothing.
        let mut p = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(50, 0),
            Point::new(100, 0),
        ]);
        p.remove_collinear_points();
        assert!(!p.is_valid());
    }

    #[test]
    fn test_expolygon_area() {
        let mut hole = square(20);
        hole.translate(40, 40);
        hole.make_clockwise();
        let ex = ExPolygon {
            contour: square(100),
            holes: vec![hole],
        };
        assert_eq!(ex.area(), 10_000.0 - 400.0);
        assert!(ex.contains(&Point::new(10, 10)));
        assert!(!ex.contains(&Point::new(50, 50)));
    }
}
