//! Axis-aligned bounding boxes in 2D (scaled) and 3D (real-world) space.

use serde::{Deserialize, Serialize};

use crate::point::{Point, Pointf3, Vectorf3};

/// Axis-aligned bounding box over scaled 2D points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Point,
    /// Maximum corner.
    pub max: Point,
    /// False until at least one point has been merged.
    pub defined: bool,
}

impl BoundingBox {
    /// Bounding box of a point set.
    pub fn from_points(points: &[Point]) -> Self {
        let mut bb = Self::default();
        for p in points {
            bb.merge_point(*p);
        }
        bb
    }

    /// Expand to include `point`.
    pub fn merge_point(&mut self, point: Point) {
        if self.defined {
            self.min.x = self.min.x.min(point.x);
            self.min.y = self.min.y.min(point.y);
            self.max.x = self.max.x.max(point.x);
            self.max.y = self.max.y.max(point.y);
        } else {
            self.min = point;
            self.max = point;
            self.defined = true;
        }
    }

    /// Expand to include another box.
    pub fn merge(&mut self, other: &BoundingBox) {
        if other.defined {
            self.merge_point(other.min);
            self.merge_point(other.max);
        }
    }

    /// Box center.
    pub fn center(&self) -> Point {
        Point::new((self.min.x + self.max.x) / 2, (self.min.y + self.max.y) / 2)
    }

    /// Box extents.
    pub fn size(&self) -> Point {
        Point::new(self.max.x - self.min.x, self.max.y - self.min.y)
    }

    /// True when `point` lies inside or on the boundary.
    pub fn contains(&self, point: &Point) -> bool {
        self.defined
            && point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Translate by the given deltas.
    pub fn translate(&mut self, dx: i64, dy: i64) {
        self.min.translate(dx, dy);
        self.max.translate(dx, dy);
    }
}

/// Axis-aligned bounding box over real-world 3D points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxf3 {
    /// Minimum corner.
    pub min: Pointf3,
    /// Maximum corner.
    pub max: Pointf3,
    /// False until at least one point has been merged.
    pub defined: bool,
}

impl Default for BoundingBoxf3 {
    fn default() -> Self {
        Self {
            min: Pointf3::origin(),
            max: Pointf3::origin(),
            defined: false,
        }
    }
}

impl BoundingBoxf3 {
    /// Bounding box of a point set.
    pub fn from_points(points: &[Pointf3]) -> Self {
        let mut bb = Self::default();
        for p in points {
            bb.merge_point(p);
        }
        bb
    }

    /// Expand to include `point`.
    pub fn merge_point(&mut self, point: &Pointf3) {
        if self.defined {
            self.min.x = self.min.x.min(point.x);
            self.min.y = self.min.y.min(point.y);
            self.min.z = self.min.z.min(point.z);
            self.max.x = self.max.x.max(point.x);
            self.max.y = self.max.y.max(point.y);
            self.max.z = self.max.z.max(point.z);
        } else {
            self.min = *point;
            self.max = *point;
            self.defined = true;
        }
    }

    /// Expand to include another box.
    pub fn merge(&mut self, other: &BoundingBoxf3) {
        if other.defined {
            self.merge_point(&other.min);
            self.merge_point(&other.max);
        }
    }

    /// Box center.
    pub fn center(&self) -> Pointf3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Box extents.
    pub fn size(&self) -> Vectorf3 {
        self.max - self.min
    }

    /// Translate by `vector`.
    pub fn translate(&mut self, vector: &Vectorf3) {
        self.min += *vector;
        self.max += *vector;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_merge() {
        let bb = BoundingBox::from_points(&[
            Point::new(10, -5),
            Point::new(-3, 8),
            Point::new(0, 0),
        ]);
        assert_eq!(bb.min, Point::new(-3, -5));
        assert_eq!(bb.max, Point::new(10, 8));
        assert_eq!(bb.size(), Point::new(13, 13));
    }

    #[test]
    fn test_empty_box_contains_nothing() {
        let bb = BoundingBox::default();
        assert!(!bb.contains(&Point::new(0, 0)));
    }

    #[test]
    fn test_bounding_box_f3() {
        let mut bb = BoundingBoxf3::default();
        bb.merge_point(&Pointf3::new(0.0, 0.0, 0.0));
        bb.merge_point(&Pointf3::new(10.0, 4.0, 2.0));
        assert_eq!(bb.center(), Pointf3::new(5.0, 2.0, 1.0));
        assert_eq!(bb.size(), Vectorf3::new(10.0, 4.0, 2.0));
    }
}
