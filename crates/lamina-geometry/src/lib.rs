#![warn(missing_docs)]

//! Geometric primitives for the lamina slicing core.
//!
//! 2D coordinates used by slicing predicates are exact integers in a
//! fixed-point space ([`Point`], scaled by [`SCALING_FACTOR`]), while
//! real-world coordinates are `f64` ([`Pointf`], [`Pointf3`]). Orientation
//! tests on scaled coordinates escalate to `i128` so they never overflow.

pub mod bounding;
pub mod line;
pub mod point;
pub mod polygon;
pub mod polyline;
pub mod simplify;
pub mod transform;
pub mod triangulate;

pub use bounding::{BoundingBox, BoundingBoxf3};
pub use line::Line;
pub use point::{Point, Pointf, Pointf3, Vectorf, Vectorf3};
pub use polygon::{ExPolygon, Polygon};
pub use polyline::Polyline;
pub use simplify::{douglas_peucker, visvalingam};
pub use transform::{Axis, TransformationMatrix};
pub use triangulate::triangulate_expolygon;

/// Millimeters represented by one count of the fixed-point coordinate space.
pub const SCALING_FACTOR: f64 = 0.000001;

/// Geometric tolerance in unscaled (mm) units.
pub const EPSILON: f64 = 1e-4;

/// [`EPSILON`] expressed in scaled integer counts.
pub const SCALED_EPSILON: i64 = (EPSILON / SCALING_FACTOR) as i64;

/// Convert an unscaled coordinate to fixed-point counts.
#[inline]
pub fn scale(val: f64) -> i64 {
    (val / SCALING_FACTOR).round() as i64
}

/// Convert fixed-point counts back to an unscaled coordinate.
#[inline]
pub fn unscale(val: i64) -> f64 {
    val as f64 * SCALING_FACTOR
}
