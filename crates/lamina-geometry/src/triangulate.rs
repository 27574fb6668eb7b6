//! Ear-clipping triangulation of expolygons.

use crate::point::Point;
use crate::polygon::{ExPolygon, Polygon};

/// Triangulate an expolygon into a fan-free triangle list.
///
/// Holes are first merged into the contour through bridge edges (each hole
/// is joined to the polygon at its closest vertex pair, which keeps bridges
/// short and non-crossing for the nested loops the slicer produces), then
/// the resulting simple polygon is ear-clipped. Triangles wind
/// counter-clockwise. Degenerate input yields an empty list.
pub fn triangulate_expolygon(expolygon: &ExPolygon) -> Vec<[Point; 3]> {
    let mut contour = expolygon.contour.clone();
    contour.remove_duplicate_points();
    if !contour.is_valid() {
        return Vec::new();
    }
    contour.make_counter_clockwise();

    let mut merged = contour.points;
    for hole in &expolygon.holes {
        let mut hole = hole.clone();
        hole.remove_duplicate_points();
        if !hole.is_valid() {
            continue;
        }
        // Hole vertices must run opposite to the contour so the bridged
        // polygon stays counter-clockwise overall.
        hole.make_clockwise();
        merge_hole(&mut merged, &hole.points);
    }

    ear_clip(&merged)
}

/// Splice `hole` into `outline` through a bridge at the closest vertex pair.
fn merge_hole(outline: &mut Vec<Point>, hole: &[Point]) {
    let mut best = (0usize, 0usize);
    let mut best_dist = f64::INFINITY;
    for (i, p) in outline.iter().enumerate() {
        for (j, q) in hole.iter().enumerate() {
            let d = p.distance_to_sq(q);
            if d < best_dist {
                best_dist = d;
                best = (i, j);
            }
        }
    }
    let (i, j) = best;

    // outline[..=i], hole[j..], hole[..=j], outline[i..]: the bridge edge is
    // traversed once in each direction.
    let mut spliced = Vec::with_capacity(outline.len() + hole.len() + 2);
    spliced.extend_from_slice(&outline[..=i]);
    spliced.extend_from_slice(&hole[j..]);
    spliced.extend_from_slice(&hole[..=j]);
    spliced.extend_from_slice(&outline[i..]);
    *outline = spliced;
}

/// True when `p` lies strictly inside the counter-clockwise triangle `abc`.
fn point_in_triangle(p: &Point, a: &Point, b: &Point, c: &Point) -> bool {
    p.ccw(a, b) > 0 && p.ccw(b, c) > 0 && p.ccw(c, a) > 0
}

/// Ear-clip a simple counter-clockwise polygon.
fn ear_clip(points: &[Point]) -> Vec<[Point; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    let mut indices: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    while indices.len() > 3 {
        let m = indices.len();
        let mut clipped = false;
        for k in 0..m {
            let ia = indices[(k + m - 1) % m];
            let ib = indices[k];
            let ic = indices[(k + 1) % m];
            let (a, b, c) = (points[ia], points[ib], points[ic]);
            // Reflex or degenerate corners cannot be ears.
            if c.ccw(&a, &b) <= 0 {
                continue;
            }
            let blocked = indices.iter().any(|&other| {
                other != ia
                    && other != ib
                    && other != ic
                    && point_in_triangle(&points[other], &a, &b, &c)
            });
            if blocked {
                continue;
            }
            triangles.push([a, b, c]);
            indices.remove(k);
            clipped = true;
            break;
        }
        if !clipped {
            // Only collinear slivers remain (bridge back-edges reduce to
            // zero-area corners); drop the flattest corner and keep going.
            let m = indices.len();
            let flattest = (0..m)
                .min_by_key(|&k| {
                    let a = points[indices[(k + m - 1) % m]];
                    let b = points[indices[k]];
                    let c = points[indices[(k + 1) % m]];
                    c.ccw(&a, &b).abs()
                })
                .unwrap_or(0);
            indices.remove(flattest);
            if indices.len() < 3 {
                break;
            }
        }
    }
    if indices.len() == 3 {
        let (a, b, c) = (points[indices[0]], points[indices[1]], points[indices[2]]);
        if c.ccw(&a, &b) > 0 {
            triangles.push([a, b, c]);
        }
    }
    triangles
}

/// Triangulate a plain polygon without holes.
pub fn triangulate_polygon(polygon: &Polygon) -> Vec<[Point; 3]> {
    triangulate_expolygon(&ExPolygon::from_contour(polygon.clone()))
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

    fn total_area(triangles: &[[Point; 3]]) -> f64 {
        triangles
            .iter()
            .map(|t| t[2].ccw(&t[0], &t[1]) as f64 / 2.0)
            .sum()
    }

    #[test]
    fn test_square_two_triangles() {
        let triangles = triangulate_polygon(&square(100));
        assert_eq!(triangles.len(), 2);
        assert_eq!(total_area(&triangles), 10_000.0);
    }

    #[test]
    fn test_concave_polygon() {
        // An L shape: 6 vertices, 4 triangles.
        let l = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(200, 0),
            Point::new(200, 100),
            Point::new(100, 100),
            Point::new(100, 200),
            Point::new(0, 200),
        ]);
        let triangles = triangulate_polygon(&l);
        assert_eq!(triangles.len(), 4);
        assert_eq!(total_area(&triangles), l.area());
    }

    #[test]
    fn test_expolygon_with_hole_preserves_area() {
        let mut hole = square(40);
        hole.translate(30, 30);
        hole.make_clockwise();
        let ex = ExPolygon {
            contour: square(100),
            holes: vec![hole],
        };
        let triangles = triangulate_expolygon(&ex);
        assert!((total_area(&triangles) - ex.area()).abs() < 1.0);
        // All triangles counter-clockwise.
        assert!(triangles.iter().all(|t| t[2].ccw(&t[0], &t[1]) > 0));
    }

    #[test]
    fn test_degenerate_contour_is_empty() {
        let line = Polygon::new(vec![Point::new(0, 0), Point::new(100, 0)]);
        assert!(triangulate_polygon(&line).is_empty());
    }
}
