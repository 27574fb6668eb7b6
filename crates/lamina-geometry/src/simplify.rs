//! Path simplification: Douglas-Peucker and Visvalingam-Whyatt.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::line::Line;
use crate::point::Point;

/// Douglas-Peucker simplification.
///
/// Keeps the point of maximum deviation from the chord between the range
/// endpoints (shortest distance to the chord segment, not strictly
/// perpendicular) whenever that deviation reaches `tolerance`, and recurses
/// on both halves. Endpoints are always kept, the result is a subset of the
/// input in the original order. A zero tolerance returns the input
/// unchanged; an infinite tolerance returns just the two endpoints.
pub fn douglas_peucker(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    mark_kept(points, 0, points.len() - 1, tolerance, &mut keep);
    points
        .iter()
        .zip(&keep)
        .filter(|(_, &k)| k)
        .map(|(p, _)| *p)
        .collect()
}

fn mark_kept(points: &[Point], begin: usize, end: usize, tolerance: f64, keep: &mut [bool]) {
    if end - begin < 2 {
        return;
    }
    let chord = Line::new(points[begin], points[end]);
    let mut dmax = 0.0;
    let mut index = 0;
    for (i, p) in points.iter().enumerate().take(end).skip(begin + 1) {
        let d = p.distance_to_line(&chord);
        if d > dmax {
            dmax = d;
            index = i;
        }
    }
    if dmax >= tolerance {
        if index == 0 {
            // Every interior point sits exactly on the chord and the
            // tolerance admits no deviation at all; keep the whole run.
            for k in keep.iter_mut().take(end).skip(begin + 1) {
                *k = true;
            }
        } else {
            keep[index] = true;
            mark_kept(points, begin, index, tolerance, keep);
            mark_kept(points, index, end, tolerance, keep);
        }
    }
}

struct HeapEntry {
    area: f64,
    index: usize,
    version: u64,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.area == other.area
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap over area: reverse the comparison. Areas are finite and
        // non-negative so total_cmp never sees a NaN.
        other.area.total_cmp(&self.area)
    }
}

/// Visvalingam-Whyatt simplification.
///
/// Iteratively removes the interior point whose triangle with its current
/// predecessor and successor has the smallest effective area, maintained in
/// a priority queue over a doubly-linked predecessor/successor index map.
/// Each removal updates the two neighbors' cached areas; the effective area
/// assigned to a removed point never decreases (a later removal cannot be
/// cheaper than an earlier one). Points whose effective area exceeds
/// `tolerance` are retained, endpoints always.
pub fn visvalingam(points: &[Point], tolerance: f64) -> Vec<Point> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    let mut prev: Vec<usize> = (0..n).map(|i| i.wrapping_sub(1)).collect();
    let mut next: Vec<usize> = (1..=n).collect();
    let mut version = vec![0u64; n];
    let mut effective = vec![f64::INFINITY; n];

    let tri_area = |a: &Point, b: &Point, c: &Point| -> f64 {
        let det = b.ccw(a, c);
        (det as f64).abs() / 2.0
    };

    let mut heap = BinaryHeap::with_capacity(n);
    for i in 1..n - 1 {
        heap.push(HeapEntry {
            area: tri_area(&points[i - 1], &points[i], &points[i + 1]),
            index: i,
            version: 0,
        });
    }

    let mut min_area: f64 = 0.0;
    let mut remaining = n;
    while remaining > 2 {
        let entry = match heap.pop() {
            Some(e) => e,
            None => break,
        };
        if entry.version != version[entry.index] || effective[entry.index].is_finite() {
            continue; // stale entry for a recomputed or removed node
        }
        // The removal threshold is monotonically non-decreasing.
        min_area = min_area.max(entry.area);
        effective[entry.index] = min_area;
        remaining -= 1;

        // Unlink and refresh both neighbors' cached areas.
        let p = prev[entry.index];
        let q = next[entry.index];
        next[p] = q;
        prev[q] = p;
        for &i in &[p, q] {
            if i == 0 || i == n - 1 {
                continue;
            }
            version[i] += 1;
            heap.push(HeapEntry {
                area: tri_area(&points[prev[i]], &points[i], &points[next[i]]),
                index: i,
                version: version[i],
            });
        }
    }

    points
        .iter()
        .enumerate()
        .filter(|(i, _)| *i == 0 || *i == n - 1 || effective[*i] > tolerance)
        .map(|(_, p)| *p)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> Vec<Point> {
        vec![
            Point::new(0, 0),
            Point::new(100, 5),
            Point::new(200, 0),
            Point::new(300, 400),
            Point::new(400, 0),
        ]
    }

    #[test]
    fn test_douglas_peucker_zero_tolerance_is_identity() {
        assert_eq!(douglas_peucker(&path(), 0.0), path());

        // Also for exactly collinear runs.
        let collinear = vec![Point::new(0, 0), Point::new(50, 0), Point::new(100, 0)];
        assert_eq!(douglas_peucker(&collinear, 0.0), collinear);
    }

    #[test]
    fn test_douglas_peucker_infinite_tolerance_keeps_endpoints() {
        let simplified = douglas_peucker(&path(), f64::INFINITY);
        assert_eq!(simplified, vec![Point::new(0, 0), Point::new(400, 0)]);
    }

    #[test]
    fn test_douglas_peucker_drops_small_deviation() {
        let simplified = douglas_peucker(&path(), 50.0);
        // The 5-count bump at x=100 goes, the 400-count spike stays.
        assert!(!simplified.contains(&Point::new(100, 5)));
        assert!(simplified.contains(&Point::new(300, 400)));
        assert_eq!(simplified.first(), Some(&Point::new(0, 0)));
        assert_eq!(simplified.last(), Some(&Point::new(400, 0)));
    }

    #[test]
    fn test_visvalingam_removes_smallest_triangle_first() {
        let simplified = visvalingam(&path(), 1_000.0);
        assert!(!simplified.contains(&Point::new(100, 5)));
        assert!(simplified.contains(&Point::new(300, 400)));
    }

    #[test]
    fn test_visvalingam_endpoints_survive_any_tolerance() {
        let simplified = visvalingam(&path(), f64::MAX);
        assert_eq!(simplified, vec![Point::new(0, 0), Point::new(400, 0)]);
    }

    #[test]
    fn test_visvalingam_short_paths_untouched() {
        let two = vec![Point::new(0, 0), Point::new(10, 10)];
        assert_eq!(visvalingam(&two, 100.0), two);
    }
}
