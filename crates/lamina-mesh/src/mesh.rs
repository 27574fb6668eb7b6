//! Shared-vertex triangle mesh.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use lamina_geometry::{Axis, BoundingBoxf3, Pointf3, TransformationMatrix, Vectorf3};

use crate::repair::RepairStats;

/// A triangle mesh over a shared vertex array.
///
/// Facets index into `vertices`; a facet's vertices wind counter-clockwise
/// when seen from outside the solid. Fresh meshes are unrepaired and most
/// downstream consumers (the slicer in particular) require
/// [`TriangleMesh::repair`] to have run first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Vertex positions in real-world (unscaled) coordinates.
    pub vertices: Vec<Pointf3>,
    /// Vertex index triples, counter-clockwise from outside.
    pub facets: Vec<[u32; 3]>,
    pub(crate) repaired: bool,
    pub(crate) stats: RepairStats,
}

impl TriangleMesh {
    /// An empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from raw vertex and facet arrays.
    ///
    /// The arrays are taken as-is; call [`TriangleMesh::repair`] to weld
    /// duplicates and fix defects.
    pub fn from_raw(vertices: Vec<Pointf3>, facets: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            facets,
            repaired: false,
            stats: RepairStats::default(),
        }
    }

    /// Number of facets.
    pub fn facets_count(&self) -> usize {
        self.facets.len()
    }

    /// True when the mesh has no facets.
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// True once [`TriangleMesh::repair`] has run.
    pub fn repaired(&self) -> bool {
        self.repaired
    }

    /// Counters recorded by the last repair.
    pub fn stats(&self) -> &RepairStats {
        &self.stats
    }

    /// True when the last repair had to intervene.
    pub fn needed_repair(&self) -> bool {
        self.stats.needed_repair()
    }

    /// Clear the recorded repair counters and the repaired flag.
    pub fn reset_repair_stats(&mut self) {
        self.stats = RepairStats::default();
        self.repaired = false;
    }

    /// The three vertex positions of facet `i`.
    pub fn facet_vertices(&self, i: usize) -> [Pointf3; 3] {
        let f = self.facets[i];
        [
            self.vertices[f[0] as usize],
            self.vertices[f[1] as usize],
            self.vertices[f[2] as usize],
        ]
    }

    /// Outward normal of facet `i`, not normalized.
    pub fn facet_normal(&self, i: usize) -> Vectorf3 {
        let [a, b, c] = self.facet_vertices(i);
        (b - a).cross(&(c - a))
    }

    /// Append another mesh's geometry; the result is unrepaired.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.facets.extend(
            other
                .facets
                .iter()
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
        self.repaired = false;
    }

    /// Bounding box of all vertices.
    pub fn bounding_box(&self) -> BoundingBoxf3 {
        BoundingBoxf3::from_points(&self.vertices)
    }

    /// Box extents.
    pub fn size(&self) -> Vectorf3 {
        self.bounding_box().size()
    }

    /// Box center.
    pub fn center(&self) -> Pointf3 {
        self.bounding_box().center()
    }

    /// Translate all vertices.
    pub fn translate(&mut self, x: f64, y: f64, z: f64) {
        let v = Vectorf3::new(x, y, z);
        for p in &mut self.vertices {
            *p += v;
        }
    }

    /// Uniform scale about the origin.
    pub fn scale(&mut self, factor: f64) {
        for p in &mut self.vertices {
            p.coords *= factor;
        }
    }

    /// Per-axis scale about the origin.
    pub fn scale_versor(&mut self, versor: &Vectorf3) {
        for p in &mut self.vertices {
            p.x *= versor.x;
            p.y *= versor.y;
            p.z *= versor.z;
        }
    }

    /// Rotate about a coordinate axis through the origin.
    pub fn rotate(&mut self, angle: f64, axis: Axis) {
        if angle == 0.0 {
            return;
        }
        self.transform(&TransformationMatrix::mat_rotation(angle, axis));
    }

    /// Mirror across the plane whose normal is `axis`.
    ///
    /// Mirroring inverts winding, so each facet is re-ordered to keep the
    /// normals pointing outward.
    pub fn mirror(&mut self, axis: Axis) {
        self.transform(&TransformationMatrix::mat_mirror(axis));
    }

    /// Apply an arbitrary affine transform.
    ///
    /// A negative determinant means the transform inverts orientation; the
    /// facet winding is flipped to compensate.
    pub fn transform(&mut self, t: &TransformationMatrix) {
        for p in &mut self.vertices {
            *p = t.apply_point(p);
        }
        if t.determinant() < 0.0 {
            for f in &mut self.facets {
                f.swap(1, 2);
            }
        }
    }

    /// Translate so the bounding box minimum sits at the origin.
    pub fn align_to_origin(&mut self) {
        let min = self.bounding_box().min;
        self.translate(-min.x, -min.y, -min.z);
    }

    /// Translate so the bounding box center sits at the origin.
    pub fn center_around_origin(&mut self) {
        let c = self.center();
        self.translate(-c.x, -c.y, -c.z);
    }

    /// Signed volume via the divergence theorem.
    ///
    /// Positive for a closed mesh with outward-facing facets; the sign is
    /// what repair uses to detect a globally inside-out mesh.
    pub fn volume(&self) -> f64 {
        let mut vol = 0.0;
        for f in &self.facets {
            let a = self.vertices[f[0] as usize].coords;
            let b = self.vertices[f[1] as usize].coords;
            let c = self.vertices[f[2] as usize].coords;
            vol += a.dot(&b.cross(&c)) / 6.0;
        }
        vol
    }

    /// True when every edge is shared by exactly two facets.
    pub fn is_manifold(&self) -> bool {
        if self.facets.is_empty() {
            return false;
        }
        let mut counts: HashMap<(u32, u32), u32> = HashMap::new();
        for f in &self.facets {
            for e in facet_edges(f) {
                *counts.entry(undirected(e)).or_insert(0) += 1;
            }
        }
        counts.values().all(|&c| c == 2)
    }

    /// Split into connected components.
    ///
    /// Connectivity follows shared vertex indices, so the mesh should be
    /// repaired (welded) first; an unwelded mesh splits at every duplicated
    /// seam. Component meshes are returned unrepaired.
    pub fn split(&self) -> Vec<TriangleMesh> {
        let labels = self.component_labels();
        let parts = labels.iter().copied().max().map_or(0, |m| m + 1);
        let mut out = Vec::with_capacity(parts);
        for part in 0..parts {
            let mut remap: HashMap<u32, u32> = HashMap::new();
            let mut mesh = TriangleMesh::new();
            for (fi, f) in self.facets.iter().enumerate() {
                if labels[fi] != part {
                    continue;
                }
                let mut facet = [0u32; 3];
                for (slot, &vi) in facet.iter_mut().zip(f) {
                    let next = remap.len() as u32;
                    let idx = *remap.entry(vi).or_insert_with(|| {
                        mesh.vertices.push(self.vertices[vi as usize]);
                        next
                    });
                    *slot = idx;
                }
                mesh.facets.push(facet);
            }
            out.push(mesh);
        }
        out
    }

    /// Per-facet connected-component labels (vertex-shared connectivity).
    pub(crate) fn component_labels(&self) -> Vec<usize> {
        let mut vertex_facets: HashMap<u32, Vec<usize>> = HashMap::new();
        for (fi, f) in self.facets.iter().enumerate() {
            for &vi in f {
                vertex_facets.entry(vi).or_default().push(fi);
            }
        }
        let mut labels = vec![usize::MAX; self.facets.len()];
        let mut part = 0;
        for start in 0..self.facets.len() {
            if labels[start] != usize::MAX {
                continue;
            }
            let mut queue = VecDeque::from([start]);
            labels[start] = part;
            while let Some(fi) = queue.pop_front() {
                for &vi in &self.facets[fi] {
                    for &other in &vertex_facets[&vi] {
                        if labels[other] == usize::MAX {
                            labels[other] = part;
                            queue.push_back(other);
                        }
                    }
                }
            }
            part += 1;
        }
        labels
    }
}

/// Directed edges of a facet, in traversal order.
pub(crate) fn facet_edges(f: &[u32; 3]) -> [(u32, u32); 3] {
    [(f[0], f[1]), (f[1], f[2]), (f[2], f[0])]
}

/// Canonical key for an edge regardless of direction.
pub(crate) fn undirected(e: (u32, u32)) -> (u32, u32) {
    if e.0 <= e.1 {
        e
    } else {
        (e.1, e.0)
    }
}

/// A unit cube with shared vertices and outward windings, for tests.
#[doc(hidden)]
pub fn unit_cube() -> TriangleMesh {
    let vertices = vec![
        Pointf3::new(0.0, 0.0, 0.0),
        Pointf3::new(1.0, 0.0, 0.0),
        Pointf3::new(1.0, 1.0, 0.0),
        Pointf3::new(0.0, 1.0, 0.0),
        Pointf3::new(0.0, 0.0, 1.0),
        Pointf3::new(1.0, 0.0, 1.0),
        Pointf3::new(1.0, 1.0, 1.0),
        Pointf3::new(0.0, 1.0, 1.0),
    ];
    let facets = vec![
        // bottom (z = 0), facing -Z
        [0, 2, 1],
        [0, 3, 2],
        // top (z = 1), facing +Z
        [4, 5, 6],
        [4, 6, 7],
        // front (y = 0)
        [0, 1, 5],
        [0, 5, 4],
        // right (x = 1)
        [1, 2, 6],
        [1, 6, 5],
        // back (y = 1)
        [2, 3, 7],
        [2, 7, 6],
        // left (x = 0)
        [3, 0, 4],
        [3, 4, 7],
    ];
    TriangleMesh::from_raw(vertices, facets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_volume_and_manifold() {
        let cube = unit_cube();
        assert_relative_eq!(cube.volume(), 1.0);
        assert!(cube.is_manifold());
    }

    #[test]
    fn test_scale_and_translate() {
        let mut cube = unit_cube();
        cube.scale(2.0);
        cube.translate(1.0, 0.0, 0.0);
        let bb = cube.bounding_box();
        assert_relative_eq!(bb.min, Pointf3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(bb.max, Pointf3::new(3.0, 2.0, 2.0));
        assert_relative_eq!(cube.volume(), 8.0);
    }

    #[test]
    fn test_mirror_preserves_volume_sign() {
        let mut cube = unit_cube();
        cube.mirror(Axis::X);
        // Winding is fixed up, so the solid stays positively oriented.
        assert_relative_eq!(cube.volume(), 1.0);
    }

    #[test]
    fn test_rotation_preserves_volume() {
        let mut cube = unit_cube();
        cube.rotate(0.4, Axis::Z);
        assert_relative_eq!(cube.volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_center_around_origin() {
        let mut cube = unit_cube();
        cube.center_around_origin();
        assert_relative_eq!(cube.center(), Pointf3::origin());
    }

    #[test]
    fn test_merge_and_split() {
        let mut pair = unit_cube();
        let mut second = unit_cube();
        second.translate(5.0, 0.0, 0.0);
        pair.merge(&second);
        assert_eq!(pair.facets_count(), 24);
        let parts = pair.split();
        assert_eq!(parts.len(), 2);
        for part in &parts {
            assert_eq!(part.facets_count(), 12);
            assert_eq!(part.vertices.len(), 8);
        }
    }

    #[test]
    fn test_open_mesh_is_not_manifold() {
        let mut cube = unit_cube();
        cube.facets.pop();
        assert!(!cube.is_manifold());
    }
}
