//! Facet-plane intersection, loop chaining, and mesh cutting.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use lamina_geometry::{
    triangulate_expolygon, unscale, Axis, ExPolygon, Point, Pointf3, Polygon, SCALING_FACTOR,
};
use lamina_mesh::TriangleMesh;

use crate::error::{Result, SliceError};

/// How an intersection segment relates to the facet that produced it.
///
/// A `General` segment crosses the facet interior; the other kinds mark a
/// whole facet edge lying in the slicing plane, which is what tangent-edge
/// removal keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    General,
    Top,
    Bottom,
    Horizontal,
}

/// One intersection segment, tagged with the mesh topology it came from.
///
/// `a_id`/`b_id` are shared-vertex ids for endpoints sitting exactly on a
/// vertex; `edge_a_id`/`edge_b_id` are facet-edge ids for endpoints produced
/// by crossing an edge. Loop chaining matches these ids, so two adjacent
/// facets connect even when rounding perturbs the endpoint coordinates.
#[derive(Debug, Clone)]
struct IntersectionLine {
    a: Point,
    b: Point,
    a_id: Option<u32>,
    b_id: Option<u32>,
    edge_a_id: Option<u32>,
    edge_b_id: Option<u32>,
    kind: EdgeKind,
    skip: bool,
}

/// The cross-section of a mesh at one plane.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layer {
    /// Plane coordinate along the slicing axis, in unscaled units.
    pub z: f64,
    /// Closed regions: counter-clockwise contours with clockwise holes.
    pub expolygons: Vec<ExPolygon>,
    /// Chains that could not be closed into a loop.
    ///
    /// Nonzero means the mesh surface is broken at this plane; the chains
    /// themselves are dropped.
    pub open_loops: u32,
}

/// Slices a repaired mesh with planes perpendicular to one axis.
///
/// Construction precomputes a facet-to-edge-id table over the shared-vertex
/// topology; slicing itself is read-only and fans out over planes in
/// parallel.
pub struct TriangleMeshSlicer<'a> {
    mesh: &'a TriangleMesh,
    axis: Axis,
    /// Vertices swizzled so the slicing axis is the third coordinate, then
    /// scaled to fixed-point counts.
    scaled: Vec<Pointf3>,
    facets_edges: Vec<[u32; 3]>,
}

/// Rotate coordinates so `axis` becomes the third component.
///
/// Cyclic permutations, so handedness (and facet winding) is preserved.
fn swizzle(axis: Axis, p: &Pointf3) -> Pointf3 {
    match axis {
        Axis::X => Pointf3::new(p.y, p.z, p.x),
        Axis::Y => Pointf3::new(p.z, p.x, p.y),
        Axis::Z => *p,
    }
}

fn unswizzle(axis: Axis, p: &Pointf3) -> Pointf3 {
    match axis {
        Axis::X => Pointf3::new(p.z, p.x, p.y),
        Axis::Y => Pointf3::new(p.y, p.z, p.x),
        Axis::Z => *p,
    }
}

impl<'a> TriangleMeshSlicer<'a> {
    /// Slicer over planes perpendicular to Z.
    pub fn new(mesh: &'a TriangleMesh) -> Result<Self> {
        Self::with_axis(mesh, Axis::Z)
    }

    /// Slicer over planes perpendicular to the given axis.
    pub fn with_axis(mesh: &'a TriangleMesh, axis: Axis) -> Result<Self> {
        if mesh.is_empty() {
            return Err(SliceError::EmptyMesh);
        }
        if !mesh.repaired() {
            return Err(SliceError::MeshNotRepaired);
        }

        // Assign an id to every undirected facet edge. The reversed
        // orientation is looked up first since a well-oriented manifold
        // traverses each shared edge once per direction; the same
        // orientation is also accepted so duplicated topology still maps to
        // one id.
        let mut edges_map: HashMap<(u32, u32), u32> = HashMap::new();
        let mut facets_edges = Vec::with_capacity(mesh.facets_count());
        for f in &mesh.facets {
            let mut ids = [0u32; 3];
            for (j, id) in ids.iter_mut().enumerate() {
                let a = f[j];
                let b = f[(j + 1) % 3];
                *id = if let Some(&e) = edges_map.get(&(b, a)) {
                    e
                } else if let Some(&e) = edges_map.get(&(a, b)) {
                    e
                } else {
                    let e = edges_map.len() as u32;
                    edges_map.insert((a, b), e);
                    e
                };
            }
            facets_edges.push(ids);
        }

        let scaled = mesh
            .vertices
            .iter()
            .map(|p| swizzle(axis, p) / SCALING_FACTOR)
            .collect();

        Ok(Self {
            mesh,
            axis,
            scaled,
            facets_edges,
        })
    }

    /// Slice at every plane coordinate in `z`, in order.
    ///
    /// Planes are independent, so the work is parallelized per plane. A
    /// plane outside the mesh yields an empty layer.
    pub fn slice(&self, z: &[f64]) -> Result<Vec<Layer>> {
        for &zi in z {
            if !zi.is_finite() {
                return Err(SliceError::InvalidPlane(zi));
            }
        }
        Ok(z.par_iter().map(|&zi| self.slice_plane(zi)).collect())
    }

    fn slice_plane(&self, z: f64) -> Layer {
        let scaled_z = z / SCALING_FACTOR;
        let mut lines = Vec::new();
        for facet_idx in 0..self.mesh.facets_count() {
            self.slice_facet(scaled_z, facet_idx, &mut lines);
        }
        let (loops, open_loops) = make_loops(lines);
        Layer {
            z,
            expolygons: make_expolygons(loops),
            open_loops,
        }
    }

    /// Swizzled scaled position of a shared vertex.
    fn vertex(&self, id: u32) -> Pointf3 {
        self.scaled[id as usize]
    }

    /// Sign of the facet normal along the slicing axis.
    fn facet_normal_axis(&self, facet_idx: usize) -> f64 {
        let f = self.mesh.facets[facet_idx];
        let a = self.vertex(f[0]);
        let b = self.vertex(f[1]);
        let c = self.vertex(f[2]);
        (b - a).cross(&(c - a)).z
    }

    /// Intersect one facet with the plane at `scaled_z`.
    ///
    /// Emits zero, one, or (for facets lying in the plane) three segments.
    /// Segments are oriented so the mesh interior lies to their left, which
    /// makes chained contours counter-clockwise.
    fn slice_facet(&self, scaled_z: f64, facet_idx: usize, lines: &mut Vec<IntersectionLine>) {
        let facet = self.mesh.facets[facet_idx];
        let zs = [
            self.vertex(facet[0]).z,
            self.vertex(facet[1]).z,
            self.vertex(facet[2]).z,
        ];
        let min_z = zs[0].min(zs[1]).min(zs[2]);
        let max_z = zs[0].max(zs[1]).max(zs[2]);
        if scaled_z < min_z || scaled_z > max_z {
            return;
        }

        // Start the edge walk at the lowest vertex so every facet emits its
        // segment in a consistent direction.
        let start = if zs[1] == min_z {
            1
        } else if zs[2] == min_z {
            2
        } else {
            0
        };

        // (xy, vertex id, edge id) per intersection endpoint.
        let mut points: Vec<(Point, Option<u32>, Option<u32>)> = Vec::new();
        let mut points_on_layer: Vec<usize> = Vec::new();
        let mut found_horizontal_edge = false;

        for jj in 0..3 {
            let j = (start + jj) % 3;
            let edge_id = self.facets_edges[facet_idx][j];
            let mut a_id = facet[j];
            let mut b_id = facet[(j + 1) % 3];
            let mut a = self.vertex(a_id);
            let mut b = self.vertex(b_id);

            if a.z == scaled_z && b.z == scaled_z {
                // Whole edge lies in the plane.
                let kind = if min_z == max_z {
                    // Fully planar facet; wind bottom facets backwards so
                    // their outline matches the solid's cross-section.
                    if self.facet_normal_axis(facet_idx) < 0.0 {
                        std::mem::swap(&mut a, &mut b);
                        std::mem::swap(&mut a_id, &mut b_id);
                    }
                    EdgeKind::Horizontal
                } else if zs.iter().any(|&v| v < scaled_z) {
                    std::mem::swap(&mut a, &mut b);
                    std::mem::swap(&mut a_id, &mut b_id);
                    EdgeKind::Top
                } else {
                    EdgeKind::Bottom
                };
                lines.push(IntersectionLine {
                    a: Point::from_scaled(a.x, a.y),
                    b: Point::from_scaled(b.x, b.y),
                    a_id: Some(a_id),
                    b_id: Some(b_id),
                    edge_a_id: None,
                    edge_b_id: None,
                    kind,
                    skip: false,
                });
                if kind != EdgeKind::Horizontal {
                    return;
                }
                found_horizontal_edge = true;
            } else if a.z == scaled_z {
                points_on_layer.push(points.len());
                points.push((Point::from_scaled(a.x, a.y), Some(a_id), None));
            } else if b.z == scaled_z {
                points_on_layer.push(points.len());
                points.push((Point::from_scaled(b.x, b.y), Some(b_id), None));
            } else if (a.z < scaled_z) != (b.z < scaled_z) {
                // Edge crosses the plane.
                let t = (scaled_z - b.z) / (a.z - b.z);
                let x = b.x + (a.x - b.x) * t;
                let y = b.y + (a.y - b.y) * t;
                points.push((Point::from_scaled(x, y), None, Some(edge_id)));
            }
        }
        if found_horizontal_edge {
            return;
        }

        if points_on_layer.len() == 2 {
            // A vertex on the plane is seen once per adjacent edge. With no
            // third point the facet only touches the plane at that vertex.
            if points.len() < 3 {
                return;
            }
            points.remove(points_on_layer[1]);
        }

        if points.len() == 2 {
            let (pb, b_id, edge_b_id) = points[0];
            let (pa, a_id, edge_a_id) = points[1];
            lines.push(IntersectionLine {
                a: pa,
                b: pb,
                a_id,
                b_id,
                edge_a_id,
                edge_b_id,
                kind: EdgeKind::General,
                skip: false,
            });
        }
    }

    /// Cut the mesh at the plane, filling `upper` and `lower`.
    ///
    /// Facets strictly on one side are copied whole; facets crossing the
    /// plane split into a triangle on the isolated vertex's side and two
    /// triangles on the other. Both halves get flat caps triangulated from
    /// the section outline, the upper cap facing down into the cut and the
    /// lower cap facing up. The halves come back as unwelded facet soup and
    /// need [`TriangleMesh::repair`].
    pub fn cut(&self, z: f64, upper: &mut TriangleMesh, lower: &mut TriangleMesh) -> Result<()> {
        if !z.is_finite() {
            return Err(SliceError::InvalidPlane(z));
        }
        let scaled_z = z / SCALING_FACTOR;
        let mut upper_lines = Vec::new();
        let mut lower_lines = Vec::new();

        for facet_idx in 0..self.mesh.facets_count() {
            // The section outline feeding each cap: bottom edges bound the
            // upper half, top edges the lower half, interior crossings both.
            let mut lines = Vec::new();
            self.slice_facet(scaled_z, facet_idx, &mut lines);
            for line in lines {
                match line.kind {
                    EdgeKind::Top => lower_lines.push(line),
                    EdgeKind::Bottom => upper_lines.push(line),
                    EdgeKind::Horizontal => {}
                    EdgeKind::General => {
                        lower_lines.push(line.clone());
                        upper_lines.push(line);
                    }
                }
            }

            let facet = self.mesh.facets[facet_idx];
            let v = [
                self.vertex(facet[0]) * SCALING_FACTOR,
                self.vertex(facet[1]) * SCALING_FACTOR,
                self.vertex(facet[2]) * SCALING_FACTOR,
            ];
            let min_z = v[0].z.min(v[1].z).min(v[2].z);
            let max_z = v[0].z.max(v[1].z).max(v[2].z);

            if min_z > z || (min_z == z && max_z > min_z) {
                self.push_facet(upper, [v[0], v[1], v[2]]);
            } else if max_z < z || (max_z == z && max_z > min_z) {
                self.push_facet(lower, [v[0], v[1], v[2]]);
            } else if min_z < z && max_z > z {
                // The isolated vertex is alone on its side of the plane.
                let isolated = if (v[0].z > z) == (v[1].z > z) {
                    2
                } else if (v[1].z > z) == (v[2].z > z) {
                    0
                } else {
                    1
                };
                let v0 = v[isolated];
                let v1 = v[(isolated + 1) % 3];
                let v2 = v[(isolated + 2) % 3];

                let cut_point = |from: &Pointf3, to: &Pointf3| {
                    let t = (z - to.z) / (from.z - to.z);
                    Pointf3::new(to.x + (from.x - to.x) * t, to.y + (from.y - to.y) * t, z)
                };
                let v0v1 = cut_point(&v0, &v1);
                let v2v0 = cut_point(&v0, &v2);

                let triangle = [v0, v0v1, v2v0];
                let quad = [[v1, v2, v0v1], [v2, v2v0, v0v1]];
                if v0.z > z {
                    self.push_facet(upper, triangle);
                    self.push_facet(lower, quad[0]);
                    self.push_facet(lower, quad[1]);
                } else {
                    self.push_facet(upper, quad[0]);
                    self.push_facet(upper, quad[1]);
                    self.push_facet(lower, triangle);
                }
            }
        }

        self.cap(upper, upper_lines, z, true);
        self.cap(lower, lower_lines, z, false);
        Ok(())
    }

    /// Append one facet given in swizzled unscaled coordinates.
    fn push_facet(&self, mesh: &mut TriangleMesh, v: [Pointf3; 3]) {
        let base = mesh.vertices.len() as u32;
        for p in &v {
            mesh.vertices.push(unswizzle(self.axis, p));
        }
        mesh.facets.push([base, base + 1, base + 2]);
        mesh.reset_repair_stats();
    }

    /// Triangulate a section outline into a flat cap at `z`.
    fn cap(&self, mesh: &mut TriangleMesh, lines: Vec<IntersectionLine>, z: f64, facing_down: bool) {
        let (loops, _) = make_loops(lines);
        for expolygon in make_expolygons(loops) {
            for tri in triangulate_expolygon(&expolygon) {
                // Triangles come out counter-clockwise, which faces up; the
                // upper half's cap must face down into the cut.
                let [a, b, c] = if facing_down {
                    [tri[0], tri[2], tri[1]]
                } else {
                    tri
                };
                let lift = |p: Point| Pointf3::new(unscale(p.x), unscale(p.y), z);
                self.push_facet(mesh, [lift(a), lift(b), lift(c)]);
            }
        }
    }
}

/// Chain intersection segments into closed polygons.
///
/// Tangent facet edges are dropped first: two facets meeting the plane in
/// the same edge contribute either redundant or mutually cancelling
/// segments. Chaining then proceeds by edge id, falling back to vertex id.
/// Returns the closed loops and the number of chains that failed to close.
fn make_loops(mut lines: Vec<IntersectionLine>) -> (Vec<Polygon>, u32) {
    let n = lines.len();
    for i in 0..n {
        if lines[i].skip || lines[i].kind == EdgeKind::General {
            continue;
        }
        let (kind_i, a_i, b_i) = (lines[i].kind, lines[i].a_id, lines[i].b_id);
        for j in i + 1..n {
            if lines[j].skip || lines[j].kind == EdgeKind::General {
                continue;
            }
            if a_i == lines[j].a_id && b_i == lines[j].b_id {
                lines[j].skip = true;
                // Same direction twice: a ridge or valley tangent to the
                // plane, which contributes nothing to the outline. With
                // opposite facet kinds one copy survives.
                if kind_i == lines[j].kind {
                    lines[i].skip = true;
                    break;
                }
            } else if a_i == lines[j].b_id && b_i == lines[j].a_id {
                // Opposite directions: the edge joins two coplanar facets.
                if kind_i == EdgeKind::Horizontal && lines[j].kind == EdgeKind::Horizontal {
                    lines[i].skip = true;
                    lines[j].skip = true;
                    break;
                }
            }
        }
    }

    let mut by_edge_a: HashMap<u32, Vec<usize>> = HashMap::new();
    let mut by_a: HashMap<u32, Vec<usize>> = HashMap::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.skip {
            continue;
        }
        if let Some(e) = line.edge_a_id {
            by_edge_a.entry(e).or_default().push(idx);
        }
        if let Some(v) = line.a_id {
            by_a.entry(v).or_default().push(idx);
        }
    }

    let mut loops = Vec::new();
    let mut open_loops = 0u32;
    loop {
        let first = match lines.iter().position(|l| !l.skip) {
            Some(i) => i,
            None => break,
        };
        lines[first].skip = true;
        let mut chain = vec![first];
        loop {
            let last = chain[chain.len() - 1];
            let mut next = None;
            if let Some(eb) = lines[last].edge_b_id {
                if let Some(candidates) = by_edge_a.get(&eb) {
                    next = candidates.iter().copied().find(|&c| !lines[c].skip);
                }
            }
            if next.is_none() {
                if let Some(vb) = lines[last].b_id {
                    if let Some(candidates) = by_a.get(&vb) {
                        next = candidates.iter().copied().find(|&c| !lines[c].skip);
                    }
                }
            }
            match next {
                Some(nl) => {
                    lines[nl].skip = true;
                    chain.push(nl);
                }
                None => {
                    let head = &lines[chain[0]];
                    let tail = &lines[last];
                    let closed = (head.edge_a_id.is_some() && head.edge_a_id == tail.edge_b_id)
                        || (head.a_id.is_some() && head.a_id == tail.b_id);
                    if closed {
                        loops.push(Polygon::new(chain.iter().map(|&i| lines[i].a).collect()));
                    } else {
                        open_loops += 1;
                    }
                    break;
                }
            }
        }
    }
    (loops, open_loops)
}

/// Nest loops into expolygons by containment.
///
/// Counter-clockwise loops become contours; each clockwise loop becomes a
/// hole of the smallest contour containing its first point. Clockwise loops
/// contained by nothing are dropped as invalid.
fn make_expolygons(loops: Vec<Polygon>) -> Vec<ExPolygon> {
    let mut slices: Vec<ExPolygon> = Vec::new();
    let mut areas: Vec<f64> = Vec::new();
    let mut holes: Vec<Polygon> = Vec::new();
    for polygon in loops {
        let area = polygon.area();
        if area >= 0.0 {
            areas.push(area);
            slices.push(ExPolygon::from_contour(polygon));
        } else {
            holes.push(polygon);
        }
    }
    for hole in holes {
        let mut best: Option<usize> = None;
        for (i, slice) in slices.iter().enumerate() {
            if slice.contour.contains(&hole.first_point())
                && best.map_or(true, |b| areas[i] < areas[b])
            {
                best = Some(i);
            }
        }
        if let Some(i) = best {
            slices[i].holes.push(hole);
        }
    }
    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lamina_mesh::mesh::unit_cube;

    fn repaired_cube() -> TriangleMesh {
        let mut cube = unit_cube();
        cube.repair();
        cube
    }

    /// Unscaled area of a layer in mm^2.
    fn layer_area(layer: &Layer) -> f64 {
        layer.expolygons.iter().map(ExPolygon::area).sum::<f64>()
            * SCALING_FACTOR
            * SCALING_FACTOR
    }

    #[test]
    fn test_slicer_requires_repaired_mesh() {
        let cube = unit_cube();
        assert!(matches!(
            TriangleMeshSlicer::new(&cube),
            Err(SliceError::MeshNotRepaired)
        ));
    }

    #[test]
    fn test_slice_cube_mid_height() {
        let cube = repaired_cube();
        let slicer = TriangleMeshSlicer::new(&cube).unwrap();
        let layers = slicer.slice(&[0.5]).unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].expolygons.len(), 1);
        assert_eq!(layers[0].open_loops, 0);
        assert!(layers[0].expolygons[0].contour.is_counter_clockwise());
        assert_relative_eq!(layer_area(&layers[0]), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_slice_multiple_planes() {
        let cube = repaired_cube();
        let slicer = TriangleMeshSlicer::new(&cube).unwrap();
        let layers = slicer.slice(&[0.25, 0.5, 0.75, 2.0]).unwrap();
        assert_eq!(layers.len(), 4);
        for layer in &layers[..3] {
            assert_relative_eq!(layer_area(layer), 1.0, epsilon = 1e-6);
        }
        // A plane above the mesh yields an empty layer.
        assert!(layers[3].expolygons.is_empty());
    }

    #[test]
    fn test_slice_along_x() {
        let mut cube = unit_cube();
        cube.scale_versor(&lamina_geometry::Vectorf3::new(2.0, 1.0, 1.0));
        cube.repair();
        let slicer = TriangleMeshSlicer::with_axis(&cube, Axis::X).unwrap();
        let layers = slicer.slice(&[1.0]).unwrap();
        assert_eq!(layers[0].expolygons.len(), 1);
        assert_relative_eq!(layer_area(&layers[0]), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_slice_hollow_cube_has_hole() {
        // An inverted half-size cube inside the unit cube makes it hollow.
        let mut hollow = unit_cube();
        let mut cavity = unit_cube();
        cavity.scale(0.5);
        cavity.translate(0.25, 0.25, 0.25);
        for f in &mut cavity.facets {
            f.swap(1, 2);
        }
        hollow.merge(&cavity);
        hollow.repair();
        assert_eq!(hollow.stats().number_of_parts, 2);

        let slicer = TriangleMeshSlicer::new(&hollow).unwrap();
        let layers = slicer.slice(&[0.5]).unwrap();
        assert_eq!(layers[0].expolygons.len(), 1);
        assert_eq!(layers[0].expolygons[0].holes.len(), 1);
        assert_relative_eq!(layer_area(&layers[0]), 1.0 - 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_slice_disjoint_parts() {
        let mut pair = repaired_cube();
        let mut second = unit_cube();
        second.translate(3.0, 0.0, 0.0);
        pair.merge(&second);
        pair.repair();
        let slicer = TriangleMeshSlicer::new(&pair).unwrap();
        let layers = slicer.slice(&[0.5]).unwrap();
        assert_eq!(layers[0].expolygons.len(), 2);
        assert_relative_eq!(layer_area(&layers[0]), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_plane_through_apex_is_empty() {
        // A square pyramid touched only at its apex.
        let vertices = vec![
            Pointf3::new(0.0, 0.0, 0.0),
            Pointf3::new(1.0, 0.0, 0.0),
            Pointf3::new(1.0, 1.0, 0.0),
            Pointf3::new(0.0, 1.0, 0.0),
            Pointf3::new(0.5, 0.5, 1.0),
        ];
        let facets = vec![
            [0, 2, 1],
            [0, 3, 2],
            [0, 1, 4],
            [1, 2, 4],
            [2, 3, 4],
            [3, 0, 4],
        ];
        let mut pyramid = TriangleMesh::from_raw(vertices, facets);
        pyramid.repair();
        let slicer = TriangleMeshSlicer::new(&pyramid).unwrap();
        let layers = slicer.slice(&[1.0, 0.5]).unwrap();
        assert!(layers[0].expolygons.is_empty());
        assert_eq!(layers[0].open_loops, 0);
        assert_relative_eq!(layer_area(&layers[1]), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_cut_cube_in_half() {
        let cube = repaired_cube();
        let slicer = TriangleMeshSlicer::new(&cube).unwrap();
        let mut upper = TriangleMesh::new();
        let mut lower = TriangleMesh::new();
        slicer.cut(0.5, &mut upper, &mut lower).unwrap();
        upper.repair();
        lower.repair();
        assert!(upper.is_manifold());
        assert!(lower.is_manifold());
        assert_relative_eq!(upper.volume(), 0.5, epsilon = 1e-9);
        assert_relative_eq!(lower.volume(), 0.5, epsilon = 1e-9);
        let ub = upper.bounding_box();
        assert_relative_eq!(ub.min.z, 0.5);
        assert_relative_eq!(ub.max.z, 1.0);
    }

    #[test]
    fn test_cut_caps_section_before_repair() {
        // The halves come back as facet soup, but the section caps are
        // already present; repair must not need to fill the cut boundary.
        let cube = repaired_cube();
        let slicer = TriangleMeshSlicer::new(&cube).unwrap();
        let mut upper = TriangleMesh::new();
        let mut lower = TriangleMesh::new();
        slicer.cut(0.5, &mut upper, &mut lower).unwrap();
        let in_plane = |mesh: &TriangleMesh| {
            (0..mesh.facets_count())
                .filter(|&i| {
                    mesh.facet_vertices(i)
                        .iter()
                        .all(|v| (v.z - 0.5).abs() < 1e-9)
                })
                .count()
        };
        assert!(in_plane(&upper) >= 2);
        assert!(in_plane(&lower) >= 2);
        upper.repair();
        lower.repair();
        assert_eq!(upper.stats().facets_added, 0);
        assert_eq!(lower.stats().facets_added, 0);
    }

    #[test]
    fn test_cut_through_vertex_plane() {
        // Plane through the cube's bottom face: everything goes up.
        let cube = repaired_cube();
        let slicer = TriangleMeshSlicer::new(&cube).unwrap();
        let mut upper = TriangleMesh::new();
        let mut lower = TriangleMesh::new();
        slicer.cut(0.0, &mut upper, &mut lower).unwrap();
        upper.repair();
        assert_relative_eq!(upper.volume(), 1.0, epsilon = 1e-9);
        assert!(lower.is_empty() || lower.volume().abs() < 1e-9);
    }

    #[test]
    fn test_invalid_plane_is_rejected() {
        let cube = repaired_cube();
        let slicer = TriangleMeshSlicer::new(&cube).unwrap();
        assert!(slicer.slice(&[f64::NAN]).is_err());
    }
}
