//! Mesh repair: welding, orientation, hole patching.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use lamina_geometry::EPSILON;

use crate::mesh::{facet_edges, undirected, TriangleMesh};

/// Counters describing what [`TriangleMesh::repair`] had to do.
///
/// Every intervention increments a counter; input defects are reported here
/// as data, never as errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairStats {
    /// Facets dropped for having repeated vertices or zero area.
    pub degenerate_facets: u32,
    /// Facet corners re-pointed at a nearby (within tolerance) vertex.
    pub edges_fixed: u32,
    /// Facets removed, degenerate ones included.
    pub facets_removed: u32,
    /// Facets synthesized to close boundary loops.
    pub facets_added: u32,
    /// Facets whose winding was flipped.
    pub facets_reversed: u32,
    /// Edges left with inconsistent winding after orientation propagation.
    pub backwards_edges: u32,
    /// Connected components in the repaired mesh.
    pub number_of_parts: u32,
}

impl RepairStats {
    /// True when any defect counter is nonzero.
    pub fn needed_repair(&self) -> bool {
        self.degenerate_facets > 0
            || self.edges_fixed > 0
            || self.facets_removed > 0
            || self.facets_added > 0
            || self.facets_reversed > 0
            || self.backwards_edges > 0
    }
}

impl TriangleMesh {
    /// Repair the mesh in place.
    ///
    /// Stages, in order: weld coincident vertices (exact, then within
    /// [`EPSILON`]); drop degenerate facets; propagate a consistent winding
    /// across each connected component; close boundary loops with fan
    /// facets; flip the whole mesh if its signed volume came out negative.
    /// Counters for every stage land in [`TriangleMesh::stats`]. Running
    /// repair on an already repaired mesh records all-zero counters.
    pub fn repair(&mut self) {
        let mut stats = RepairStats::default();
        self.weld_vertices(&mut stats);
        self.remove_degenerate_facets(&mut stats);
        self.fix_orientation(&mut stats);
        self.fill_holes(&mut stats);
        if self.volume() < 0.0 {
            for f in &mut self.facets {
                f.swap(1, 2);
            }
            stats.facets_reversed += self.facets.len() as u32;
        }
        stats.number_of_parts = self
            .component_labels()
            .iter()
            .copied()
            .max()
            .map_or(0, |m| m as u32 + 1);
        self.stats = stats;
        self.repaired = true;
    }

    /// Merge coincident vertices and drop the unused ones.
    fn weld_vertices(&mut self, stats: &mut RepairStats) {
        // Exact pass: identical bit patterns collapse silently, since
        // facet-soup sources duplicate every shared vertex by construction.
        let mut seen: HashMap<[u64; 3], u32> = HashMap::new();
        let mut exact = vec![0u32; self.vertices.len()];
        let mut kept: Vec<usize> = Vec::with_capacity(self.vertices.len());
        for (i, v) in self.vertices.iter().enumerate() {
            let key = [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()];
            let next = kept.len() as u32;
            exact[i] = *seen.entry(key).or_insert_with(|| {
                kept.push(i);
                next
            });
        }

        // Nearby pass over the survivors: snap to a grid of EPSILON cells
        // and merge anything within EPSILON of an earlier vertex.
        let inv_cell = 1.0 / EPSILON;
        let mut grid: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
        let mut near = vec![0u32; kept.len()];
        for (i, &orig) in kept.iter().enumerate() {
            let v = self.vertices[orig];
            let cell = (
                (v.x * inv_cell).round() as i64,
                (v.y * inv_cell).round() as i64,
                (v.z * inv_cell).round() as i64,
            );
            let mut target = i as u32;
            'search: for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let key = (cell.0 + dx, cell.1 + dy, cell.2 + dz);
                        if let Some(bucket) = grid.get(&key) {
                            for &j in bucket {
                                let u = self.vertices[kept[j as usize]];
                                if (u - v).norm() <= EPSILON {
                                    target = j;
                                    break 'search;
                                }
                            }
                        }
                    }
                }
            }
            near[i] = target;
            if target == i as u32 {
                grid.entry(cell).or_default().push(i as u32);
            }
        }

        // Rebuild the vertex array from weld representatives and remap
        // facets through both passes.
        let mut compact: Vec<u32> = vec![u32::MAX; kept.len()];
        let mut vertices = Vec::new();
        for (i, &orig) in kept.iter().enumerate() {
            if near[i] == i as u32 {
                compact[i] = vertices.len() as u32;
                vertices.push(self.vertices[orig]);
            }
        }
        for f in &mut self.facets {
            for idx in f.iter_mut() {
                let after_exact = exact[*idx as usize];
                let representative = near[after_exact as usize];
                if representative != after_exact {
                    stats.edges_fixed += 1;
                }
                *idx = compact[representative as usize];
            }
        }
        self.vertices = vertices;
    }

    fn remove_degenerate_facets(&mut self, stats: &mut RepairStats) {
        let vertices = &self.vertices;
        let before = self.facets.len();
        self.facets.retain(|f| {
            if f[0] == f[1] || f[1] == f[2] || f[2] == f[0] {
                return false;
            }
            let a = vertices[f[0] as usize];
            let b = vertices[f[1] as usize];
            let c = vertices[f[2] as usize];
            (b - a).cross(&(c - a)).norm() > 0.0
        });
        let dropped = (before - self.facets.len()) as u32;
        stats.degenerate_facets += dropped;
        stats.facets_removed += dropped;
    }

    /// Propagate one winding across each component, flipping dissenters.
    ///
    /// The first facet reached in a component is taken as reference; the
    /// final volume check re-orients globally inside-out components.
    fn fix_orientation(&mut self, stats: &mut RepairStats) {
        // dir is true when the facet traverses the undirected edge
        // low-to-high; two facets agree across an edge when their current
        // traversal directions differ.
        let mut edge_facets: HashMap<(u32, u32), Vec<(usize, bool)>> = HashMap::new();
        for (fi, f) in self.facets.iter().enumerate() {
            for (u, v) in facet_edges(f) {
                edge_facets
                    .entry(undirected((u, v)))
                    .or_default()
                    .push((fi, u < v));
            }
        }

        let n = self.facets.len();
        let mut visited = vec![false; n];
        let mut flipped = vec![false; n];
        for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut queue = VecDeque::from([start]);
            while let Some(fi) = queue.pop_front() {
                for (u, v) in facet_edges(&self.facets[fi]) {
                    let key = undirected((u, v));
                    let incident = &edge_facets[&key];
                    if incident.len() != 2 {
                        continue;
                    }
                    for &(gi, dir_g) in incident {
                        if gi == fi {
                            continue;
                        }
                        let dir_f = (u < v) != flipped[fi];
                        let cur_g = dir_g != flipped[gi];
                        if !visited[gi] {
                            visited[gi] = true;
                            if cur_g == dir_f {
                                flipped[gi] = !flipped[gi];
                                stats.facets_reversed += 1;
                            }
                            queue.push_back(gi);
                        } else if cur_g == dir_f {
                            // A cycle whose windings cannot all agree.
                            stats.backwards_edges += 1;
                        }
                    }
                }
            }
        }
        for (f, &flip) in self.facets.iter_mut().zip(&flipped) {
            if flip {
                f.swap(1, 2);
            }
        }
    }

    /// Close boundary loops with fan facets.
    fn fill_holes(&mut self, stats: &mut RepairStats) {
        let mut counts: HashMap<(u32, u32), u32> = HashMap::new();
        for f in &self.facets {
            for e in facet_edges(f) {
                *counts.entry(undirected(e)).or_insert(0) += 1;
            }
        }
        // Boundary edges keep their facet's direction; for an outward-wound
        // mesh they chain into directed loops.
        let mut successors: HashMap<u32, Vec<u32>> = HashMap::new();
        for f in &self.facets {
            for (u, v) in facet_edges(f) {
                if counts[&undirected((u, v))] == 1 {
                    successors.entry(u).or_default().push(v);
                }
            }
        }
        let starts: Vec<u32> = successors.keys().copied().collect();
        for start in starts {
            let mut loop_vertices = vec![start];
            let mut current = start;
            let closed = loop {
                let next = match successors.get_mut(&current).and_then(Vec::pop) {
                    Some(v) => v,
                    None => break false,
                };
                if next == start {
                    break true;
                }
                loop_vertices.push(next);
                current = next;
            };
            if !closed || loop_vertices.len() < 3 {
                continue;
            }
            // Patch facets traverse each boundary edge in reverse.
            for i in 1..loop_vertices.len() - 1 {
                self.facets
                    .push([loop_vertices[0], loop_vertices[i + 1], loop_vertices[i]]);
                stats.facets_added += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::unit_cube;
    use approx::assert_relative_eq;

    /// The unit cube as an unwelded facet soup, 36 vertices.
    fn cube_soup() -> TriangleMesh {
        let cube = unit_cube();
        let mut vertices = Vec::with_capacity(36);
        let mut facets = Vec::with_capacity(12);
        for i in 0..cube.facets_count() {
            let [a, b, c] = cube.facet_vertices(i);
            let base = vertices.len() as u32;
            vertices.extend([a, b, c]);
            facets.push([base, base + 1, base + 2]);
        }
        TriangleMesh::from_raw(vertices, facets)
    }

    #[test]
    fn test_weld_cube_soup_to_eight_vertices() {
        let mut mesh = cube_soup();
        mesh.repair();
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.facets_count(), 12);
        assert!(mesh.is_manifold());
        assert_relative_eq!(mesh.volume(), 1.0);
        assert_eq!(mesh.stats().number_of_parts, 1);
    }

    #[test]
    fn test_repair_is_idempotent() {
        let mut mesh = cube_soup();
        mesh.repair();
        mesh.repair();
        assert!(!mesh.needed_repair());
        assert_eq!(mesh.stats().number_of_parts, 1);
    }

    #[test]
    fn test_reversed_facet_is_flipped_back() {
        let mut mesh = unit_cube();
        mesh.facets[5].swap(1, 2);
        mesh.repair();
        assert!(mesh.stats().facets_reversed >= 1);
        assert_relative_eq!(mesh.volume(), 1.0);
        assert!(mesh.is_manifold());
    }

    #[test]
    fn test_inside_out_mesh_is_reoriented() {
        let mut mesh = unit_cube();
        for f in &mut mesh.facets {
            f.swap(1, 2);
        }
        mesh.repair();
        assert_relative_eq!(mesh.volume(), 1.0);
        assert_eq!(mesh.stats().facets_reversed, 12);
    }

    #[test]
    fn test_hole_is_filled() {
        let mut mesh = unit_cube();
        mesh.facets.pop();
        mesh.repair();
        assert!(mesh.stats().facets_added >= 1);
        assert!(mesh.is_manifold());
        assert_relative_eq!(mesh.volume(), 1.0);
    }

    #[test]
    fn test_degenerate_facet_is_dropped() {
        let mut mesh = unit_cube();
        mesh.facets.push([0, 0, 1]);
        mesh.repair();
        assert_eq!(mesh.stats().degenerate_facets, 1);
        assert_eq!(mesh.facets_count(), 12);
    }

    #[test]
    fn test_two_parts_counted() {
        let mut mesh = unit_cube();
        let mut second = unit_cube();
        second.translate(3.0, 0.0, 0.0);
        mesh.merge(&second);
        mesh.repair();
        assert_eq!(mesh.stats().number_of_parts, 2);
        assert_eq!(mesh.split().len(), 2);
    }

    #[test]
    fn test_nearby_vertices_welded() {
        let mut mesh = cube_soup();
        // Nudge one duplicated corner by less than the tolerance.
        mesh.vertices[0].x += EPSILON / 2.0;
        mesh.repair();
        assert_eq!(mesh.vertices.len(), 8);
        assert!(mesh.stats().edges_fixed >= 1);
    }
}
