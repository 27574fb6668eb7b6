#![warn(missing_docs)]

//! Triangle mesh storage and manifold repair.
//!
//! A [`TriangleMesh`] is a shared-vertex store: one vertex array and one
//! facet array of index triples. Meshes arrive from tessellated sources with
//! duplicated vertices and assorted defects; [`TriangleMesh::repair`] welds,
//! re-orients and patches them, reporting every intervention through
//! [`RepairStats`] counters rather than errors.

pub mod mesh;
pub mod repair;

pub use mesh::TriangleMesh;
pub use repair::RepairStats;
