#![warn(missing_docs)]

//! Plane slicing of triangle meshes.
//!
//! [`TriangleMeshSlicer`] intersects a repaired [`lamina_mesh::TriangleMesh`]
//! with horizontal planes, chaining the per-facet intersection segments into
//! closed polygons by mesh topology (shared edge and vertex ids) so that
//! exact coincidence of endpoints is never required. It also cuts a mesh in
//! two at a plane, capping both halves watertight.

pub mod error;
pub mod slice;

pub use error::{Result, SliceError};
pub use slice::{Layer, TriangleMeshSlicer};
