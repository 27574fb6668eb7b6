//! Error types for the slicing engine.

use thiserror::Error;

/// Errors that can occur while slicing or cutting a mesh.
#[derive(Error, Debug)]
pub enum SliceError {
    /// Mesh has no triangles.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Mesh was never repaired; slicing relies on welded topology.
    #[error("mesh must be repaired before slicing")]
    MeshNotRepaired,

    /// A slicing plane coordinate is NaN or infinite.
    #[error("slicing plane at z={0} is not finite")]
    InvalidPlane(f64),
}

/// Result type for slicing operations.
pub type Result<T> = std::result::Result<T, SliceError>;
