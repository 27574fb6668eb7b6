//! Error types for model graph operations.

use thiserror::Error;

/// Errors that can occur while editing or cutting model objects.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A transform with zero determinant cannot be applied (it could never
    /// be undone).
    #[error("transformation is singular and cannot be applied")]
    SingularTransform,

    /// The object has no volumes to operate on.
    #[error("object has no volumes")]
    EmptyObject,

    /// The referenced object is not in the model.
    #[error("no such object in model")]
    UnknownObject,

    /// A slicing operation on a volume mesh failed.
    #[error(transparent)]
    Slice(#[from] lamina_slice::SliceError),
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
