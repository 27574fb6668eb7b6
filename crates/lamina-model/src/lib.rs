#![warn(missing_docs)]

//! Scene model graph: objects, volumes, instances.
//!
//! A [`Model`] owns [`ModelObject`]s and materials in arenas keyed by
//! [`ObjectKey`]/[`MaterialKey`]; all cross-references are keys, never
//! pointers. An object owns its [`ModelVolume`] meshes plus an append-only
//! log of the transforms applied to them, and [`ModelInstance`]s that place
//! the object in the scene as offset + planar rotation + uniform scale with
//! an exact affine residual.

pub mod error;
pub mod instance;
pub mod model;

pub use error::{ModelError, Result};
pub use instance::ModelInstance;
pub use model::{
    Material, MaterialKey, Model, ModelObject, ModelVolume, ObjectKey, VolumeKind,
};
