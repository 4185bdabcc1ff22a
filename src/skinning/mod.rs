//! Skinning
//!
//! Converts animated bone world transforms into the per-bone skin matrices
//! consumed by a renderer.

pub mod composer;
pub mod pipeline;

pub use composer::{SkinMatrix, compose, compose_with_root_inverse, invert_root};
pub use pipeline::{BoneHandle, SkinnedMesh, SkinningReport, SkinningSystem, WorldTransforms};
