//! Error Types
//!
//! This module defines the error types used by the asset and configuration
//! layers of the animation runtime.
//!
//! # Overview
//!
//! The main error type [`AnimationError`] covers:
//! - Clip and bone mask lookups that fail to resolve
//! - Baked curves that violate the keyframe invariants
//! - I/O and JSON failures of the file-backed asset source
//! - Skinned meshes whose bind poses do not match their bones
//! - Invalid runtime settings
//!
//! The per-frame systems never return errors. Asset failures are reported
//! through `log` and the affected request is skipped.
//!
//! ```rust,ignore
//! use skinned_animation::errors::{AnimationError, Result};
//!
//! fn load() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the animation runtime.
#[derive(Error, Debug)]
pub enum AnimationError {
    // ========================================================================
    // Asset Resolution Errors
    // ========================================================================
    /// No baked clip is registered under the given name.
    #[error("Animation clip not found: {0}")]
    ClipNotFound(String),

    /// No bone mask is registered under the given name.
    #[error("Bone mask not found: {0}")]
    MaskNotFound(String),

    // ========================================================================
    // Baked Data Errors
    // ========================================================================
    /// A baked curve breaks the keyframe invariants.
    #[error("Invalid curve in clip '{clip}' (bone {bone}): {reason}")]
    InvalidCurve {
        /// Name of the clip being baked
        clip: String,
        /// Bone slot of the offending curve
        bone: usize,
        /// What was wrong with it
        reason: String,
    },

    /// A curve was stored at a bone slot that does not match its own index.
    #[error("Bone index mismatch in clip '{clip}': slot {expected} holds curve for bone {found}")]
    BoneIndexMismatch {
        /// Name of the clip being baked
        clip: String,
        /// Slot the curve was found at
        expected: usize,
        /// Bone index recorded on the curve
        found: i32,
    },

    // ========================================================================
    // Skinning Errors
    // ========================================================================
    /// A skinned mesh was built with a bind pose count differing from its bone count.
    #[error("Skinned mesh has {bones} bones but {bind_poses} inverse bind poses")]
    SkinLengthMismatch {
        /// Number of bone handles
        bones: usize,
        /// Number of inverse bind matrices
        bind_poses: usize,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Settings failed validation.
    #[error("Invalid animation settings: {0}")]
    InvalidSettings(String),
}

/// Alias for `Result<T, AnimationError>`.
pub type Result<T> = std::result::Result<T, AnimationError>;
