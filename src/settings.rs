//! Animation Runtime Settings
//!
//! Knobs for the per-frame systems. Settings are plain data and can be
//! embedded in a host configuration file:
//!
//! ```rust,ignore
//! use skinned_animation::settings::AnimationSettings;
//!
//! let settings = AnimationSettings::from_json_str(r#"{ "parallel_skinning": false }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{AnimationError, Result};

/// Configuration shared by [`AnimationSystem`](crate::animation::AnimationSystem)
/// and [`SkinningSystem`](crate::skinning::SkinningSystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Run the skin matrix phases on the rayon thread pool.
    ///
    /// When `false` the same phases run sequentially on the calling thread.
    /// Results are identical either way.
    pub parallel_skinning: bool,

    /// Blend the bones of each skeleton on the rayon thread pool once
    /// request resolution has finished.
    pub parallel_blending: bool,

    /// Minimum number of work items handed to a single rayon job.
    pub skinning_min_batch: usize,

    /// Keep a request queued when no bone could receive it this frame
    /// (for example because the bone buffers are not attached yet).
    pub retain_unapplied_requests: bool,

    /// Remove a request whose clip or mask fails to load instead of
    /// retrying it (and logging the failure) every frame.
    pub drop_unresolvable_requests: bool,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            parallel_skinning: true,
            parallel_blending: true,
            skinning_min_batch: 16,
            retain_unapplied_requests: true,
            drop_unresolvable_requests: true,
        }
    }
}

impl AnimationSettings {
    /// Parses settings from JSON. Missing fields take their default value.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.skinning_min_batch == 0 {
            return Err(AnimationError::InvalidSettings(
                "skinning_min_batch must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
