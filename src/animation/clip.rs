use std::sync::Arc;

use glam::Vec4;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::animation::curve::{Curve, CurveRef};
use crate::animation::values::{ChannelGroup, Interpolatable, Keyframe, WrapType};
use crate::errors::{AnimationError, Result};

// ============================================================================
// Asset data (produced by the offline baker)
// ============================================================================

/// Keyframes baked for one bone and one channel group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveAsset {
    pub bone_index: i32,
    pub keyframes: Vec<Keyframe>,
}

/// A baked clip as stored on disk.
///
/// Both curve arrays are indexed by bone; a `None` slot means the bone has
/// no curve for that channel group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipAsset {
    pub length: f32,
    #[serde(default)]
    pub wrap_type: WrapType,
    #[serde(default)]
    pub position_scale_curves: Vec<Option<CurveAsset>>,
    #[serde(default)]
    pub rotation_curves: Vec<Option<CurveAsset>>,
}

/// Bone indices allowed to receive a masked request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneMaskAsset {
    pub bones: Vec<i32>,
}

// ============================================================================
// Runtime data
// ============================================================================

/// Parsed clip as held by the cache.
#[derive(Debug, Clone)]
pub struct BakedClip {
    pub name: String,
    pub length: f32,
    pub wrap_type: WrapType,
    position_scale: Vec<Option<CurveRef>>,
    rotation: Vec<Option<CurveRef>>,
}

impl BakedClip {
    /// Validates every curve of `asset` and converts it into shared handles.
    pub fn bake(name: &str, asset: ClipAsset) -> Result<Self> {
        if !asset.length.is_finite() || asset.length < 0.0 {
            return Err(AnimationError::InvalidCurve {
                clip: name.to_string(),
                bone: 0,
                reason: format!("clip length {} is not a finite non-negative number", asset.length),
            });
        }

        let position_scale = bake_curves(name, ChannelGroup::PositionScale, asset.position_scale_curves)?;
        let rotation = bake_curves(name, ChannelGroup::Rotation, asset.rotation_curves)?;

        Ok(Self {
            name: name.to_string(),
            length: asset.length,
            wrap_type: asset.wrap_type,
            position_scale,
            rotation,
        })
    }

    /// Curve for `bone` in `channel`, if the clip animates it.
    #[must_use]
    pub fn curve(&self, channel: ChannelGroup, bone: usize) -> Option<&CurveRef> {
        let curves = match channel {
            ChannelGroup::PositionScale => &self.position_scale,
            ChannelGroup::Rotation => &self.rotation,
        };
        curves.get(bone).and_then(Option::as_ref)
    }

    /// Number of bone slots (the longer of the two curve arrays).
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.position_scale.len().max(self.rotation.len())
    }

    /// Total number of baked curves across both channel groups.
    #[must_use]
    pub fn curve_count(&self) -> usize {
        self.position_scale.iter().flatten().count() + self.rotation.iter().flatten().count()
    }
}

fn bake_curves(
    clip: &str,
    channel: ChannelGroup,
    curves: Vec<Option<CurveAsset>>,
) -> Result<Vec<Option<CurveRef>>> {
    curves
        .into_iter()
        .enumerate()
        .map(|(slot, curve)| {
            curve
                .map(|curve| {
                    if usize::try_from(curve.bone_index).ok() != Some(slot) {
                        return Err(AnimationError::BoneIndexMismatch {
                            clip: clip.to_string(),
                            expected: slot,
                            found: curve.bone_index,
                        });
                    }
                    validate_keyframes(clip, slot, &curve.keyframes)?;
                    Ok(Arc::new(Curve::new(curve.bone_index, channel, curve.keyframes)))
                })
                .transpose()
        })
        .collect()
}

fn validate_keyframes(clip: &str, bone: usize, keyframes: &[Keyframe]) -> Result<()> {
    let invalid = |reason: String| AnimationError::InvalidCurve {
        clip: clip.to_string(),
        bone,
        reason,
    };

    let Some(first) = keyframes.first() else {
        return Err(invalid("curve has no keyframes".to_string()));
    };
    if first.time != 0.0 {
        return Err(invalid(format!("first keyframe at {} instead of 0", first.time)));
    }

    for (i, key) in keyframes.iter().enumerate() {
        if !key.time.is_finite()
            || !Interpolatable::is_finite(&key.value)
            || !Interpolatable::is_finite(&key.in_tangent)
            || !Interpolatable::is_finite(&key.out_tangent)
        {
            return Err(invalid(format!("keyframe {i} contains non-finite data")));
        }
        if i > 0 && key.time < keyframes[i - 1].time {
            return Err(invalid(format!("keyframe {i} goes back in time")));
        }
    }
    Ok(())
}

/// Set of bones eligible for a masked request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoneMask {
    allowed: FxHashSet<usize>,
}

impl BoneMask {
    #[must_use]
    pub fn new(bones: impl IntoIterator<Item = usize>) -> Self {
        Self {
            allowed: bones.into_iter().collect(),
        }
    }

    /// Negative indices in the asset cannot address a bone and are dropped.
    #[must_use]
    pub fn from_asset(name: &str, asset: &BoneMaskAsset) -> Self {
        let mut allowed = FxHashSet::default();
        for &bone in &asset.bones {
            match usize::try_from(bone) {
                Ok(index) => {
                    allowed.insert(index);
                }
                Err(_) => log::warn!("Bone mask '{name}' lists invalid bone index {bone}, ignoring"),
            }
        }
        Self { allowed }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, bone: usize) -> bool {
        self.allowed.contains(&bone)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Assembles a [`ClipAsset`] in code.
///
/// ```rust,ignore
/// let idle = ClipBuilder::new(1.0, WrapType::Loop)
///     .constant(0, ChannelGroup::PositionScale, Vec4::new(0.0, 1.0, 0.0, 1.0))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ClipBuilder {
    asset: ClipAsset,
}

impl ClipBuilder {
    #[must_use]
    pub fn new(length: f32, wrap_type: WrapType) -> Self {
        Self {
            asset: ClipAsset {
                length,
                wrap_type,
                position_scale_curves: Vec::new(),
                rotation_curves: Vec::new(),
            },
        }
    }

    /// Adds (or replaces) the curve of `bone` in `channel`.
    #[must_use]
    pub fn curve(mut self, bone: usize, channel: ChannelGroup, keyframes: Vec<Keyframe>) -> Self {
        let curves = match channel {
            ChannelGroup::PositionScale => &mut self.asset.position_scale_curves,
            ChannelGroup::Rotation => &mut self.asset.rotation_curves,
        };
        if curves.len() <= bone {
            curves.resize(bone + 1, None);
        }
        curves[bone] = Some(CurveAsset {
            bone_index: bone as i32,
            keyframes,
        });
        self
    }

    /// Adds a single-key curve.
    #[must_use]
    pub fn constant(self, bone: usize, channel: ChannelGroup, value: Vec4) -> Self {
        self.curve(bone, channel, vec![Keyframe::new(0.0, value)])
    }

    #[must_use]
    pub fn build(self) -> ClipAsset {
        self.asset
    }
}
