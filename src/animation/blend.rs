//! Layer Blending
//!
//! Turns a bone's sorted track list into one value per channel group.
//!
//! Tracks are walked in list order, which is `(channel group, layer
//! ascending)`. Within a group the lowest layer is taken as-is and every
//! higher layer is mixed over the accumulated value by its layer weight
//! (see [`Track::layer_weight`]). Outside its fade window a higher layer
//! therefore fully overrides the layers below it. A change of channel group
//! between neighbours closes the group.

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::animation::rig::BoneController;
use crate::animation::track::{Track, TrackList};
use crate::animation::values::{ChannelGroup, Interpolatable};

/// Animated local transform of one bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPose {
    pub position: Vec3,
    pub scale: f32,
    /// Written as blended, not renormalized.
    pub rotation: Quat,
}

impl Default for LocalPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: 1.0,
            rotation: Quat::IDENTITY,
        }
    }
}

impl LocalPose {
    /// Writes a resolved channel value into the pose.
    ///
    /// `PositionScale` sets `xyz` as position and `w` as uniform scale;
    /// `Rotation` copies the quaternion components.
    pub fn apply(&mut self, channel: ChannelGroup, value: Vec4) {
        match channel {
            ChannelGroup::PositionScale => {
                self.position = value.truncate();
                self.scale = value.w;
            }
            ChannelGroup::Rotation => {
                self.rotation = Quat::from_vec4(value);
            }
        }
    }

    /// Local matrix `T * R * S`. The rotation is normalized here; a degenerate
    /// quaternion is treated as identity.
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        let rotation = if self.rotation.length_squared() > f32::EPSILON {
            self.rotation.normalize()
        } else {
            Quat::IDENTITY
        };
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, self.position)
    }
}

/// Blended value per channel group; `None` for groups without tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolvedPose {
    pub position_scale: Option<Vec4>,
    pub rotation: Option<Vec4>,
}

impl ResolvedPose {
    #[must_use]
    pub fn get(&self, channel: ChannelGroup) -> Option<Vec4> {
        match channel {
            ChannelGroup::PositionScale => self.position_scale,
            ChannelGroup::Rotation => self.rotation,
        }
    }

    fn set(&mut self, channel: ChannelGroup, value: Vec4) {
        match channel {
            ChannelGroup::PositionScale => self.position_scale = Some(value),
            ChannelGroup::Rotation => self.rotation = Some(value),
        }
    }

    /// Writes every resolved group into `pose`, leaving the others untouched.
    pub fn apply_to(&self, pose: &mut LocalPose) {
        for channel in ChannelGroup::ALL {
            if let Some(value) = self.get(channel) {
                pose.apply(channel, value);
            }
        }
    }
}

/// Removes `Once` tracks that have played out.
///
/// If the controller's current layer lost its last track, it is demoted to
/// the highest remaining layer below it. Returns the number of removed tracks.
pub fn prune_expired(tracks: &mut TrackList, controller: &mut BoneController, time: f32) -> usize {
    let before = tracks.len();
    let mut expired_current = false;
    tracks.retain(|track| {
        if track.is_expired(time) {
            expired_current |= track.layer == controller.current_layer;
            false
        } else {
            true
        }
    });

    let removed = before - tracks.len();
    if removed > 0 {
        log::debug!("Removed {removed} finished one-shot track(s) at t={time:.3}");
    }

    if expired_current && !tracks.iter().any(|t| t.layer == controller.current_layer) {
        let current = controller.current_layer;
        if let Some(lower) = tracks.iter().map(|t| t.layer).filter(|&l| l < current).max() {
            log::debug!("Demoting current layer {current} -> {lower}");
            controller.current_layer = lower;
        }
    }
    removed
}

/// Samples and layers `tracks` at `time`.
///
/// Sampling advances cross-fades, so pending curves may be committed as a
/// side effect. `tracks` must be sorted.
pub fn blend_tracks(tracks: &mut [Track], time: f32) -> ResolvedPose {
    let mut resolved = ResolvedPose::default();
    let mut accumulated: Option<Vec4> = None;

    let count = tracks.len();
    for i in 0..count {
        let channel = tracks[i].channel();
        let value = tracks[i].sample(time);

        accumulated = Some(match accumulated {
            None => value,
            Some(below) => Vec4::interpolate_linear(below, value, tracks[i].layer_weight(time)),
        });

        let closes_group = i + 1 == count || tracks[i + 1].channel() != channel;
        if closes_group && let Some(value) = accumulated.take() {
            resolved.set(channel, value);
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::animation::curve::Curve;
    use crate::animation::track::sort_tracks;
    use crate::animation::values::WrapType;

    fn track(channel: ChannelGroup, layer: i32, value: f32, fade: f32, wrap: WrapType) -> Track {
        let curve = Arc::new(Curve::constant(0, channel, Vec4::splat(value)));
        Track::new(curve, layer, 0.0, 1.0, 1.0, fade, wrap)
    }

    #[test]
    fn higher_layer_overrides_outside_fade_window() {
        let mut tracks = vec![
            track(ChannelGroup::PositionScale, 2, 5.0, 0.0, WrapType::Loop),
            track(ChannelGroup::PositionScale, 1, 1.0, 0.0, WrapType::Loop),
            track(ChannelGroup::Rotation, 1, 3.0, 0.0, WrapType::Loop),
        ];
        sort_tracks(&mut tracks);
        let pose = blend_tracks(&mut tracks, 0.5);
        assert_eq!(pose.position_scale, Some(Vec4::splat(5.0)));
        assert_eq!(pose.rotation, Some(Vec4::splat(3.0)));
    }

    #[test]
    fn fading_layer_mixes_with_layer_below() {
        let mut tracks = vec![
            track(ChannelGroup::PositionScale, 1, 0.0, 0.0, WrapType::Loop),
            track(ChannelGroup::PositionScale, 2, 4.0, 0.5, WrapType::Loop),
        ];
        let pose = blend_tracks(&mut tracks, 0.25);
        let v = pose.position_scale.unwrap();
        assert!((v.x - 2.0).abs() < 1e-5);
        assert!(pose.rotation.is_none());
    }

    #[test]
    fn pose_takes_scale_from_w() {
        let mut pose = LocalPose::default();
        pose.apply(ChannelGroup::PositionScale, Vec4::new(1.0, 2.0, 3.0, 0.5));
        assert_eq!(pose.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(pose.scale, 0.5);
    }

    #[test]
    fn expiry_demotes_current_layer() {
        let mut tracks: TrackList = [
            track(ChannelGroup::Rotation, 1, 0.0, 0.0, WrapType::Loop),
            track(ChannelGroup::Rotation, 3, 0.0, 0.0, WrapType::Once),
        ]
        .into_iter()
        .collect();
        let mut controller = BoneController {
            enable: true,
            current_layer: 3,
        };

        assert_eq!(prune_expired(&mut tracks, &mut controller, 0.5), 0);
        assert_eq!(prune_expired(&mut tracks, &mut controller, 1.01), 1);
        assert_eq!(tracks.len(), 1);
        assert_eq!(controller.current_layer, 1);
    }
}
