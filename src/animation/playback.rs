//! Request Resolution
//!
//! Turns queued [`AnimationRequest`]s into per-bone tracks.
//!
//! For every bone the request reaches, and for each channel group the clip
//! animates on that bone:
//! - a track already playing on the request's layer is kept and receives the
//!   new curve as a pending cross-fade;
//! - otherwise a fresh track is appended.
//!
//! The bone's list is then re-sorted so blending can find channel group
//! boundaries by adjacency.

use crate::animation::cache::ClipCache;
use crate::animation::clip::BakedClip;
use crate::animation::request::AnimationRequest;
use crate::animation::rig::{AnimatedSkeleton, BoneAnimation};
use crate::animation::track::{Track, find_track, sort_tracks};
use crate::animation::values::ChannelGroup;
use crate::settings::AnimationSettings;

/// What happened to one request during a resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Tracks were written to this many bones.
    Applied(usize),
    /// The clip resolved but no bone could take it this pass.
    Unapplied,
    /// The request can never apply (non-positive layer).
    Ignored,
    /// The clip or mask failed to load.
    Failed,
}

/// Request resolution. Runs single-threaded: it mutates track lists and fills
/// the clip cache.
pub struct PlaybackEngine;

impl PlaybackEngine {
    /// Resolves every queued request of `skeleton` in submission order.
    ///
    /// Requests that were not applied are put back at the front of the queue
    /// depending on `settings`. An empty animation name discards everything
    /// queued before it.
    pub fn process_requests(
        skeleton: &mut AnimatedSkeleton,
        cache: &ClipCache,
        settings: &AnimationSettings,
        time: f32,
    ) {
        if skeleton.requests.is_empty() {
            return;
        }

        let mut requests = skeleton.requests.drain();
        if let Some(marker) = requests.iter().rposition(AnimationRequest::is_clear_marker) {
            log::debug!("Empty animation request, discarding {marker} queued request(s)");
            requests = requests.split_off(marker + 1);
        }
        let mut retained = Vec::new();

        for request in requests {
            match Self::resolve_request(&mut skeleton.bones, &request, cache, time) {
                Resolution::Applied(bones) => {
                    log::debug!(
                        "Resolved '{}' on layer {} for {bones} bone(s)",
                        request.animation_name,
                        request.layer
                    );
                }
                Resolution::Unapplied => {
                    if settings.retain_unapplied_requests {
                        retained.push(request);
                    } else {
                        log::warn!("Dropping request '{}': no bone could receive it", request.animation_name);
                    }
                }
                Resolution::Ignored => {}
                Resolution::Failed => {
                    if !settings.drop_unresolvable_requests {
                        retained.push(request);
                    }
                }
            }
        }

        skeleton.requests.requeue_front(retained);
    }

    /// Applies one request to every attached bone it reaches.
    pub fn resolve_request(
        bones: &mut [Option<BoneAnimation>],
        request: &AnimationRequest,
        cache: &ClipCache,
        time: f32,
    ) -> Resolution {
        if request.layer <= 0 {
            log::warn!(
                "Ignoring request '{}' on non-positive layer {}",
                request.animation_name,
                request.layer
            );
            return Resolution::Ignored;
        }

        let clip = match cache.get_or_load(&request.animation_name) {
            Ok(clip) => clip,
            Err(err) => {
                log::error!("Failed to load animation '{}': {err}", request.animation_name);
                return Resolution::Failed;
            }
        };

        let mask = match request.mask() {
            Some(name) => match cache.mask(name) {
                Ok(mask) => Some(mask),
                Err(err) => {
                    log::error!("Failed to load bone mask '{name}': {err}");
                    return Resolution::Failed;
                }
            },
            None => None,
        };

        let mut applied = 0;
        for (index, slot) in bones.iter_mut().enumerate() {
            let Some(bone) = slot.as_mut() else {
                continue;
            };
            if let Some(mask) = &mask
                && !mask.contains(index)
            {
                continue;
            }
            if Self::resolve_bone(bone, index, &clip, request, time) {
                applied += 1;
            }
        }

        if applied == 0 {
            Resolution::Unapplied
        } else {
            Resolution::Applied(applied)
        }
    }

    /// Writes the clip's curves for `bone_index` into `bone`.
    ///
    /// Returns `false` if the clip does not animate this bone.
    pub fn resolve_bone(
        bone: &mut BoneAnimation,
        bone_index: usize,
        clip: &BakedClip,
        request: &AnimationRequest,
        time: f32,
    ) -> bool {
        let fadeout_time = request.fadeout_time.max(0.0);
        let mut touched = false;

        for channel in ChannelGroup::ALL {
            let Some(curve) = clip.curve(channel, bone_index) else {
                continue;
            };
            touched = true;

            match find_track(&bone.tracks, request.layer, channel) {
                Some(i) => bone.tracks[i].queue_cross_fade(
                    curve.clone(),
                    fadeout_time,
                    time,
                    clip.length,
                    request.speed,
                    clip.wrap_type,
                ),
                None => bone.tracks.push(Track::new(
                    curve.clone(),
                    request.layer,
                    time,
                    clip.length,
                    request.speed,
                    fadeout_time,
                    clip.wrap_type,
                )),
            }
        }

        if touched {
            sort_tracks(&mut bone.tracks);
            bone.controller.enable = true;
            bone.controller.current_layer = bone.controller.current_layer.max(request.layer);
        }
        touched
    }
}
