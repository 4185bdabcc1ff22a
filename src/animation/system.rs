use rayon::prelude::*;

use crate::animation::cache::ClipCache;
use crate::animation::playback::PlaybackEngine;
use crate::animation::rig::AnimatedSkeleton;
use crate::settings::AnimationSettings;

/// Animation system.
///
/// Drives request resolution and layer blending for every skeleton.
pub struct AnimationSystem;

impl AnimationSystem {
    /// Advances all skeletons to `time` (seconds).
    ///
    /// Resolution runs on the calling thread since it writes track lists and
    /// the clip cache. Blending only touches each bone's own state and runs on
    /// the rayon pool when `settings.parallel_blending` is set.
    pub fn update(
        skeletons: &mut [AnimatedSkeleton],
        cache: &ClipCache,
        settings: &AnimationSettings,
        time: f32,
    ) {
        for skeleton in skeletons.iter_mut() {
            PlaybackEngine::process_requests(skeleton, cache, settings, time);
        }

        if settings.parallel_blending {
            let min_len = settings.skinning_min_batch.max(1);
            skeletons.par_iter_mut().for_each(|skeleton| {
                skeleton
                    .bones
                    .par_iter_mut()
                    .with_min_len(min_len)
                    .filter_map(Option::as_mut)
                    .for_each(|bone| {
                        bone.blend(time);
                    });
            });
        } else {
            for skeleton in skeletons.iter_mut() {
                for bone in skeleton.bones.iter_mut().filter_map(Option::as_mut) {
                    bone.blend(time);
                }
            }
        }
    }
}
