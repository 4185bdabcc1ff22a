use glam::Mat4;

use crate::animation::blend::{LocalPose, ResolvedPose, blend_tracks, prune_expired};
use crate::animation::request::{AnimationRequest, RequestQueue};
use crate::animation::track::TrackList;

/// Per-bone playback status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoneController {
    /// Set once the bone has received its first track. A disabled bone is
    /// not blended and keeps its pose.
    pub enable: bool,
    /// Highest layer that has been requested on this bone and is still playing.
    pub current_layer: i32,
}

/// Animation state owned by one bone.
#[derive(Debug, Clone, Default)]
pub struct BoneAnimation {
    pub controller: BoneController,
    pub tracks: TrackList,
    pub pose: LocalPose,
}

impl BoneAnimation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops finished one-shot tracks, blends the rest and writes the result
    /// into [`Self::pose`].
    ///
    /// Does nothing while the controller is disabled.
    pub fn blend(&mut self, time: f32) -> ResolvedPose {
        if !self.controller.enable {
            return ResolvedPose::default();
        }
        prune_expired(&mut self.tracks, &mut self.controller, time);
        let resolved = blend_tracks(&mut self.tracks, time);
        resolved.apply_to(&mut self.pose);
        resolved
    }
}

/// Animation state of a whole skeleton: one slot per bone plus the request
/// queue feeding it.
///
/// A `None` slot is a bone whose animation buffers are not attached yet.
/// Requests that reach no bone stay queued until one is.
#[derive(Debug, Clone, Default)]
pub struct AnimatedSkeleton {
    pub bones: Vec<Option<BoneAnimation>>,
    pub requests: RequestQueue,
}

impl AnimatedSkeleton {
    /// A skeleton with `bone_count` attached bones.
    #[must_use]
    pub fn new(bone_count: usize) -> Self {
        Self {
            bones: (0..bone_count).map(|_| Some(BoneAnimation::new())).collect(),
            requests: RequestQueue::new(),
        }
    }

    /// A skeleton whose bones all still lack their animation buffers.
    #[must_use]
    pub fn detached(bone_count: usize) -> Self {
        Self {
            bones: vec![None; bone_count],
            requests: RequestQueue::new(),
        }
    }

    /// Queues the animation a freshly spawned skeleton starts with.
    /// Layers `<= 0` mean "no default animation".
    #[must_use]
    pub fn with_default_animation(mut self, request: AnimationRequest) -> Self {
        if request.layer > 0 {
            self.requests.push(request);
        }
        self
    }

    pub fn play(&mut self, request: AnimationRequest) {
        self.requests.push(request);
    }

    /// Attaches buffers to `index`. Returns `false` if the index is out of range.
    pub fn attach_bone(&mut self, index: usize) -> bool {
        match self.bones.get_mut(index) {
            Some(slot) => {
                slot.get_or_insert_with(BoneAnimation::new);
                true
            }
            None => false,
        }
    }

    pub fn detach_bone(&mut self, index: usize) -> Option<BoneAnimation> {
        self.bones.get_mut(index).and_then(Option::take)
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn bone(&self, index: usize) -> Option<&BoneAnimation> {
        self.bones.get(index).and_then(Option::as_ref)
    }

    pub fn bone_mut(&mut self, index: usize) -> Option<&mut BoneAnimation> {
        self.bones.get_mut(index).and_then(Option::as_mut)
    }

    #[must_use]
    pub fn pose(&self, index: usize) -> Option<LocalPose> {
        self.bone(index).map(|b| b.pose)
    }

    /// Local matrices of every bone, `None` for detached ones.
    #[must_use]
    pub fn local_matrices(&self) -> Vec<Option<Mat4>> {
        self.bones
            .iter()
            .map(|b| b.as_ref().map(|b| b.pose.to_mat4()))
            .collect()
    }
}
