use serde::{Deserialize, Serialize};

/// A request to start playing a clip on one layer of a skeleton.
///
/// Requests are queued on an [`AnimatedSkeleton`](crate::animation::AnimatedSkeleton)
/// and consumed by the next [`AnimationSystem::update`](crate::animation::AnimationSystem::update).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationRequest {
    pub animation_name: String,
    /// Priority band. Only positive layers are played.
    pub layer: i32,
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Cross-fade duration in seconds, used both for replacing a clip on the
    /// same layer and for blending the layer over the ones below it.
    #[serde(default)]
    pub fadeout_time: f32,
    #[serde(default)]
    pub mask_path: Option<String>,
}

fn default_speed() -> f32 {
    1.0
}

impl AnimationRequest {
    #[must_use]
    pub fn new(animation_name: impl Into<String>, layer: i32) -> Self {
        Self {
            animation_name: animation_name.into(),
            layer,
            speed: 1.0,
            fadeout_time: 0.0,
            mask_path: None,
        }
    }

    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn with_fadeout(mut self, fadeout_time: f32) -> Self {
        self.fadeout_time = fadeout_time;
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask_path: impl Into<String>) -> Self {
        self.mask_path = Some(mask_path.into());
        self
    }

    /// Mask name, treating an empty string as "no mask".
    #[must_use]
    pub fn mask(&self) -> Option<&str> {
        self.mask_path.as_deref().filter(|m| !m.is_empty())
    }

    /// An empty name is a "stop listening" marker: it clears the queue.
    #[inline]
    #[must_use]
    pub fn is_clear_marker(&self) -> bool {
        self.animation_name.is_empty()
    }
}

/// FIFO of requests waiting for the next resolution pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestQueue {
    pending: Vec<AnimationRequest>,
}

impl RequestQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: AnimationRequest) {
        self.pending.push(request);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimationRequest> {
        self.pending.iter()
    }

    /// Removes every queued request, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<AnimationRequest> {
        std::mem::take(&mut self.pending)
    }

    /// Puts back requests that could not be applied, ahead of anything
    /// queued while they were being processed.
    pub fn requeue_front(&mut self, mut requests: Vec<AnimationRequest>) {
        if requests.is_empty() {
            return;
        }
        requests.append(&mut self.pending);
        self.pending = requests;
    }
}

impl Extend<AnimationRequest> for RequestQueue {
    fn extend<I: IntoIterator<Item = AnimationRequest>>(&mut self, iter: I) {
        self.pending.extend(iter);
    }
}
