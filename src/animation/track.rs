use glam::Vec4;
use smallvec::SmallVec;

use crate::animation::curve::{CurveRef, compute_span};
use crate::animation::values::{ChannelGroup, Interpolatable, WrapType};

/// `PendingFade::fade_out_time` value meaning "no cross-fade queued".
pub const NO_PENDING_FADE: f32 = -999.0;

/// A bone's live tracks, kept sorted by `(channel group, layer)`.
///
/// Track counts are bounded by active layers × 2 channel groups, so the
/// common case stays inline.
pub type TrackList = SmallVec<[Track; 4]>;

/// Timing window used when this track's layer blends over lower layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerFadeout {
    pub start_time: f32,
    pub duration: f32,
    pub fadeout_time: f32,
}

impl LayerFadeout {
    /// Weight of this layer over the layers below it at `time`.
    ///
    /// Ramps up over `fadeout_time` after `start_time`; when `fades_out` is set
    /// it also ramps down over the last `fadeout_time` seconds before the clip
    /// ends. Overlapping ramps take the smaller weight, so a window longer
    /// than the clip never jumps. A non-positive window is a hard cut.
    #[must_use]
    pub fn weight(&self, time: f32, speed: f32, fades_out: bool) -> f32 {
        if self.fadeout_time <= 0.0 {
            return 1.0;
        }
        let elapsed = time - self.start_time;
        let fade_in = (elapsed / self.fadeout_time).clamp(0.0, 1.0);
        if !fades_out || speed <= 0.0 {
            return fade_in;
        }
        let remaining = (self.duration - elapsed * speed) / speed;
        let fade_out = (remaining / self.fadeout_time).clamp(0.0, 1.0);
        fade_in.min(fade_out)
    }
}

/// Curve queued to replace a track's current curve through a cross-fade.
#[derive(Debug, Clone)]
pub struct PendingFade {
    pub fade_out_time: f32,
    pub start_time: f32,
    pub duration: f32,
    pub speed: f32,
    pub wrap_type: WrapType,
    pub curve: Option<CurveRef>,
}

impl Default for PendingFade {
    fn default() -> Self {
        Self {
            fade_out_time: NO_PENDING_FADE,
            start_time: 0.0,
            duration: 0.0,
            speed: 1.0,
            wrap_type: WrapType::Clamp,
            curve: None,
        }
    }
}

impl PendingFade {
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.fade_out_time != NO_PENDING_FADE && self.curve.is_some()
    }

    /// Fraction of the incoming curve at `time`, in `[0, 1]`.
    #[must_use]
    pub fn blend_factor(&self, time: f32) -> f32 {
        if self.fade_out_time <= 0.0 {
            return 1.0;
        }
        ((time - self.start_time) / self.fade_out_time).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn span(&self, time: f32) -> f32 {
        compute_span(time, self.start_time, self.speed, self.duration, self.wrap_type)
    }
}

/// One curve playing on one bone within one layer.
#[derive(Debug, Clone)]
pub struct Track {
    pub layer: i32,
    pub start_time: f32,
    pub duration: f32,
    pub speed: f32,
    pub wrap_type: WrapType,
    pub curve: CurveRef,
    pub layer_fadeout: LayerFadeout,
    pub pending: PendingFade,
}

impl Track {
    #[must_use]
    pub fn new(
        curve: CurveRef,
        layer: i32,
        start_time: f32,
        duration: f32,
        speed: f32,
        fadeout_time: f32,
        wrap_type: WrapType,
    ) -> Self {
        Self {
            layer,
            start_time,
            duration,
            speed,
            wrap_type,
            curve,
            layer_fadeout: LayerFadeout {
                start_time,
                duration,
                fadeout_time,
            },
            pending: PendingFade::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn channel(&self) -> ChannelGroup {
        self.curve.channel()
    }

    #[inline]
    #[must_use]
    pub fn sort_key(&self) -> (ChannelGroup, i32) {
        (self.channel(), self.layer)
    }

    #[must_use]
    pub fn span(&self, time: f32) -> f32 {
        compute_span(time, self.start_time, self.speed, self.duration, self.wrap_type)
    }

    /// `true` once a `Once` track has played through its duration.
    ///
    /// A track with a cross-fade in flight stays alive until the fade commits.
    #[must_use]
    pub fn is_expired(&self, time: f32) -> bool {
        self.wrap_type == WrapType::Once
            && !self.pending.is_active()
            && (time - self.start_time) * self.speed >= self.duration
    }

    /// Queues `curve` to cross-fade in over `fadeout_time` seconds from `start_time`.
    ///
    /// The layer window restarts with the new timing so layer blending follows
    /// the incoming clip.
    pub fn queue_cross_fade(
        &mut self,
        curve: CurveRef,
        fadeout_time: f32,
        start_time: f32,
        duration: f32,
        speed: f32,
        wrap_type: WrapType,
    ) {
        let fadeout_time = fadeout_time.max(0.0);
        self.pending = PendingFade {
            fade_out_time: fadeout_time,
            start_time,
            duration,
            speed,
            wrap_type,
            curve: Some(curve),
        };
        self.layer_fadeout = LayerFadeout {
            start_time,
            duration,
            fadeout_time,
        };
    }

    /// Evaluates the track at `time`, advancing any cross-fade.
    ///
    /// Once the fade window has fully elapsed the pending curve and timing
    /// replace the current ones.
    pub fn sample(&mut self, time: f32) -> Vec4 {
        let value = self.curve.evaluate(self.span(time));
        if !self.pending.is_active() {
            return value;
        }
        let Some(next_curve) = self.pending.curve.clone() else {
            return value;
        };

        let next_value = next_curve.evaluate(self.pending.span(time));
        let factor = self.pending.blend_factor(time);
        let blended = Vec4::interpolate_linear(value, next_value, factor);

        if time - self.pending.start_time >= self.pending.fade_out_time {
            self.commit_pending();
        }
        blended
    }

    fn commit_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        if let Some(curve) = pending.curve {
            self.curve = curve;
        }
        self.start_time = pending.start_time;
        self.duration = pending.duration;
        self.speed = pending.speed;
        self.wrap_type = pending.wrap_type;
        self.layer_fadeout = LayerFadeout {
            start_time: pending.start_time,
            duration: pending.duration,
            fadeout_time: pending.fade_out_time,
        };
    }

    /// Weight of this track over the accumulated lower layers of its group.
    #[must_use]
    pub fn layer_weight(&self, time: f32) -> f32 {
        self.layer_fadeout
            .weight(time, self.speed, self.wrap_type == WrapType::Once)
    }
}

/// Restores `(channel group, layer ascending)` order. Stable, so equal keys
/// keep their insertion order.
pub fn sort_tracks(tracks: &mut [Track]) {
    tracks.sort_by_key(Track::sort_key);
}

/// Index of the track playing `channel` on `layer`.
#[must_use]
pub fn find_track(tracks: &[Track], layer: i32, channel: ChannelGroup) -> Option<usize> {
    tracks
        .iter()
        .position(|t| t.layer == layer && t.channel() == channel)
}
