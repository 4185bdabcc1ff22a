use std::sync::Arc;

use glam::Vec4;

use crate::animation::values::{ChannelGroup, Interpolatable, Keyframe, WrapType};

/// Shared, read-only handle to a baked curve.
///
/// The [`ClipCache`](crate::animation::ClipCache) owns the canonical copy;
/// tracks clone the handle.
pub type CurveRef = Arc<Curve>;

/// Baked Hermite curve for one channel group of one bone.
///
/// Immutable once built. Rotation curves hold raw quaternion components and
/// are never normalized here.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    bone_index: i32,
    channel: ChannelGroup,
    keyframes: Vec<Keyframe>,
}

impl Curve {
    #[must_use]
    pub fn new(bone_index: i32, channel: ChannelGroup, keyframes: Vec<Keyframe>) -> Self {
        Self {
            bone_index,
            channel,
            keyframes,
        }
    }

    /// A single-key curve that evaluates to `value` everywhere.
    #[must_use]
    pub fn constant(bone_index: i32, channel: ChannelGroup, value: Vec4) -> Self {
        Self::new(bone_index, channel, vec![Keyframe::new(0.0, value)])
    }

    #[inline]
    #[must_use]
    pub fn bone_index(&self) -> i32 {
        self.bone_index
    }

    #[inline]
    #[must_use]
    pub fn channel(&self) -> ChannelGroup {
        self.channel
    }

    #[inline]
    #[must_use]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Time of the last key.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    /// Samples the curve at `span` (already wrap-adjusted).
    #[inline]
    #[must_use]
    pub fn evaluate(&self, span: f32) -> Vec4 {
        evaluate_keyframes(&self.keyframes, span)
    }
}

/// Hermite evaluation over an ordered key list.
///
/// Before the first key the first value is held, past the last key the last
/// value is held. An empty list yields zero.
#[must_use]
pub fn evaluate_keyframes<T: Interpolatable>(keyframes: &[Keyframe<T>], span: f32) -> T {
    let Some(first) = keyframes.first() else {
        return T::zero();
    };
    if keyframes.len() == 1 || span < first.time {
        return first.value;
    }

    // First key strictly after `span`; the segment is [next - 1, next).
    let next = keyframes.partition_point(|k| k.time <= span);
    if next >= keyframes.len() {
        return keyframes[keyframes.len() - 1].value;
    }

    hermite_segment(&keyframes[next - 1], &keyframes[next], span)
}

/// Interpolates between two adjacent keys.
///
/// A zero-length segment contributes no tangents and returns `lhs.value`.
#[must_use]
pub fn hermite_segment<T: Interpolatable>(lhs: &Keyframe<T>, rhs: &Keyframe<T>, time: f32) -> T {
    let dx = rhs.time - lhs.time;
    if dx == 0.0 {
        return T::interpolate_cubic(lhs.value, T::zero(), T::zero(), rhs.value, 0.0, 0.0);
    }
    let t = (time - lhs.time) / dx;
    T::interpolate_cubic(lhs.value, lhs.out_tangent, rhs.in_tangent, rhs.value, t, dx)
}

/// Maps wall-clock time to the local evaluation time of a track.
///
/// - `Loop`: wraps into `[0, duration)`; a zero duration passes the raw span through.
/// - `Clamp`: caps at `duration`.
/// - `Once`: unmodified, expiry is checked by the caller.
#[must_use]
pub fn compute_span(time: f32, start_time: f32, speed: f32, duration: f32, wrap_type: WrapType) -> f32 {
    let raw = (time - start_time) * speed;
    match wrap_type {
        WrapType::Loop => {
            if duration <= 0.0 {
                return raw;
            }
            let mut span = raw % duration;
            if span < 0.0 {
                span += duration;
            }
            // Rounding of the negative branch can land exactly on `duration`.
            if span >= duration { 0.0 } else { span }
        }
        WrapType::Clamp => raw.min(duration),
        WrapType::Once => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn key(time: f32, value: f32) -> Keyframe<f32> {
        Keyframe::new(time, value)
    }

    #[test]
    fn zero_tangent_midpoint_is_halfway() {
        let keys = [key(0.0, 0.0), key(1.0, 10.0)];
        assert!((evaluate_keyframes(&keys, 0.5) - 5.0).abs() < EPSILON);
    }

    #[test]
    fn tangents_scale_with_segment_length() {
        // Straight line of slope 2 expressed through tangents on a 2s segment.
        let keys = [
            key(0.0, 0.0).with_tangents(2.0, 2.0),
            key(2.0, 4.0).with_tangents(2.0, 2.0),
        ];
        for i in 0..=20 {
            let time = i as f32 * 0.1;
            let v = evaluate_keyframes(&keys, time);
            assert!((v - 2.0 * time).abs() < 1e-4, "t={time} v={v}");
        }
    }

    #[test]
    fn duplicate_times_do_not_divide_by_zero() {
        let keys = [key(0.0, 1.0), key(0.5, 2.0), key(0.5, 3.0), key(1.0, 4.0)];
        let v = evaluate_keyframes(&keys, 0.5);
        assert!(v.is_finite());
        assert!((v - 3.0).abs() < EPSILON);

        let lhs = key(0.5, 2.0);
        let rhs = key(0.5, 3.0);
        assert!((hermite_segment(&lhs, &rhs, 0.5) - 2.0).abs() < EPSILON);
    }

    #[test]
    fn empty_curve_is_zero() {
        let keys: [Keyframe<f32>; 0] = [];
        assert_eq!(evaluate_keyframes(&keys, 3.0), 0.0);
    }

    #[test]
    fn loop_span_handles_zero_duration_and_reverse_speed() {
        assert_eq!(compute_span(3.0, 1.0, 1.0, 0.0, WrapType::Loop), 2.0);
        let span = compute_span(1.25, 1.0, -1.0, 1.0, WrapType::Loop);
        assert!((span - 0.75).abs() < EPSILON);
    }
}
