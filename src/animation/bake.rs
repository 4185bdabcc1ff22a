//! Curve Alignment
//!
//! Authoring tools usually hand out one scalar curve per component
//! (`position.x`, `position.y`, ..., `rotation.w`), each with its own key
//! times. The runtime stores one 4-vector curve per channel group, so the four
//! component curves must first share a common timeline.
//!
//! [`align_components`] merges the key times of all four components. A
//! component without a key at a merged time gets one inserted with the value
//! and slope its own curve has there, so the aligned curve reproduces every
//! component exactly.

use glam::Vec4;

use crate::animation::curve::evaluate_keyframes;
use crate::animation::values::Keyframe;

pub type ScalarKey = Keyframe<f32>;

/// A single-component Hermite curve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarCurve {
    pub keys: Vec<ScalarKey>,
}

impl ScalarCurve {
    #[must_use]
    pub fn new(mut keys: Vec<ScalarKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn evaluate(&self, time: f32) -> f32 {
        evaluate_keyframes(&self.keys, time)
    }

    /// Slope of the curve at `time` (per second). Zero outside the key range.
    #[must_use]
    pub fn slope(&self, time: f32) -> f32 {
        let keys = &self.keys;
        if keys.len() < 2 || time < keys[0].time {
            return 0.0;
        }
        let next = keys.partition_point(|k| k.time <= time);
        if next >= keys.len() {
            return 0.0;
        }
        let (lhs, rhs) = (&keys[next - 1], &keys[next]);
        let dx = rhs.time - lhs.time;
        if dx == 0.0 {
            return 0.0;
        }
        let t = (time - lhs.time) / dx;
        let t2 = t * t;

        let d00 = 6.0 * t2 - 6.0 * t;
        let d10 = 3.0 * t2 - 4.0 * t + 1.0;
        let d01 = -d00;
        let d11 = 3.0 * t2 - 2.0 * t;

        let m0 = lhs.out_tangent * dx;
        let m1 = rhs.in_tangent * dx;
        (d00 * lhs.value + d10 * m0 + d01 * rhs.value + d11 * m1) / dx
    }

    fn key_at(&self, time: f32) -> Option<&ScalarKey> {
        self.keys.iter().find(|k| k.time == time)
    }
}

/// Packs four component curves into one 4-vector key list.
///
/// `defaults` fills components whose curve is empty (typically the bind pose
/// value of that component). The result starts at the earliest key time of
/// any component; callers that need `time[0] == 0` should key time zero.
#[must_use]
pub fn align_components(components: [&ScalarCurve; 4], defaults: Vec4) -> Vec<Keyframe> {
    let mut times: Vec<f32> = components
        .iter()
        .flat_map(|c| c.keys.iter().map(|k| k.time))
        .collect();
    times.sort_by(f32::total_cmp);
    times.dedup();

    if times.is_empty() {
        return vec![Keyframe::new(0.0, defaults)];
    }

    let (first_time, last_time) = (times[0], times[times.len() - 1]);
    times
        .into_iter()
        .map(|time| {
            let mut key = Keyframe::new(time, Vec4::ZERO);
            for (i, curve) in components.iter().enumerate() {
                let (value, in_tangent, out_tangent) = if curve.is_empty() {
                    (defaults[i], 0.0, 0.0)
                } else if let Some(k) = curve.key_at(time) {
                    // The component holds flat outside its own key range.
                    let is_first = curve.keys.first().is_some_and(|f| f.time == time);
                    let is_last = curve.keys.last().is_some_and(|l| l.time == time);
                    let in_tangent = if is_first && time > first_time { 0.0 } else { k.in_tangent };
                    let out_tangent = if is_last && time < last_time { 0.0 } else { k.out_tangent };
                    (k.value, in_tangent, out_tangent)
                } else {
                    let slope = curve.slope(time);
                    (curve.evaluate(time), slope, slope)
                };
                key.value[i] = value;
                key.in_tangent[i] = in_tangent;
                key.out_tangent[i] = out_tangent;
            }
            key
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(time: f32, value: f32, tangent: f32) -> ScalarKey {
        Keyframe::new(time, value).with_tangents(tangent, tangent)
    }

    #[test]
    fn merged_timeline_is_sorted_and_unique() {
        let x = ScalarCurve::new(vec![k(0.0, 0.0, 0.0), k(1.0, 1.0, 0.0)]);
        let y = ScalarCurve::new(vec![k(0.0, 0.0, 0.0), k(0.5, 2.0, 0.0), k(1.0, 0.0, 0.0)]);
        let z = ScalarCurve::default();
        let w = ScalarCurve::new(vec![k(0.25, 1.0, 0.0)]);

        let keys = align_components([&x, &y, &z, &w], Vec4::new(0.0, 0.0, 7.0, 1.0));
        let times: Vec<f32> = keys.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 0.25, 0.5, 1.0]);
        assert!(keys.iter().all(|k| k.value.z == 7.0));
        assert_eq!(keys[2].value.y, 2.0);
    }

    #[test]
    fn aligned_curve_reproduces_components() {
        let x = ScalarCurve::new(vec![k(0.0, 0.0, 1.0), k(1.0, 3.0, -2.0), k(2.0, 1.0, 0.5)]);
        let y = ScalarCurve::new(vec![k(0.0, 5.0, 0.0), k(0.7, -1.0, 4.0), k(2.0, 2.0, 0.0)]);
        let z = ScalarCurve::new(vec![k(0.0, 1.0, 0.0)]);
        let w = ScalarCurve::new(vec![k(0.0, 1.0, 0.3), k(1.5, 2.0, 0.0)]);
        check_reproduction([&x, &y, &z, &w]);
    }

    #[test]
    fn boundary_tangents_do_not_leak_outside_component_range() {
        let x = ScalarCurve::new(vec![k(0.0, 0.0, 0.0), k(2.0, 1.0, 0.0)]);
        let y = ScalarCurve::new(vec![k(0.5, 1.0, -2.0), k(1.2, 3.0, 4.0)]);
        let z = ScalarCurve::new(vec![k(0.0, 0.0, 0.0)]);
        let w = ScalarCurve::new(vec![k(0.5, 2.0, 3.0)]);
        check_reproduction([&x, &y, &z, &w]);

        let keys = align_components([&x, &y, &z, &w], Vec4::ZERO);
        let at_half = keys.iter().find(|k| k.time == 0.5).expect("merged key at 0.5");
        assert_eq!(at_half.in_tangent.w, 0.0);
        assert_eq!(at_half.out_tangent.w, 0.0);
        assert_eq!(at_half.in_tangent.y, 0.0);
        assert_eq!(at_half.out_tangent.y, -2.0);
    }

    fn check_reproduction(components: [&ScalarCurve; 4]) {
        let [x, y, z, w] = components;
        let keys = align_components(components, Vec4::ZERO);
        for i in 0..=40 {
            let time = i as f32 * 0.05;
            let packed = evaluate_keyframes(&keys, time);
            let expected = Vec4::new(x.evaluate(time), y.evaluate(time), z.evaluate(time), w.evaluate(time));
            assert!(
                (packed - expected).abs().max_element() < 1e-3,
                "t={time}: {packed} vs {expected}"
            );
        }
    }

    #[test]
    fn no_keys_yields_constant_default() {
        let empty = ScalarCurve::default();
        let keys = align_components([&empty, &empty, &empty, &empty], Vec4::W);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].value, Vec4::W);
    }
}
