use glam::Vec4;
use serde::{Deserialize, Serialize};

/// The two pose attributes a bone blends independently.
///
/// The declaration order is the sort order of a bone's track list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChannelGroup {
    /// `xyz` local position, `w` uniform scale.
    PositionScale,
    /// Local rotation quaternion `(x, y, z, w)`.
    Rotation,
}

impl ChannelGroup {
    pub const ALL: [ChannelGroup; 2] = [ChannelGroup::PositionScale, ChannelGroup::Rotation];
}

/// How a clip maps elapsed time onto its curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WrapType {
    /// Hold the last pose after the clip ends.
    #[default]
    Clamp,
    /// Restart from the beginning.
    Loop,
    /// Play once; the track is removed when it ends.
    Once,
}

/// One control point of a Hermite curve.
///
/// Tangents are slopes per second and only valid inside the two segments
/// adjacent to this key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T = Vec4> {
    pub time: f32,
    pub value: T,
    #[serde(default)]
    pub in_tangent: T,
    #[serde(default)]
    pub out_tangent: T,
}

impl<T: Interpolatable> Keyframe<T> {
    /// A key with flat tangents.
    #[must_use]
    pub fn new(time: f32, value: T) -> Self {
        Self {
            time,
            value,
            in_tangent: T::zero(),
            out_tangent: T::zero(),
        }
    }

    #[must_use]
    pub fn with_tangents(mut self, in_tangent: T, out_tangent: T) -> Self {
        self.in_tangent = in_tangent;
        self.out_tangent = out_tangent;
        self
    }
}

pub trait Interpolatable: Copy + Sized {
    fn zero() -> Self;

    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;

    fn interpolate_cubic(
        v0: Self,
        out_tangent0: Self,
        in_tangent1: Self,
        v1: Self,
        t: f32,
        dt: f32,
    ) -> Self;

    fn is_finite(&self) -> bool;
}

impl Interpolatable for f32 {
    fn zero() -> Self {
        0.0
    }

    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }

    fn interpolate_cubic(v0: Self, out_tangent0: Self, in_tangent1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let t2 = t * t;
        let t3 = t2 * t;

        let s2 = -2.0 * t3 + 3.0 * t2;
        let s3 = t3 - t2;
        let s0 = 1.0 - s2;
        let s1 = s3 - t2 + t;

        let m0 = out_tangent0 * dt;
        let m1 = in_tangent1 * dt;

        s0 * v0 + s1 * m0 + s2 * v1 + s3 * m1
    }

    fn is_finite(&self) -> bool {
        f32::is_finite(*self)
    }
}

impl Interpolatable for Vec4 {
    fn zero() -> Self {
        Vec4::ZERO
    }

    // Cross-fades blend quaternions component-wise too; no renormalization here.
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        end * t + start * (1.0 - t)
    }

    fn interpolate_cubic(v0: Self, out_tangent0: Self, in_tangent1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let t2 = t * t;
        let t3 = t2 * t;

        let s2 = -2.0 * t3 + 3.0 * t2;
        let s3 = t3 - t2;
        let s0 = 1.0 - s2;
        let s1 = s3 - t2 + t;

        let m0 = out_tangent0 * dt;
        let m1 = in_tangent1 * dt;

        v0 * s0 + m0 * s1 + v1 * s2 + m1 * s3
    }

    fn is_finite(&self) -> bool {
        Vec4::is_finite(*self)
    }
}
