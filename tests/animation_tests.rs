//! Curve and Track Tests
//!
//! Tests for:
//! - Hermite evaluation (constant curves, continuity at keys, clamping)
//! - Wrap-mode span computation (Loop, Clamp, Once)
//! - Same-track cross-fade factor and commit
//! - Clip baking through the JSON directory source
//! - Component alignment feeding a baked clip

use std::sync::Arc;

use glam::Vec4;

use skinned_animation::animation::bake::{ScalarCurve, ScalarKey, align_components};
use skinned_animation::animation::cache::{ClipCache, ClipSource, JsonDirectorySource};
use skinned_animation::animation::clip::{BakedClip, ClipAsset, ClipBuilder};
use skinned_animation::animation::curve::{Curve, compute_span, evaluate_keyframes};
use skinned_animation::animation::track::{NO_PENDING_FADE, PendingFade, Track};
use skinned_animation::animation::values::{ChannelGroup, Keyframe, WrapType};
use skinned_animation::errors::AnimationError;

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_vec4(a: Vec4, b: Vec4, eps: f32) -> bool {
    (a - b).abs().max_element() < eps
}

fn wavy_keys() -> Vec<Keyframe> {
    vec![
        Keyframe::new(0.0, Vec4::new(0.0, 1.0, 0.0, 1.0)).with_tangents(Vec4::ZERO, Vec4::new(1.0, 0.0, 2.0, 0.0)),
        Keyframe::new(0.4, Vec4::new(2.0, -1.0, 0.5, 1.0)).with_tangents(Vec4::splat(-3.0), Vec4::splat(0.5)),
        Keyframe::new(1.0, Vec4::new(-1.0, 0.0, 4.0, 2.0)).with_tangents(Vec4::new(0.0, 1.0, 0.0, -1.0), Vec4::ZERO),
    ]
}

// ============================================================================
// Curve Evaluation
// ============================================================================

#[test]
fn single_key_curve_is_constant() {
    let value = Vec4::new(0.3, -2.0, 5.0, 1.0);
    let curve = Curve::constant(4, ChannelGroup::PositionScale, value);

    for span in [-10.0, 0.0, 0.25, 1.0, 37.5] {
        assert_eq!(curve.evaluate(span), value, "span={span}");
    }
}

#[test]
fn evaluation_hits_every_key_exactly() {
    let curve = Curve::new(0, ChannelGroup::Rotation, wavy_keys());
    for key in curve.keyframes() {
        assert_eq!(curve.evaluate(key.time), key.value, "t={}", key.time);
    }
}

#[test]
fn evaluation_is_continuous_across_keys() {
    let curve = Curve::new(0, ChannelGroup::Rotation, wavy_keys());
    for key in &curve.keyframes()[1..] {
        let left = curve.evaluate(key.time - 1e-4);
        assert!(approx_vec4(left, key.value, 1e-2), "left of t={}: {left}", key.time);
    }
}

#[test]
fn evaluation_clamps_outside_range() {
    let curve = Curve::new(0, ChannelGroup::PositionScale, wavy_keys());
    let keys = curve.keyframes();
    assert_eq!(curve.evaluate(-1.0), keys[0].value);
    assert_eq!(curve.evaluate(5.0), keys[2].value);
    assert!(approx(curve.end_time(), 1.0));
}

#[test]
fn hermite_basis_matches_reference_formula() {
    let keys = wavy_keys();
    let (k0, k1) = (&keys[0], &keys[1]);
    let dx = k1.time - k0.time;
    let span = 0.13;
    let t = (span - k0.time) / dx;

    let h00 = 2.0 * t * t * t - 3.0 * t * t + 1.0;
    let h10 = t * t * t - 2.0 * t * t + t;
    let h01 = -2.0 * t * t * t + 3.0 * t * t;
    let h11 = t * t * t - t * t;
    let expected = k0.value * h00 + k0.out_tangent * dx * h10 + k1.value * h01 + k1.in_tangent * dx * h11;

    assert!(approx_vec4(evaluate_keyframes(&keys, span), expected, 1e-5));
}

// ============================================================================
// Span Computation
// ============================================================================

#[test]
fn loop_span_stays_in_range() {
    let duration = 0.7;
    for i in 0..400 {
        let time = 2.0 + i as f32 * 0.137;
        let span = compute_span(time, 2.0, 1.3, duration, WrapType::Loop);
        assert!((0.0..duration).contains(&span), "time={time} span={span}");
    }
}

#[test]
fn clamp_span_never_exceeds_duration() {
    for i in 0..200 {
        let time = i as f32 * 0.05;
        let span = compute_span(time, 0.0, 2.0, 1.5, WrapType::Clamp);
        assert!(span <= 1.5, "time={time} span={span}");
    }
    assert!(approx(compute_span(0.25, 0.0, 2.0, 1.5, WrapType::Clamp), 0.5));
}

#[test]
fn once_span_is_unwrapped() {
    assert!(approx(compute_span(3.0, 0.5, 2.0, 1.0, WrapType::Once), 5.0));
}

// ============================================================================
// Cross-fade
// ============================================================================

#[test]
fn cross_fade_factor_is_monotonic_and_clamped() {
    let fade = PendingFade {
        fade_out_time: 0.4,
        start_time: 1.0,
        ..PendingFade::default()
    };

    let mut previous = 0.0;
    for i in 0..300 {
        let time = i as f32 * 0.01;
        let factor = fade.blend_factor(time);
        assert!((0.0..=1.0).contains(&factor), "time={time} factor={factor}");
        assert!(factor >= previous, "time={time}: {factor} < {previous}");
        previous = factor;
    }
    assert_eq!(fade.blend_factor(0.5), 0.0);
    assert_eq!(fade.blend_factor(2.0), 1.0);
}

#[test]
fn default_pending_fade_uses_sentinel() {
    assert_eq!(PendingFade::default().fade_out_time, NO_PENDING_FADE);
    assert_eq!(NO_PENDING_FADE, -999.0);
}

#[test]
fn cross_fade_blends_then_commits() {
    let from = Arc::new(Curve::constant(0, ChannelGroup::PositionScale, Vec4::ZERO));
    let to = Arc::new(Curve::constant(0, ChannelGroup::PositionScale, Vec4::splat(4.0)));

    let mut track = Track::new(from, 1, 0.0, 1.0, 1.0, 0.0, WrapType::Loop);
    track.queue_cross_fade(to.clone(), 1.0, 1.0, 2.0, 0.5, WrapType::Clamp);

    assert!(approx_vec4(track.sample(1.0), Vec4::ZERO, EPSILON));
    assert!(approx_vec4(track.sample(1.25), Vec4::splat(1.0), 1e-4));
    assert!(track.pending.is_active());

    assert!(approx_vec4(track.sample(2.0), Vec4::splat(4.0), EPSILON));
    assert!(!track.pending.is_active());
    assert!(Arc::ptr_eq(&track.curve, &to));
    assert_eq!(track.speed, 0.5);
    assert_eq!(track.start_time, 1.0);
}

// ============================================================================
// Baking
// ============================================================================

#[test]
fn json_directory_source_round_trip() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join(format!("skinned-animation-json-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;

    let clip = ClipBuilder::new(1.0, WrapType::Loop)
        .curve(0, ChannelGroup::PositionScale, wavy_keys())
        .constant(1, ChannelGroup::Rotation, Vec4::W)
        .build();
    std::fs::write(dir.join("Wave.clip.json"), serde_json::to_string(&clip)?)?;
    std::fs::write(dir.join("upper.mask.json"), r#"{ "bones": [1, 2] }"#)?;

    let source = JsonDirectorySource::new(&dir);
    let loaded: ClipAsset = source.load_clip("Wave")?;
    assert_eq!(loaded, clip);

    let cache = ClipCache::new(source);
    let baked = cache.get_or_load("Wave")?;
    assert_eq!(baked.curve_count(), 2);
    assert!(cache.mask("upper")?.contains(2));
    assert!(matches!(cache.get_or_load("Missing"), Err(AnimationError::ClipNotFound(_))));

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn json_keyframe_tangents_default_to_zero() -> anyhow::Result<()> {
    let json = r#"{
        "length": 1.0,
        "wrap_type": "Once",
        "rotation_curves": [
            { "bone_index": 0, "keyframes": [ { "time": 0.0, "value": [0.0, 0.0, 0.0, 1.0] } ] }
        ]
    }"#;
    let asset: ClipAsset = serde_json::from_str(json)?;
    let clip = BakedClip::bake("json", asset)?;
    let curve = clip.curve(ChannelGroup::Rotation, 0).expect("rotation curve");
    assert_eq!(curve.keyframes()[0].out_tangent, Vec4::ZERO);
    assert_eq!(clip.wrap_type, WrapType::Once);
    Ok(())
}

#[test]
fn aligned_components_bake_into_a_clip() -> anyhow::Result<()> {
    let k = |time: f32, value: f32| ScalarKey::new(time, value);
    let x = ScalarCurve::new(vec![k(0.0, 0.0), k(1.0, 2.0)]);
    let y = ScalarCurve::new(vec![k(0.0, 1.0), k(0.5, 3.0), k(1.0, 1.0)]);
    let z = ScalarCurve::default();
    let scale = ScalarCurve::new(vec![k(0.0, 1.0)]);

    let keys = align_components([&x, &y, &z, &scale], Vec4::new(0.0, 0.0, 0.25, 1.0));
    let clip = BakedClip::bake(
        "aligned",
        ClipBuilder::new(1.0, WrapType::Clamp)
            .curve(0, ChannelGroup::PositionScale, keys)
            .build(),
    )?;

    let curve = clip.curve(ChannelGroup::PositionScale, 0).expect("curve");
    for time in [0.0, 0.2, 0.5, 0.8, 1.0] {
        let v = curve.evaluate(time);
        assert!((v.x - x.evaluate(time)).abs() < 1e-4, "x at {time}");
        assert!((v.y - y.evaluate(time)).abs() < 1e-4, "y at {time}");
        assert!(approx(v.z, 0.25));
        assert!(approx(v.w, 1.0));
    }
    Ok(())
}
