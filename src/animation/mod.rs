//! Baked Skeletal Animation
//!
//! Playback of baked per-bone Hermite curves with layering, cross-fades and
//! bone masks.
//!
//! # Data flow
//!
//! 1. [`ClipCache`] bakes each clip the first time its name is requested.
//! 2. [`PlaybackEngine`] turns queued [`AnimationRequest`]s into [`Track`]s.
//! 3. Each frame the tracks of a bone are sampled and layered into a
//!    [`LocalPose`].
//!
//! [`AnimationSystem::update`] runs steps 2 and 3 for a batch of skeletons.

pub mod bake;
pub mod blend;
pub mod cache;
pub mod clip;
pub mod curve;
pub mod playback;
pub mod request;
pub mod rig;
pub mod system;
pub mod track;
pub mod values;

pub use bake::{ScalarCurve, ScalarKey, align_components};
pub use blend::{LocalPose, ResolvedPose, blend_tracks, prune_expired};
pub use cache::{ClipCache, ClipSource, JsonDirectorySource, MemorySource};
pub use clip::{BakedClip, BoneMask, BoneMaskAsset, ClipAsset, ClipBuilder, CurveAsset};
pub use curve::{Curve, CurveRef, compute_span, evaluate_keyframes, hermite_segment};
pub use playback::{PlaybackEngine, Resolution};
pub use request::{AnimationRequest, RequestQueue};
pub use rig::{AnimatedSkeleton, BoneAnimation, BoneController};
pub use system::AnimationSystem;
pub use track::{LayerFadeout, NO_PENDING_FADE, PendingFade, Track, TrackList, find_track, sort_tracks};
pub use values::{ChannelGroup, Interpolatable, Keyframe, WrapType};
