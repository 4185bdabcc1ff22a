#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod errors;
pub mod settings;
pub mod skinning;

pub use animation::{
    AnimatedSkeleton, AnimationRequest, AnimationSystem, BakedClip, ChannelGroup, ClipBuilder, ClipCache, Keyframe,
    LocalPose, MemorySource, WrapType,
};
pub use errors::{AnimationError, Result};
pub use settings::AnimationSettings;
pub use skinning::{BoneHandle, SkinMatrix, SkinnedMesh, SkinningSystem};
