//! Skin Matrix Pipeline
//!
//! Produces every skinned mesh's skin matrices once per frame in three
//! phases:
//!
//! 1. gather the world transform of every bone,
//! 2. gather the inverse world transform of every mesh root,
//! 3. compose `inverse(root) * bone * inverse_bind_pose` per bone.
//!
//! Phases 1 and 2 are independent and run side by side through
//! `rayon::join`; phase 3 starts once both have finished. Each work item
//! only reads the lookups built by the earlier phases and writes its own
//! bone's matrix.
//!
//! A bone (or root) whose world transform is missing this frame is skipped
//! and keeps last frame's matrix.

use glam::Mat4;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use slotmap::{SecondaryMap, SlotMap, new_key_type};

use crate::errors::{AnimationError, Result};
use crate::settings::AnimationSettings;
use crate::skinning::composer::{SkinMatrix, compose_with_root_inverse, invert_root};

new_key_type! {
    /// Handle of a bone in the host's transform storage.
    pub struct BoneHandle;
}

/// Read-only access to world transforms computed by the host's transform
/// propagation.
pub trait WorldTransforms: Sync {
    fn world_matrix(&self, bone: BoneHandle) -> Option<Mat4>;
}

impl WorldTransforms for SecondaryMap<BoneHandle, Mat4> {
    #[inline]
    fn world_matrix(&self, bone: BoneHandle) -> Option<Mat4> {
        self.get(bone).copied()
    }
}

impl WorldTransforms for SlotMap<BoneHandle, Mat4> {
    #[inline]
    fn world_matrix(&self, bone: BoneHandle) -> Option<Mat4> {
        self.get(bone).copied()
    }
}

impl WorldTransforms for FxHashMap<BoneHandle, Mat4> {
    #[inline]
    fn world_matrix(&self, bone: BoneHandle) -> Option<Mat4> {
        self.get(&bone).copied()
    }
}

/// A mesh deformed by a skeleton.
///
/// `bones`, `inverse_bind_poses` and `skin_matrices` always have the same
/// length; the fields are private to keep it that way.
#[derive(Debug, Clone)]
pub struct SkinnedMesh {
    /// `bones[i]` drives joint `i` of the mesh.
    bones: Vec<BoneHandle>,
    /// Bone whose world transform defines the mesh's model space.
    root: BoneHandle,
    inverse_bind_poses: Vec<Mat4>,
    /// Output, one per bone. Starts as identity.
    skin_matrices: Vec<SkinMatrix>,
}

impl SkinnedMesh {
    pub fn new(bones: Vec<BoneHandle>, root: BoneHandle, inverse_bind_poses: Vec<Mat4>) -> Result<Self> {
        if bones.len() != inverse_bind_poses.len() {
            return Err(AnimationError::SkinLengthMismatch {
                bones: bones.len(),
                bind_poses: inverse_bind_poses.len(),
            });
        }
        let skin_matrices = vec![SkinMatrix::IDENTITY; bones.len()];
        Ok(Self {
            bones,
            root,
            inverse_bind_poses,
            skin_matrices,
        })
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn bones(&self) -> &[BoneHandle] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> BoneHandle {
        self.root
    }

    pub fn set_root(&mut self, root: BoneHandle) {
        self.root = root;
    }

    #[must_use]
    pub fn inverse_bind_poses(&self) -> &[Mat4] {
        &self.inverse_bind_poses
    }

    #[must_use]
    pub fn skin_matrices(&self) -> &[SkinMatrix] {
        &self.skin_matrices
    }

    /// Mutable view of the output matrices. The slice cannot change length.
    pub fn skin_matrices_mut(&mut self) -> &mut [SkinMatrix] {
        &mut self.skin_matrices
    }

    /// Skin matrices as raw bytes for GPU upload.
    #[must_use]
    pub fn skin_matrix_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.skin_matrices)
    }
}

/// Counts from one [`SkinningSystem::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkinningReport {
    pub updated: usize,
    pub skipped: usize,
}

impl std::ops::Add for SkinningReport {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            updated: self.updated + rhs.updated,
            skipped: self.skipped + rhs.skipped,
        }
    }
}

/// Skin matrix system.
pub struct SkinningSystem;

impl SkinningSystem {
    /// Recomputes the skin matrices of all `meshes`.
    pub fn update<T>(meshes: &mut [SkinnedMesh], transforms: &T, settings: &AnimationSettings) -> SkinningReport
    where
        T: WorldTransforms + ?Sized,
    {
        if settings.parallel_skinning {
            Self::update_parallel(meshes, transforms, settings.skinning_min_batch.max(1))
        } else {
            Self::update_sequential(meshes, transforms)
        }
    }

    fn update_parallel<T>(meshes: &mut [SkinnedMesh], transforms: &T, min_len: usize) -> SkinningReport
    where
        T: WorldTransforms + ?Sized,
    {
        let (bone_worlds, root_inverses) = {
            let meshes: &[SkinnedMesh] = meshes;
            rayon::join(
                || {
                    meshes
                        .par_iter()
                        .map(|mesh| {
                            mesh.bones
                                .par_iter()
                                .with_min_len(min_len)
                                .map(|&bone| transforms.world_matrix(bone))
                                .collect::<Vec<_>>()
                        })
                        .collect::<Vec<_>>()
                },
                || {
                    meshes
                        .par_iter()
                        .map(|mesh| gather_root_inverse(mesh, transforms))
                        .collect::<Vec<_>>()
                },
            )
        };

        meshes
            .par_iter_mut()
            .zip(bone_worlds.par_iter())
            .zip(root_inverses.par_iter())
            .map(|((mesh, worlds), &root_inverse)| {
                let Some(root_inverse) = root_inverse else {
                    return SkinningReport {
                        updated: 0,
                        skipped: mesh.bones.len(),
                    };
                };
                mesh.skin_matrices
                    .par_iter_mut()
                    .with_min_len(min_len)
                    .zip(mesh.inverse_bind_poses.par_iter())
                    .zip(worlds.par_iter())
                    .map(|((skin, &inverse_bind), world)| compose_into(skin, *world, root_inverse, inverse_bind))
                    .reduce(SkinningReport::default, |a, b| a + b)
            })
            .reduce(SkinningReport::default, |a, b| a + b)
    }

    fn update_sequential<T>(meshes: &mut [SkinnedMesh], transforms: &T) -> SkinningReport
    where
        T: WorldTransforms + ?Sized,
    {
        let mut report = SkinningReport::default();
        for mesh in meshes.iter_mut() {
            let Some(root_inverse) = gather_root_inverse(mesh, transforms) else {
                report.skipped += mesh.bones.len();
                continue;
            };
            for ((skin, &inverse_bind), &bone) in mesh
                .skin_matrices
                .iter_mut()
                .zip(mesh.inverse_bind_poses.iter())
                .zip(mesh.bones.iter())
            {
                let world = transforms.world_matrix(bone);
                report = report + compose_into(skin, world, root_inverse, inverse_bind);
            }
        }
        report
    }
}

fn gather_root_inverse<T>(mesh: &SkinnedMesh, transforms: &T) -> Option<Mat4>
where
    T: WorldTransforms + ?Sized,
{
    let Some(root_world) = transforms.world_matrix(mesh.root) else {
        log::trace!("Root bone transform unavailable, skipping {} bones", mesh.bones.len());
        return None;
    };
    let inverse = invert_root(root_world);
    if inverse.is_none() {
        log::trace!("Root bone transform is singular, skipping {} bones", mesh.bones.len());
    }
    inverse
}

fn compose_into(skin: &mut SkinMatrix, world: Option<Mat4>, root_inverse: Mat4, inverse_bind: Mat4) -> SkinningReport {
    match world {
        Some(world) => {
            *skin = compose_with_root_inverse(world, root_inverse, inverse_bind);
            SkinningReport { updated: 1, skipped: 0 }
        }
        None => {
            log::trace!("Bone transform unavailable, keeping previous skin matrix");
            SkinningReport { updated: 0, skipped: 1 }
        }
    }
}
