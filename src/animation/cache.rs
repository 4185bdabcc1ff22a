//! Clip Cache
//!
//! Baked clips and bone masks are produced by external tooling and fetched by
//! name through a [`ClipSource`]. The [`ClipCache`] parses each name once and
//! hands out shared handles for the rest of the session.
//!
//! # Locking
//!
//! Both maps sit behind a `parking_lot::RwLock`. Lookups take the read lock;
//! a miss loads the asset without holding any lock, then takes the write lock
//! and re-checks, so two racing loaders still end up sharing one entry.
//! Entries are never mutated after insertion and only dropped by
//! [`ClipCache::clear`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::animation::clip::{BakedClip, BoneMask, BoneMaskAsset, ClipAsset};
use crate::errors::{AnimationError, Result};

// ============================================================================
// Sources
// ============================================================================

/// Resolves asset names to baked data.
pub trait ClipSource: Send + Sync {
    fn load_clip(&self, name: &str) -> Result<ClipAsset>;

    fn load_mask(&self, name: &str) -> Result<BoneMaskAsset>;
}

/// In-process asset registry.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    clips: FxHashMap<String, ClipAsset>,
    masks: FxHashMap<String, BoneMaskAsset>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_clip(&mut self, name: impl Into<String>, clip: ClipAsset) {
        self.clips.insert(name.into(), clip);
    }

    pub fn insert_mask(&mut self, name: impl Into<String>, bones: impl IntoIterator<Item = i32>) {
        self.masks.insert(
            name.into(),
            BoneMaskAsset {
                bones: bones.into_iter().collect(),
            },
        );
    }

    #[must_use]
    pub fn with_clip(mut self, name: impl Into<String>, clip: ClipAsset) -> Self {
        self.insert_clip(name, clip);
        self
    }

    #[must_use]
    pub fn with_mask(mut self, name: impl Into<String>, bones: impl IntoIterator<Item = i32>) -> Self {
        self.insert_mask(name, bones);
        self
    }
}

impl ClipSource for MemorySource {
    fn load_clip(&self, name: &str) -> Result<ClipAsset> {
        self.clips
            .get(name)
            .cloned()
            .ok_or_else(|| AnimationError::ClipNotFound(name.to_string()))
    }

    fn load_mask(&self, name: &str) -> Result<BoneMaskAsset> {
        self.masks
            .get(name)
            .cloned()
            .ok_or_else(|| AnimationError::MaskNotFound(name.to_string()))
    }
}

/// Reads `<root>/<name>.clip.json` and `<root>/<name>.mask.json`.
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    root_path: PathBuf,
}

impl JsonDirectorySource {
    pub const CLIP_EXTENSION: &'static str = "clip.json";
    pub const MASK_EXTENSION: &'static str = "mask.json";

    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root_path: root.as_ref().to_path_buf(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn path_for(&self, name: &str, extension: &str) -> PathBuf {
        self.root_path.join(format!("{name}.{extension}"))
    }

    /// `Ok(None)` when the file does not exist.
    fn read(&self, name: &str, extension: &str) -> Result<Option<String>> {
        let path = self.path_for(name, extension);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl ClipSource for JsonDirectorySource {
    fn load_clip(&self, name: &str) -> Result<ClipAsset> {
        let text = self
            .read(name, Self::CLIP_EXTENSION)?
            .ok_or_else(|| AnimationError::ClipNotFound(name.to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn load_mask(&self, name: &str) -> Result<BoneMaskAsset> {
        let text = self
            .read(name, Self::MASK_EXTENSION)?
            .ok_or_else(|| AnimationError::MaskNotFound(name.to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Name-keyed store of baked clips and masks.
pub struct ClipCache {
    source: Box<dyn ClipSource>,
    clips: RwLock<FxHashMap<String, Arc<BakedClip>>>,
    masks: RwLock<FxHashMap<String, Arc<BoneMask>>>,
}

impl ClipCache {
    #[must_use]
    pub fn new(source: impl ClipSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            clips: RwLock::default(),
            masks: RwLock::default(),
        }
    }

    /// Returns the baked clip for `name`, loading and baking it on first use.
    pub fn get_or_load(&self, name: &str) -> Result<Arc<BakedClip>> {
        if let Some(clip) = self.clips.read().get(name) {
            return Ok(clip.clone());
        }

        let baked = Arc::new(BakedClip::bake(name, self.source.load_clip(name)?)?);

        let mut guard = self.clips.write();
        let entry = guard.entry(name.to_string()).or_insert_with(|| {
            log::debug!(
                "Cached clip '{name}' ({} curves, length {:.3}s)",
                baked.curve_count(),
                baked.length
            );
            baked
        });
        Ok(entry.clone())
    }

    /// Returns the bone mask for `name`, loading it on first use.
    pub fn mask(&self, name: &str) -> Result<Arc<BoneMask>> {
        if let Some(mask) = self.masks.read().get(name) {
            return Ok(mask.clone());
        }

        let asset = self.source.load_mask(name)?;
        let mask = Arc::new(BoneMask::from_asset(name, &asset));

        let mut guard = self.masks.write();
        let entry = guard.entry(name.to_string()).or_insert_with(|| {
            log::debug!("Cached bone mask '{name}' ({} bones)", mask.len());
            mask
        });
        Ok(entry.clone())
    }

    /// `true` if a clip named `name` has already been baked.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.clips.read().contains_key(name)
    }

    /// Number of cached clips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.read().is_empty()
    }

    /// Drops every cached clip and mask. Tracks already holding curve
    /// handles keep them alive until they are replaced.
    pub fn clear(&self) {
        self.clips.write().clear();
        self.masks.write().clear();
    }
}

impl std::fmt::Debug for ClipCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipCache")
            .field("clips", &self.clips.read().len())
            .field("masks", &self.masks.read().len())
            .finish_non_exhaustive()
    }
}
