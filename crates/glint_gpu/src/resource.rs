//! Two-phase texture lifecycle
//!
//! Loading a texture happens in two phases. The render thread runs the
//! upload through [`ResourceCoordinator::load`]; the result travels back to
//! the controller thread, which then settles the [`TextureHandle`] with
//! [`TextureHandle::finish`]. The handle never sees a half-created texture:
//! it is either unset, loading, or holding a texture the GPU already has.

use std::sync::{Arc, Weak};

use glint_core::GlintError;
use parking_lot::Mutex;

use crate::atlas::{AtlasId, AtlasSource, AtlasTextures};
use crate::backend::TextureBackend;
use crate::error::{Result, TextureError};
use crate::texture::{PixelBuffer, Texture, TextureId};

/// Where a texture's pixels come from
#[derive(Clone, Debug)]
pub enum TextureSource {
    /// Pixels owned by the request
    Pixels(Arc<PixelBuffer>),
    /// A decoded image owned elsewhere; it may be dropped before upload
    Image(Weak<PixelBuffer>),
    /// A shared font atlas
    Atlas(AtlasId),
}

/// Who deletes a loaded texture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// Deleted directly when destroyed
    Owned,
    /// An atlas checkout, released when destroyed
    Atlas(AtlasId),
}

/// A texture and how to give it back
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadedTexture {
    pub texture: Texture,
    pub ownership: Ownership,
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Loading,
    Loaded(LoadedTexture),
}

/// Controller-side texture object
///
/// Clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct TextureHandle {
    slot: Arc<Mutex<Slot>>,
}

impl TextureHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark as loading; fails if a load is in flight or already done
    pub fn begin_load(&self) -> glint_core::Result<()> {
        let mut slot = self.slot.lock();
        match *slot {
            Slot::Empty => {
                *slot = Slot::Loading;
                Ok(())
            }
            Slot::Loading | Slot::Loaded(_) => Err(GlintError::AlreadyStarted("texture load")),
        }
    }

    /// Settle a load with the render thread's result
    ///
    /// On failure the handle goes back to unset so the load can be retried.
    pub fn finish(&self, result: Result<LoadedTexture>) {
        let mut slot = self.slot.lock();
        *slot = match result {
            Ok(loaded) => Slot::Loaded(loaded),
            Err(_) => Slot::Empty,
        };
    }

    /// Abandon an in-flight load that was cancelled
    pub fn abort_load(&self) {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Loading) {
            *slot = Slot::Empty;
        }
    }

    /// Take the loaded texture out, leaving the handle unset
    pub fn take(&self) -> Option<LoadedTexture> {
        let mut slot = self.slot.lock();
        match std::mem::take(&mut *slot) {
            Slot::Loaded(loaded) => Some(loaded),
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Swap in a re-uploaded texture
    ///
    /// Only applies while the handle still holds the texture with the same
    /// id; returns false if it was destroyed or replaced in the meantime.
    pub fn replace(&self, updated: LoadedTexture) -> bool {
        let mut slot = self.slot.lock();
        match &mut *slot {
            Slot::Loaded(current) if current.texture.id == updated.texture.id => {
                *current = updated;
                true
            }
            _ => false,
        }
    }

    pub fn texture(&self) -> Option<Texture> {
        match *self.slot.lock() {
            Slot::Loaded(loaded) => Some(loaded.texture),
            _ => None,
        }
    }

    pub fn loaded(&self) -> Option<LoadedTexture> {
        match *self.slot.lock() {
            Slot::Loaded(loaded) => Some(loaded),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Loading)
    }
}

/// Texture counters kept by the coordinator
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceStats {
    pub textures_created: u64,
    pub textures_deleted: u64,
    pub failures: u64,
}

/// Render-thread owner of the texture backend and the atlas checkouts
pub struct ResourceCoordinator {
    backend: Box<dyn TextureBackend>,
    atlas_source: Box<dyn AtlasSource>,
    atlases: AtlasTextures,
    stats: ResourceStats,
}

impl ResourceCoordinator {
    pub fn new(
        backend: Box<dyn TextureBackend>,
        atlas_source: Box<dyn AtlasSource>,
        atlas_capacity: usize,
    ) -> Self {
        Self {
            backend,
            atlas_source,
            atlases: AtlasTextures::with_capacity(atlas_capacity),
            stats: ResourceStats::default(),
        }
    }

    /// Upload a texture (the render-thread phase of a load)
    ///
    /// `existing` re-uploads into a texture the caller already owns.
    pub fn load(
        &mut self,
        source: &TextureSource,
        existing: Option<TextureId>,
    ) -> Result<LoadedTexture> {
        let result = self.load_inner(source, existing);
        match &result {
            Ok(loaded) => tracing::debug!(
                "ResourceCoordinator: loaded {} ({}x{})",
                loaded.texture.id,
                loaded.texture.width,
                loaded.texture.height
            ),
            Err(e) => {
                self.stats.failures += 1;
                tracing::warn!("ResourceCoordinator: texture load failed: {}", e);
            }
        }
        result
    }

    fn load_inner(
        &mut self,
        source: &TextureSource,
        existing: Option<TextureId>,
    ) -> Result<LoadedTexture> {
        let pixels = match source {
            TextureSource::Atlas(atlas) => {
                let (texture, is_new) =
                    self.atlases
                        .acquire(*atlas, self.atlas_source.as_ref(), self.backend.as_mut())?;
                if is_new {
                    self.stats.textures_created += 1;
                }
                return Ok(LoadedTexture {
                    texture,
                    ownership: Ownership::Atlas(*atlas),
                });
            }
            TextureSource::Pixels(pixels) => Arc::clone(pixels),
            TextureSource::Image(image) => image.upgrade().ok_or(TextureError::SourceDropped)?,
        };

        let id = self.backend.create_texture(
            pixels.data(),
            pixels.width(),
            pixels.height(),
            pixels.bpp(),
            existing,
        )?;
        if existing.is_none() {
            self.stats.textures_created += 1;
        }
        Ok(LoadedTexture {
            texture: Texture {
                id,
                width: pixels.width(),
                height: pixels.height(),
                format: pixels.format(),
            },
            ownership: Ownership::Owned,
        })
    }

    /// Delete an owned texture or release an atlas checkout
    pub fn destroy(&mut self, loaded: LoadedTexture) {
        match loaded.ownership {
            Ownership::Owned => {
                self.backend.delete_texture(loaded.texture.id);
                self.stats.textures_deleted += 1;
            }
            Ownership::Atlas(atlas) => {
                if self.atlases.release(atlas, self.backend.as_mut()) {
                    self.stats.textures_deleted += 1;
                }
            }
        }
    }

    pub fn live_textures(&self) -> usize {
        self.backend.live_textures()
    }

    pub fn atlases(&self) -> &AtlasTextures {
        &self.atlases
    }

    pub fn stats(&self) -> ResourceStats {
        self.stats
    }
}

impl std::fmt::Debug for ResourceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCoordinator")
            .field("live_textures", &self.backend.live_textures())
            .field("atlases", &self.atlases.len())
            .field("stats", &self.stats)
            .finish()
    }
}
