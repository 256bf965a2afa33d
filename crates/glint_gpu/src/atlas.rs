//! Shared atlas textures
//!
//! Font atlases are uploaded once and shared by every text node that uses
//! them. Each user checks the texture out with [`AtlasTextures::acquire`] and
//! hands it back with [`AtlasTextures::release`]; the GPU texture is deleted
//! when the last checkout is released.

use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::backend::TextureBackend;
use crate::error::{Result, TextureError};
use crate::texture::{PixelBuffer, Texture};

/// Identifies one atlas (typically one font at one size)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AtlasId(pub u32);

/// Supplies atlas pixels on demand
pub trait AtlasSource: Send {
    fn atlas_pixels(&self, atlas: AtlasId) -> Option<PixelBuffer>;
}

/// Atlas source backed by a fixed map, for headless runs and tests
#[derive(Debug, Default)]
pub struct StaticAtlases {
    atlases: FxHashMap<AtlasId, PixelBuffer>,
}

impl StaticAtlases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_atlas(mut self, atlas: AtlasId, pixels: PixelBuffer) -> Self {
        self.atlases.insert(atlas, pixels);
        self
    }
}

impl AtlasSource for StaticAtlases {
    fn atlas_pixels(&self, atlas: AtlasId) -> Option<PixelBuffer> {
        self.atlases.get(&atlas).cloned()
    }
}

#[derive(Debug)]
struct Entry {
    texture: Texture,
    refs: u32,
}

/// Counted checkouts of atlas textures
#[derive(Debug, Default)]
pub struct AtlasTextures {
    entries: FxHashMap<AtlasId, Entry>,
}

impl AtlasTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
        }
    }

    /// Check out the texture for `atlas`, uploading it on first use
    ///
    /// Returns the texture and whether this call created it.
    pub fn acquire(
        &mut self,
        atlas: AtlasId,
        source: &dyn AtlasSource,
        backend: &mut dyn TextureBackend,
    ) -> Result<(Texture, bool)> {
        if let Some(entry) = self.entries.get_mut(&atlas) {
            entry.refs += 1;
            return Ok((entry.texture, false));
        }

        let pixels = source
            .atlas_pixels(atlas)
            .ok_or(TextureError::AtlasUnavailable(atlas))?;
        let id = backend.create_texture(
            pixels.data(),
            pixels.width(),
            pixels.height(),
            pixels.bpp(),
            None,
        )?;
        let texture = Texture {
            id,
            width: pixels.width(),
            height: pixels.height(),
            format: pixels.format(),
        };
        self.entries.insert(atlas, Entry { texture, refs: 1 });
        tracing::debug!("AtlasTextures: uploaded {:?} as {}", atlas, id);
        Ok((texture, true))
    }

    /// Give back one checkout; returns true when the texture was deleted
    pub fn release(&mut self, atlas: AtlasId, backend: &mut dyn TextureBackend) -> bool {
        let Some(entry) = self.entries.get_mut(&atlas) else {
            tracing::warn!("AtlasTextures: release of unknown atlas {:?}", atlas);
            return false;
        };

        entry.refs -= 1;
        if entry.refs > 0 {
            return false;
        }

        if let Some(entry) = self.entries.remove(&atlas) {
            backend.delete_texture(entry.texture.id);
            tracing::debug!("AtlasTextures: deleted {:?}", atlas);
        }
        true
    }

    /// Outstanding checkouts of `atlas`
    pub fn ref_count(&self, atlas: AtlasId) -> u32 {
        self.entries.get(&atlas).map_or(0, |entry| entry.refs)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
