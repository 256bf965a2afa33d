//! Texture backends
//!
//! The backend is the only thing that talks to the GPU. It is owned by the
//! render thread and never touched from the controller thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{Result, TextureError};
use crate::texture::{Texture, TextureFormat, TextureId};

/// Creates and deletes GPU textures
pub trait TextureBackend: Send {
    /// Upload pixels into a new texture, or into `existing` when given
    fn create_texture(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
        bpp: u32,
        existing: Option<TextureId>,
    ) -> Result<TextureId>;

    fn delete_texture(&mut self, id: TextureId);

    /// Number of textures currently alive
    fn live_textures(&self) -> usize;
}

/// In-memory backend for headless runs and tests
///
/// Failures can be injected through the handle returned by
/// [`HeadlessBackend::failure_switch`].
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u32,
    textures: FxHashMap<TextureId, Texture>,
    fail: Arc<AtomicBool>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared switch; while set, every creation fails
    pub fn failure_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fail)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(&id)
    }
}

impl TextureBackend for HeadlessBackend {
    fn create_texture(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
        bpp: u32,
        existing: Option<TextureId>,
    ) -> Result<TextureId> {
        if self.fail.load(Ordering::Acquire) {
            return Err(TextureError::CreationFailed("backend refused".into()));
        }

        let format = TextureFormat::from_bpp(bpp)?;
        let expected = width as usize * height as usize * bpp as usize;
        if data.len() < expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        let id = match existing {
            Some(id) => id,
            None => {
                self.next_id += 1;
                TextureId(self.next_id)
            }
        };
        self.textures.insert(
            id,
            Texture {
                id,
                width,
                height,
                format,
            },
        );
        tracing::trace!("HeadlessBackend: uploaded {} ({}x{} {:?})", id, width, height, format);
        Ok(id)
    }

    fn delete_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_none() {
            tracing::warn!("HeadlessBackend: delete of unknown texture {}", id);
        }
    }

    fn live_textures(&self) -> usize {
        self.textures.len()
    }
}
