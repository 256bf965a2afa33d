//! Glint GPU Resources
//!
//! Texture lifecycle for the Glint engine. Textures are always created and
//! deleted on the render thread; the controller thread only holds
//! [`TextureHandle`]s, which are settled once the render thread reports back.
//!
//! - [`TextureBackend`]: the GPU seam (a [`HeadlessBackend`] ships for tests
//!   and headless runs)
//! - [`AtlasTextures`]: counted checkouts of shared font atlases
//! - [`ResourceCoordinator`]: render-thread owner of both

pub mod atlas;
pub mod backend;
pub mod error;
pub mod resource;
pub mod texture;

pub use atlas::{AtlasId, AtlasSource, AtlasTextures, StaticAtlases};
pub use backend::{HeadlessBackend, TextureBackend};
pub use error::{Result, TextureError};
pub use resource::{
    LoadedTexture, Ownership, ResourceCoordinator, ResourceStats, TextureHandle, TextureSource,
};
pub use texture::{PixelBuffer, Texture, TextureFormat, TextureId};
