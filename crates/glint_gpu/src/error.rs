//! Error types for glint_gpu

use glint_core::GlintError;
use thiserror::Error;

use crate::atlas::AtlasId;

/// Texture creation and lookup failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TextureError {
    #[error("could not create texture: {0}")]
    CreationFailed(String),

    #[error("unsupported pixel format: {0} bytes per pixel")]
    UnsupportedFormat(u32),

    #[error("pixel buffer holds {actual} bytes, {expected} expected")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("texture source was dropped before it could be uploaded")]
    SourceDropped,

    #[error("atlas {0:?} has no pixels")]
    AtlasUnavailable(AtlasId),
}

impl From<TextureError> for GlintError {
    fn from(err: TextureError) -> Self {
        GlintError::ResourceUnavailable(err.to_string())
    }
}

/// Result type for texture operations
pub type Result<T> = std::result::Result<T, TextureError>;
