//! Texture descriptors and pixel sources

use std::fmt;

use crate::error::{Result, TextureError};

/// GPU texture name; zero is never a valid texture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

impl TextureId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tex{}", self.0)
    }
}

/// Pixel layout of a texture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Luminance,
    LuminanceAlpha,
    Rgb,
    Rgba,
}

impl TextureFormat {
    /// Format for a bytes-per-pixel count
    pub fn from_bpp(bpp: u32) -> Result<Self> {
        match bpp {
            1 => Ok(TextureFormat::Luminance),
            2 => Ok(TextureFormat::LuminanceAlpha),
            3 => Ok(TextureFormat::Rgb),
            4 => Ok(TextureFormat::Rgba),
            other => Err(TextureError::UnsupportedFormat(other)),
        }
    }

    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Luminance => 1,
            TextureFormat::LuminanceAlpha => 2,
            TextureFormat::Rgb => 3,
            TextureFormat::Rgba => 4,
        }
    }
}

/// A live GPU texture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Texture {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Decoded pixels ready for upload
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: TextureFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw pixel data, checking its length against the dimensions
    pub fn new(width: u32, height: u32, bpp: u32, data: Vec<u8>) -> Result<Self> {
        let format = TextureFormat::from_bpp(bpp)?;
        let expected = width as usize * height as usize * bpp as usize;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Solid RGBA fill, handy for placeholders
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            format: TextureFormat::Rgba,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn bpp(&self) -> u32 {
        self.format.bytes_per_pixel()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}
