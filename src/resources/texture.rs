//! Texture loading

use crate::error::TextureError;
use image::{DynamicImage, GenericImageView};
use std::path::Path;

/// Decoded RGBA8 texture data
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8 pixels
    pub data: Vec<u8>,
}

impl TextureData {
    /// Load texture from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let img = image::open(path).map_err(|source| TextureError::Decode {
            name: name.clone(),
            source,
        })?;
        Ok(Self::from_image(img, &name))
    }

    /// Decode texture from encoded bytes (PNG, JPEG, ...)
    pub fn from_bytes(bytes: &[u8], name: &str) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes).map_err(|source| TextureError::Decode {
            name: name.to_string(),
            source,
        })?;
        Ok(Self::from_image(img, name))
    }

    fn from_image(img: DynamicImage, name: &str) -> Self {
        let (width, height) = img.dimensions();
        log::debug!("Decoded texture '{}' ({}x{})", name, width, height);
        Self {
            name: name.to_string(),
            width,
            height,
            data: img.to_rgba8().into_raw(),
        }
    }

    /// 1x1 texture of a single colour
    pub fn solid_color(color: [u8; 4], name: &str) -> Self {
        Self {
            name: name.to_string(),
            width: 1,
            height: 1,
            data: color.to_vec(),
        }
    }

    pub fn white() -> Self {
        Self::solid_color([255, 255, 255, 255], "white")
    }

    /// Square checkerboard with `cell`-pixel squares
    pub fn checkerboard(size: u32, cell: u32, color1: [u8; 4], color2: [u8; 4]) -> Self {
        let cell = cell.max(1);
        let data = (0..size)
            .flat_map(|y| (0..size).map(move |x| (x, y)))
            .flat_map(|(x, y)| {
                if ((x / cell) + (y / cell)) % 2 == 0 {
                    color1
                } else {
                    color2
                }
            })
            .collect();

        Self {
            name: "checkerboard".to_string(),
            width: size,
            height: size,
            data,
        }
    }

    /// RGBA of the pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let p = self.data.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }
}
