//! Sketch capture and encoding
//!
//! A sketch is the 512×512 RGBA raster drawn in the browser canvas. It lives
//! for one generation request: it is decoded from the page's PNG data URL,
//! checked for content, flattened to RGB and re-encoded as PNG for the
//! provider calls.

use crate::{Error, Result};
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;

/// Width and height of the drawing surface.
pub const SKETCH_SIZE: u32 = 512;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone)]
pub struct Sketch {
    pixels: RgbaImage,
}

impl Sketch {
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self> {
        if pixels.dimensions() != (SKETCH_SIZE, SKETCH_SIZE) {
            return Err(Error::InvalidSketch(format!(
                "expected {}x{} pixels, got {}x{}",
                SKETCH_SIZE,
                SKETCH_SIZE,
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self { pixels })
    }

    pub fn from_png_bytes(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|e| Error::InvalidSketch(format!("not a readable PNG: {}", e)))?;
        Self::from_rgba(decoded.to_rgba8())
    }

    /// Decodes a `data:image/png;base64,...` URL as produced by `canvas.toDataURL()`.
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        let payload = data_url
            .trim()
            .strip_prefix(PNG_DATA_URL_PREFIX)
            .ok_or_else(|| Error::InvalidSketch("expected a base64 PNG data URL".to_string()))?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| Error::InvalidSketch(format!("invalid base64 payload: {}", e)))?;

        Self::from_png_bytes(&bytes)
    }

    /// True when nothing has been drawn: every pixel is transparent or
    /// the white canvas background.
    pub fn is_blank(&self) -> bool {
        self.pixels
            .pixels()
            .all(|p| p[3] == 0 || (p[0] == 255 && p[1] == 255 && p[2] == 255))
    }

    /// Drops the alpha channel.
    pub fn to_rgb(&self) -> RgbImage {
        DynamicImage::ImageRgba8(self.pixels.clone()).to_rgb8()
    }
}

pub fn encode_png_sync(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Encodes off the async runtime.
pub async fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let image = image.clone();
    tokio::task::spawn_blocking(move || encode_png_sync(&image))
        .await
        .map_err(|e| Error::Invariant(format!("PNG encoding task join error: {}", e)))?
}
