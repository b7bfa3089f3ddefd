//! # Export
//!
//! Encodes a rendered frame for sharing (JPEG) or download (PNG).
//!
//! An [`ExportJob`] is an owned copy of the frame, so encoding can run on the
//! blocking pool or inside a share flow without borrowing the compositor.

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{
    RgbImage, RgbaImage,
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
};

use crate::error::CanvasError;
use crate::render::Surface;

pub const JPEG_MIME: &str = "image/jpeg";
pub const PNG_MIME: &str = "image/png";

/// A snapshot of one rendered frame, ready to encode.
#[derive(Debug, Clone)]
pub struct ExportJob {
    image: RgbaImage,
    jpeg_quality: u8,
}

impl ExportJob {
    pub fn from_surface(surface: &Surface, jpeg_quality: u8) -> Self {
        Self {
            image: surface.to_rgba_image(),
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Encode as JPEG. Transparent pixels are composited over black.
    pub fn encode_jpeg(&self) -> Result<Vec<u8>, CanvasError> {
        let (width, height) = self.image.dimensions();
        let mut rgb = RgbImage::new(width, height);
        for (dst, src) in rgb.pixels_mut().zip(self.image.pixels()) {
            let a = src[3] as u32;
            for c in 0..3 {
                dst[c] = ((src[c] as u32 * a + 127) / 255) as u8;
            }
        }

        let mut bytes = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality))
            .map_err(|e| CanvasError::Encode(format!("Failed to encode JPEG: {}", e)))?;
        Ok(bytes)
    }

    /// Encode as lossless PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, CanvasError> {
        let mut bytes = Vec::new();
        self.image
            .write_with_encoder(PngEncoder::new(&mut bytes))
            .map_err(|e| CanvasError::Encode(format!("Failed to encode PNG: {}", e)))?;
        Ok(bytes)
    }

    /// PNG as a `data:` URI for direct download links.
    pub fn to_data_uri(&self) -> Result<String, CanvasError> {
        let png = self.encode_png()?;
        Ok(format!("data:{};base64,{}", PNG_MIME, STANDARD.encode(png)))
    }

    /// Encode JPEG on the blocking thread pool.
    pub async fn encode_jpeg_async(self) -> Result<Vec<u8>, CanvasError> {
        tokio::task::spawn_blocking(move || self.encode_jpeg())
            .await
            .map_err(|e| CanvasError::Encode(format!("Encode task failed: {}", e)))?
    }
}
