//! HEIC/HEIF upload support (phone photos).

use image::DynamicImage;

use crate::error::CanvasError;

/// Check if the data looks like a HEIC/HEIF file by examining magic bytes.
/// HEIC files have an "ftyp" box near the start with HEIC-related brand codes.
pub fn is_heic(data: &[u8]) -> bool {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return false;
    }
    matches!(
        &data[8..12],
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" | b"hevm" | b"hevs" | b"mif1" | b"msf1"
    )
}

/// Decode a HEIC/HEIF image using libheif.
#[cfg(feature = "heif")]
pub fn decode_heic(data: &[u8]) -> Result<DynamicImage, CanvasError> {
    use image::RgbImage;
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(data)
        .map_err(|e| CanvasError::Decode(format!("Failed to read HEIC: {}", e)))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| CanvasError::Decode(format!("Failed to get primary image: {}", e)))?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| CanvasError::Decode(format!("Failed to decode HEIC image: {}", e)))?;

    let planes = decoded.planes();
    let interleaved = planes
        .interleaved
        .ok_or_else(|| CanvasError::Decode("No interleaved RGB data in HEIC".to_string()))?;

    let width = decoded.width();
    let height = decoded.height();
    let stride = interleaved.stride;
    let row_bytes = width as usize * 3;

    // Drop the row padding libheif adds after each stride
    let mut rgb = Vec::with_capacity(row_bytes * height as usize);
    for row in interleaved.data.chunks(stride).take(height as usize) {
        rgb.extend_from_slice(&row[..row_bytes.min(row.len())]);
    }

    RgbImage::from_raw(width, height, rgb)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| CanvasError::Decode("Truncated HEIC pixel data".to_string()))
}

#[cfg(not(feature = "heif"))]
pub fn decode_heic(_data: &[u8]) -> Result<DynamicImage, CanvasError> {
    Err(CanvasError::Decode(
        "HEIC images are not supported (built without the `heif` feature)".to_string(),
    ))
}
