//! Pre-upload image compression.

use crate::encode::encode_jpeg;
use crate::error::{RenderError, RenderResult};
use image::imageops::FilterType;
use postmark_core::item::ImageFormat;
use serde::{Deserialize, Serialize};

/// Compression settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressOptions {
    /// Longest side after compression.
    pub max_dimension: u32,
    /// JPEG quality, 1..=100.
    pub quality: u8,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_dimension: 2048,
            quality: 80,
        }
    }
}

/// Result of [`compress_image`].
#[derive(Debug, Clone)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub width: u32,
    pub height: u32,
    /// False when the original bytes were kept.
    pub compressed: bool,
}

/// Downscale and re-encode an image as JPEG.
///
/// The input is returned untouched when it already fits and re-encoding
/// would not make it smaller.
pub fn compress_image(bytes: &[u8], opts: &CompressOptions) -> RenderResult<Compressed> {
    let decoded = image::load_from_memory(bytes).map_err(|e| RenderError::Decode(e.to_string()))?;
    let (width, height) = (decoded.width(), decoded.height());
    let max_dimension = opts.max_dimension.max(1);

    let longest = width.max(height);
    let resized = longest > max_dimension;
    let rgba = if resized {
        let scale = max_dimension as f64 / longest as f64;
        let w = ((width as f64 * scale).round() as u32).max(1);
        let h = ((height as f64 * scale).round() as u32).max(1);
        image::imageops::resize(&decoded.to_rgba8(), w, h, FilterType::Triangle)
    } else {
        decoded.to_rgba8()
    };

    let encoded = encode_jpeg(rgba.as_raw(), rgba.width(), rgba.height(), opts.quality)?;
    if !resized && encoded.len() >= bytes.len() {
        let mime = ImageFormat::from_magic_bytes(bytes)
            .map(|f| f.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        log::debug!("Keeping original {} ({} bytes)", mime, bytes.len());
        return Ok(Compressed {
            bytes: bytes.to_vec(),
            mime,
            width,
            height,
            compressed: false,
        });
    }

    log::info!(
        "Compressed {}x{} ({} bytes) to {}x{} ({} bytes)",
        width,
        height,
        bytes.len(),
        rgba.width(),
        rgba.height(),
        encoded.len()
    );
    Ok(Compressed {
        bytes: encoded,
        mime: "image/jpeg".to_string(),
        width: rgba.width(),
        height: rgba.height(),
        compressed: true,
    })
}
