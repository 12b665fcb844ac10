//! Pixel conversions, PNG/JPEG encoding and data URLs.

use crate::error::{RenderError, RenderResult};
use crate::options::OutputFormat;
use base64::Engine;
use std::sync::Arc;

pub(crate) fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}

/// Wrap premultiplied RGBA8 bytes as a vello_cpu image paint.
pub(crate) fn image_paint(
    premul: &[u8],
    width: u32,
    height: u32,
) -> RenderResult<vello_cpu::Image> {
    let (w, h) = surface_size(width, height)?;
    if premul.len() != (width as usize) * (height as usize) * 4 {
        return Err(RenderError::Surface(format!(
            "Pixel buffer of {} bytes does not match {}x{}",
            premul.len(),
            width,
            height
        )));
    }
    let pixels = premul
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Surface dimensions as vello_cpu expects them.
pub(crate) fn surface_size(width: u32, height: u32) -> RenderResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| RenderError::Surface(format!("Width {} exceeds surface limit", width)))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| RenderError::Surface(format!("Height {} exceeds surface limit", height)))?;
    if w == 0 || h == 0 {
        return Err(RenderError::Surface(format!("Empty surface {}x{}", width, height)));
    }
    Ok((w, h))
}

/// Encode straight-alpha RGBA8 pixels to PNG.
pub fn encode_png(rgba: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("PNG header: {}", e)))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| RenderError::Encode(format!("PNG data: {}", e)))?;
    }
    Ok(png_data)
}

/// Encode RGBA8 pixels to JPEG at `quality` (1..=100).
///
/// JPEG has no alpha, so translucent pixels are flattened onto white.
pub fn encode_jpeg(rgba: &[u8], width: u32, height: u32, quality: u8) -> RenderResult<Vec<u8>> {
    let rgb: Vec<u8> = rgba
        .chunks_exact(4)
        .flat_map(|px| {
            let a = px[3] as u32;
            let over_white = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
            [over_white(px[0]), over_white(px[1]), over_white(px[2])]
        })
        .collect();
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .encode(&rgb, width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| RenderError::Encode(format!("JPEG: {}", e)))?;
    Ok(out)
}

pub fn encode(
    rgba: &[u8],
    width: u32,
    height: u32,
    format: OutputFormat,
    quality: u8,
) -> RenderResult<Vec<u8>> {
    match format {
        OutputFormat::Png => encode_png(rgba, width, height),
        OutputFormat::Jpeg => encode_jpeg(rgba, width, height, quality),
    }
}

/// `data:<mime>;base64,<payload>`
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Split a base64 data URL into its MIME type and decoded bytes.
pub fn parse_data_url(url: &str) -> RenderResult<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::DataUrl("missing data: prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::DataUrl("missing payload".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| RenderError::DataUrl("only base64 payloads are supported".to_string()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| RenderError::DataUrl(e.to_string()))?;
    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premultiply_roundtrip_opaque() {
        let mut px = vec![200, 100, 50, 255, 10, 20, 30, 0];
        premultiply_in_place(&mut px);
        assert_eq!(px, vec![200, 100, 50, 255, 0, 0, 0, 0]);
        unpremultiply_in_place(&mut px);
        assert_eq!(&px[..4], &[200, 100, 50, 255]);
    }

    #[test]
    fn test_jpeg_flattens_transparency_onto_white() {
        let clear_black = [0, 0, 0, 0].repeat(16 * 16);
        let jpeg = encode_jpeg(&clear_black, 16, 16, 90).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| c > 240)));

        let opaque_black = [0, 0, 0, 255].repeat(16 * 16);
        let jpeg = encode_jpeg(&opaque_black, 16, 16, 90).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| c < 15)));
    }

    #[test]
    fn test_half_alpha() {
        let mut px = vec![255, 0, 128, 128];
        premultiply_in_place(&mut px);
        assert_eq!(px, vec![128, 0, 64, 128]);
        unpremultiply_in_place(&mut px);
        assert_eq!(px, vec![255, 0, 128, 128]);
    }

    #[test]
    fn test_png_signature() {
        let png = encode_png(&[255; 16], 2, 2).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        assert!(encode_png(&[255; 4], 2, 2).is_err());
    }

    #[test]
    fn test_jpeg_signature() {
        let jpeg = encode_jpeg(&[128; 64], 4, 4, 80).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_data_url() {
        let url = to_data_url("image/png", b"hello");
        assert_eq!(url, "data:image/png;base64,aGVsbG8=");
        let (mime, bytes) = parse_data_url(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"hello");

        assert!(matches!(parse_data_url("image/png;base64,xx"), Err(RenderError::DataUrl(_))));
        assert!(matches!(parse_data_url("data:text/plain,hi"), Err(RenderError::DataUrl(_))));
    }

    #[test]
    fn test_surface_limits() {
        assert!(surface_size(800, 600).is_ok());
        assert!(matches!(surface_size(70_000, 10), Err(RenderError::Surface(_))));
        assert!(matches!(surface_size(0, 10), Err(RenderError::Surface(_))));
    }
}
