//! Polaroid-style composite rendering.
//!
//! A composite is the photo inside a solid frame with a caption band below
//! it: bold title, location, and a small branding line at the bottom.

use crate::encode::{
    encode, image_paint, premultiply_in_place, surface_size, to_data_url, unpremultiply_in_place,
};
use crate::error::{RenderError, RenderResult};
use crate::layout::CompositeLayout;
use crate::options::{OutputFormat, PolaroidOptions};
use crate::text::TextBackend;
use image::imageops::FilterType;
use kurbo::Point;
use postmark_core::share::ClipboardImage;

/// A decoded source photo.
#[derive(Debug, Clone)]
pub struct SourceImage {
    rgba: image::RgbaImage,
}

impl SourceImage {
    /// Decode PNG, JPEG or WebP bytes.
    pub fn decode(bytes: &[u8]) -> RenderResult<Self> {
        let image = image::load_from_memory(bytes).map_err(|e| RenderError::Decode(e.to_string()))?;
        Ok(Self::from_rgba(image.to_rgba8()))
    }

    pub fn from_rgba(rgba: image::RgbaImage) -> Self {
        Self { rgba }
    }

    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    /// Straight-alpha pixels scaled to exactly `width`x`height`.
    fn scaled(&self, width: u32, height: u32) -> Vec<u8> {
        if (width, height) == self.rgba.dimensions() {
            self.rgba.as_raw().clone()
        } else {
            image::imageops::resize(&self.rgba, width, height, FilterType::Triangle).into_raw()
        }
    }
}

/// An encoded composite.
#[derive(Debug, Clone)]
pub struct RenderedComposite {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    /// Straight-alpha RGBA8 pixels of the composite.
    pub pixels: Vec<u8>,
    pub layout: CompositeLayout,
}

impl RenderedComposite {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// The encoded bytes as a base64 data URL.
    pub fn data_url(&self) -> String {
        to_data_url(self.mime_type(), &self.bytes)
    }

    pub fn clipboard_image(&self) -> ClipboardImage {
        ClipboardImage {
            width: self.width as usize,
            height: self.height as usize,
            rgba: self.pixels.clone(),
        }
    }
}

/// Renders composites with a given text backend.
pub struct Compositor<T> {
    text: T,
}

impl<T: TextBackend> Compositor<T> {
    pub fn new(text: T) -> Self {
        Self { text }
    }

    pub fn text_mut(&mut self) -> &mut T {
        &mut self.text
    }

    /// Compute the composite layout for an image of the given size.
    pub fn layout(&mut self, width: u32, height: u32, opts: &PolaroidOptions) -> CompositeLayout {
        let text = &mut self.text;
        CompositeLayout::compute(width, height, opts, |s, font| text.measure(s, font))
    }

    /// Decode `bytes` and render them.
    pub fn render_bytes(
        &mut self,
        bytes: &[u8],
        opts: &PolaroidOptions,
    ) -> RenderResult<RenderedComposite> {
        let image = SourceImage::decode(bytes)?;
        self.render(&image, opts)
    }

    /// Render and encode a composite.
    pub fn render(
        &mut self,
        image: &SourceImage,
        opts: &PolaroidOptions,
    ) -> RenderResult<RenderedComposite> {
        let layout = self.layout(image.width(), image.height(), opts);
        let pixels = self.rasterize(image, &layout, opts)?;
        let bytes = encode(
            &pixels,
            layout.canvas_width,
            layout.canvas_height,
            opts.format,
            opts.jpeg_quality(),
        )?;
        log::info!(
            "Rendered {}x{} composite ({} lines, {} bytes {})",
            layout.canvas_width,
            layout.canvas_height,
            layout.lines.len(),
            bytes.len(),
            opts.format.mime_type()
        );
        Ok(RenderedComposite {
            bytes,
            format: opts.format,
            width: layout.canvas_width,
            height: layout.canvas_height,
            pixels,
            layout,
        })
    }

    /// Draw the composite into straight-alpha RGBA8 pixels.
    fn rasterize(
        &mut self,
        image: &SourceImage,
        layout: &CompositeLayout,
        opts: &PolaroidOptions,
    ) -> RenderResult<Vec<u8>> {
        let (w, h) = surface_size(layout.canvas_width, layout.canvas_height)?;
        let mut ctx = vello_cpu::RenderContext::new(w, h);

        ctx.set_paint(opts.background.to_color());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w as f64, h as f64));

        let (cw, ch) = (layout.content_width, layout.content_height);
        let mut photo = image.scaled(cw, ch);
        premultiply_in_place(&mut photo);
        let paint = image_paint(&photo, cw, ch)?;
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            layout.image_rect.x0,
            layout.image_rect.y0,
        )));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, cw as f64, ch as f64));
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

        for line in &layout.lines {
            self.text.draw(
                &mut ctx,
                &line.text,
                line.font,
                Point::new(line.x, line.y),
                opts.text_color,
            );
        }

        ctx.flush();
        let mut target = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut target);
        let mut pixels = target.data_as_u8_slice().to_vec();
        unpremultiply_in_place(&mut pixels);
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LineKind;
    use crate::options::Rgba8;
    use crate::text::BlockText;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> SourceImage {
        SourceImage::from_rgba(image::RgbaImage::from_pixel(width, height, image::Rgba(color)))
    }

    fn pixel(rendered: &RenderedComposite, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * rendered.width + x) * 4) as usize;
        [
            rendered.pixels[i],
            rendered.pixels[i + 1],
            rendered.pixels[i + 2],
            rendered.pixels[i + 3],
        ]
    }

    #[test]
    fn test_sunset_composite() {
        let mut compositor = Compositor::new(BlockText);
        let opts = PolaroidOptions {
            title: "Sunset".to_string(),
            ..Default::default()
        };
        let rendered = compositor.render(&solid(1024, 768, [200, 40, 30, 255]), &opts).unwrap();

        assert_eq!((rendered.width, rendered.height), (850, 730));
        assert_eq!(rendered.mime_type(), "image/png");
        assert_eq!(rendered.pixels.len(), 850 * 730 * 4);
        assert!(rendered.data_url().starts_with("data:image/png;base64,iVBORw0KGgo"));

        // Frame, photo and caption band.
        assert_eq!(pixel(&rendered, 5, 5), [255, 255, 255, 255]);
        let center = pixel(&rendered, 425, 325);
        assert!(center[0] > 180 && center[1] < 60 && center[2] < 50, "{center:?}");
        assert_eq!(pixel(&rendered, 5, 700), [255, 255, 255, 255]);

        let title = &rendered.layout.lines[0];
        assert_eq!(title.kind, LineKind::Title);
        let ink = pixel(&rendered, (title.x + 6.0) as u32, (title.y + 12.0) as u32);
        assert!(ink[0] < 100, "{ink:?}");
    }

    #[test]
    fn test_data_url_matches_bytes() {
        let mut compositor = Compositor::new(BlockText);
        for format in [OutputFormat::Png, OutputFormat::Jpeg] {
            let opts = PolaroidOptions {
                title: "Sunset".to_string(),
                location: "Lisbon".to_string(),
                format,
                ..Default::default()
            };
            let rendered = compositor.render(&solid(640, 480, [30, 90, 200, 255]), &opts).unwrap();

            let (mime, bytes) = crate::encode::parse_data_url(&rendered.data_url()).unwrap();
            assert_eq!(mime, rendered.mime_type());
            assert_eq!(bytes, rendered.bytes);

            let from_url = image::load_from_memory(&bytes).unwrap().to_rgba8();
            let from_blob = image::load_from_memory(&rendered.bytes).unwrap().to_rgba8();
            assert_eq!(from_url.dimensions(), (rendered.width, rendered.height));
            assert_eq!(from_url, from_blob, "{format:?}");
        }
    }

    #[test]
    fn test_jpeg_output_decodes() {
        let mut compositor = Compositor::new(BlockText);
        let opts = PolaroidOptions {
            format: OutputFormat::Jpeg,
            quality: 0.8,
            background: Rgba8::from_hex("#f4efe6").unwrap(),
            ..Default::default()
        };
        let rendered = compositor.render(&solid(300, 400, [0, 0, 255, 255]), &opts).unwrap();
        assert_eq!(rendered.mime_type(), "image/jpeg");
        assert!(rendered.data_url().starts_with("data:image/jpeg;base64,"));

        let decoded = image::load_from_memory(&rendered.bytes).unwrap();
        assert_eq!(decoded.width(), rendered.width);
        assert_eq!(decoded.height(), rendered.height);
        assert_eq!(rendered.width, 300 + 50);
    }

    #[test]
    fn test_render_encoded_input() {
        let png = crate::encode::encode_png(&[10, 200, 10, 255].repeat(64 * 48), 64, 48).unwrap();
        let mut compositor = Compositor::new(BlockText);
        let rendered = compositor.render_bytes(&png, &PolaroidOptions::default()).unwrap();
        assert_eq!(rendered.layout.content_width, 64);
        assert_eq!(rendered.layout.content_height, 48);
        assert_eq!(rendered.clipboard_image().rgba.len(), rendered.pixels.len());
    }

    #[test]
    fn test_decode_failure() {
        let mut compositor = Compositor::new(BlockText);
        let err = compositor
            .render_bytes(b"definitely not an image", &PolaroidOptions::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));
    }
}
