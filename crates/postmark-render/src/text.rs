//! Caption text: font loading, measuring and glyph drawing.
//!
//! Layout code only needs widths, so text sits behind [`TextBackend`].
//! [`TextEngine`] is the real backend: Parley shapes, vello_cpu fills.

use crate::error::{RenderError, RenderResult};
use crate::options::Rgba8;
use kurbo::Point;
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, LayoutContext, StyleProperty};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Size and weight of one caption line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub size: f64,
    pub bold: bool,
}

impl FontSpec {
    pub const fn new(size: f64, bold: bool) -> Self {
        Self { size, bold }
    }
}

/// Measures and draws single lines of text.
pub trait TextBackend {
    /// Advance width of `text` in pixels.
    fn measure(&mut self, text: &str, font: FontSpec) -> f64;

    /// Draw `text` with its line box's top-left corner at `origin`.
    fn draw(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        font: FontSpec,
        origin: Point,
        color: Rgba8,
    );
}

/// Well-known (regular, bold) font locations tried by [`FontSource::discover`].
const FONT_CANDIDATES: &[(&str, &str)] = &[
    (
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    ),
    (
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    ),
    ("C:\\Windows\\Fonts\\arial.ttf", "C:\\Windows\\Fonts\\arialbd.ttf"),
];

/// Raw font files for captions.
#[derive(Clone)]
pub struct FontSource {
    pub regular: Vec<u8>,
    /// Bold face for titles; titles use the regular face when absent.
    pub bold: Option<Vec<u8>>,
}

impl std::fmt::Debug for FontSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSource")
            .field("regular", &self.regular.len())
            .field("bold", &self.bold.as_ref().map(Vec::len))
            .finish()
    }
}

impl FontSource {
    pub fn from_paths(regular: &Path, bold: Option<&Path>) -> RenderResult<Self> {
        let regular = read_font(regular)?;
        let bold = bold.map(read_font).transpose()?;
        Ok(Self { regular, bold })
    }

    /// First installed font from a list of common system locations.
    pub fn discover() -> RenderResult<Self> {
        for (regular, bold) in FONT_CANDIDATES {
            let regular = PathBuf::from(regular);
            if !regular.is_file() {
                continue;
            }
            let bold = PathBuf::from(bold);
            let bold = bold.is_file().then_some(bold.as_path());
            log::debug!("Using system font {}", regular.display());
            return Self::from_paths(&regular, bold);
        }
        Err(RenderError::Font(
            "No font configured and no system font found; set POSTMARK_FONT".to_string(),
        ))
    }

    /// Configured paths when given, otherwise [`FontSource::discover`].
    pub fn resolve(regular: Option<&Path>, bold: Option<&Path>) -> RenderResult<Self> {
        match regular {
            Some(regular) => Self::from_paths(regular, bold),
            None => Self::discover(),
        }
    }
}

fn read_font(path: &Path) -> RenderResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| RenderError::Font(format!("Failed to read {}: {}", path.display(), e)))
}

/// A registered face: Parley family name plus the bytes vello_cpu draws with.
struct Face {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Parley + vello_cpu text backend.
pub struct TextEngine {
    font_cx: FontContext,
    layout_cx: LayoutContext<Rgba8>,
    regular: Face,
    bold: Option<Face>,
}

impl TextEngine {
    pub fn new(source: FontSource) -> RenderResult<Self> {
        let mut font_cx = FontContext::default();
        let regular = register(&mut font_cx, source.regular)?;
        let bold = source
            .bold
            .map(|bytes| register(&mut font_cx, bytes))
            .transpose()?;
        log::debug!(
            "Text engine ready: regular={}, bold={}",
            regular.family,
            bold.as_ref().map_or("-", |f| f.family.as_str())
        );
        Ok(Self {
            font_cx,
            layout_cx: LayoutContext::new(),
            regular,
            bold,
        })
    }

    /// Convenience for [`FontSource::resolve`] followed by [`TextEngine::new`].
    pub fn load(regular: Option<&Path>, bold: Option<&Path>) -> RenderResult<Self> {
        Self::new(FontSource::resolve(regular, bold)?)
    }

    fn layout(&mut self, text: &str, font: FontSpec, brush: Rgba8) -> parley::Layout<Rgba8> {
        let face = match (&self.bold, font.bold) {
            (Some(bold), true) => bold,
            _ => &self.regular,
        };
        let mut builder = self
            .layout_cx
            .ranged_builder(&mut self.font_cx, text, 1.0, true);
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Source(
            Cow::Owned(face.family.clone()),
        )));
        builder.push_default(StyleProperty::FontSize(font.size as f32));
        builder.push_default(StyleProperty::Brush(brush));
        if font.bold {
            builder.push_default(StyleProperty::FontWeight(parley::FontWeight::BOLD));
        }
        let mut layout = builder.build(text);
        layout.break_all_lines(None);
        layout.align(None, parley::Alignment::Start, parley::AlignmentOptions::default());
        layout
    }

    fn face_data(&self, font: FontSpec) -> &vello_cpu::peniko::FontData {
        match (&self.bold, font.bold) {
            (Some(bold), true) => &bold.data,
            _ => &self.regular.data,
        }
    }
}

fn register(font_cx: &mut FontContext, bytes: Vec<u8>) -> RenderResult<Face> {
    let families = font_cx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| RenderError::Font("No font families found in font data".to_string()))?;
    let family = font_cx
        .collection
        .family_name(family_id)
        .ok_or_else(|| RenderError::Font("Registered font family has no name".to_string()))?
        .to_string();
    let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
    Ok(Face { family, data })
}

impl TextBackend for TextEngine {
    fn measure(&mut self, text: &str, font: FontSpec) -> f64 {
        if text.is_empty() {
            return 0.0;
        }
        self.layout(text, font, Rgba8::default()).width() as f64
    }

    fn draw(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        font: FontSpec,
        origin: Point,
        color: Rgba8,
    ) {
        if text.is_empty() {
            return;
        }
        let layout = self.layout(text, font, color);
        let data = self.face_data(font);

        ctx.set_transform(vello_cpu::kurbo::Affine::translate((origin.x, origin.y)));
        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                ctx.set_paint(glyph_run.style().brush.to_color());
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let glyphs = glyph_run.glyphs().map(|glyph| {
                    let gx = x + glyph.x;
                    let gy = y - glyph.y;
                    x += glyph.advance;
                    vello_cpu::Glyph {
                        id: glyph.id,
                        x: gx,
                        y: gy,
                    }
                });
                ctx.glyph_run(data)
                    .font_size(glyph_run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }
}

/// Fixed-advance backend that draws every non-space character as a block.
#[cfg(test)]
pub(crate) struct BlockText;

#[cfg(test)]
impl BlockText {
    pub(crate) fn advance(font: FontSpec) -> f64 {
        font.size * 0.5
    }
}

#[cfg(test)]
impl TextBackend for BlockText {
    fn measure(&mut self, text: &str, font: FontSpec) -> f64 {
        text.chars().count() as f64 * Self::advance(font)
    }

    fn draw(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        font: FontSpec,
        origin: Point,
        color: Rgba8,
    ) {
        let advance = Self::advance(font);
        ctx.set_paint(color.to_color());
        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let x = origin.x + i as f64 * advance;
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                x + 1.0,
                origin.y + 4.0,
                x + advance - 1.0,
                origin.y + font.size.min(20.0),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_font_file() {
        let err =
            FontSource::from_paths(Path::new("/definitely/not/a/font.ttf"), None).unwrap_err();
        assert!(matches!(err, RenderError::Font(_)));
    }

    #[test]
    fn test_invalid_font_bytes() {
        let source = FontSource {
            regular: b"not a font".to_vec(),
            bold: None,
        };
        assert!(matches!(TextEngine::new(source), Err(RenderError::Font(_))));
    }

    #[test]
    fn test_block_text_measure() {
        let mut text = BlockText;
        assert_eq!(text.measure("abcd", FontSpec::new(20.0, false)), 40.0);
        assert_eq!(text.measure("", FontSpec::new(20.0, true)), 0.0);
    }

    #[test]
    fn test_system_font_measures_when_available() {
        // Environments without any of the well-known fonts skip this check.
        let Ok(source) = FontSource::discover() else {
            return;
        };
        let mut engine = TextEngine::new(source).unwrap();
        let small = FontSpec::new(12.0, false);
        let large = FontSpec::new(24.0, false);
        assert_eq!(engine.measure("", small), 0.0);
        let short = engine.measure("Sun", small);
        let long = engine.measure("Sunset over the bay", small);
        assert!(short > 0.0);
        assert!(long > short);
        assert!(engine.measure("Sunset", large) > engine.measure("Sunset", small));
    }
}
