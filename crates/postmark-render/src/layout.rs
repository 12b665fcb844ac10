//! Composite layout: photo sizing, caption wrapping and line placement.
//!
//! All geometry is computed up front so it can be tested without
//! rasterizing anything.

use crate::options::PolaroidOptions;
use crate::text::FontSpec;
use kurbo::Rect;

/// Vertical distance between caption lines.
pub const LINE_HEIGHT: f64 = 25.0;
/// Space between the band edges and the first/last caption line.
pub const TEXT_PADDING: f64 = 10.0;
/// Aspect ratios within this distance of 1 count as square.
const SQUARE_TOLERANCE: f64 = 0.1;

/// Photo orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

impl Orientation {
    pub fn classify(width: u32, height: u32) -> Self {
        let aspect = width.max(1) as f64 / height.max(1) as f64;
        if (aspect - 1.0).abs() < SQUARE_TOLERANCE {
            Orientation::Square
        } else if aspect > 1.0 {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Size of the photo inside the frame.
///
/// Bounds are scaled by the device factor. Landscape photos fit the width
/// first, portrait photos the height, square photos the smaller bound.
/// Photos are never enlarged.
pub fn content_size(image_width: u32, image_height: u32, opts: &PolaroidOptions) -> (u32, u32) {
    let (iw, ih) = (image_width.max(1) as f64, image_height.max(1) as f64);
    let factor = opts.device.bounds_factor();
    let max_w = (opts.max_width * factor).max(1.0);
    let max_h = (opts.max_height * factor).max(1.0);

    let (w, h) = match Orientation::classify(image_width, image_height) {
        Orientation::Landscape => {
            let w = iw.min(max_w);
            let h = w * ih / iw;
            if h > max_h { (max_h * iw / ih, max_h) } else { (w, h) }
        }
        Orientation::Portrait => {
            let h = ih.min(max_h);
            let w = h * iw / ih;
            if w > max_w { (max_w, max_w * ih / iw) } else { (w, h) }
        }
        Orientation::Square => {
            let scale = (max_w.min(max_h) / iw.max(ih)).min(1.0);
            (iw * scale, ih * scale)
        }
    };
    (w.round().max(1.0) as u32, h.round().max(1.0) as u32)
}

/// Greedy word wrap.
///
/// Joined lines stay strictly narrower than `max_width`; a line reaching it
/// only happens for a single word that does not fit on its own.
pub fn wrap_text(
    text: &str,
    max_width: f64,
    mut measure: impl FnMut(&str) -> f64,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if measure(&candidate) < max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Which caption a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Location,
    Branding,
}

/// One positioned caption line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub kind: LineKind,
    pub text: String,
    pub font: FontSpec,
    /// Left edge of the line box.
    pub x: f64,
    /// Top edge of the line box.
    pub y: f64,
    pub width: f64,
}

/// Full composite geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeLayout {
    pub orientation: Orientation,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub content_width: u32,
    pub content_height: u32,
    /// Where the photo is drawn.
    pub image_rect: Rect,
    /// Caption area below the photo.
    pub text_band: Rect,
    pub lines: Vec<TextLine>,
}

impl CompositeLayout {
    /// Lay out a composite for an image of the given size.
    ///
    /// `measure` returns the advance width of a string in a font.
    pub fn compute(
        image_width: u32,
        image_height: u32,
        opts: &PolaroidOptions,
        mut measure: impl FnMut(&str, FontSpec) -> f64,
    ) -> Self {
        let (cw, ch) = content_size(image_width, image_height, opts);
        let border = opts.border_width.max(0.0).round();
        let canvas_width = cw + 2 * border as u32;
        let max_text_width = cw as f64;

        let title_font = FontSpec::new(opts.font_size, true);
        let location_font = FontSpec::new(opts.font_size * 0.75, false);
        let branding_font = FontSpec::new(opts.font_size * 0.6, false);

        let title_lines = wrap_text(opts.title.trim(), max_text_width, |s| measure(s, title_font));
        let location_lines =
            wrap_text(&opts.location_line(), max_text_width, |s| measure(s, location_font));
        let branding = opts.branding_line();

        let line_count = title_lines.len() + location_lines.len() + 1;
        let band = opts
            .min_text_height
            .max(line_count as f64 * LINE_HEIGHT + 2.0 * TEXT_PADDING)
            .round();
        let band_top = ch as f64 + 2.0 * border;
        let canvas_height = band_top as u32 + band as u32;

        let mut place = |kind: LineKind, text: String, font: FontSpec, y: f64| {
            let width = measure(&text, font);
            let x = ((canvas_width as f64 - width) / 2.0).max(border);
            TextLine {
                kind,
                text,
                font,
                x,
                y,
                width,
            }
        };

        let mut lines = Vec::with_capacity(line_count);
        let mut y = band_top + TEXT_PADDING;
        for text in title_lines {
            lines.push(place(LineKind::Title, text, title_font, y));
            y += LINE_HEIGHT;
        }
        for text in location_lines {
            lines.push(place(LineKind::Location, text, location_font, y));
            y += LINE_HEIGHT;
        }
        let branding_y = canvas_height as f64 - TEXT_PADDING - LINE_HEIGHT;
        lines.push(place(LineKind::Branding, branding, branding_font, branding_y));

        Self {
            orientation: Orientation::classify(image_width, image_height),
            canvas_width,
            canvas_height,
            content_width: cw,
            content_height: ch,
            image_rect: Rect::new(border, border, border + cw as f64, border + ch as f64),
            text_band: Rect::new(0.0, band_top, canvas_width as f64, canvas_height as f64),
            lines,
        }
    }

    /// Height of the caption band.
    pub fn text_band_height(&self) -> f64 {
        self.text_band.height()
    }
}
