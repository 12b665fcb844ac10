//! Composite rendering options.

use postmark_core::device::DeviceClass;
use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);
    pub const INK: Rgba8 = Rgba8::rgb(26, 26, 26);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => None,
        }
    }

    pub(crate) fn to_color(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }
}

/// Options for one composite render. Everything except the image is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolaroidOptions {
    /// Maximum content width before the device factor is applied.
    pub max_width: f64,
    /// Maximum content height before the device factor is applied.
    pub max_height: f64,
    /// Frame width around the photo.
    pub border_width: f64,
    /// Minimum height of the caption band.
    pub min_text_height: f64,
    /// Title size; location and branding are derived from it.
    pub font_size: f64,
    pub background: Rgba8,
    pub text_color: Rgba8,
    pub format: OutputFormat,
    /// JPEG quality in `0.0..=1.0`.
    pub quality: f32,
    pub title: String,
    pub location: String,
    pub device: DeviceClass,
    pub branding: String,
    pub location_prefix: String,
    pub handle: Option<String>,
    pub date: Option<String>,
}

impl Default for PolaroidOptions {
    fn default() -> Self {
        Self {
            max_width: 800.0,
            max_height: 800.0,
            border_width: 25.0,
            min_text_height: 80.0,
            font_size: 24.0,
            background: Rgba8::WHITE,
            text_color: Rgba8::INK,
            format: OutputFormat::Png,
            quality: 0.92,
            title: String::new(),
            location: String::new(),
            device: DeviceClass::Desktop,
            branding: "Made with Postmark".to_string(),
            location_prefix: "📍 ".to_string(),
            handle: None,
            date: None,
        }
    }
}

impl PolaroidOptions {
    /// Full location line, empty when no location is set.
    pub fn location_line(&self) -> String {
        let location = self.location.trim();
        if location.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.location_prefix, location)
        }
    }

    /// Branding line with handle and date appended.
    pub fn branding_line(&self) -> String {
        let mut line = self.branding.clone();
        for extra in [&self.handle, &self.date].into_iter().flatten() {
            let extra = extra.trim();
            if extra.is_empty() {
                continue;
            }
            if !line.is_empty() {
                line.push_str(" · ");
            }
            line.push_str(extra);
        }
        line
    }

    /// JPEG quality as the encoder's 1..=100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
    }
}
