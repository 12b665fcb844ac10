//! Renderable gallery items.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Item construction errors.
#[derive(Debug, Error, PartialEq)]
pub enum ItemError {
    #[error("Invalid item size for {id}: {width}x{height}")]
    InvalidSize { id: String, width: f64, height: f64 },
    #[error("Item id must not be empty")]
    EmptyId,
}

/// Optional descriptive data attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub date: Option<String>,
    pub location: Option<String>,
    pub camera: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub description: Option<String>,
}

/// A rectangular item placed in grid space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasItem {
    /// Unique within one grid generation.
    pub id: String,
    /// Top-left corner in grid coordinates.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Image location; empty for an upload action tile.
    #[serde(default)]
    pub image_url: String,
    pub title: Option<String>,
    pub metadata: Option<ItemMetadata>,
}

impl CanvasItem {
    /// Create an item covering `rect`.
    ///
    /// The rectangle must have a strictly positive, finite size.
    pub fn new(id: impl Into<String>, rect: Rect) -> Result<Self, ItemError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ItemError::EmptyId);
        }
        let (width, height) = (rect.width(), rect.height());
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ItemError::InvalidSize { id, width, height });
        }
        Ok(Self {
            id,
            x: rect.x0,
            y: rect.y0,
            width,
            height,
            image_url: String::new(),
            title: None,
            metadata: None,
        })
    }

    /// Set the image location.
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = url.into();
        self
    }

    /// Set the display label.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: ItemMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Bounding rectangle in grid coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(Point::new(self.x, self.y), Size::new(self.width, self.height))
    }

    /// Center point in grid coordinates.
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Whether this is a placeholder/action tile without an image.
    pub fn is_placeholder(&self) -> bool {
        self.image_url.is_empty()
    }
}

/// Bounding box of a set of items, or `None` when empty.
pub fn items_bounds(items: &[CanvasItem]) -> Option<Rect> {
    let mut iter = items.iter();
    let first = iter.next()?.bounds();
    Some(iter.fold(first, |acc, item| acc.union(item.bounds())))
}

/// Image format of uploaded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }
}
