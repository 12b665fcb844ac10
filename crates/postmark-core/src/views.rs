//! Alternative gallery presentations: carousel and vertical list.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How the gallery presents its memories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryMode {
    #[default]
    Grid,
    Carousel,
    List,
}

impl GalleryMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "grid" => Some(GalleryMode::Grid),
            "carousel" => Some(GalleryMode::Carousel),
            "list" => Some(GalleryMode::List),
            _ => None,
        }
    }
}

/// Wrap-around selection over `len` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Carousel {
    len: usize,
    current: usize,
}

impl Carousel {
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Selected index, `None` when empty.
    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.current)
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.current = (self.current + 1) % self.len;
        Some(self.current)
    }

    pub fn prev(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.current = (self.current + self.len - 1) % self.len;
        Some(self.current)
    }

    /// Jump to `index`; out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.current = index;
        true
    }

    /// Change the entry count, keeping the selection in range.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if self.current >= len {
            self.current = 0;
        }
    }

    /// Indices within `radius` of the selection, wrapping around, in display order.
    pub fn window(&self, radius: usize) -> Vec<usize> {
        if self.len == 0 {
            return Vec::new();
        }
        let span = (2 * radius + 1).min(self.len);
        let start = (self.current + self.len - (span / 2) % self.len) % self.len;
        (0..span).map(|i| (start + i) % self.len).collect()
    }
}

/// Visible range of a fixed-row-height vertical list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListWindow {
    pub row_height: f64,
    /// Extra rows kept mounted above and below the viewport.
    pub overscan: usize,
}

impl Default for ListWindow {
    fn default() -> Self {
        Self {
            row_height: 320.0,
            overscan: 2,
        }
    }
}

impl ListWindow {
    pub fn new(row_height: f64, overscan: usize) -> Self {
        Self {
            row_height,
            overscan,
        }
    }

    /// Total scrollable height for `count` rows.
    pub fn content_height(&self, count: usize) -> f64 {
        count as f64 * self.row_height
    }

    /// Indices to mount for the given scroll offset and viewport height.
    pub fn visible_range(
        &self,
        count: usize,
        scroll_offset: f64,
        viewport_height: f64,
    ) -> Range<usize> {
        if count == 0 || self.row_height <= 0.0 || viewport_height <= 0.0 {
            return 0..0;
        }
        let offset = scroll_offset.max(0.0);
        let first = (offset / self.row_height).floor() as usize;
        let last = ((offset + viewport_height) / self.row_height).ceil() as usize;
        let start = first.saturating_sub(self.overscan).min(count);
        let end = (last + self.overscan).min(count);
        start..end
    }

    /// Scroll offset that brings row `index` to the top.
    pub fn offset_for(&self, index: usize) -> f64 {
        index as f64 * self.row_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carousel_wraps() {
        let mut carousel = Carousel::new(3);
        assert_eq!(carousel.current(), Some(0));
        assert_eq!(carousel.prev(), Some(2));
        assert_eq!(carousel.next(), Some(0));
        assert_eq!(carousel.next(), Some(1));
        assert!(carousel.select(2));
        assert!(!carousel.select(3));
        assert_eq!(carousel.current(), Some(2));
    }

    #[test]
    fn test_empty_carousel() {
        let mut carousel = Carousel::new(0);
        assert_eq!(carousel.current(), None);
        assert_eq!(carousel.next(), None);
        assert_eq!(carousel.prev(), None);
        assert!(carousel.window(2).is_empty());
    }

    #[test]
    fn test_carousel_window() {
        let mut carousel = Carousel::new(6);
        assert_eq!(carousel.window(1), vec![5, 0, 1]);
        carousel.select(3);
        assert_eq!(carousel.window(2), vec![1, 2, 3, 4, 5]);
        assert_eq!(Carousel::new(2).window(3), vec![1, 0]);

        carousel.set_len(2);
        assert_eq!(carousel.current(), Some(0));
    }

    #[test]
    fn test_list_window() {
        let list = ListWindow::new(100.0, 1);
        assert_eq!(list.visible_range(50, 0.0, 250.0), 0..4);
        assert_eq!(list.visible_range(50, 1000.0, 250.0), 9..14);
        assert_eq!(list.visible_range(12, 1000.0, 250.0), 9..12);
        assert_eq!(list.visible_range(0, 0.0, 250.0), 0..0);
        assert_eq!(list.visible_range(10, 0.0, 0.0), 0..0);
        assert_eq!(list.content_height(10), 1000.0);
        assert_eq!(list.offset_for(3), 300.0);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(GalleryMode::parse("List"), Some(GalleryMode::List));
        assert_eq!(GalleryMode::parse("masonry"), None);
    }
}
