//! Viewport culling for the infinitely tiled grid.
//!
//! The base items form one tile. The tile repeats in every direction with a
//! period derived from the item spacing, and only instances whose rectangle
//! overlaps the padded viewport are materialized.

use crate::camera::Camera;
use crate::item::{CanvasItem, items_bounds};
use kurbo::{Rect, Size, Vec2};

/// Tolerance for deciding that two items share a row or column.
const ALIGN_EPSILON: f64 = 0.5;

/// Geometry of the repeating tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGeometry {
    /// Bounding box of the base items.
    pub bounds: Rect,
    /// Repetition period along each axis.
    pub size: Size,
}

impl TileGeometry {
    /// Derive the tile from the base items.
    ///
    /// The horizontal step is the distance between the first item and the
    /// first other item on its row; the vertical step uses the first other
    /// item in its column. Without such a neighbour the step falls back to
    /// the item size plus `fallback_gap`.
    pub fn from_items(items: &[CanvasItem], fallback_gap: f64) -> Option<Self> {
        let first = items.first()?;
        let bounds = items_bounds(items)?;

        let step_x = items
            .iter()
            .skip(1)
            .find(|item| (item.y - first.y).abs() < ALIGN_EPSILON)
            .map(|item| (item.x - first.x).abs())
            .filter(|dx| *dx > ALIGN_EPSILON)
            .unwrap_or(first.width + fallback_gap);

        let step_y = items
            .iter()
            .skip(1)
            .find(|item| {
                (item.x - first.x).abs() < ALIGN_EPSILON
                    && (item.y - first.y).abs() >= ALIGN_EPSILON
            })
            .map(|item| (item.y - first.y).abs())
            .unwrap_or(first.height + fallback_gap);

        let size = Size::new(
            (bounds.width() - first.width + step_x).max(bounds.width()),
            (bounds.height() - first.height + step_y).max(bounds.height()),
        );
        if size.width <= 0.0 || size.height <= 0.0 {
            return None;
        }
        Some(Self { bounds, size })
    }

    /// Offset of the tile copy at the given tile coordinates.
    pub fn tile_offset(&self, tile_x: i64, tile_y: i64) -> Vec2 {
        Vec2::new(tile_x as f64 * self.size.width, tile_y as f64 * self.size.height)
    }
}

/// One materialized copy of a base item.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleItem {
    /// Stable key combining the base id and tile coordinates.
    pub key: String,
    /// Index into the base item list.
    pub index: usize,
    pub tile_x: i64,
    pub tile_y: i64,
    /// Translated rectangle in grid coordinates.
    pub bounds: Rect,
}

/// Build the key of a tile copy.
pub fn tile_key(id: &str, tile_x: i64, tile_y: i64) -> String {
    format!("{}@{},{}", id, tile_x, tile_y)
}

/// Positive-area overlap test.
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}

/// The viewport converted to grid space and expanded by `padding`.
pub fn padded_viewport(camera: &Camera, viewport: Size, padding: f64) -> Rect {
    camera.visible_world_rect(viewport).inflate(padding, padding)
}

/// Collect every tile copy of every base item overlapping the padded viewport.
pub fn visible_items(
    items: &[CanvasItem],
    tile: &TileGeometry,
    camera: &Camera,
    viewport: Size,
    padding: f64,
) -> Vec<VisibleItem> {
    if items.is_empty() || viewport.width <= 0.0 || viewport.height <= 0.0 {
        return Vec::new();
    }

    let view = padded_viewport(camera, viewport, padding);
    let (cols, rows) = tile_range(tile, view);

    let mut visible = Vec::new();
    for tile_y in rows.0..=rows.1 {
        for tile_x in cols.0..=cols.1 {
            let offset = tile.tile_offset(tile_x, tile_y);
            if !overlaps(tile.bounds + offset, view) {
                continue;
            }
            for (index, item) in items.iter().enumerate() {
                let bounds = item.bounds() + offset;
                if overlaps(bounds, view) {
                    visible.push(VisibleItem {
                        key: tile_key(&item.id, tile_x, tile_y),
                        index,
                        tile_x,
                        tile_y,
                        bounds,
                    });
                }
            }
        }
    }
    visible
}

/// Inclusive tile index ranges whose tile rectangle may overlap `view`.
fn tile_range(tile: &TileGeometry, view: Rect) -> ((i64, i64), (i64, i64)) {
    let axis = |v0: f64, v1: f64, b0: f64, b1: f64, period: f64| {
        let lo = ((v0 - b1) / period).floor() as i64;
        let hi = ((v1 - b0) / period).ceil() as i64;
        (lo, hi.max(lo))
    };
    (
        axis(view.x0, view.x1, tile.bounds.x0, tile.bounds.x1, tile.size.width),
        axis(view.y0, view.y1, tile.bounds.y0, tile.bounds.y1, tile.size.height),
    )
}
