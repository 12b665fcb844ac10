//! Infinite grid controller.
//!
//! Owns the base items, the camera and the gesture tracker. The UI layer
//! forwards pointer/touch events, reports its viewport size and mounts
//! whatever [`InfiniteGrid::visible_items`] returns.

use crate::camera::Camera;
use crate::device::DeviceClass;
use crate::input::{GestureState, GestureTracker, InputResponse, PointerEvent, TouchEvent};
use crate::item::{CanvasItem, items_bounds};
use crate::virtualize::{self, TileGeometry, VisibleItem};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Tunables for the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Grid-space margin around the viewport that is still materialized.
    pub padding: f64,
    /// Multiplier for wheel deltas.
    pub scroll_speed: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Total movement in pixels below which a gesture is a tap.
    pub tap_threshold: f64,
    /// Gap used for the tile period when items have no same-row neighbour.
    ///
    /// Galleries set this to their device's grid gap through
    /// [`InfiniteGrid::set_device`].
    pub fallback_gap: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            padding: 600.0,
            scroll_speed: 1.0,
            min_scale: crate::camera::MIN_SCALE,
            max_scale: crate::camera::MAX_SCALE,
            tap_threshold: crate::input::TAP_THRESHOLD,
            fallback_gap: DeviceClass::default().grid_gap(),
        }
    }
}

/// Whether the initial centering has happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPhase {
    Uninitialized,
    Centered,
}

/// Controller for the virtualized, infinitely tiled grid.
#[derive(Debug, Clone)]
pub struct InfiniteGrid {
    items: Vec<CanvasItem>,
    tile: Option<TileGeometry>,
    camera: Camera,
    viewport: Size,
    gestures: GestureTracker,
    phase: GridPhase,
    config: GridConfig,
}

impl Default for InfiniteGrid {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl InfiniteGrid {
    pub fn new(config: GridConfig) -> Self {
        Self {
            items: Vec::new(),
            tile: None,
            camera: Camera::with_scale_range(config.min_scale, config.max_scale),
            viewport: Size::ZERO,
            gestures: GestureTracker::new(config.scroll_speed, config.tap_threshold),
            phase: GridPhase::Uninitialized,
            config,
        }
    }

    /// Replace the base item list.
    pub fn set_items(&mut self, items: Vec<CanvasItem>) {
        self.tile = TileGeometry::from_items(&items, self.config.fallback_gap);
        log::debug!(
            "Grid items set: {} items, tile {:?}",
            items.len(),
            self.tile.map(|t| t.size)
        );
        self.items = items;
        self.try_center();
    }

    /// Take the tile fallback gap from the device the items were laid out for.
    pub fn set_device(&mut self, device: DeviceClass) {
        let gap = device.grid_gap();
        if (gap - self.config.fallback_gap).abs() < f64::EPSILON {
            return;
        }
        self.config.fallback_gap = gap;
        self.tile = TileGeometry::from_items(&self.items, gap);
    }

    /// Record the measured viewport size.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.try_center();
    }

    pub fn items(&self) -> &[CanvasItem] {
        &self.items
    }

    pub fn tile(&self) -> Option<&TileGeometry> {
        self.tile.as_ref()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn gesture(&self) -> &GestureState {
        self.gestures.state()
    }

    pub fn phase(&self) -> GridPhase {
        self.phase
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Item copies overlapping the padded viewport.
    pub fn visible_items(&self) -> Vec<VisibleItem> {
        match &self.tile {
            Some(tile) => virtualize::visible_items(
                &self.items,
                tile,
                &self.camera,
                self.viewport,
                self.config.padding,
            ),
            None => Vec::new(),
        }
    }

    /// The visible item copy under a screen point, if any.
    pub fn hit_test(&self, screen_point: Point) -> Option<VisibleItem> {
        let world = self.camera.screen_to_world(screen_point);
        self.visible_items()
            .into_iter()
            .find(|visible| visible.bounds.contains(world))
    }

    /// Base item for a visible copy.
    pub fn item_for(&self, visible: &VisibleItem) -> Option<&CanvasItem> {
        self.items.get(visible.index)
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> InputResponse {
        self.gestures.handle_pointer(&mut self.camera, event)
    }

    pub fn handle_touch(&mut self, event: TouchEvent) -> InputResponse {
        self.gestures.handle_touch(&mut self.camera, event)
    }

    /// The host document was hidden; end any drag.
    pub fn visibility_hidden(&mut self) {
        self.gestures.cancel();
    }

    /// Drop any in-progress gesture.
    pub fn reset_drag_state(&mut self) {
        self.gestures.cancel();
    }

    /// Return to 100% zoom and center the items again.
    pub fn reset_view(&mut self) {
        self.gestures.cancel();
        self.camera.reset();
        self.phase = GridPhase::Uninitialized;
        self.try_center();
    }

    /// Center the viewport on the base item with the given id.
    ///
    /// Returns `false` when no such item exists.
    pub fn center_on_item(&mut self, id: &str) -> bool {
        let Some(item) = self.items.iter().find(|item| item.id == id) else {
            log::warn!("Cannot center on unknown item: {}", id);
            return false;
        };
        self.camera.center_on(item.center(), self.viewport);
        true
    }

    fn try_center(&mut self) {
        if self.phase == GridPhase::Centered {
            return;
        }
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return;
        }
        let Some(bounds) = items_bounds(&self.items) else {
            return;
        };
        self.camera.center_on(bounds.center(), self.viewport);
        self.phase = GridPhase::Centered;
        log::debug!("Grid centered at offset {:?}", self.camera.offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{MouseButton, TouchPoint};
    use kurbo::{Rect, Vec2};
    use std::collections::BTreeSet;

    fn items() -> Vec<CanvasItem> {
        (0..9)
            .map(|i| {
                let x = (i % 3) as f64 * 300.0;
                let y = (i / 3) as f64 * 300.0;
                CanvasItem::new(format!("p{}", i), Rect::new(x, y, x + 280.0, y + 280.0))
                    .unwrap()
                    .with_image_url(format!("https://example.com/p{}", i))
            })
            .collect()
    }

    fn keys(grid: &InfiniteGrid) -> BTreeSet<String> {
        grid.visible_items().into_iter().map(|v| v.key).collect()
    }

    fn drag(grid: &mut InfiniteGrid, from: Point, to: Point) {
        grid.handle_pointer(PointerEvent::Down {
            position: from,
            button: MouseButton::Left,
            over_item: false,
        });
        grid.handle_pointer(PointerEvent::Move { position: to });
        grid.handle_pointer(PointerEvent::Up {
            position: to,
            button: MouseButton::Left,
        });
    }

    #[test]
    fn test_centers_once_measured() {
        let mut grid = InfiniteGrid::default();
        grid.set_items(items());
        assert_eq!(grid.phase(), GridPhase::Uninitialized);

        grid.set_viewport(Size::new(1000.0, 800.0));
        assert_eq!(grid.phase(), GridPhase::Centered);

        let center = items_bounds(grid.items()).unwrap().center();
        let screen = grid.camera().world_to_screen(center);
        assert!((screen.x - 500.0).abs() < 1e-9);
        assert!((screen.y - 400.0).abs() < 1e-9);

        // A later viewport change does not recenter.
        drag(&mut grid, Point::new(0.0, 0.0), Point::new(40.0, 0.0));
        let offset = grid.camera().offset;
        grid.set_viewport(Size::new(1200.0, 800.0));
        assert_eq!(grid.camera().offset, offset);
    }

    #[test]
    fn test_single_row_uses_device_gap() {
        use crate::layout::GridLayout;

        let layout = GridLayout::for_device(DeviceClass::Mobile, 2);
        let row: Vec<CanvasItem> = (0..2)
            .map(|i| CanvasItem::new(format!("m{}", i), layout.slot_rect(i)).unwrap())
            .collect();

        let mut grid = InfiniteGrid::default();
        grid.set_device(DeviceClass::Mobile);
        grid.set_items(row.clone());
        let tile = grid.tile().unwrap();
        assert_eq!(tile.size.width, 2.0 * layout.step());
        assert_eq!(tile.size.height, layout.step());

        // Switching device after the items are set recomputes the tile.
        let mut grid = InfiniteGrid::default();
        grid.set_items(row);
        assert_eq!(grid.tile().unwrap().size.height, 160.0 + 32.0);
        grid.set_device(DeviceClass::Tablet);
        assert_eq!(grid.tile().unwrap().size.height, 160.0 + 24.0);
    }

    #[test]
    fn test_inverted_scale_range_does_not_panic() {
        let config = GridConfig {
            min_scale: 3.0,
            max_scale: 0.5,
            ..GridConfig::default()
        };
        let mut grid = InfiniteGrid::new(config);
        grid.set_items(items());
        grid.set_viewport(Size::new(1000.0, 800.0));

        grid.handle_touch(TouchEvent::Start(vec![
            TouchPoint::new(1, Point::new(400.0, 400.0)),
            TouchPoint::new(2, Point::new(500.0, 400.0)),
        ]));
        grid.handle_touch(TouchEvent::Move(vec![
            TouchPoint::new(1, Point::new(300.0, 400.0)),
            TouchPoint::new(2, Point::new(600.0, 400.0)),
        ]));
        let scale = grid.camera().scale;
        assert!((0.5..=3.0).contains(&scale), "{scale}");
    }

    #[test]
    fn test_empty_grid() {
        let mut grid = InfiniteGrid::default();
        grid.set_viewport(Size::new(1000.0, 800.0));
        assert_eq!(grid.phase(), GridPhase::Uninitialized);
        assert!(grid.visible_items().is_empty());

        let mut grid = InfiniteGrid::default();
        grid.set_items(items());
        assert!(grid.visible_items().is_empty());
    }

    #[test]
    fn test_visible_set_is_idempotent() {
        let mut grid = InfiniteGrid::default();
        grid.set_items(items());
        grid.set_viewport(Size::new(1280.0, 720.0));
        assert!(!grid.visible_items().is_empty());
        assert_eq!(grid.visible_items(), grid.visible_items());
    }

    #[test]
    fn test_two_pans_equal_one() {
        let mut stepped = InfiniteGrid::default();
        stepped.set_items(items());
        let mut direct = stepped.clone();
        let viewport = Size::new(1280.0, 720.0);
        stepped.set_viewport(viewport);
        direct.set_viewport(viewport);

        let origin = stepped.camera().offset;
        drag(&mut stepped, Point::new(100.0, 100.0), Point::new(150.0, 100.0));
        drag(&mut stepped, Point::new(300.0, 300.0), Point::new(350.0, 300.0));
        drag(&mut direct, Point::new(100.0, 100.0), Point::new(200.0, 100.0));

        assert_eq!(stepped.camera().offset, origin + Vec2::new(100.0, 0.0));
        assert_eq!(stepped.camera().offset, direct.camera().offset);
        assert_eq!(keys(&stepped), keys(&direct));
    }

    #[test]
    fn test_center_on_item() {
        let mut grid = InfiniteGrid::default();
        grid.set_items(items());
        grid.set_viewport(Size::new(800.0, 600.0));

        assert!(grid.center_on_item("p8"));
        let screen = grid.camera().world_to_screen(Point::new(740.0, 740.0));
        assert!((screen.x - 400.0).abs() < 1e-9);
        assert!((screen.y - 300.0).abs() < 1e-9);
        assert!(!grid.center_on_item("missing"));
    }

    #[test]
    fn test_reset_view_recenters() {
        let mut grid = InfiniteGrid::default();
        grid.set_items(items());
        grid.set_viewport(Size::new(800.0, 600.0));
        let centered = grid.camera().offset;

        drag(&mut grid, Point::new(0.0, 0.0), Point::new(-500.0, 120.0));
        grid.handle_pointer(PointerEvent::Down {
            position: Point::ZERO,
            button: MouseButton::Left,
            over_item: false,
        });
        grid.reset_view();

        assert_eq!(grid.phase(), GridPhase::Centered);
        assert_eq!(grid.camera().offset, centered);
        assert_eq!(grid.gesture(), &GestureState::Idle);
    }

    #[test]
    fn test_hidden_document_ends_drag() {
        let mut grid = InfiniteGrid::default();
        grid.set_items(items());
        grid.set_viewport(Size::new(800.0, 600.0));

        grid.handle_pointer(PointerEvent::Down {
            position: Point::ZERO,
            button: MouseButton::Left,
            over_item: false,
        });
        grid.visibility_hidden();
        let before = grid.camera().offset;
        grid.handle_pointer(PointerEvent::Move {
            position: Point::new(90.0, 90.0),
        });
        assert_eq!(grid.camera().offset, before);
    }

    #[test]
    fn test_hit_test_finds_tile_copy() {
        let mut grid = InfiniteGrid::default();
        grid.set_items(items());
        grid.set_viewport(Size::new(800.0, 600.0));

        let target = grid.camera().world_to_screen(Point::new(900.0 + 10.0, 10.0));
        let hit = grid.hit_test(target).unwrap();
        assert_eq!(hit.key, "p0@1,0");
        assert_eq!(grid.item_for(&hit).unwrap().id, "p0");
    }
}
