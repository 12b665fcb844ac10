//! Camera module for the grid's pan/zoom transform.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default minimum zoom.
pub const MIN_SCALE: f64 = 0.1;
/// Default maximum zoom.
pub const MAX_SCALE: f64 = 3.0;

/// Camera maps grid coordinates to screen coordinates.
///
/// Screen = `offset + grid * scale`. Only the scale is clamped; the grid is
/// unbounded so the offset can take any value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan) in screen pixels.
    pub offset: Vec2,
    /// Current zoom level (1.0 = one grid unit per pixel).
    pub scale: f64,
    /// Minimum allowed zoom level.
    pub min_scale: f64,
    /// Maximum allowed zoom level.
    pub max_scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera with a custom zoom range.
    ///
    /// Bounds given in reverse order are swapped. A bound that is not a
    /// positive finite number falls back to its default.
    pub fn with_scale_range(min_scale: f64, max_scale: f64) -> Self {
        let valid = |s: f64| s.is_finite() && s > 0.0;
        let min_scale = if valid(min_scale) { min_scale } else { MIN_SCALE };
        let max_scale = if valid(max_scale) { max_scale } else { MAX_SCALE };
        Self {
            min_scale: min_scale.min(max_scale),
            max_scale: min_scale.max(max_scale),
            ..Self::default()
        }
    }

    /// Get the affine transform for rendering (grid -> screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Get the inverse transform for input handling (screen -> grid).
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to grid coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a grid point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom the camera, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        // min/max instead of clamp: the bounds are public and may be inverted.
        let new_scale = (self.scale * factor).max(self.min_scale).min(self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        // Convert screen point to grid space before the zoom
        let world_point = self.screen_to_world(screen_point);

        self.scale = new_scale;

        // Adjust offset so world_point stays under screen_point
        let new_screen = self.world_to_screen(world_point);
        self.offset += Vec2::new(
            screen_point.x - new_screen.x,
            screen_point.y - new_screen.y,
        );
    }

    /// The part of grid space currently covered by a viewport of the given size.
    pub fn visible_world_rect(&self, viewport: Size) -> Rect {
        let top_left = self.screen_to_world(Point::ZERO);
        let bottom_right = self.screen_to_world(Point::new(viewport.width, viewport.height));
        Rect::from_points(top_left, bottom_right)
    }

    /// Pan so that `world_point` lands on the center of the viewport.
    pub fn center_on(&mut self, world_point: Point, viewport: Size) {
        self.offset = Vec2::new(
            viewport.width / 2.0 - world_point.x * self.scale,
            viewport.height / 2.0 - world_point.y * self.scale,
        );
    }

    /// Reset camera to the origin at 100% zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.offset, Vec2::ZERO);
        assert!((camera.scale - 1.0).abs() < f64::EPSILON);
        assert!((camera.min_scale - 0.1).abs() < f64::EPSILON);
        assert!((camera.max_scale - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scale_range_is_normalized() {
        let camera = Camera::with_scale_range(3.0, 0.5);
        assert_eq!((camera.min_scale, camera.max_scale), (0.5, 3.0));

        let camera = Camera::with_scale_range(f64::NAN, -1.0);
        assert_eq!((camera.min_scale, camera.max_scale), (MIN_SCALE, MAX_SCALE));

        // Inverted public bounds still never panic when zooming.
        let mut camera = Camera::new();
        camera.min_scale = 2.0;
        camera.max_scale = 1.5;
        camera.zoom_at(Point::new(10.0, 10.0), 4.0);
        assert!(camera.scale.is_finite());
    }

    #[test]
    fn test_screen_to_world_with_offset() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(50.0, 100.0);
        let world = camera.screen_to_world(Point::new(100.0, 200.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_with_zoom() {
        let mut camera = Camera::new();
        camera.scale = 2.0;
        let world = camera.screen_to_world(Point::new(100.0, 200.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(30.0, -20.0);
        camera.scale = 1.5;

        let original = Point::new(123.0, 456.0);
        let back = camera.world_to_screen(camera.screen_to_world(original));

        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::new();
        camera.zoom_at(Point::ZERO, 0.001);
        assert!((camera.scale - camera.min_scale).abs() < f64::EPSILON);

        camera.scale = 1.0;
        camera.zoom_at(Point::ZERO, 1000.0);
        assert!((camera.scale - camera.max_scale).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(12.0, -40.0);
        let anchor = Point::new(300.0, 200.0);
        let before = camera.screen_to_world(anchor);

        camera.zoom_at(anchor, 1.7);

        let after = camera.world_to_screen(before);
        assert!((after.x - anchor.x).abs() < 1e-9);
        assert!((after.y - anchor.y).abs() < 1e-9);
    }

    #[test]
    fn test_visible_world_rect() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(-100.0, 50.0);
        camera.scale = 2.0;
        let rect = camera.visible_world_rect(Size::new(800.0, 600.0));
        assert!((rect.x0 - 50.0).abs() < 1e-9);
        assert!((rect.y0 + 25.0).abs() < 1e-9);
        assert!((rect.width() - 400.0).abs() < 1e-9);
        assert!((rect.height() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_center_on() {
        let mut camera = Camera::new();
        camera.scale = 0.5;
        let viewport = Size::new(1000.0, 500.0);
        camera.center_on(Point::new(400.0, 400.0), viewport);
        let screen = camera.world_to_screen(Point::new(400.0, 400.0));
        assert!((screen.x - 500.0).abs() < 1e-9);
        assert!((screen.y - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_pan() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(10.0, 20.0));
        assert!((camera.offset.x - 10.0).abs() < f64::EPSILON);
        assert!((camera.offset.y - 20.0).abs() < f64::EPSILON);
    }
}
