//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom level shown as "100%".
pub const BASE_ZOOM: f64 = 1.0;

/// Multiplier applied by one zoom-in step.
pub const ZOOM_STEP: f64 = 1.2;

/// Zoom state reported to the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomInfo {
    pub scale: f64,
    pub can_zoom_in: bool,
    pub can_zoom_out: bool,
}

/// Camera manages the view transform for the canvas.
///
/// It handles panning (translation) and zooming (scaling) operations,
/// converting between screen coordinates and world coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan), in screen units.
    pub offset: Vec2,
    /// Current zoom level.
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Factor applied by [`Camera::zoom_in`] / [`Camera::zoom_out`].
    pub zoom_step: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: BASE_ZOOM,
            min_zoom: 0.1,
            max_zoom: 5.0,
            zoom_step: ZOOM_STEP,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera with custom zoom limits. Unusable limits fall back to the
    /// defaults: bounds must be finite and positive (swapped when given in
    /// the wrong order) and the step must be greater than one.
    pub fn with_limits(min_zoom: f64, max_zoom: f64, zoom_step: f64) -> Self {
        let defaults = Self::default();
        let usable = |z: f64| z.is_finite() && z > 0.0;
        let (min_zoom, max_zoom) = match (usable(min_zoom), usable(max_zoom)) {
            (true, true) => (min_zoom.min(max_zoom), min_zoom.max(max_zoom)),
            (true, false) => (min_zoom, defaults.max_zoom.max(min_zoom)),
            (false, true) => (defaults.min_zoom.min(max_zoom), max_zoom),
            (false, false) => (defaults.min_zoom, defaults.max_zoom),
        };
        let zoom_step = if zoom_step.is_finite() && zoom_step > 1.0 {
            zoom_step
        } else {
            log::warn!("Ignoring zoom step {zoom_step}, using {ZOOM_STEP}");
            ZOOM_STEP
        };
        Self {
            zoom: BASE_ZOOM.max(min_zoom).min(max_zoom),
            min_zoom,
            max_zoom,
            zoom_step,
            ..defaults
        }
    }

    /// `zoom` limited to the camera's bounds. Never panics, even if the
    /// public bounds were set inconsistently.
    fn clamp_zoom(&self, zoom: f64) -> f64 {
        let clamped = zoom.max(self.min_zoom).min(self.max_zoom);
        if clamped.is_finite() && clamped > 0.0 { clamped } else { self.zoom }
    }

    /// World-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen-to-world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// World-space rectangle visible in a viewport of the given CSS size.
    pub fn visible_world_rect(&self, viewport: Size) -> Rect {
        Rect::from_points(
            self.screen_to_world(Point::ZERO),
            self.screen_to_world(Point::new(viewport.width, viewport.height)),
        )
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom the camera, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = self.clamp_zoom(self.zoom * factor);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.screen_to_world(screen_point);
        self.zoom = new_zoom;

        // Shift so world_point stays under screen_point.
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
    }

    pub fn zoom_in(&mut self, center: Point) {
        self.zoom_at(center, self.zoom_step);
    }

    pub fn zoom_out(&mut self, center: Point) {
        self.zoom_at(center, 1.0 / self.zoom_step);
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom < self.max_zoom - f64::EPSILON
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom > self.min_zoom + f64::EPSILON
    }

    pub fn zoom_info(&self) -> ZoomInfo {
        ZoomInfo {
            scale: self.zoom,
            can_zoom_in: self.can_zoom_in(),
            can_zoom_out: self.can_zoom_out(),
        }
    }

    /// Reset camera to default position and zoom, kept within the limits.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = self.clamp_zoom(BASE_ZOOM);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.offset, Vec2::ZERO);
        assert!((camera.zoom - BASE_ZOOM).abs() < f64::EPSILON);
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
        camera.zoom = 2.0;
        let world = camera.screen_to_world(Point::new(100.0, 200.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(30.0, -20.0);
        camera.zoom = 1.5;

        let original = Point::new(123.0, 456.0);
        let back = camera.world_to_screen(camera.screen_to_world(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::new();
        for _ in 0..50 {
            camera.zoom_in(Point::new(400.0, 300.0));
        }
        assert!((camera.zoom - 5.0).abs() < f64::EPSILON);
        assert!(!camera.zoom_info().can_zoom_in);
        assert!(camera.zoom_info().can_zoom_out);

        for _ in 0..50 {
            camera.zoom_out(Point::new(400.0, 300.0));
        }
        assert!((camera.zoom - 0.1).abs() < f64::EPSILON);
        assert!(!camera.zoom_info().can_zoom_out);
    }

    #[test]
    fn test_zoom_keeps_center_fixed() {
        let mut camera = Camera::new();
        let center = Point::new(400.0, 300.0);
        let before = camera.screen_to_world(center);
        camera.zoom_in(center);
        let after = camera.screen_to_world(center);
        assert!((camera.zoom - 1.2).abs() < 1e-12);
        assert!((before - after).hypot() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut camera = Camera::new();
        camera.zoom_in(Point::new(10.0, 10.0));
        camera.pan(Vec2::new(10.0, 20.0));
        camera.reset();
        assert_eq!(camera.offset, Vec2::ZERO);
        assert!((camera.zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_with_limits_repairs_bad_bounds() {
        let camera = Camera::with_limits(4.0, 2.0, 1.5);
        assert_eq!((camera.min_zoom, camera.max_zoom), (2.0, 4.0));
        assert!((camera.zoom - 2.0).abs() < f64::EPSILON);

        let camera = Camera::with_limits(f64::NAN, f64::INFINITY, 0.5);
        assert_eq!((camera.min_zoom, camera.max_zoom), (0.1, 5.0));
        assert!((camera.zoom_step - ZOOM_STEP).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_stays_in_bounds_above_base() {
        let mut camera = Camera::with_limits(2.0, 4.0, 1.5);
        let center = Point::new(400.0, 300.0);
        camera.zoom_out(center);
        assert!((camera.zoom - 2.0).abs() < f64::EPSILON);
        camera.zoom_in(center);
        camera.zoom_in(center);
        assert!((camera.zoom - 4.0).abs() < f64::EPSILON);
        camera.reset();
        assert!((camera.zoom - 2.0).abs() < f64::EPSILON);

        // Inconsistent public fields must not panic.
        camera.min_zoom = 8.0;
        camera.zoom_in(center);
        assert!(camera.zoom.is_finite());
    }

    #[test]
    fn test_visible_world_rect() {
        let mut camera = Camera::new();
        camera.zoom = 2.0;
        camera.offset = Vec2::new(100.0, 0.0);
        let rect = camera.visible_world_rect(Size::new(800.0, 600.0));
        assert_eq!(rect, Rect::new(-50.0, 0.0, 350.0, 300.0));
    }
}
