//! Follow camera
//!
//! Keeps the tracked body about a third of the way across the screen and
//! zooms out as it climbs. Horizontal smoothing tightens with speed so a fast
//! body never outruns the view; zoom eases at a fixed rate. Zoom pivots on
//! the bottom-center of the screen so the ground stays anchored.

use glam::{Affine2, Vec2};

use crate::tuning::{CameraTuning, Viewport};

#[derive(Debug, Clone)]
pub struct CameraController {
    tuning: CameraTuning,
    viewport: Viewport,
    x: f32,
    zoom: f32,
    target_x: f32,
    target_zoom: f32,
    target_speed: f32,
}

impl CameraController {
    pub fn new(tuning: CameraTuning, viewport: Viewport) -> Self {
        let zoom = tuning.max_zoom;
        Self {
            tuning,
            viewport,
            x: 0.0,
            zoom,
            target_x: 0.0,
            target_zoom: zoom,
            target_speed: 0.0,
        }
    }

    /// Aim at `target` moving at `speed`; takes effect on the next
    /// [`update`](Self::update)
    pub fn follow(&mut self, target: Vec2, speed: f32) {
        let t = &self.tuning;
        let height = self.viewport.height;

        self.target_x = target.x - self.viewport.width * t.lead_fraction;

        let above_bottom = height - target.y;
        self.target_zoom = if above_bottom > 0.0 {
            ((height - t.top_margin) / above_bottom).clamp(t.min_zoom, t.max_zoom)
        } else {
            t.max_zoom
        };
        self.target_speed = speed;
    }

    /// Horizontal smoothing factor for the current target speed
    pub fn smoothing(&self) -> f32 {
        let t = &self.tuning;
        let blend = if t.speed_margin > 0.0 {
            ((self.target_speed - t.speed_threshold) / t.speed_margin).clamp(0.0, 1.0)
        } else if self.target_speed >= t.speed_threshold {
            1.0
        } else {
            0.0
        };
        t.slow_smoothing + (t.fast_smoothing - t.slow_smoothing) * blend
    }

    /// Ease one frame toward the target
    pub fn update(&mut self) {
        let factor = self.smoothing();
        self.x += (self.target_x - self.x) * factor;
        self.x = self.x.max(0.0);

        self.zoom += (self.target_zoom - self.zoom) * self.tuning.zoom_smoothing;
        self.zoom = self.zoom.clamp(self.tuning.min_zoom, self.tuning.max_zoom);
    }

    /// World to screen transform
    pub fn transform(&self) -> Affine2 {
        let pivot = Vec2::new(self.viewport.width * 0.5, self.viewport.height);
        Affine2::from_translation(pivot)
            * Affine2::from_scale(Vec2::splat(self.zoom))
            * Affine2::from_translation(-pivot)
            * Affine2::from_translation(Vec2::new(-self.x, 0.0))
    }

    pub fn world_to_screen(&self, point: Vec2) -> Vec2 {
        self.transform().transform_point2(point)
    }

    pub fn reset(&mut self) {
        self.x = 0.0;
        self.zoom = self.tuning.max_zoom;
        self.target_x = 0.0;
        self.target_zoom = self.tuning.max_zoom;
        self.target_speed = 0.0;
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn target_x(&self) -> f32 {
        self.target_x
    }

    pub fn target_zoom(&self) -> f32 {
        self.target_zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn camera() -> CameraController {
        CameraController::new(CameraTuning::default(), Viewport::default())
    }

    #[test]
    fn test_starts_at_origin_fully_zoomed_in() {
        let cam = camera();
        assert_eq!(cam.x(), 0.0);
        assert_eq!(cam.zoom(), 1.0);
        assert_eq!(cam.world_to_screen(Vec2::new(100.0, 200.0)), Vec2::new(100.0, 200.0));
    }

    #[test]
    fn test_body_near_ground_keeps_max_zoom() {
        let mut cam = camera();
        cam.follow(Vec2::new(500.0, 565.0), 0.0);
        assert_eq!(cam.target_zoom(), 1.0);
    }

    #[test]
    fn test_high_body_zooms_out() {
        let mut cam = camera();
        // 660 / 1320 = 0.5
        cam.follow(Vec2::new(500.0, -600.0), 0.0);
        assert!((cam.target_zoom() - 0.5).abs() < 1e-5);

        cam.follow(Vec2::new(500.0, -50_000.0), 0.0);
        assert_eq!(cam.target_zoom(), 0.35);
    }

    #[test]
    fn test_below_screen_bottom_keeps_max_zoom() {
        let mut cam = camera();
        cam.follow(Vec2::new(0.0, 900.0), 0.0);
        assert_eq!(cam.target_zoom(), 1.0);
    }

    #[test]
    fn test_smoothing_tightens_with_speed() {
        let mut cam = camera();
        cam.follow(Vec2::ZERO, 5.0);
        assert!((cam.smoothing() - 0.08).abs() < 1e-6);
        cam.follow(Vec2::ZERO, 17.5);
        assert!((cam.smoothing() - 0.165).abs() < 1e-5);
        cam.follow(Vec2::ZERO, 40.0);
        assert!((cam.smoothing() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_converges_with_target_a_third_across() {
        let mut cam = camera();
        let target = Vec2::new(3000.0, 565.0);
        for _ in 0..500 {
            cam.follow(target, 0.0);
            cam.update();
        }
        let screen = cam.world_to_screen(target);
        assert!((screen.x - 1280.0 / 3.0).abs() < 0.5, "screen x {}", screen.x);
        assert!((screen.y - 565.0).abs() < 1e-3);
    }

    #[test]
    fn test_x_never_negative_near_start() {
        let mut cam = camera();
        for _ in 0..100 {
            cam.follow(Vec2::new(100.0, 500.0), 0.0);
            cam.update();
        }
        assert_eq!(cam.x(), 0.0);
    }

    #[test]
    fn test_zoom_pivots_on_bottom_center() {
        let mut cam = camera();
        for _ in 0..400 {
            cam.follow(Vec2::new(0.0, -600.0), 0.0);
            cam.update();
        }
        let pivot = Vec2::new(640.0, 720.0);
        assert!((cam.world_to_screen(pivot) - pivot).length() < 1e-3);
    }

    #[test]
    fn test_reset() {
        let mut cam = camera();
        for _ in 0..50 {
            cam.follow(Vec2::new(5000.0, -800.0), 30.0);
            cam.update();
        }
        cam.reset();
        assert_eq!(cam.x(), 0.0);
        assert_eq!(cam.zoom(), 1.0);
    }

    proptest! {
        #[test]
        fn camera_stays_clamped(
            moves in prop::collection::vec(
                (-20_000.0f32..20_000.0, -20_000.0f32..2_000.0, 0.0f32..100.0),
                1..60,
            )
        ) {
            let mut cam = camera();
            for (x, y, speed) in moves {
                cam.follow(Vec2::new(x, y), speed);
                cam.update();
                prop_assert!(cam.x() >= 0.0);
                prop_assert!(cam.zoom() >= 0.35 && cam.zoom() <= 1.0);
            }
        }
    }
}
