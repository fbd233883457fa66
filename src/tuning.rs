//! Data-driven game balance
//!
//! Every number that shapes a round lives here so it can be tweaked from a
//! JSON file without recompiling. Missing fields fall back to the defaults,
//! which reproduce the shipped game.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Viewport the camera frames (logical pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Height of the ground strip at the bottom of the screen
    pub ground_height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            ground_height: 120.0,
        }
    }
}

impl Viewport {
    /// World y of the ground surface
    #[inline]
    pub fn ground_y(&self) -> f32 {
        self.height - self.ground_height
    }
}

/// An angle-ratio window that multiplies the launch force
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweetSpot {
    pub center: f32,
    pub half_width: f32,
    pub multiplier: f32,
    pub label: String,
}

impl SweetSpot {
    pub fn new(center: f32, half_width: f32, multiplier: f32, label: &str) -> Self {
        Self {
            center,
            half_width,
            multiplier,
            label: label.to_string(),
        }
    }

    #[inline]
    pub fn contains(&self, ratio: f32) -> bool {
        (ratio - self.center).abs() <= self.half_width
    }
}

/// Meter, shot and round-timing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotTuning {
    pub power_min: f32,
    pub power_max: f32,
    /// Angular speed of the power meter oscillation (rad/s)
    pub power_speed: f32,
    /// Degrees
    pub angle_min: f32,
    pub angle_max: f32,
    pub angle_speed: f32,
    pub power_bonus_threshold: f32,
    pub power_bonus_multiplier: f32,
    /// Checked in order; first match wins
    pub sweet_spots: Vec<SweetSpot>,
    /// Base scale from power units to engine force
    pub force_scale: f32,
    pub slap_duration_ms: f64,
    /// Offset into the slap at which the hit lands
    pub impact_time_ms: f64,
    pub impact_window_ms: f64,
    /// Below this speed (px/step) the body counts as stopped
    pub stop_threshold: f32,
    pub stop_duration_ms: f32,
}

impl Default for ShotTuning {
    fn default() -> Self {
        Self {
            power_min: 15.0,
            power_max: 30.0,
            power_speed: 4.0,
            angle_min: 20.0,
            angle_max: 60.0,
            angle_speed: 3.0,
            power_bonus_threshold: 0.9,
            power_bonus_multiplier: 2.0,
            sweet_spots: vec![
                SweetSpot::new(0.50, 0.03, 5.0, "PERFECT"),
                SweetSpot::new(0.30, 0.04, 3.0, "GREAT"),
                SweetSpot::new(0.70, 0.04, 3.0, "GREAT"),
                SweetSpot::new(0.15, 0.05, 2.0, "GOOD"),
                SweetSpot::new(0.85, 0.05, 2.0, "GOOD"),
            ],
            force_scale: 0.015,
            slap_duration_ms: 800.0,
            impact_time_ms: 650.0,
            impact_window_ms: 50.0,
            stop_threshold: 0.3,
            stop_duration_ms: 2000.0,
        }
    }
}

/// The launched body and the slapper that hits it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagdollTuning {
    pub start_x: f32,
    /// Resting height of the body center above the ground surface
    pub start_height: f32,
    pub slapper_x: f32,
    pub radius: f32,
    pub restitution: f32,
    pub friction: f32,
    pub friction_air: f32,
    pub density: f32,
    /// Launch spin = force.x * launch_spin_factor + launch_spin_base
    pub launch_spin_factor: f32,
    pub launch_spin_base: f32,
    /// Extra spin per unit of boost force
    pub boost_spin_factor: f32,
}

impl Default for RagdollTuning {
    fn default() -> Self {
        Self {
            start_x: 500.0,
            start_height: 80.0,
            slapper_x: 150.0,
            radius: 35.0,
            restitution: 0.7,
            friction: 0.4,
            friction_air: 0.008,
            density: 0.001,
            launch_spin_factor: 50.0,
            launch_spin_base: 0.3,
            boost_spin_factor: 20.0,
        }
    }
}

/// Procedural obstacle lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub gravity: Vec2,
    pub gravity_scale: f32,
    pub ground_restitution: f32,
    pub ground_friction: f32,
    /// How far past the tracked body the lane is kept populated
    pub lookahead: f32,
    /// Lane length measured from the ragdoll start
    pub max_distance: f32,
    /// Pre-generated span past the ragdoll start
    pub initial_span: f32,
    /// Obstacles further than this behind the body are dropped
    pub cleanup_distance: f32,
    pub base_spacing: f32,
    pub variance_scale: f32,
    pub macro_period: f32,
    pub micro_period: f32,
    pub macro_amplitude: f32,
    pub micro_amplitude: f32,
    pub openness_bias: f32,
    /// Aerial obstacles float between min and min + span above ground
    pub aerial_min_height: f32,
    pub aerial_height_span: f32,
    pub stack_step: f32,
    pub stack_jitter: f32,
    pub spawn_x_jitter: f32,
    pub ghost_opacity: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 1.0),
            gravity_scale: 0.001,
            ground_restitution: 0.7,
            ground_friction: 0.3,
            lookahead: 4000.0,
            max_distance: 10000.0,
            initial_span: 1000.0,
            cleanup_distance: 2000.0,
            base_spacing: 40.0,
            variance_scale: 350.0,
            macro_period: 1800.0,
            micro_period: 450.0,
            macro_amplitude: 0.5,
            micro_amplitude: 0.3,
            openness_bias: 0.2,
            aerial_min_height: 150.0,
            aerial_height_span: 400.0,
            stack_step: 80.0,
            stack_jitter: 50.0,
            spawn_x_jitter: 50.0,
            ghost_opacity: 0.3,
        }
    }
}

/// Follow camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Fraction of the view width kept left of the tracked body
    pub lead_fraction: f32,
    pub slow_smoothing: f32,
    pub fast_smoothing: f32,
    /// Speed (px/step) above which the camera starts to catch up faster
    pub speed_threshold: f32,
    /// Extra speed over the threshold at which fast smoothing is reached
    pub speed_margin: f32,
    pub zoom_smoothing: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Screen space kept clear above the body when zoomed out
    pub top_margin: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            lead_fraction: 1.0 / 3.0,
            slow_smoothing: 0.08,
            fast_smoothing: 0.25,
            speed_threshold: 10.0,
            speed_margin: 15.0,
            zoom_smoothing: 0.05,
            min_zoom: 0.35,
            max_zoom: 1.0,
            top_margin: 60.0,
        }
    }
}

/// Frame loop pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopTuning {
    /// Frame delta clamp (seconds)
    pub max_frame_dt: f32,
    /// Fixed physics step (ms)
    pub physics_step_ms: f32,
    pub max_substeps: u32,
}

impl Default for LoopTuning {
    fn default() -> Self {
        Self {
            max_frame_dt: 0.1,
            physics_step_ms: 1000.0 / 60.0,
            max_substeps: 8,
        }
    }
}

/// Complete game balance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub viewport: Viewport,
    pub shot: ShotTuning,
    pub ragdoll: RagdollTuning,
    pub world: WorldTuning,
    pub camera: CameraTuning,
    #[serde(rename = "loop")]
    pub frame_loop: LoopTuning,
}

impl Tuning {
    /// Parse tuning from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Load tuning from a JSON file on disk
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading tuning file {}", path.display()))?;
        let tuning = Self::from_json(&json)
            .with_context(|| format!("parsing tuning file {}", path.display()))?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Resting position of the launched body
    pub fn ragdoll_start(&self) -> Vec2 {
        Vec2::new(
            self.ragdoll.start_x,
            self.viewport.ground_y() - self.ragdoll.start_height,
        )
    }
}
