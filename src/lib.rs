//! Slap & Fly - a one-tap physics launch game
//!
//! Core modules:
//! - `sim`: Round state machine, obstacle lane, contact boosts, session loop
//! - `physics`: Rigid-body engine boundary and the bundled simple backend
//! - `camera`: Follow camera with speed-adaptive smoothing and zoom
//! - `highscores`: Leaderboard model and score service wire types
//! - `platform`: Browser/native clock
//! - `tuning`: Data-driven game balance
//! - `web`: wasm32 bindings for a JS renderer

pub mod camera;
pub mod highscores;
pub mod physics;
pub mod platform;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use camera::CameraController;
pub use highscores::{Leaderboard, LeaderboardView};
pub use sim::{GameEvent, RoundState, Session, TickInput};
pub use tuning::Tuning;

/// Quadratic ease-in-out on [0, 1]
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_in_out_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(0.5), 0.5);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!(ease_in_out(0.25) < 0.25);
        assert!(ease_in_out(0.75) > 0.75);
    }
}
