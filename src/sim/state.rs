//! Round phases and the events a frame can emit

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::obstacle::ObstacleKind;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundState {
    /// Waiting for the first tap
    #[default]
    Idle,
    /// Power meter oscillating
    PowerSelect,
    /// Power locked, angle meter oscillating
    AngleSelect,
    /// Slapper walking up and swinging
    SlapAnimation,
    /// Body launched, physics in charge
    Flying,
    /// Body came to rest
    End,
}

impl RoundState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundState::Idle => "IDLE",
            RoundState::PowerSelect => "POWER_SELECT",
            RoundState::AngleSelect => "ANGLE_SELECT",
            RoundState::SlapAnimation => "SLAP_ANIMATION",
            RoundState::Flying => "FLYING",
            RoundState::End => "END",
        }
    }

    /// HUD prompt for the phase, if any
    pub fn instruction(&self) -> Option<&'static str> {
        match self {
            RoundState::Idle => Some("TAP TO START"),
            RoundState::PowerSelect => Some("TAP TO LOCK POWER"),
            RoundState::AngleSelect => Some("TAP TO LOCK ANGLE"),
            RoundState::End => Some("TAP TO PLAY AGAIN"),
            _ => None,
        }
    }
}

/// Things that happened during a frame, for HUD, audio and score submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    RoundStarted { round: u32 },
    PowerLocked { power: f32, bonus: bool },
    AngleLocked {
        angle: f32,
        sweet_spot: Option<String>,
        multiplier: f32,
    },
    Launched { force: Vec2, multiplier: f32 },
    Boosted { kind: ObstacleKind },
    RoundEnded {
        distance: f32,
        best: f32,
        new_best: bool,
    },
}
