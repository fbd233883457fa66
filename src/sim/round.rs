//! Round state machine
//!
//! Two things move a round forward: a tap from the player, handled by
//! [`RoundMachine::handle_tap`], and the passage of time, handled by
//! [`RoundMachine::update`]. Nothing else changes the phase.
//!
//! Wall-clock timestamps (`now_ms`) come from the host so the machine stays
//! deterministic under test.

use glam::Vec2;

use super::meter::{lerp_range, oscillate};
use super::state::RoundState;
use crate::ease_in_out;
use crate::tuning::{RagdollTuning, ShotTuning, SweetSpot};

/// First zone (in declared order) whose window contains `ratio`
pub fn match_sweet_spot(spots: &[SweetSpot], ratio: f32) -> Option<&SweetSpot> {
    spots.iter().find(|spot| spot.contains(ratio))
}

#[derive(Debug, Clone)]
pub struct RoundMachine {
    shot: ShotTuning,
    /// x the body is launched from; distance is measured from here
    slap_start_x: f32,
    /// Resting x of the slapper
    slapper_x: f32,

    state: RoundState,
    /// Seconds since the active meter was (re)started
    meter_time: f32,
    power_ratio: f32,
    angle_ratio: f32,
    power: f32,
    angle: f32,
    power_bonus: bool,
    sweet_spot: Option<SweetSpot>,
    slap_start_ms: f64,

    last_distance: f32,
    best_distance: f32,
    stop_timer_ms: f32,
}

impl RoundMachine {
    pub fn new(shot: ShotTuning, ragdoll: &RagdollTuning) -> Self {
        Self {
            shot,
            slap_start_x: ragdoll.start_x,
            slapper_x: ragdoll.slapper_x,
            state: RoundState::Idle,
            meter_time: 0.0,
            power_ratio: 0.0,
            angle_ratio: 0.0,
            power: 0.0,
            angle: 0.0,
            power_bonus: false,
            sweet_spot: None,
            slap_start_ms: 0.0,
            last_distance: 0.0,
            best_distance: 0.0,
            stop_timer_ms: 0.0,
        }
    }

    fn set_state(&mut self, next: RoundState) {
        log::info!("State: {} -> {}", self.state.as_str(), next.as_str());
        self.state = next;
    }

    /// Clear everything tied to the current round; the session best survives
    fn clear_round(&mut self) {
        self.power = 0.0;
        self.angle = 0.0;
        self.power_ratio = 0.0;
        self.angle_ratio = 0.0;
        self.last_distance = 0.0;
        self.stop_timer_ms = 0.0;
        self.sweet_spot = None;
        self.power_bonus = false;
        self.meter_time = 0.0;
    }

    /// Return to Idle from any phase
    pub fn reset(&mut self) {
        self.clear_round();
        self.set_state(RoundState::Idle);
    }

    /// Advance on a player tap. Returns true when the phase changed.
    pub fn handle_tap(&mut self, now_ms: f64) -> bool {
        match self.state {
            RoundState::Idle => {
                self.meter_time = 0.0;
                self.set_state(RoundState::PowerSelect);
            }
            RoundState::PowerSelect => {
                self.power = lerp_range(self.power_ratio, self.shot.power_min, self.shot.power_max);
                self.power_bonus = self.power_ratio >= self.shot.power_bonus_threshold;
                if self.power_bonus {
                    log::info!("POWER BONUS! {}x", self.shot.power_bonus_multiplier);
                }
                self.meter_time = 0.0;
                self.set_state(RoundState::AngleSelect);
            }
            RoundState::AngleSelect => {
                self.angle = lerp_range(self.angle_ratio, self.shot.angle_min, self.shot.angle_max);
                self.sweet_spot = match_sweet_spot(&self.shot.sweet_spots, self.angle_ratio).cloned();
                if let Some(spot) = &self.sweet_spot {
                    log::info!("{}! {}x", spot.label, spot.multiplier);
                }
                self.slap_start_ms = now_ms;
                self.set_state(RoundState::SlapAnimation);
            }
            RoundState::End => {
                self.clear_round();
                self.set_state(RoundState::PowerSelect);
            }
            RoundState::SlapAnimation | RoundState::Flying => return false,
        }
        true
    }

    /// Advance timers by `dt` seconds
    pub fn update(&mut self, dt: f32, now_ms: f64) {
        self.meter_time += dt;

        match self.state {
            RoundState::PowerSelect => {
                self.power_ratio = oscillate(self.meter_time, self.shot.power_speed);
            }
            RoundState::AngleSelect => {
                self.angle_ratio = oscillate(self.meter_time, self.shot.angle_speed);
            }
            RoundState::SlapAnimation => {
                if now_ms - self.slap_start_ms >= self.shot.slap_duration_ms {
                    self.set_state(RoundState::Flying);
                }
            }
            RoundState::Idle | RoundState::Flying | RoundState::End => {}
        }
    }

    /// True inside the impact window of the slap. The caller applies the
    /// force at most once per round.
    pub fn should_apply_force(&self, now_ms: f64) -> bool {
        if self.state != RoundState::SlapAnimation {
            return false;
        }
        let elapsed = now_ms - self.slap_start_ms;
        elapsed >= self.shot.impact_time_ms
            && elapsed < self.shot.impact_time_ms + self.shot.impact_window_ms
    }

    /// Power bonus times sweet-spot multiplier
    pub fn total_multiplier(&self) -> f32 {
        let bonus = if self.power_bonus {
            self.shot.power_bonus_multiplier
        } else {
            1.0
        };
        bonus * self.sweet_spot.as_ref().map_or(1.0, |s| s.multiplier)
    }

    /// Launch force from the locked power and angle (screen y points down)
    pub fn force_vector(&self) -> Vec2 {
        let theta = self.angle.to_radians();
        let scale = self.power * self.shot.force_scale * self.total_multiplier();
        Vec2::new(theta.cos() * scale, -theta.sin() * scale)
    }

    /// Track the furthest point reached this round
    pub fn update_distance(&mut self, current_x: f32) {
        let distance = (current_x - self.slap_start_x).max(0.0);
        self.last_distance = self.last_distance.max(distance);
    }

    /// Debounced end detection while Flying. Returns true on the tick the
    /// round ends.
    pub fn check_end_condition(&mut self, speed: f32, dt: f32) -> bool {
        if self.state != RoundState::Flying {
            return false;
        }

        if speed < self.shot.stop_threshold {
            self.stop_timer_ms += dt * 1000.0;
            if self.stop_timer_ms >= self.shot.stop_duration_ms {
                self.end_round();
                return true;
            }
        } else {
            self.stop_timer_ms = 0.0;
        }
        false
    }

    fn end_round(&mut self) {
        self.best_distance = self.best_distance.max(self.last_distance);
        self.set_state(RoundState::End);
    }

    /// Slap animation progress in [0, 1]; 0 outside the animation
    pub fn slap_progress(&self, now_ms: f64) -> f32 {
        if self.state != RoundState::SlapAnimation {
            return 0.0;
        }
        let elapsed = (now_ms - self.slap_start_ms).max(0.0);
        (elapsed / self.shot.slap_duration_ms).min(1.0) as f32
    }

    /// Where the slapper stands: it runs up to the body during the slap
    pub fn slapper_x(&self, now_ms: f64) -> f32 {
        if self.state != RoundState::SlapAnimation {
            return self.slapper_x;
        }
        let from = self.slapper_x - 100.0;
        let to = self.slap_start_x - 120.0;
        from + (to - from) * ease_in_out(self.slap_progress(now_ms))
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn power_ratio(&self) -> f32 {
        self.power_ratio
    }

    pub fn angle_ratio(&self) -> f32 {
        self.angle_ratio
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn is_power_bonus(&self) -> bool {
        self.power_bonus
    }

    pub fn sweet_spot(&self) -> Option<&SweetSpot> {
        self.sweet_spot.as_ref()
    }

    pub fn slap_start_x(&self) -> f32 {
        self.slap_start_x
    }

    pub fn last_distance(&self) -> f32 {
        self.last_distance
    }

    pub fn best_distance(&self) -> f32 {
        self.best_distance
    }

    pub fn stop_timer_ms(&self) -> f32 {
        self.stop_timer_ms
    }
}
