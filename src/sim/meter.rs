//! Oscillating meters
//!
//! Both the power and the angle meter sweep back and forth on a sine wave;
//! the player locks whichever value the meter shows when they tap.

/// Meter fill ratio in [0, 1] after `elapsed_secs` at angular `speed`
#[inline]
pub fn oscillate(elapsed_secs: f32, speed: f32) -> f32 {
    (elapsed_secs * speed).sin() * 0.5 + 0.5
}

/// Map a ratio onto `[min, max]`
#[inline]
pub fn lerp_range(ratio: f32, min: f32, max: f32) -> f32 {
    min + ratio * (max - min)
}
