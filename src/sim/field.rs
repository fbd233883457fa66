//! Procedural obstacle lane
//!
//! The lane is generated lazily: whenever the tracked body gets close to the
//! frontier, [`ObstacleField::ensure_generated_ahead`] populates the next
//! stretch. Spacing follows an "openness" signal built from two sine waves,
//! a long one that carves out sparse and crowded regions and a short one that
//! clusters obstacles locally. Random draws come from a seeded PCG stream so
//! a lane can be replayed from its seed.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::obstacle::{Obstacle, ObstacleKind};
use crate::physics::{BodyHandle, PhysicsBody, PhysicsWorld};
use crate::tuning::WorldTuning;

const MAX_SPAWN_PER_STEP: u32 = 3;

#[derive(Debug, Clone)]
pub struct ObstacleField {
    tuning: WorldTuning,
    /// Ragdoll start x; the lane ends `max_distance` past it
    start_x: f32,
    ground_y: f32,
    /// Live obstacles, ordered by handle
    obstacles: Vec<Obstacle>,
    generated_up_to: f32,
    seed: u64,
    rng: Pcg32,
}

impl ObstacleField {
    /// Empty field; call [`reset`](Self::reset) or
    /// [`ensure_generated_ahead`](Self::ensure_generated_ahead) to populate it
    pub fn new(tuning: WorldTuning, start_x: f32, ground_y: f32, seed: u64) -> Self {
        Self {
            tuning,
            start_x,
            ground_y,
            obstacles: Vec::new(),
            generated_up_to: 0.0,
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Spacing signal at `x`: high in sparse stretches, low in crowded ones
    pub fn openness(&self, x: f32) -> f32 {
        let t = &self.tuning;
        (x / t.macro_period).sin() * t.macro_amplitude
            + (x / t.micro_period).sin() * t.micro_amplitude
            + t.openness_bias
    }

    /// Rightmost x already populated
    pub fn generated_up_to(&self) -> f32 {
        self.generated_up_to
    }

    /// Furthest the frontier can ever reach
    pub fn lane_end(&self) -> f32 {
        self.tuning.max_distance + self.start_x
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Obstacle> {
        self.obstacles
            .binary_search_by_key(&handle, |o| o.handle)
            .ok()
            .map(|i| &self.obstacles[i])
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Obstacle> {
        self.obstacles
            .binary_search_by_key(&handle, |o| o.handle)
            .ok()
            .map(|i| &mut self.obstacles[i])
    }

    /// Populate the lane up to `current_x + lookahead` (capped at the lane
    /// end). Returns the handles of the obstacles created; empty when the
    /// frontier is already far enough.
    pub fn ensure_generated_ahead<W: PhysicsWorld>(
        &mut self,
        world: &mut W,
        current_x: f32,
    ) -> Vec<BodyHandle> {
        let target_x = (current_x + self.tuning.lookahead).min(self.lane_end());
        if target_x <= self.generated_up_to {
            return Vec::new();
        }
        if self.tuning.base_spacing.is_nan() || self.tuning.base_spacing <= 0.0 {
            log::warn!(
                "Obstacle spacing {} is not positive, skipping generation",
                self.tuning.base_spacing
            );
            return Vec::new();
        }

        let mut created = Vec::new();
        let mut x = self.generated_up_to;
        loop {
            let openness = self.openness(x);
            let variance = ((openness + 0.8) * self.tuning.variance_scale).max(0.0);
            let jitter = self.rng.random::<f32>() * 0.5 + 0.75;
            x += self.tuning.base_spacing + variance * jitter;

            if x >= target_x {
                break;
            }

            // Crowded stretches spawn more per step
            let intensity = (1.5 - openness) * 1.5;
            let count = ((intensity + self.rng.random::<f32>()).floor() as i64)
                .clamp(1, MAX_SPAWN_PER_STEP as i64) as u32;

            for i in 0..count {
                let handle = self.spawn(world, x, i);
                created.push(handle);
            }
        }

        log::debug!(
            "Generated {} obstacles over {:.0}..{:.0}",
            created.len(),
            self.generated_up_to,
            target_x
        );
        self.generated_up_to = target_x;
        created
    }

    fn spawn<W: PhysicsWorld>(&mut self, world: &mut W, x: f32, stack_index: u32) -> BodyHandle {
        let kind = ObstacleKind::ALL[self.rng.random_range(0..ObstacleKind::ALL.len())];

        let lift = if kind.is_aerial() {
            self.tuning.aerial_min_height + self.rng.random::<f32>() * self.tuning.aerial_height_span
        } else if stack_index > 0 {
            stack_index as f32 * self.tuning.stack_step
                + self.rng.random::<f32>() * self.tuning.stack_jitter
        } else {
            0.0
        };
        // Ground kinds rest on the surface rather than straddling it
        let rest = if kind.is_aerial() {
            0.0
        } else {
            kind.shape().half_height()
        };

        let spawn_x = x + (self.rng.random::<f32>() - 0.5) * self.tuning.spawn_x_jitter;
        let position = Vec2::new(spawn_x, self.ground_y - lift - rest);

        let handle = world.add_body(kind.body_desc(position));
        self.obstacles.push(Obstacle::new(handle, kind, position));
        handle
    }

    /// Drop every obstacle more than `cleanup_distance` behind `current_x`.
    /// Returns how many were removed.
    pub fn cleanup<W: PhysicsWorld>(&mut self, world: &mut W, current_x: f32) -> usize {
        let threshold = current_x - self.tuning.cleanup_distance;
        let before = self.obstacles.len();

        self.obstacles.retain(|obstacle| {
            let x = world
                .body(obstacle.handle)
                .map_or(obstacle.spawn.x, |b| b.position().x);
            if x < threshold {
                world.remove_body(obstacle.handle);
                false
            } else {
                true
            }
        });

        let removed = before - self.obstacles.len();
        if removed > 0 {
            log::debug!("Cleaned up {} obstacles behind x={:.0}", removed, threshold);
        }
        removed
    }

    /// Remove every obstacle and start a fresh lane from `seed`, pre-generated
    /// a little past the ragdoll start
    pub fn reset<W: PhysicsWorld>(&mut self, world: &mut W, seed: u64) -> Vec<BodyHandle> {
        for obstacle in self.obstacles.drain(..) {
            world.remove_body(obstacle.handle);
        }
        self.generated_up_to = 0.0;
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);

        let initial_x = self.start_x + self.tuning.initial_span;
        self.ensure_generated_ahead(world, initial_x)
    }
}
