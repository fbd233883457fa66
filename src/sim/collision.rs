//! Contact boosts
//!
//! Each obstacle hands the tracked body its boost exactly once. After that
//! the obstacle is ghosted: it stops colliding with anything and fades, but
//! stays in the lane until cleanup.

use glam::Vec2;

use super::field::ObstacleField;
use super::obstacle::{Obstacle, ObstacleKind};
use crate::physics::{BodyHandle, BodyLabel, CollisionFilter, ContactPair, PhysicsBody, PhysicsWorld};

/// A boost handed out during contact resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostApplied {
    pub obstacle: BodyHandle,
    pub kind: ObstacleKind,
    pub force: Vec2,
}

#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver {
    ghost_opacity: f32,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self { ghost_opacity: 0.3 }
    }
}

impl CollisionResolver {
    pub fn new(ghost_opacity: f32) -> Self {
        Self { ghost_opacity }
    }

    /// Hand `obstacle`'s boost to `tracked`. Returns the force applied, or
    /// `None` when the obstacle was already spent or has nothing to give.
    pub fn on_contact<W: PhysicsWorld>(
        &self,
        world: &mut W,
        tracked: BodyHandle,
        obstacle: &mut Obstacle,
    ) -> Option<Vec2> {
        if obstacle.triggered {
            return None;
        }
        let boost = obstacle.boost?;

        let body = world.body_mut(tracked)?;
        let point = body.position();
        body.apply_force(point, boost);
        obstacle.triggered = true;

        if let Some(spent) = world.body_mut(obstacle.handle) {
            spent.set_collision_filter(CollisionFilter::GHOST);
            spent.set_opacity(self.ghost_opacity);
        }

        log::debug!(
            "{} boost ({:.4}, {:.4})",
            obstacle.kind.as_str(),
            boost.x,
            boost.y
        );
        Some(boost)
    }

    /// Resolve every collision-start pair between `tracked` and an obstacle
    /// in `field`. Anything else is ignored.
    pub fn resolve_pairs<W: PhysicsWorld>(
        &self,
        world: &mut W,
        tracked: BodyHandle,
        pairs: &[ContactPair],
        field: &mut ObstacleField,
    ) -> Vec<BoostApplied> {
        let mut applied = Vec::new();

        for pair in pairs {
            let Some((other, label)) = pair.other(tracked) else {
                continue;
            };
            if !matches!(label, BodyLabel::Obstacle(_)) {
                continue;
            }
            let Some(obstacle) = field.get_mut(other) else {
                continue;
            };
            if let Some(force) = self.on_contact(world, tracked, obstacle) {
                applied.push(BoostApplied {
                    obstacle: other,
                    kind: obstacle.kind,
                    force,
                });
            }
        }

        applied
    }
}
