//! The launched body
//!
//! The ragdoll waits as a static body on its mark until the slap lands, then
//! turns dynamic with the launch force and some spin. Boosts from obstacles
//! add spin on top of their force.

use glam::Vec2;

use crate::physics::{BodyDesc, BodyHandle, BodyLabel, PhysicsBody, PhysicsWorld, Shape};
use crate::tuning::RagdollTuning;

#[derive(Debug, Clone)]
pub struct Ragdoll {
    handle: BodyHandle,
    start: Vec2,
    tuning: RagdollTuning,
    flying: bool,
}

impl Ragdoll {
    /// Create the body at `start`, static until launched
    pub fn spawn<W: PhysicsWorld>(world: &mut W, tuning: RagdollTuning, start: Vec2) -> Self {
        let desc = BodyDesc::new(
            BodyLabel::Thug,
            start,
            Shape::Circle {
                radius: tuning.radius,
            },
        )
        .with_static(true)
        .with_density(tuning.density)
        .with_restitution(tuning.restitution)
        .with_friction(tuning.friction)
        .with_friction_air(tuning.friction_air);

        let handle = world.add_body(desc);
        Self {
            handle,
            start,
            tuning,
            flying: false,
        }
    }

    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    pub fn start(&self) -> Vec2 {
        self.start
    }

    pub fn is_flying(&self) -> bool {
        self.flying
    }

    /// Release the body with `force`. Returns false if the body is gone.
    pub fn launch<W: PhysicsWorld>(&mut self, world: &mut W, force: Vec2) -> bool {
        let Some(body) = world.body_mut(self.handle) else {
            log::warn!("Ragdoll body missing at launch");
            return false;
        };
        body.set_static(false);
        let point = body.position();
        body.apply_force(point, force);
        body.set_angular_velocity(force.x * self.tuning.launch_spin_factor + self.tuning.launch_spin_base);
        self.flying = true;
        true
    }

    /// Extra spin from an obstacle boost
    pub fn boost_spin<W: PhysicsWorld>(&self, world: &mut W, boost: Vec2) {
        if let Some(body) = world.body_mut(self.handle) {
            let spin = body.angular_velocity() + boost.x * self.tuning.boost_spin_factor;
            body.set_angular_velocity(spin);
        }
    }

    /// Back on the mark, static and at rest
    pub fn reset<W: PhysicsWorld>(&mut self, world: &mut W) {
        if let Some(body) = world.body_mut(self.handle) {
            body.set_static(true);
            body.set_position(self.start);
            body.set_velocity(Vec2::ZERO);
            body.set_angle(0.0);
            body.set_angular_velocity(0.0);
        }
        self.flying = false;
    }

    pub fn position<W: PhysicsWorld>(&self, world: &W) -> Vec2 {
        world
            .body(self.handle)
            .map_or(self.start, |b| b.position())
    }

    pub fn angle<W: PhysicsWorld>(&self, world: &W) -> f32 {
        world.body(self.handle).map_or(0.0, |b| b.angle())
    }

    pub fn speed<W: PhysicsWorld>(&self, world: &W) -> f32 {
        world.body(self.handle).map_or(0.0, |b| b.speed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::SimpleWorld;
    use crate::physics::simple::BASE_DELTA_MS;

    fn spawn(world: &mut SimpleWorld) -> Ragdoll {
        Ragdoll::spawn(world, RagdollTuning::default(), Vec2::new(500.0, 520.0))
    }

    #[test]
    fn test_waits_static_until_launch() {
        let mut world = SimpleWorld::default();
        let ragdoll = spawn(&mut world);
        for _ in 0..10 {
            world.step(BASE_DELTA_MS);
        }
        assert_eq!(ragdoll.position(&world), Vec2::new(500.0, 520.0));
        assert!(!ragdoll.is_flying());
    }

    #[test]
    fn test_launch_applies_force_and_spin() {
        let mut world = SimpleWorld::new(Vec2::ZERO, 0.0);
        let mut ragdoll = spawn(&mut world);
        let force = Vec2::new(0.2, -0.1);

        assert!(ragdoll.launch(&mut world, force));
        assert!(ragdoll.is_flying());
        let body = world.body(ragdoll.handle()).unwrap();
        assert!(!body.is_static());
        assert_eq!(body.pending_force(), force);
        assert!((body.angular_velocity() - (0.2 * 50.0 + 0.3)).abs() < 1e-5);

        world.step(BASE_DELTA_MS);
        let pos = ragdoll.position(&world);
        assert!(pos.x > 500.0 && pos.y < 520.0);
    }

    #[test]
    fn test_boost_adds_spin() {
        let mut world = SimpleWorld::new(Vec2::ZERO, 0.0);
        let mut ragdoll = spawn(&mut world);
        ragdoll.launch(&mut world, Vec2::ZERO);

        ragdoll.boost_spin(&mut world, Vec2::new(0.01, -0.01));
        let spin = world.body(ragdoll.handle()).unwrap().angular_velocity();
        assert!((spin - (0.3 + 0.2)).abs() < 1e-5);
    }

    #[test]
    fn test_reset_restores_pose() {
        let mut world = SimpleWorld::default();
        let mut ragdoll = spawn(&mut world);
        ragdoll.launch(&mut world, Vec2::new(0.3, -0.3));
        for _ in 0..20 {
            world.step(BASE_DELTA_MS);
        }

        ragdoll.reset(&mut world);
        let body = world.body(ragdoll.handle()).unwrap();
        assert!(body.is_static());
        assert_eq!(body.position(), Vec2::new(500.0, 520.0));
        assert_eq!(body.velocity(), Vec2::ZERO);
        assert_eq!(body.angle(), 0.0);
        assert!(!ragdoll.is_flying());
    }

    #[test]
    fn test_missing_body_degrades() {
        let mut world = SimpleWorld::default();
        let mut ragdoll = spawn(&mut world);
        world.remove_body(ragdoll.handle());

        assert!(!ragdoll.launch(&mut world, Vec2::X));
        assert_eq!(ragdoll.position(&world), ragdoll.start());
        assert_eq!(ragdoll.speed(&world), 0.0);
    }
}
