//! Minimal rigid-body backend
//!
//! Bodies are integrated the way the original tuning expects (velocity in
//! pixels per step, force scaled by step time squared) and collide as
//! bounding circles. Bodies labelled [`BodyLabel::Ground`] act as a half
//! plane at their top edge. Good enough to play a round headless and to
//! test the game rules against; not a general engine.

use std::collections::HashSet;

use glam::Vec2;

use super::{
    BodyDesc, BodyHandle, BodyLabel, CollisionFilter, ContactPair, PhysicsBody, PhysicsWorld,
    Shape,
};

/// Step length the velocity units are expressed in (ms)
pub const BASE_DELTA_MS: f32 = 1000.0 / 60.0;

/// Approach speed below which contacts do not bounce
const RESTING_SPEED: f32 = 1.0;
/// Penetration allowed before position correction kicks in
const SLOP: f32 = 0.05;
const POSITION_CORRECTION: f32 = 0.8;
/// Spin lost per step while touching something
const CONTACT_SPIN_DAMPING: f32 = 0.98;

#[derive(Debug, Clone)]
pub struct SimpleBody {
    label: BodyLabel,
    shape: Shape,
    position: Vec2,
    velocity: Vec2,
    angle: f32,
    angular_velocity: f32,
    force: Vec2,
    torque: f32,
    is_static: bool,
    density: f32,
    mass: f32,
    inertia: f32,
    restitution: f32,
    friction: f32,
    friction_air: f32,
    filter: CollisionFilter,
    opacity: f32,
}

impl SimpleBody {
    fn from_desc(desc: BodyDesc) -> Self {
        let mut body = Self {
            label: desc.label,
            shape: desc.shape,
            position: desc.position,
            velocity: Vec2::ZERO,
            angle: desc.angle,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            is_static: desc.is_static,
            density: desc.density,
            mass: 0.0,
            inertia: 0.0,
            restitution: desc.restitution,
            friction: desc.friction,
            friction_air: desc.friction_air,
            filter: desc.filter,
            opacity: 1.0,
        };
        body.update_mass();
        body
    }

    fn update_mass(&mut self) {
        self.mass = (self.density * self.shape.area()).max(f32::EPSILON);
        let r = self.shape.bounding_radius();
        self.inertia = 0.5 * self.mass * r * r;
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Force accumulated since the last step
    pub fn pending_force(&self) -> Vec2 {
        self.force
    }

    fn inverse_mass(&self) -> f32 {
        if self.is_static { 0.0 } else { 1.0 / self.mass }
    }

    fn radius(&self) -> f32 {
        self.shape.bounding_radius()
    }

    fn half_height(&self) -> f32 {
        self.shape.half_height()
    }

    fn integrate(&mut self, delta_ms: f32, gravity: Vec2) {
        if self.is_static {
            self.force = Vec2::ZERO;
            self.torque = 0.0;
            return;
        }
        let dt2 = delta_ms * delta_ms;
        let air = 1.0 - self.friction_air * (delta_ms / BASE_DELTA_MS);

        self.velocity = self.velocity * air + (self.force / self.mass + gravity) * dt2;
        self.position += self.velocity;

        self.angular_velocity = self.angular_velocity * air + (self.torque / self.inertia) * dt2;
        self.angle += self.angular_velocity;

        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }
}

impl PhysicsBody for SimpleBody {
    fn label(&self) -> BodyLabel {
        self.label
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn angle(&self) -> f32 {
        self.angle
    }

    fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    fn is_static(&self) -> bool {
        self.is_static
    }

    fn collision_filter(&self) -> CollisionFilter {
        self.filter
    }

    fn opacity(&self) -> f32 {
        self.opacity
    }

    fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
        if is_static {
            self.velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
        } else {
            self.update_mass();
        }
    }

    fn apply_force(&mut self, point: Vec2, force: Vec2) {
        self.force += force;
        self.torque += (point - self.position).perp_dot(force);
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.angular_velocity = angular_velocity;
    }

    fn set_collision_filter(&mut self, filter: CollisionFilter) {
        self.filter = filter;
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }
}

/// Normal (pointing from `a` to `b`) and penetration depth of an overlap
fn contact(a: &SimpleBody, b: &SimpleBody) -> Option<(Vec2, f32)> {
    match (a.label, b.label) {
        (BodyLabel::Ground, BodyLabel::Ground) => None,
        (_, BodyLabel::Ground) => {
            let top = b.position.y - b.half_height();
            let depth = a.position.y + a.radius() - top;
            (depth > 0.0).then_some((Vec2::Y, depth))
        }
        (BodyLabel::Ground, _) => {
            let top = a.position.y - a.half_height();
            let depth = b.position.y + b.radius() - top;
            (depth > 0.0).then_some((Vec2::NEG_Y, depth))
        }
        _ => {
            let delta = b.position - a.position;
            let dist = delta.length();
            let depth = a.radius() + b.radius() - dist;
            if depth <= 0.0 {
                return None;
            }
            let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::NEG_Y };
            Some((normal, depth))
        }
    }
}

fn resolve(a: &mut SimpleBody, b: &mut SimpleBody, normal: Vec2, depth: f32) {
    let inv_a = a.inverse_mass();
    let inv_b = b.inverse_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return;
    }

    let correction = normal * ((depth - SLOP).max(0.0) * POSITION_CORRECTION / inv_sum);
    a.position -= correction * inv_a;
    b.position += correction * inv_b;

    let relative = b.velocity - a.velocity;
    let approach = relative.dot(normal);
    if approach >= 0.0 {
        return;
    }

    let restitution = if -approach > RESTING_SPEED {
        a.restitution.max(b.restitution)
    } else {
        0.0
    };
    let j = -(1.0 + restitution) * approach / inv_sum;
    a.velocity -= normal * (j * inv_a);
    b.velocity += normal * (j * inv_b);

    // Coulomb friction along the contact tangent
    let tangent = relative - normal * approach;
    let slide = tangent.length();
    if slide > f32::EPSILON {
        let dir = tangent / slide;
        let mu = a.friction.min(b.friction);
        let jt = (slide / inv_sum).min(mu * j);
        a.velocity += dir * (jt * inv_a);
        b.velocity -= dir * (jt * inv_b);
    }

    a.angular_velocity *= CONTACT_SPIN_DAMPING;
    b.angular_velocity *= CONTACT_SPIN_DAMPING;
}

fn pair_key(a: BodyHandle, b: BodyHandle) -> (BodyHandle, BodyHandle) {
    if a < b { (a, b) } else { (b, a) }
}

/// World owning [`SimpleBody`]s, kept sorted by handle
#[derive(Debug, Clone)]
pub struct SimpleWorld {
    bodies: Vec<(BodyHandle, SimpleBody)>,
    next_id: u32,
    gravity: Vec2,
    gravity_scale: f32,
    touching: HashSet<(BodyHandle, BodyHandle)>,
    collision_starts: Vec<ContactPair>,
}

impl Default for SimpleWorld {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, 1.0), 0.001)
    }
}

impl SimpleWorld {
    pub fn new(gravity: Vec2, gravity_scale: f32) -> Self {
        Self {
            bodies: Vec::new(),
            next_id: 1,
            gravity,
            gravity_scale,
            touching: HashSet::new(),
            collision_starts: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.bodies.iter().map(|(h, _)| *h)
    }

    fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.bodies.binary_search_by_key(&handle, |(h, _)| *h).ok()
    }

    fn detect_and_resolve(&mut self) {
        let mut now_touching = HashSet::new();
        let count = self.bodies.len();

        for i in 0..count {
            let (head, tail) = self.bodies.split_at_mut(i + 1);
            let (ha, a) = &mut head[i];
            for (hb, b) in tail.iter_mut() {
                if a.is_static && b.is_static {
                    continue;
                }
                if !a.filter.can_collide(&b.filter) {
                    continue;
                }
                let Some((normal, depth)) = contact(a, b) else {
                    continue;
                };

                let key = pair_key(*ha, *hb);
                if !self.touching.contains(&key) {
                    self.collision_starts.push(ContactPair {
                        a: *ha,
                        b: *hb,
                        label_a: a.label,
                        label_b: b.label,
                    });
                }
                now_touching.insert(key);
                resolve(a, b, normal, depth);
            }
        }

        self.touching = now_touching;
    }
}

impl PhysicsWorld for SimpleWorld {
    type Body = SimpleBody;

    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        // Handles only grow, so pushing keeps the list sorted
        self.bodies.push((handle, SimpleBody::from_desc(desc)));
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        match self.index_of(handle) {
            Some(i) => {
                self.bodies.remove(i);
                self.touching.retain(|(a, b)| *a != handle && *b != handle);
                true
            }
            None => false,
        }
    }

    fn body(&self, handle: BodyHandle) -> Option<&SimpleBody> {
        self.index_of(handle).map(|i| &self.bodies[i].1)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut SimpleBody> {
        self.index_of(handle).map(|i| &mut self.bodies[i].1)
    }

    fn gravity(&self) -> Vec2 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    fn step(&mut self, delta_ms: f32) {
        let gravity = self.gravity * self.gravity_scale;
        for (_, body) in &mut self.bodies {
            body.integrate(delta_ms, gravity);
        }
        self.detect_and_resolve();
    }

    fn drain_collision_starts(&mut self) -> Vec<ContactPair> {
        std::mem::take(&mut self.collision_starts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ObstacleKind;

    fn ground(world: &mut SimpleWorld) -> BodyHandle {
        world.add_body(
            BodyDesc::new(
                BodyLabel::Ground,
                Vec2::new(50_000.0, 660.0),
                Shape::Rect {
                    width: 100_000.0,
                    height: 120.0,
                },
            )
            .with_static(true)
            .with_friction(0.3),
        )
    }

    fn ball(world: &mut SimpleWorld, pos: Vec2) -> BodyHandle {
        world.add_body(
            BodyDesc::new(BodyLabel::Thug, pos, Shape::Circle { radius: 35.0 })
                .with_restitution(0.7)
                .with_friction(0.4)
                .with_friction_air(0.008),
        )
    }

    #[test]
    fn test_static_body_does_not_fall() {
        let mut world = SimpleWorld::default();
        let h = world.add_body(
            BodyDesc::new(BodyLabel::Thug, Vec2::new(0.0, 0.0), Shape::Circle { radius: 5.0 })
                .with_static(true),
        );
        for _ in 0..30 {
            world.step(BASE_DELTA_MS);
        }
        assert_eq!(world.body(h).unwrap().position(), Vec2::ZERO);
    }

    #[test]
    fn test_dynamic_body_falls_and_settles_on_ground() {
        let mut world = SimpleWorld::default();
        ground(&mut world);
        let h = ball(&mut world, Vec2::new(500.0, 300.0));

        for _ in 0..600 {
            world.step(BASE_DELTA_MS);
        }
        let body = world.body(h).unwrap();
        // Ground top is 600; center should rest about one radius above it
        assert!((body.position().y - 565.0).abs() < 2.0, "y = {}", body.position().y);
        assert!(body.speed() < 0.3, "speed = {}", body.speed());
    }

    #[test]
    fn test_sliding_body_is_stopped_by_friction() {
        let mut world = SimpleWorld::default();
        ground(&mut world);
        let h = ball(&mut world, Vec2::new(500.0, 565.0));
        world.body_mut(h).unwrap().set_velocity(Vec2::new(15.0, 0.0));

        for _ in 0..1200 {
            world.step(BASE_DELTA_MS);
        }
        let body = world.body(h).unwrap();
        assert!(body.position().x > 500.0);
        assert!(body.speed() < 0.3);
    }

    #[test]
    fn test_force_is_consumed_by_step() {
        let mut world = SimpleWorld::new(Vec2::ZERO, 0.0);
        let h = ball(&mut world, Vec2::ZERO);
        let body = world.body_mut(h).unwrap();
        body.apply_force(Vec2::ZERO, Vec2::new(0.01, 0.0));
        assert_eq!(body.pending_force(), Vec2::new(0.01, 0.0));

        world.step(BASE_DELTA_MS);
        let body = world.body(h).unwrap();
        assert_eq!(body.pending_force(), Vec2::ZERO);
        assert!(body.velocity().x > 0.0);
    }

    #[test]
    fn test_collision_start_reported_once_while_touching() {
        let mut world = SimpleWorld::new(Vec2::ZERO, 0.0);
        let thug = ball(&mut world, Vec2::new(0.0, 0.0));
        let cloud = world.add_body(
            BodyDesc::new(
                BodyLabel::Obstacle(ObstacleKind::Cloud),
                Vec2::new(60.0, 0.0),
                Shape::Rect {
                    width: 90.0,
                    height: 45.0,
                },
            )
            .with_static(true),
        );

        world.step(BASE_DELTA_MS);
        let starts = world.drain_collision_starts();
        assert_eq!(starts.len(), 1);
        assert!(starts[0].other(thug).is_some_and(|(h, _)| h == cloud));

        // Keep the pair overlapping; no new start event
        world.body_mut(thug).unwrap().set_position(Vec2::new(0.0, 0.0));
        world.step(BASE_DELTA_MS);
        assert!(world.drain_collision_starts().is_empty());
    }

    #[test]
    fn test_ghost_filter_skips_contacts() {
        let mut world = SimpleWorld::new(Vec2::ZERO, 0.0);
        ball(&mut world, Vec2::new(0.0, 0.0));
        let other = ball(&mut world, Vec2::new(10.0, 0.0));
        world
            .body_mut(other)
            .unwrap()
            .set_collision_filter(CollisionFilter::GHOST);

        world.step(BASE_DELTA_MS);
        assert!(world.drain_collision_starts().is_empty());
        assert_eq!(world.body(other).unwrap().position(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_remove_unknown_handle() {
        let mut world = SimpleWorld::default();
        let h = ball(&mut world, Vec2::ZERO);
        assert!(world.remove_body(h));
        assert!(!world.remove_body(h));
        assert!(world.body(h).is_none());
        assert!(world.is_empty());
    }
}
