//! Physics engine boundary
//!
//! The game only needs a narrow slice of a rigid-body engine: bodies with a
//! pose and velocity that accept forces, a world that owns them and steps
//! them, and a stream of collision-start pairs. Any backend implementing
//! [`PhysicsWorld`] can drive a session; [`simple::SimpleWorld`] is the one
//! bundled for headless play and tests.
//!
//! Units follow the engine the game was tuned against: positions in pixels,
//! velocities in pixels per 16.67 ms step, forces scaled by step time squared.

pub mod simple;

use glam::Vec2;

use crate::sim::ObstacleKind;

pub use simple::{SimpleBody, SimpleWorld};

/// Handle to a body owned by a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// What a body represents in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLabel {
    Ground,
    /// The launched ragdoll
    Thug,
    Obstacle(ObstacleKind),
}

/// Collision shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

impl Shape {
    pub fn area(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Rect { width, height } => width * height,
        }
    }

    /// Distance from the center to the bottom edge when unrotated
    pub fn half_height(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => radius,
            Shape::Rect { height, .. } => height * 0.5,
        }
    }

    /// Radius of a circle approximating the shape for contact tests
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => radius,
            Shape::Rect { width, height } => (width + height) * 0.25,
        }
    }
}

/// Category/mask collision filter. Two bodies collide when each one's mask
/// accepts the other's category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionFilter {
    pub category: u32,
    pub mask: u32,
}

impl CollisionFilter {
    pub const DEFAULT: Self = Self {
        category: 0x0001,
        mask: 0xFFFF_FFFF,
    };

    /// Filter for bodies that must never collide again
    pub const GHOST: Self = Self {
        category: 0x0002,
        mask: 0x0000,
    };

    #[inline]
    pub fn can_collide(&self, other: &CollisionFilter) -> bool {
        (self.mask & other.category) != 0 && (other.mask & self.category) != 0
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Everything needed to create a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub label: BodyLabel,
    pub position: Vec2,
    pub angle: f32,
    pub shape: Shape,
    pub is_static: bool,
    pub density: f32,
    pub restitution: f32,
    pub friction: f32,
    pub friction_air: f32,
    pub filter: CollisionFilter,
}

impl BodyDesc {
    pub fn new(label: BodyLabel, position: Vec2, shape: Shape) -> Self {
        Self {
            label,
            position,
            angle: 0.0,
            shape,
            is_static: false,
            density: 0.001,
            restitution: 0.0,
            friction: 0.1,
            friction_air: 0.01,
            filter: CollisionFilter::DEFAULT,
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_friction_air(mut self, friction_air: f32) -> Self {
        self.friction_air = friction_air;
        self
    }
}

/// A collision that started during the last step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub label_a: BodyLabel,
    pub label_b: BodyLabel,
}

impl ContactPair {
    /// If `body` takes part in this pair, return the other side
    pub fn other(&self, body: BodyHandle) -> Option<(BodyHandle, BodyLabel)> {
        if self.a == body {
            Some((self.b, self.label_b))
        } else if self.b == body {
            Some((self.a, self.label_a))
        } else {
            None
        }
    }
}

/// A simulated rigid body
pub trait PhysicsBody {
    fn label(&self) -> BodyLabel;
    fn position(&self) -> Vec2;
    fn velocity(&self) -> Vec2;
    fn angle(&self) -> f32;
    fn angular_velocity(&self) -> f32;
    fn is_static(&self) -> bool;
    fn collision_filter(&self) -> CollisionFilter;
    /// Render opacity (1.0 opaque); physics ignores it
    fn opacity(&self) -> f32;

    fn set_static(&mut self, is_static: bool);
    /// Accumulate a force for the next step; `point` is where it acts
    fn apply_force(&mut self, point: Vec2, force: Vec2);
    fn set_position(&mut self, position: Vec2);
    fn set_velocity(&mut self, velocity: Vec2);
    fn set_angle(&mut self, angle: f32);
    fn set_angular_velocity(&mut self, angular_velocity: f32);
    fn set_collision_filter(&mut self, filter: CollisionFilter);
    fn set_opacity(&mut self, opacity: f32);

    fn speed(&self) -> f32 {
        self.velocity().length()
    }
}

/// A container of bodies that can be stepped
pub trait PhysicsWorld {
    type Body: PhysicsBody;

    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;
    /// Returns false when the handle is unknown
    fn remove_body(&mut self, handle: BodyHandle) -> bool;
    fn body(&self, handle: BodyHandle) -> Option<&Self::Body>;
    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Self::Body>;
    fn gravity(&self) -> Vec2;
    fn set_gravity(&mut self, gravity: Vec2);
    /// Advance the simulation by `delta_ms`
    fn step(&mut self, delta_ms: f32);
    /// Collision-start pairs reported since the last call
    fn drain_collision_starts(&mut self) -> Vec<ContactPair>;
}
