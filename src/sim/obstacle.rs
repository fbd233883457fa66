//! Lane obstacles
//!
//! Ground obstacles are light dynamic bodies that get knocked around; aerial
//! ones hang in place. Every obstacle carries a one-shot boost that is handed
//! to the body the first time it touches the obstacle.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::physics::{BodyDesc, BodyHandle, BodyLabel, Shape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    Bicycle,
    Person,
    Barrel,
    Ramp,
    Cloud,
    Bird,
}

/// Air friction of dynamic obstacles
const DYNAMIC_FRICTION_AIR: f32 = 0.02;
/// Light enough to fly when hit
const DYNAMIC_DENSITY: f32 = 0.0005;
const RAMP_TILT: f32 = -0.3;

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 6] = [
        ObstacleKind::Bicycle,
        ObstacleKind::Person,
        ObstacleKind::Barrel,
        ObstacleKind::Ramp,
        ObstacleKind::Cloud,
        ObstacleKind::Bird,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleKind::Bicycle => "bicycle",
            ObstacleKind::Person => "person",
            ObstacleKind::Barrel => "barrel",
            ObstacleKind::Ramp => "ramp",
            ObstacleKind::Cloud => "cloud",
            ObstacleKind::Bird => "bird",
        }
    }

    /// Floats in the air instead of standing on the ground
    pub fn is_aerial(&self) -> bool {
        matches!(self, ObstacleKind::Cloud | ObstacleKind::Bird)
    }

    pub fn shape(&self) -> Shape {
        match self {
            ObstacleKind::Bicycle => Shape::Rect {
                width: 60.0,
                height: 35.0,
            },
            ObstacleKind::Person => Shape::Rect {
                width: 40.0,
                height: 70.0,
            },
            ObstacleKind::Barrel => Shape::Circle { radius: 22.0 },
            ObstacleKind::Ramp => Shape::Rect {
                width: 80.0,
                height: 35.0,
            },
            ObstacleKind::Cloud => Shape::Rect {
                width: 90.0,
                height: 45.0,
            },
            ObstacleKind::Bird => Shape::Circle { radius: 18.0 },
        }
    }

    /// Force handed to the body on first contact
    pub fn boost(&self) -> Vec2 {
        match self {
            ObstacleKind::Bicycle => Vec2::new(0.008, -0.006),
            ObstacleKind::Person => Vec2::new(0.003, -0.008),
            ObstacleKind::Barrel => Vec2::new(-0.002, -0.004),
            ObstacleKind::Ramp => Vec2::new(0.006, -0.015),
            ObstacleKind::Cloud => Vec2::new(0.004, -0.018),
            ObstacleKind::Bird => Vec2::new(0.008, -0.005),
        }
    }

    pub fn restitution(&self) -> f32 {
        match self {
            ObstacleKind::Bicycle => 0.7,
            ObstacleKind::Person => 0.5,
            ObstacleKind::Barrel => 0.8,
            ObstacleKind::Ramp => 0.9,
            ObstacleKind::Cloud => 0.95,
            ObstacleKind::Bird => 0.6,
        }
    }

    /// Body description for an obstacle centered at `position`
    pub fn body_desc(&self, position: Vec2) -> BodyDesc {
        let desc = BodyDesc::new(BodyLabel::Obstacle(*self), position, self.shape())
            .with_restitution(self.restitution());

        match self {
            ObstacleKind::Cloud | ObstacleKind::Bird => desc.with_static(true),
            ObstacleKind::Ramp => desc
                .with_angle(RAMP_TILT)
                .with_friction_air(DYNAMIC_FRICTION_AIR)
                .with_density(DYNAMIC_DENSITY),
            _ => desc
                .with_friction_air(DYNAMIC_FRICTION_AIR)
                .with_density(DYNAMIC_DENSITY),
        }
    }
}

/// An obstacle placed in the lane
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub handle: BodyHandle,
    pub kind: ObstacleKind,
    /// Where it was spawned; the body may have moved since
    pub spawn: Vec2,
    pub boost: Option<Vec2>,
    /// Boost already handed out
    pub triggered: bool,
}

impl Obstacle {
    pub fn new(handle: BodyHandle, kind: ObstacleKind, spawn: Vec2) -> Self {
        Self {
            handle,
            kind,
            spawn,
            boost: Some(kind.boost()),
            triggered: false,
        }
    }
}
