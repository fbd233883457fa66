//! Gameplay simulation
//!
//! Everything that decides how a round plays out lives here. Randomness comes
//! from seeded PCG streams and time from the host, so a session replays
//! exactly given the same seed and frame timings.

pub mod collision;
pub mod field;
pub mod meter;
pub mod obstacle;
pub mod ragdoll;
pub mod round;
pub mod state;
pub mod tick;

pub use collision::{BoostApplied, CollisionResolver};
pub use field::ObstacleField;
pub use obstacle::{Obstacle, ObstacleKind};
pub use ragdoll::Ragdoll;
pub use round::{RoundMachine, match_sweet_spot};
pub use state::{GameEvent, RoundState};
pub use tick::{Session, TickInput, round_seed};
