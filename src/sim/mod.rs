//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod path;
pub mod state;
pub mod tick;

pub use collision::{SweepHit, circles_overlap, sweep_circle, sweep_pair};
pub use path::{InvaderPath, invader_offset};
pub use state::{
    Bullet, BulletOwner, GameEvent, GamePhase, GameState, Invader, InvaderState, Magazine,
    Particle, Player, PlayerState, MAX_PARTICLES,
};
pub use tick::{TickInput, move_axis_from_keys, tick};
