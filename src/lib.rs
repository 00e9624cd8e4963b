//! Invader Waves - a wave-based invaders shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement curve, collisions, game state)
//! - `tuning`: Data-driven difficulty settings, ramped each wave
//! - `ui`: Menu panel switcher driven by simulation events
//! - `renderer`: WebGPU rendering pipeline
//! - `audio`: Procedural sound effects (Web Audio on wasm32)
//! - `highscores`, `settings`: Leaderboard and player preferences, kept in
//!   LocalStorage via `storage`

pub mod audio;
pub mod highscores;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod storage;
pub mod tuning;
pub mod ui;

pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};
pub use tuning::{GameSettings, TuningError};

use glam::Vec2;

/// Game configuration constants
///
/// World space is the play-field seen from above: `x` is lateral, `y` is
/// depth. Invaders start far up the field and drift toward `y = 0`; the
/// player patrols just below that line.
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Player spawn point
    pub const PLAYER_START: Vec2 = Vec2::new(0.0, -1.0);
    /// Lateral clamp for the player
    pub const PLAYER_X_MAX: f32 = 10.0;
    /// Lateral speed (units/s at full stick)
    pub const PLAYER_SPEED: f32 = 9.0;
    pub const PLAYER_RADIUS: f32 = 0.5;
    /// Muzzle offset from the player center, along its heading
    pub const SHOOTING_POINT_OFFSET: f32 = 0.6;

    /// Magazine defaults
    pub const MAGAZINE_CAPACITY: usize = 5;
    pub const RELOAD_TIME: f32 = 1.0;
    /// Reload indicator refresh period
    pub const RELOAD_STEP: f32 = 0.1;

    /// Single-shot dispersion (degrees, +/-)
    pub const FIRE_DISPERSION: f32 = 1.0;
    /// Total shotgun dispersion (degrees), split across the magazine
    pub const SHOTGUN_DISPERSION: f32 = 10.0;
    /// Spacing between shotgun pellets along their heading
    pub const SHOTGUN_PELLET_SPACING: f32 = 0.2;

    /// Wave grid anchor: row 0 is centered on it, later rows stack further up
    pub const WAVE_START: Vec2 = Vec2::new(0.0, 14.0);
    pub const INVADER_RADIUS: f32 = 0.4;
    /// How long a destroyed invader stays around as debris (seconds)
    pub const DEBRIS_LIFETIME: f32 = 2.0;

    /// Bullets
    pub const BULLET_SPEED: f32 = 12.0;
    pub const BULLET_RADIUS: f32 = 0.12;
    /// Bullets expire after travelling this far
    pub const BULLET_MAX_TRAVEL: f32 = 30.0;

    /// Lower bound on the delay between invader shots (seconds)
    pub const MIN_FIRE_DELAY: f32 = 0.1;
    /// Grace period between the last kill and declaring the wave cleared
    pub const WAVE_CLEAR_DELAY: f32 = 2.0;
}

/// Rotate a heading around the vertical axis by `degrees`.
///
/// Positive angles turn "forward" (+y) toward +x.
#[inline]
pub fn yaw(dir: Vec2, degrees: f32) -> Vec2 {
    let (s, c) = degrees.to_radians().sin_cos();
    Vec2::new(dir.x * c + dir.y * s, -dir.x * s + dir.y * c)
}

/// Signed angle in degrees from `from` to `to`, positive when turning toward +x.
#[inline]
pub fn signed_angle(from: Vec2, to: Vec2) -> f32 {
    if from.length_squared() == 0.0 || to.length_squared() == 0.0 {
        return 0.0;
    }
    // perp_dot is positive counter-clockwise; yaw turns clockwise in the x/y plane
    let angle = from.perp_dot(to).atan2(from.dot(to));
    -angle.to_degrees()
}
