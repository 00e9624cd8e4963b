//! Game state and core simulation types
//!
//! `GameState` is the single coordinator for a run: it owns the wave, the
//! score, every entity and the timers that pace the invaders. Lifecycle
//! changes are published as `GameEvent`s for the UI and audio to consume.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::tuning::GameSettings;
use crate::{signed_angle, yaw};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start menu: the player can drive around but not shoot
    Attract,
    /// Invaders are marching
    Wave,
    /// Last invader is down; short grace period before the wave counts as cleared
    Clearing,
    /// Wave cleared, waiting for the next one
    Intermission,
    /// Run ended, everything frozen in place
    GameOver,
}

/// Lifecycle notifications published by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    WaveStarted(u32),
    ScoreChanged(u32),
    WaveCleared,
    GameOver,
    /// Player pulled the trigger (`rounds` bullets left the barrel)
    PlayerFired { rounds: u32 },
    InvaderFired,
    InvaderDestroyed { id: u32 },
    PlayerDestroyed,
    DifficultyIncreased,
}

/// Reload progress, counted in indicator refresh steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Reload {
    steps: u32,
    step_timer: f32,
}

/// The player's magazine with per-round indicator scales (0 = spent, 1 = ready)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Magazine {
    rounds: usize,
    reload_time: f32,
    indicators: Vec<f32>,
    reload: Option<Reload>,
}

impl Magazine {
    pub fn new(capacity: usize, reload_time: f32) -> Self {
        Self {
            rounds: capacity,
            reload_time,
            indicators: vec![1.0; capacity],
            reload: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.indicators.len()
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn is_reloading(&self) -> bool {
        self.reload.is_some()
    }

    /// Indicator scale per magazine slot
    pub fn indicators(&self) -> &[f32] {
        &self.indicators
    }

    /// Fire a single round. Returns false when empty.
    pub fn take_one(&mut self) -> bool {
        if self.rounds == 0 {
            return false;
        }
        self.rounds -= 1;
        self.indicators[self.rounds] = 0.0;
        if self.rounds == 0 {
            self.start_reload();
        }
        true
    }

    /// Dump every remaining round. Returns how many were fired.
    pub fn take_all(&mut self) -> usize {
        let fired = self.rounds;
        if fired == 0 {
            return 0;
        }
        for slot in &mut self.indicators[..fired] {
            *slot = 0.0;
        }
        self.rounds = 0;
        self.start_reload();
        fired
    }

    fn start_reload(&mut self) {
        if self.reload.is_none() {
            self.reload = Some(Reload {
                steps: 0,
                step_timer: 0.0,
            });
        }
    }

    /// Advance the reload; indicators refresh every `RELOAD_STEP` seconds
    pub fn tick(&mut self, dt: f32) {
        let Some(mut reload) = self.reload else {
            return;
        };

        reload.step_timer += dt;
        while reload.step_timer >= RELOAD_STEP {
            reload.step_timer -= RELOAD_STEP;
            reload.steps += 1;

            let elapsed = reload.steps as f32 * RELOAD_STEP;
            // Tolerance absorbs float drift from summing steps
            if elapsed >= self.reload_time - 1e-4 {
                self.indicators.fill(1.0);
                self.rounds = self.capacity();
                self.reload = None;
                return;
            }
            self.indicators.fill(elapsed / self.reload_time);
        }
        self.reload = Some(reload);
    }
}

/// Player liveness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayerState {
    Alive,
    /// Wrecked ship: drifts, spins and its light flickers until the game resets
    Dead {
        light_on: bool,
        flicker_timer: f32,
        vel: Vec2,
        spin: f32,
        angle: f32,
    },
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub state: PlayerState,
    pub magazine: Magazine,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: PLAYER_START,
            state: PlayerState::Alive,
            magazine: Magazine::new(MAGAZINE_CAPACITY, RELOAD_TIME),
        }
    }
}

impl Player {
    pub fn is_alive(&self) -> bool {
        matches!(self.state, PlayerState::Alive)
    }

    /// Muzzle position
    pub fn shooting_point(&self) -> Vec2 {
        self.pos + Vec2::Y * SHOOTING_POINT_OFFSET
    }

    /// Slide sideways, clamped to the play-field
    pub fn move_lateral(&mut self, axis: f32, dt: f32) {
        let axis = axis.clamp(-1.0, 1.0);
        self.pos.x = (self.pos.x + axis * PLAYER_SPEED * dt).clamp(-PLAYER_X_MAX, PLAYER_X_MAX);
    }
}

/// Invader liveness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InvaderState {
    /// Marching and shooting
    Active,
    /// Stopped by game over; still on display and still solid
    Frozen,
    /// Shot down; lingers as debris for `DEBRIS_LIFETIME`
    Destroyed { timer: f32 },
}

/// An invader entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invader {
    pub id: u32,
    pub start: Vec2,
    /// Own movement clock, advanced at the wave's invader speed
    pub clock: f32,
    pub pos: Vec2,
    pub state: InvaderState,
}

impl Invader {
    pub fn new(id: u32, start: Vec2) -> Self {
        Self {
            id,
            start,
            clock: 0.0,
            pos: start,
            state: InvaderState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == InvaderState::Active
    }

    /// Solid bodies absorb bullets (active or frozen)
    pub fn is_solid(&self) -> bool {
        !matches!(self.state, InvaderState::Destroyed { .. })
    }
}

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Invader,
}

/// A bullet entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub owner: BulletOwner,
    pub pos: Vec2,
    /// Position at the start of the current tick (for swept collision)
    pub prev_pos: Vec2,
    pub vel: Vec2,
    /// Seconds until the bullet expires
    pub ttl: f32,
}

impl Bullet {
    pub fn new(id: u32, owner: BulletOwner, pos: Vec2, heading: Vec2) -> Self {
        Self {
            id,
            owner,
            pos,
            prev_pos: pos,
            vel: heading.normalize_or_zero() * BULLET_SPEED,
            ttl: BULLET_MAX_TRAVEL / BULLET_SPEED,
        }
    }
}

/// A debris particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds remaining
    pub life: f32,
    pub size: f32,
    pub angle: f32,
    pub spin: f32,
}

/// Maximum particles
pub const MAX_PARTICLES: usize = 256;
/// Debris pieces per destroyed invader
const DEBRIS_PIECES: usize = 6;

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    /// Live settings, ramped each wave
    pub settings: GameSettings,
    /// Settings as authored; restored on every new game
    original_settings: GameSettings,
    pub phase: GamePhase,
    /// Current wave number (1-based once a game starts)
    pub wave: u32,
    pub score: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: Player,
    /// Invaders (sorted by id for determinism)
    pub invaders: Vec<Invader>,
    /// Bullets (sorted by id for determinism)
    pub bullets: Vec<Bullet>,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    /// Seconds until the next invader shot (None = invaders hold fire)
    pub fire_timer: Option<f32>,
    /// Seconds until the wave is declared cleared
    pub clear_timer: Option<f32>,
    #[serde(skip)]
    events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a new game state in the start menu
    pub fn new(seed: u64, settings: GameSettings) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            settings,
            original_settings: settings,
            phase: GamePhase::Attract,
            wave: 0,
            score: 0,
            time_ticks: 0,
            player: Player::default(),
            invaders: Vec::new(),
            bullets: Vec::new(),
            particles: Vec::new(),
            fire_timer: None,
            clear_timer: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Seeded RNG shared by all gameplay randomness
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Settings the current run started from
    pub fn original_settings(&self) -> &GameSettings {
        &self.original_settings
    }

    pub fn player_can_shoot(&self) -> bool {
        matches!(self.phase, GamePhase::Wave | GamePhase::Clearing)
    }

    pub fn player_can_move(&self) -> bool {
        self.phase != GamePhase::GameOver
    }

    pub fn active_invaders(&self) -> usize {
        self.invaders.iter().filter(|i| i.is_active()).count()
    }

    /// Take all events published since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        log::debug!("event: {:?}", event);
        self.events.push(event);
    }

    /// Begin a fresh run from the authored settings
    pub fn start_game(&mut self) {
        self.settings = self.original_settings;

        self.invaders.clear();
        self.bullets.clear();
        if !self.player.is_alive() {
            self.respawn_player();
        }

        self.score = 0;
        self.emit(GameEvent::ScoreChanged(0));
        self.wave = 1;
        self.emit(GameEvent::WaveStarted(self.wave));

        log::info!("Game started (seed {})", self.seed);
        self.start_wave();
    }

    /// Ramp difficulty and spawn the next wave
    pub fn next_wave(&mut self) {
        self.settings.increase_difficulty();
        self.start_wave();

        self.wave += 1;
        self.emit(GameEvent::WaveStarted(self.wave));
    }

    /// Back to the start menu: clear the field and bring in a fresh ship
    pub fn reset_game(&mut self) {
        self.invaders.clear();
        self.bullets.clear();
        self.fire_timer = None;
        self.clear_timer = None;
        self.respawn_player();
        self.phase = GamePhase::Attract;
        log::info!("Game reset");
    }

    /// Debug shortcut: ramp difficulty in place and bump the wave counter
    pub fn increase_difficulty_cheat(&mut self) {
        self.settings.increase_difficulty();
        self.wave += 1;
        log::info!("Difficulty increased to wave {}", self.wave);
        self.emit(GameEvent::DifficultyIncreased);
        self.emit(GameEvent::WaveStarted(self.wave));
    }

    fn respawn_player(&mut self) {
        self.player = Player::default();
    }

    /// Spawn the invader grid and arm the invader fire timer
    fn start_wave(&mut self) {
        let width = self.settings.wave_width;
        let height = self.settings.wave_height;

        // Debris from the previous wave keeps animating
        self.invaders.retain(|i| !i.is_solid());
        self.invaders.reserve(self.settings.wave_size());

        for j in 0..height {
            for i in 0..width {
                let local = Vec2::new(i as f32 - 0.5 * width as f32 + 0.5, j as f32);
                let id = self.next_entity_id();
                self.invaders.push(Invader::new(id, WAVE_START + local));
            }
        }

        self.clear_timer = None;
        self.fire_timer = Some(self.roll_fire_delay());
        self.phase = GamePhase::Wave;

        log::info!(
            "Wave spawned: {}x{} invaders, speed {:.2}, exponent {:.2}",
            width,
            height,
            self.settings.invader_speed,
            self.settings.effective_exponent()
        );
    }

    /// Random delay before the next invader shot
    pub(crate) fn roll_fire_delay(&mut self) -> f32 {
        let range = self.settings.wave_fire_delay_range;
        if !range.is_finite() {
            log::warn!("Fire delay range {:?} is not finite", range);
            return MIN_FIRE_DELAY;
        }
        let (lo, hi) = if range.x <= range.y {
            (range.x, range.y)
        } else {
            (range.y, range.x)
        };
        self.rng.random_range(lo..=hi).max(MIN_FIRE_DELAY)
    }

    /// A random active invader shoots back at the player
    pub(crate) fn invader_shoot(&mut self) {
        let shooters: Vec<usize> = self
            .invaders
            .iter()
            .enumerate()
            .filter(|(_, inv)| inv.is_active())
            .map(|(idx, _)| idx)
            .collect();
        if shooters.is_empty() {
            return;
        }

        let pick = shooters[self.rng.random_range(0..shooters.len())];
        let origin = self.invaders[pick].pos;
        let id = self.next_entity_id();
        self.bullets
            .push(Bullet::new(id, BulletOwner::Invader, origin, Vec2::NEG_Y));
        self.emit(GameEvent::InvaderFired);
    }

    /// Single aimed shot with slight dispersion
    pub(crate) fn player_fire(&mut self) {
        if !self.player.magazine.take_one() {
            return;
        }
        let angle = self.rng.random_range(-FIRE_DISPERSION..=FIRE_DISPERSION);
        let heading = yaw(Vec2::Y, angle);
        let origin = self.player.shooting_point();
        let id = self.next_entity_id();
        self.bullets
            .push(Bullet::new(id, BulletOwner::Player, origin, heading));
        self.emit(GameEvent::PlayerFired { rounds: 1 });
    }

    /// Empty the magazine in a fan
    pub(crate) fn player_shotgun(&mut self) {
        let rounds = self.player.magazine.take_all();
        if rounds == 0 {
            return;
        }

        let dispersion = SHOTGUN_DISPERSION / self.player.magazine.capacity() as f32;
        let muzzle = self.player.shooting_point();
        for i in 0..rounds {
            let jitter = self.rng.random_range(-dispersion..=dispersion);
            // Each pellet fans out one dispersion step further than the last
            let angle = jitter.signum() * (jitter.abs() + i as f32 * dispersion);
            let heading = yaw(Vec2::Y, angle);
            let origin = muzzle + heading * (i as f32 * SHOTGUN_PELLET_SPACING);
            let id = self.next_entity_id();
            self.bullets
                .push(Bullet::new(id, BulletOwner::Player, origin, heading));
        }
        self.emit(GameEvent::PlayerFired {
            rounds: rounds as u32,
        });
    }

    /// Shoot down an invader. No-op unless it is still active.
    pub(crate) fn destroy_invader(&mut self, index: usize, relative_velocity: Vec2) {
        let Some(invader) = self.invaders.get_mut(index) else {
            return;
        };
        if !invader.is_active() {
            return;
        }
        invader.state = InvaderState::Destroyed { timer: 0.0 };
        let (id, pos) = (invader.id, invader.pos);

        self.spawn_debris(pos, relative_velocity);
        self.emit(GameEvent::InvaderDestroyed { id });

        self.score += 1;
        self.emit(GameEvent::ScoreChanged(self.score));

        if self.active_invaders() == 0 {
            // Hold off in case the last invader took the player down with it
            self.fire_timer = None;
            self.clear_timer = Some(WAVE_CLEAR_DELAY);
            self.phase = GamePhase::Clearing;
            log::info!("Wave {} down, score {}", self.wave, self.score);
        }
    }

    /// Break an invader into tumbling pieces pushed along the impact
    fn spawn_debris(&mut self, at: Vec2, relative_velocity: Vec2) {
        let base = signed_angle(Vec2::Y, relative_velocity);
        for _ in 0..DEBRIS_PIECES {
            if self.particles.len() >= MAX_PARTICLES {
                break;
            }
            // Exaggerate the impact angle, then scatter it
            let angle = base * (10.0 + self.rng.random_range(-10.0..10.0));
            let push: f32 = self.rng.random_range(1.0..20.0) * 0.04;
            let vel = yaw(relative_velocity, angle) * push;
            let spin: f32 = self.rng.random_range(-10.0..10.0);
            let size: f32 = self.rng.random_range(0.08..0.2);
            self.particles.push(Particle {
                pos: at,
                vel,
                life: DEBRIS_LIFETIME,
                size,
                angle: 0.0,
                spin,
            });
        }
    }

    /// Wreck the player's ship
    pub(crate) fn destroy_player(&mut self) {
        if !self.player.is_alive() {
            return;
        }
        let vel = Vec2::new(
            self.rng.random_range(-10.0..10.0),
            self.rng.random_range(-10.0..10.0),
        ) * 0.1;
        let spin: f32 = self.rng.random_range(-10.0..10.0);
        let flicker_timer = self.roll_flicker_delay();
        self.player.state = PlayerState::Dead {
            light_on: true,
            flicker_timer,
            vel,
            spin,
            angle: 0.0,
        };
        self.emit(GameEvent::PlayerDestroyed);
        self.game_over();
    }

    /// Random wait between light flickers, biased short
    pub(crate) fn roll_flicker_delay(&mut self) -> f32 {
        let r: f32 = self.rng.random();
        r * r * 0.5
    }

    /// Freeze the field and end the run. Fires once per game.
    pub(crate) fn game_over(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        for invader in &mut self.invaders {
            if invader.is_active() {
                invader.state = InvaderState::Frozen;
            }
        }
        self.fire_timer = None;
        self.clear_timer = None;
        self.phase = GamePhase::GameOver;

        log::info!("Game over at wave {} with score {}", self.wave, self.score);
        self.emit(GameEvent::GameOver);
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.invaders.sort_by_key(|i| i.id);
        self.bullets.sort_by_key(|b| b.id);
    }
}
