//! Scene assembly: turns a `GameState` snapshot into world-space triangles

use glam::Vec2;

use super::shapes::{circle, polyline, quad, ship};
use super::vertex::{Palette, Vertex, mix};
use crate::consts::*;
use crate::settings::Settings;
use crate::sim::{BulletOwner, GamePhase, GameState, InvaderState, PlayerState};

/// Clock span and resolution of the path preview
const PREVIEW_LENGTH: f32 = 10.0;
const PREVIEW_STEPS: usize = 100;

/// Visible region of the play-field in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldView {
    pub center: Vec2,
    pub half_extent: Vec2,
}

impl Default for WorldView {
    fn default() -> Self {
        Self {
            center: Vec2::new(0.0, 8.5),
            half_extent: Vec2::new(PLAYER_X_MAX + 1.0, 11.0),
        }
    }
}

impl WorldView {
    /// Map world coordinates to NDC, letterboxed to keep the field's aspect
    pub fn to_ndc(&self, p: Vec2, viewport: (u32, u32)) -> Vec2 {
        let (w, h) = viewport;
        let screen_aspect = w.max(1) as f32 / h.max(1) as f32;
        let world_aspect = self.half_extent.x / self.half_extent.y;

        let local = (p - self.center) / self.half_extent;
        if screen_aspect > world_aspect {
            // Pillarbox
            Vec2::new(local.x * world_aspect / screen_aspect, local.y)
        } else {
            Vec2::new(local.x, local.y * screen_aspect / world_aspect)
        }
    }
}

/// Build the full frame in world space
pub fn build_scene(state: &GameState, settings: &Settings) -> Vec<Vertex> {
    let palette = Palette::for_settings(settings.high_contrast);
    let segments = settings.quality.circle_segments();
    let mut out = Vec::with_capacity(4096);

    draw_field(&mut out, palette);

    let in_wave = matches!(state.phase, GamePhase::Wave | GamePhase::Clearing);
    if settings.path_preview && in_wave {
        let points: Vec<Vec2> = state
            .settings
            .path()
            .sample(PREVIEW_LENGTH, PREVIEW_STEPS)
            .into_iter()
            .map(|p| p + WAVE_START)
            .collect();
        out.extend(polyline(&points, 0.05, palette.path));
    }

    for invader in &state.invaders {
        match invader.state {
            InvaderState::Active => draw_invader(&mut out, invader.pos, palette.invader, palette, segments),
            InvaderState::Frozen => {
                draw_invader(&mut out, invader.pos, palette.invader_frozen, palette, segments)
            }
            // Debris particles stand in for the body
            InvaderState::Destroyed { .. } => {}
        }
    }

    for particle in state.particles.iter().take(settings.max_debris()) {
        let angle = if settings.reduced_motion { 0.0 } else { particle.angle };
        let fade = (particle.life / DEBRIS_LIFETIME).clamp(0.0, 1.0);
        let color = mix(palette.background, palette.debris, fade);
        out.extend(quad(particle.pos, Vec2::splat(particle.size), angle, color));
    }

    for bullet in &state.bullets {
        let color = match bullet.owner {
            BulletOwner::Player => palette.player_bullet,
            BulletOwner::Invader => palette.invader_bullet,
        };
        out.extend(circle(bullet.pos, BULLET_RADIUS, color, segments / 2));
    }

    draw_player(&mut out, state, settings, palette, segments);

    out
}

fn draw_field(out: &mut Vec<Vertex>, palette: &Palette) {
    let top = WAVE_START.y + 6.0;
    let bottom = PLAYER_START.y - PLAYER_RADIUS * 2.0;
    let wall_x = PLAYER_X_MAX + PLAYER_RADIUS + 0.1;

    for x in [-wall_x, wall_x] {
        out.extend(polyline(
            &[Vec2::new(x, bottom), Vec2::new(x, top)],
            0.08,
            palette.wall,
        ));
    }
    // Invaders crossing this line end the run
    out.extend(polyline(
        &[Vec2::new(-wall_x, 0.0), Vec2::new(wall_x, 0.0)],
        0.04,
        palette.danger_line,
    ));
}

fn draw_invader(
    out: &mut Vec<Vertex>,
    pos: Vec2,
    body: [f32; 4],
    palette: &Palette,
    segments: u32,
) {
    out.extend(circle(pos, INVADER_RADIUS, body, segments));
    for side in [-1.0, 1.0] {
        let eye = pos + Vec2::new(side * INVADER_RADIUS * 0.4, -INVADER_RADIUS * 0.2);
        out.extend(circle(eye, INVADER_RADIUS * 0.15, palette.invader_eye, 6));
    }
}

fn draw_player(
    out: &mut Vec<Vertex>,
    state: &GameState,
    settings: &Settings,
    palette: &Palette,
    segments: u32,
) {
    let player = &state.player;
    match player.state {
        PlayerState::Alive => {
            out.extend(ship(player.pos, PLAYER_RADIUS, 0.0, palette.player));
            out.extend(circle(
                player.pos,
                PLAYER_RADIUS * 0.2,
                palette.player_light,
                segments / 2,
            ));
            draw_magazine(out, state, palette);
        }
        PlayerState::Dead {
            light_on, angle, ..
        } => {
            out.extend(ship(player.pos, PLAYER_RADIUS, angle, palette.wreck));
            let lit = light_on || !settings.effective_flicker();
            if lit {
                out.extend(circle(
                    player.pos,
                    PLAYER_RADIUS * 0.2,
                    palette.player_light,
                    segments / 2,
                ));
            }
        }
    }
}

/// Row of round indicators under the ship, each bar grows with its scale
fn draw_magazine(out: &mut Vec<Vertex>, state: &GameState, palette: &Palette) {
    let indicators = state.player.magazine.indicators();
    let spacing = 0.22;
    let origin = state.player.pos
        + Vec2::new(
            -spacing * (indicators.len() as f32 - 1.0) * 0.5,
            -PLAYER_RADIUS - 0.3,
        );

    for (i, scale) in indicators.iter().enumerate() {
        let center = origin + Vec2::X * (i as f32 * spacing);
        let color = if *scale >= 1.0 {
            palette.round_ready
        } else {
            palette.round_spent
        };
        let half = Vec2::new(0.07, 0.12 * scale.max(0.15));
        out.extend(quad(center, half, 0.0, color));
    }
}
