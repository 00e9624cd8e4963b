//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use super::collision::{sweep_circle, sweep_pair};
use super::state::{BulletOwner, GameEvent, GamePhase, GameState, InvaderState, PlayerState};
use crate::consts::*;

/// Ticks between autopilot trigger pulls
const AUTOPILOT_FIRE_INTERVAL: u64 = 12;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Lateral stick, -1 (left) to 1 (right)
    pub move_axis: f32,
    /// Single shot (edge-triggered by the host)
    pub fire: bool,
    /// Empty the magazine in a spread (edge-triggered by the host)
    pub shotgun: bool,
    /// Debug: ramp difficulty without spawning a wave
    pub increase_difficulty: bool,
    /// Demo mode - the ship flies itself
    pub autopilot: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.increase_difficulty {
        state.increase_difficulty_cheat();
    }

    let mut input = input.clone();
    if input.autopilot {
        autopilot(state, &mut input);
    }
    let input = &input;

    state.time_ticks += 1;

    update_player(state, input, dt);
    state.player.magazine.tick(dt);
    update_invaders(state, dt);
    update_invader_fire(state, dt);
    update_bullets(state, dt);
    update_clear_timer(state, dt);
    update_particles(state, dt);
    update_wreck(state, dt);

    // Ensure deterministic ordering
    state.normalize_order();
}

fn update_player(state: &mut GameState, input: &TickInput, dt: f32) {
    if !state.player.is_alive() {
        return;
    }

    if state.player_can_shoot() {
        if input.fire {
            state.player_fire();
        }
        if input.shotgun {
            state.player_shotgun();
        }
    }

    if state.player_can_move() {
        state.player.move_lateral(input.move_axis, dt);
    }
}

fn update_invaders(state: &mut GameState, dt: f32) {
    // Settings are read live, so a mid-wave difficulty bump reshapes the march
    let path = state.settings.path();
    let advance = dt * state.settings.invader_speed;
    let mut reached_bottom = false;

    for invader in &mut state.invaders {
        match &mut invader.state {
            InvaderState::Active => {
                invader.clock += advance;
                invader.pos = invader.start + path.offset_at(invader.clock);

                if invader.pos.y <= 0.0 {
                    reached_bottom = true;
                }
            }
            InvaderState::Destroyed { timer } => *timer += dt,
            InvaderState::Frozen => {}
        }
    }

    state.invaders.retain(|invader| match invader.state {
        InvaderState::Destroyed { timer } => timer < DEBRIS_LIFETIME,
        _ => true,
    });

    if reached_bottom {
        state.game_over();
    }
}

fn update_invader_fire(state: &mut GameState, dt: f32) {
    let Some(remaining) = state.fire_timer else {
        return;
    };

    let remaining = remaining - dt;
    if remaining > 0.0 {
        state.fire_timer = Some(remaining);
        return;
    }

    state.invader_shoot();
    state.fire_timer = Some(state.roll_fire_delay());
}

fn update_bullets(state: &mut GameState, dt: f32) {
    for bullet in &mut state.bullets {
        bullet.prev_pos = bullet.pos;
        bullet.pos += bullet.vel * dt;
        bullet.ttl -= dt;
    }

    let count = state.bullets.len();
    let mut spent = vec![false; count];
    // Invaders shot down this tick still stop any other bullet reaching them
    let mut struck = vec![false; state.invaders.len()];

    // Opposing bullets knock each other out
    for i in 0..count {
        if state.bullets[i].owner != BulletOwner::Player {
            continue;
        }
        for j in 0..count {
            if spent[i] {
                break;
            }
            if spent[j] || state.bullets[j].owner != BulletOwner::Invader {
                continue;
            }
            let (a, b) = (&state.bullets[i], &state.bullets[j]);
            if sweep_pair(
                a.prev_pos,
                a.pos,
                BULLET_RADIUS,
                b.prev_pos,
                b.pos,
                BULLET_RADIUS,
            ) {
                spent[i] = true;
                spent[j] = true;
            }
        }
    }

    for i in 0..count {
        if spent[i] {
            continue;
        }
        let (owner, from, to, vel) = {
            let b = &state.bullets[i];
            (b.owner, b.prev_pos, b.pos, b.vel)
        };

        match owner {
            BulletOwner::Player => {
                // First solid body along the sweep takes the hit
                let hit = state
                    .invaders
                    .iter()
                    .enumerate()
                    .filter(|(idx, invader)| invader.is_solid() || struck[*idx])
                    .filter_map(|(idx, invader)| {
                        sweep_circle(from, to, BULLET_RADIUS, invader.pos, INVADER_RADIUS)
                            .map(|h| (idx, h.t))
                    })
                    .min_by(|a, b| a.1.total_cmp(&b.1));

                if let Some((idx, _)) = hit {
                    spent[i] = true;
                    // Frozen invaders just soak the bullet up
                    if state.invaders[idx].is_active() {
                        struck[idx] = true;
                    }
                    state.destroy_invader(idx, vel);
                }
            }
            BulletOwner::Invader => {
                if state.player.is_alive()
                    && sweep_circle(from, to, BULLET_RADIUS, state.player.pos, PLAYER_RADIUS)
                        .is_some()
                {
                    spent[i] = true;
                    state.destroy_player();
                }
            }
        }
    }

    let mut idx = 0;
    state.bullets.retain(|bullet| {
        let keep = !spent[idx] && bullet.ttl > 0.0;
        idx += 1;
        keep
    });
}

fn update_clear_timer(state: &mut GameState, dt: f32) {
    let Some(remaining) = state.clear_timer else {
        return;
    };

    let remaining = remaining - dt;
    if remaining > 0.0 {
        state.clear_timer = Some(remaining);
        return;
    }

    state.clear_timer = None;
    if state.player.is_alive() {
        state.phase = GamePhase::Intermission;
        log::info!("Wave {} cleared", state.wave);
        state.emit(GameEvent::WaveCleared);
    }
}

fn update_particles(state: &mut GameState, dt: f32) {
    for particle in state.particles.iter_mut() {
        particle.pos += particle.vel * dt;
        particle.vel *= 0.98;
        particle.angle += particle.spin * dt;
        particle.life -= dt;
    }
    state.particles.retain(|p| p.life > 0.0);
}

/// Wrecked ship drifts to a stop while its light flickers
fn update_wreck(state: &mut GameState, dt: f32) {
    let damping = (1.0 - 2.0 * dt).max(0.0);

    let flicker_due = match &mut state.player.state {
        PlayerState::Dead {
            light_on,
            flicker_timer,
            vel,
            spin,
            angle,
        } => {
            state.player.pos += *vel * dt;
            *vel *= damping;
            *angle += *spin * dt;
            *spin *= damping;

            *flicker_timer -= dt;
            if *flicker_timer <= 0.0 {
                *light_on = !*light_on;
                true
            } else {
                false
            }
        }
        PlayerState::Alive => false,
    };

    if flicker_due {
        let delay = state.roll_flicker_delay();
        if let PlayerState::Dead { flicker_timer, .. } = &mut state.player.state {
            *flicker_timer = delay;
        }
    }
}

/// Demo pilot: dodge incoming fire, otherwise line up under the lowest invader
fn autopilot(state: &GameState, input: &mut TickInput) {
    if !state.player.is_alive() {
        return;
    }
    let me = state.player.pos;

    let threat = state
        .bullets
        .iter()
        .filter(|b| b.owner == BulletOwner::Invader)
        .filter(|b| {
            let ahead = b.pos.y - me.y;
            ahead > 0.0 && ahead < 3.0 && (b.pos.x - me.x).abs() < PLAYER_RADIUS + 0.4
        })
        .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

    if let Some(bullet) = threat {
        // Sidestep away from the bullet, or inward when pinned against a wall
        let mut dir = if bullet.pos.x > me.x { -1.0 } else { 1.0 };
        if (me.x + dir * PLAYER_RADIUS).abs() >= PLAYER_X_MAX {
            dir = -dir;
        }
        input.move_axis = dir;
        return;
    }

    let target = state
        .invaders
        .iter()
        .filter(|i| i.is_active())
        .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

    let Some(target) = target else {
        input.move_axis = (-me.x).clamp(-1.0, 1.0);
        return;
    };

    let dx = target.pos.x - me.x;
    input.move_axis = (dx * 2.0).clamp(-1.0, 1.0);

    let lined_up = dx.abs() < 0.5;
    input.fire = lined_up && state.time_ticks % AUTOPILOT_FIRE_INTERVAL == 0;
    // Close-range panic button
    input.shotgun = lined_up && target.pos.y - me.y < 4.0;
}

/// Convenience for hosts: direction the player is being pushed this tick
pub fn move_axis_from_keys(left: bool, right: bool) -> f32 {
    match (left, right) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    use crate::sim::state::{Bullet, Invader};
    use crate::tuning::GameSettings;

    /// One still invader straight above the player that never shoots
    fn sitting_duck() -> GameSettings {
        GameSettings {
            invader_amplitude: 0.0,
            wave_width: 1,
            wave_height: 1,
            wave_fire_delay_range: Vec2::new(1000.0, 1000.0),
            ..Default::default()
        }
    }

    fn run(state: &mut GameState, input: &TickInput, ticks: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            tick(state, input, SIM_DT);
            events.extend(state.drain_events());
        }
        events
    }

    #[test]
    fn test_invaders_follow_path() {
        let mut state = GameState::new(1, GameSettings::default());
        state.start_game();
        let start = state.invaders[0].start;

        tick(&mut state, &TickInput::default(), SIM_DT);

        let clock = SIM_DT * state.settings.invader_speed;
        let expected = start + state.settings.path().offset_at(clock);
        assert!((state.invaders[0].pos - expected).length() < 1e-5);
        assert!((state.invaders[0].clock - clock).abs() < 1e-7);
    }

    #[test]
    fn test_player_moves_and_clamps() {
        let mut state = GameState::new(1, GameSettings::default());
        let input = TickInput {
            move_axis: 1.0,
            ..Default::default()
        };
        run(&mut state, &input, 600);
        assert_eq!(state.player.pos.x, PLAYER_X_MAX);

        let input = TickInput {
            move_axis: -5.0,
            ..Default::default()
        };
        run(&mut state, &input, 600);
        assert_eq!(state.player.pos.x, -PLAYER_X_MAX);
    }

    #[test]
    fn test_no_shooting_in_menus() {
        let mut state = GameState::new(1, GameSettings::default());
        let input = TickInput {
            fire: true,
            shotgun: true,
            ..Default::default()
        };
        run(&mut state, &input, 10);
        assert!(state.bullets.is_empty());
        assert_eq!(state.player.magazine.rounds(), MAGAZINE_CAPACITY);
    }

    #[test]
    fn test_shot_clears_wave_after_grace_period() {
        let mut state = GameState::new(2, sitting_duck());
        state.start_game();
        let _ = state.drain_events();

        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        let mut events = run(&mut state, &fire, 1);
        assert_eq!(state.player.magazine.rounds(), MAGAZINE_CAPACITY - 1);

        // Bullet needs ~1.3 s to cross the field
        events.extend(run(&mut state, &TickInput::default(), 240));
        assert_eq!(state.score, 1);
        assert_eq!(state.phase, GamePhase::Clearing);
        assert!(events.contains(&GameEvent::ScoreChanged(1)));
        assert!(!events.contains(&GameEvent::WaveCleared));

        let events = run(&mut state, &TickInput::default(), 250);
        assert_eq!(state.phase, GamePhase::Intermission);
        assert_eq!(events, vec![GameEvent::WaveCleared]);
        assert!(!state.player_can_shoot());
        assert!(state.player_can_move());
    }

    #[test]
    fn test_player_death_cancels_wave_clear() {
        let mut state = GameState::new(2, sitting_duck());
        state.start_game();
        state.destroy_invader(0, Vec2::Y);
        assert_eq!(state.phase, GamePhase::Clearing);
        let _ = state.drain_events();

        // A parting shot from the last invader, right on top of the ship
        let id = state.next_entity_id();
        let pos = state.player.pos + Vec2::Y * 0.5;
        state
            .bullets
            .push(Bullet::new(id, BulletOwner::Invader, pos, Vec2::NEG_Y));

        let events = run(&mut state, &TickInput::default(), 480);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(events.contains(&GameEvent::PlayerDestroyed));
        assert!(events.contains(&GameEvent::GameOver));
        assert!(!events.contains(&GameEvent::WaveCleared));
    }

    #[test]
    fn test_reaching_bottom_ends_game_and_freezes() {
        let settings = GameSettings {
            invader_speed: 50.0,
            wave_fire_delay_range: Vec2::new(1000.0, 1000.0),
            ..Default::default()
        };
        let mut state = GameState::new(3, settings);
        state.start_game();
        let _ = state.drain_events();

        let events = run(&mut state, &TickInput::default(), 120);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(
            events.iter().filter(|e| **e == GameEvent::GameOver).count(),
            1
        );

        let frozen: Vec<Vec2> = state.invaders.iter().map(|i| i.pos).collect();
        run(&mut state, &TickInput::default(), 60);
        let after: Vec<Vec2> = state.invaders.iter().map(|i| i.pos).collect();
        assert_eq!(frozen, after);
        assert!(state.invaders.iter().all(|i| i.state == InvaderState::Frozen));
    }

    #[test]
    fn test_frozen_invader_absorbs_bullet() {
        let mut state = GameState::new(4, sitting_duck());
        state.start_game();
        state.game_over();
        let target = state.invaders[0].pos;

        let id = state.next_entity_id();
        state.bullets.push(Bullet::new(
            id,
            BulletOwner::Player,
            target - Vec2::Y * 0.5,
            Vec2::Y,
        ));
        run(&mut state, &TickInput::default(), 10);

        assert!(state.bullets.is_empty());
        assert_eq!(state.score, 0);
        assert_eq!(state.invaders[0].state, InvaderState::Frozen);
    }

    #[test]
    fn test_double_hit_spends_both_bullets() {
        let mut state = GameState::new(4, sitting_duck());
        state.start_game();
        let target = state.invaders[0].pos;
        // A second invader directly behind the first
        state.invaders.push(Invader::new(999, target + Vec2::Y));
        let _ = state.drain_events();

        for offset in [0.5, 0.6] {
            let id = state.next_entity_id();
            state.bullets.push(Bullet::new(
                id,
                BulletOwner::Player,
                target - Vec2::Y * offset,
                Vec2::Y,
            ));
        }
        let events = run(&mut state, &TickInput::default(), 30);

        assert!(state.bullets.is_empty());
        assert_eq!(state.score, 1);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::InvaderDestroyed { .. }))
                .count(),
            1
        );
        assert!(state.invaders.iter().any(|i| i.id == 999 && i.is_active()));
    }

    #[test]
    fn test_invader_fire_timer_shoots_and_rearms() {
        let settings = GameSettings {
            invader_amplitude: 0.0,
            wave_fire_delay_range: Vec2::new(0.2, 0.3),
            ..Default::default()
        };
        let mut state = GameState::new(11, settings);
        state.start_game();
        let _ = state.drain_events();
        state.fire_timer = Some(SIM_DT / 2.0);

        let events = run(&mut state, &TickInput::default(), 1);

        assert_eq!(events, vec![GameEvent::InvaderFired]);
        assert_eq!(state.bullets.len(), 1);
        assert_eq!(state.bullets[0].owner, BulletOwner::Invader);
        assert!(state.bullets[0].vel.y < 0.0);
        let rearmed = state.fire_timer.expect("fire timer re-armed");
        assert!((0.2..=0.3).contains(&rearmed));

        // Shots keep coming while the wave lasts
        let events = run(&mut state, &TickInput::default(), 120);
        assert!(events.iter().filter(|e| **e == GameEvent::InvaderFired).count() >= 3);
    }

    #[test]
    fn test_bullets_cancel_each_other() {
        let mut state = GameState::new(5, GameSettings::default());
        let id = state.next_entity_id();
        state.bullets.push(Bullet::new(
            id,
            BulletOwner::Player,
            Vec2::new(0.0, 5.0),
            Vec2::Y,
        ));
        let id = state.next_entity_id();
        state.bullets.push(Bullet::new(
            id,
            BulletOwner::Invader,
            Vec2::new(0.0, 6.0),
            Vec2::NEG_Y,
        ));

        run(&mut state, &TickInput::default(), 10);
        assert!(state.bullets.is_empty());
        assert!(state.player.is_alive());
    }

    #[test]
    fn test_bullets_expire_after_max_travel() {
        let mut state = GameState::new(6, GameSettings::default());
        let id = state.next_entity_id();
        state.bullets.push(Bullet::new(
            id,
            BulletOwner::Player,
            Vec2::new(5.0, 0.0),
            Vec2::Y,
        ));

        let lifetime_ticks = (BULLET_MAX_TRAVEL / BULLET_SPEED / SIM_DT) as usize;
        run(&mut state, &TickInput::default(), lifetime_ticks - 2);
        assert_eq!(state.bullets.len(), 1);
        run(&mut state, &TickInput::default(), 4);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_debris_lingers_then_disappears() {
        let mut state = GameState::new(7, sitting_duck());
        state.start_game();
        state.invaders.push(Invader::new(999, Vec2::new(5.0, 10.0)));
        state.destroy_invader(0, Vec2::Y);
        assert!(!state.particles.is_empty());

        run(&mut state, &TickInput::default(), 120);
        assert_eq!(state.invaders.len(), 2);

        run(&mut state, &TickInput::default(), 130);
        assert_eq!(state.invaders.len(), 1);
        assert!(state.particles.is_empty());
    }

    #[test]
    fn test_wreck_flickers() {
        let mut state = GameState::new(8, sitting_duck());
        state.start_game();
        state.destroy_player();

        let mut toggles = 0;
        let mut last = true;
        for _ in 0..600 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            if let PlayerState::Dead { light_on, .. } = state.player.state {
                if light_on != last {
                    toggles += 1;
                    last = light_on;
                }
            }
        }
        // Mean wait is under 0.2 s, so five seconds yields plenty of flicker
        assert!(toggles > 5);
    }

    #[test]
    fn test_cheat_input_ramps_difficulty() {
        let mut state = GameState::new(9, GameSettings::default());
        state.start_game();
        let speed = state.settings.invader_speed;

        let input = TickInput {
            increase_difficulty: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.wave, 2);
        assert!(state.settings.invader_speed > speed);
    }

    #[test]
    fn test_autopilot_scores() {
        let mut state = GameState::new(10, GameSettings::default());
        state.start_game();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        run(&mut state, &input, 10 * 120);
        assert!(state.score > 0);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = GameState::new(99999, GameSettings::default());
        let mut state2 = GameState::new(99999, GameSettings::default());
        state1.start_game();
        state2.start_game();

        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..2400 {
            tick(&mut state1, &input, SIM_DT);
            tick(&mut state2, &input, SIM_DT);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.phase, state2.phase);
        assert_eq!(state1.bullets.len(), state2.bullets.len());
        assert_eq!(state1.player.pos, state2.player.pos);
    }

    #[test]
    fn test_move_axis_from_keys() {
        assert_eq!(move_axis_from_keys(true, false), -1.0);
        assert_eq!(move_axis_from_keys(false, true), 1.0);
        assert_eq!(move_axis_from_keys(true, true), 0.0);
    }
}
