//! Procedural sound effects
//!
//! Every effect is a short stack of oscillator tones, no sample files. The
//! tone tables are plain data so they can be checked anywhere; playback goes
//! through the Web Audio API on wasm32.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Single player shot
    PlayerShot,
    /// Whole magazine at once
    Shotgun,
    InvaderShot,
    InvaderDestroyed,
    PlayerDestroyed,
    WaveStart,
    WaveClear,
    GameOver,
    /// New high score
    HighScore,
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One oscillator voice with an exponential decay envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f32,
    /// Frequency glided to by the end of the tone (None = steady)
    pub glide_to: Option<f32>,
    pub waveform: Waveform,
    /// Peak gain before master/sfx volume
    pub gain: f32,
    /// Start offset, seconds
    pub delay: f64,
    /// Seconds until the envelope has decayed
    pub duration: f64,
}

const fn tone(freq: f32, waveform: Waveform, gain: f32, delay: f64, duration: f64) -> Tone {
    Tone {
        freq,
        glide_to: None,
        waveform,
        gain,
        delay,
        duration,
    }
}

const fn glide(freq: f32, to: f32, waveform: Waveform, gain: f32, duration: f64) -> Tone {
    Tone {
        freq,
        glide_to: Some(to),
        waveform,
        gain,
        delay: 0.0,
        duration,
    }
}

use Waveform::*;

const PLAYER_SHOT: &[Tone] = &[glide(900.0, 300.0, Square, 0.15, 0.08)];
const SHOTGUN: &[Tone] = &[
    glide(120.0, 40.0, Sawtooth, 0.45, 0.25),
    glide(1500.0, 200.0, Square, 0.15, 0.1),
];
const INVADER_SHOT: &[Tone] = &[glide(300.0, 600.0, Triangle, 0.15, 0.12)];
const INVADER_DESTROYED: &[Tone] = &[
    glide(100.0, 30.0, Sawtooth, 0.4, 0.3),
    tone(1500.0, Square, 0.15, 0.0, 0.08),
];
const PLAYER_DESTROYED: &[Tone] = &[
    glide(80.0, 20.0, Sawtooth, 0.5, 0.8),
    glide(300.0, 40.0, Square, 0.2, 0.6),
];
const WAVE_START: &[Tone] = &[
    tone(300.0, Triangle, 0.25, 0.0, 0.15),
    tone(450.0, Triangle, 0.25, 0.12, 0.2),
];
const WAVE_CLEAR: &[Tone] = &[
    tone(400.0, Triangle, 0.3, 0.0, 0.4),
    tone(500.0, Triangle, 0.3, 0.1, 0.4),
    tone(600.0, Triangle, 0.3, 0.2, 0.4),
    tone(800.0, Triangle, 0.3, 0.3, 0.4),
];
const GAME_OVER: &[Tone] = &[
    tone(400.0, Sine, 0.3, 0.0, 0.3),
    tone(350.0, Sine, 0.3, 0.2, 0.3),
    tone(300.0, Sine, 0.3, 0.4, 0.3),
    tone(200.0, Sine, 0.3, 0.6, 0.3),
];
const HIGH_SCORE: &[Tone] = &[
    tone(500.0, Triangle, 0.25, 0.0, 0.25),
    tone(600.0, Triangle, 0.25, 0.08, 0.25),
    tone(700.0, Triangle, 0.25, 0.16, 0.25),
    tone(800.0, Triangle, 0.25, 0.24, 0.25),
    tone(1000.0, Triangle, 0.25, 0.32, 0.25),
];

impl SoundEffect {
    /// Sound cue for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::PlayerFired { rounds } if *rounds > 1 => Some(SoundEffect::Shotgun),
            GameEvent::PlayerFired { .. } => Some(SoundEffect::PlayerShot),
            GameEvent::InvaderFired => Some(SoundEffect::InvaderShot),
            GameEvent::InvaderDestroyed { .. } => Some(SoundEffect::InvaderDestroyed),
            GameEvent::PlayerDestroyed => Some(SoundEffect::PlayerDestroyed),
            GameEvent::WaveStarted(_) => Some(SoundEffect::WaveStart),
            GameEvent::WaveCleared => Some(SoundEffect::WaveClear),
            GameEvent::GameOver => Some(SoundEffect::GameOver),
            GameEvent::ScoreChanged(_) | GameEvent::DifficultyIncreased => None,
        }
    }

    pub fn tones(&self) -> &'static [Tone] {
        match self {
            SoundEffect::PlayerShot => PLAYER_SHOT,
            SoundEffect::Shotgun => SHOTGUN,
            SoundEffect::InvaderShot => INVADER_SHOT,
            SoundEffect::InvaderDestroyed => INVADER_DESTROYED,
            SoundEffect::PlayerDestroyed => PLAYER_DESTROYED,
            SoundEffect::WaveStart => WAVE_START,
            SoundEffect::WaveClear => WAVE_CLEAR,
            SoundEffect::GameOver => GAME_OVER,
            SoundEffect::HighScore => HIGH_SCORE,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{SoundEffect, Tone, Waveform};

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        /// Master times sfx volume, from the player's settings
        gain: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                gain: 0.8,
                muted: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn set_gain(&mut self, gain: f32) {
            self.gain = gain.clamp(0.0, 1.0);
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn effective_volume(&self) -> f32 {
            if self.muted {
                0.0
            } else {
                self.gain
            }
        }

        pub fn play(&self, effect: SoundEffect) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            for tone in effect.tones() {
                self.play_tone(ctx, tone, vol);
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn play_tone(&self, ctx: &AudioContext, tone: &Tone, vol: f32) {
            let osc_type = match tone.waveform {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
                Waveform::Triangle => OscillatorType::Triangle,
            };
            let Some((osc, gain)) = self.create_osc(ctx, tone.freq, osc_type) else {
                return;
            };
            let t = ctx.current_time() + tone.delay;
            let end = t + tone.duration;

            gain.gain().set_value_at_time(vol * tone.gain, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, end).ok();
            if let Some(to) = tone.glide_to {
                osc.frequency().set_value_at_time(tone.freq, t).ok();
                osc.frequency().exponential_ramp_to_value_at_time(to, end).ok();
            }

            osc.start_with_when(t).ok();
            osc.stop_with_when(end + 0.05).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shot_sounds_by_round_count() {
        assert_eq!(
            SoundEffect::for_event(&GameEvent::PlayerFired { rounds: 1 }),
            Some(SoundEffect::PlayerShot)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::PlayerFired { rounds: 4 }),
            Some(SoundEffect::Shotgun)
        );
    }

    #[test]
    fn test_silent_events() {
        assert_eq!(SoundEffect::for_event(&GameEvent::ScoreChanged(3)), None);
        assert_eq!(SoundEffect::for_event(&GameEvent::DifficultyIncreased), None);
        assert_eq!(
            SoundEffect::for_event(&GameEvent::GameOver),
            Some(SoundEffect::GameOver)
        );
    }

    #[test]
    fn test_tones_are_playable() {
        let all = [
            SoundEffect::PlayerShot,
            SoundEffect::Shotgun,
            SoundEffect::InvaderShot,
            SoundEffect::InvaderDestroyed,
            SoundEffect::PlayerDestroyed,
            SoundEffect::WaveStart,
            SoundEffect::WaveClear,
            SoundEffect::GameOver,
            SoundEffect::HighScore,
        ];
        for effect in all {
            let tones = effect.tones();
            assert!(!tones.is_empty(), "{effect:?}");
            for t in tones {
                // Exponential ramps need strictly positive targets
                assert!(t.freq > 0.0 && t.glide_to.is_none_or(|f| f > 0.0));
                assert!(t.gain > 0.01 && t.gain <= 1.0);
                assert!(t.duration > 0.0 && t.delay >= 0.0);
            }
        }
    }
}
