//! Data-driven game balance
//!
//! `GameSettings` holds the invader movement parameters, the wave layout and
//! the per-wave difficulty increments. A game keeps an untouched copy so a
//! restart always begins from the authored values.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::path::InvaderPath;

/// Smallest period / exponent a difficulty ramp may leave behind
const MIN_CURVE_PARAM: f32 = 0.05;

/// Most invaders a single wave may hold
pub const MAX_WAVE_INVADERS: u32 = 4096;

/// Errors raised while loading or validating tuning data
#[derive(Debug, Clone, PartialEq)]
pub enum TuningError {
    /// JSON could not be decoded
    Parse(String),
    /// A float field is NaN or infinite
    NonFinite { field: &'static str },
    /// A field that must be strictly positive was not
    NonPositive { field: &'static str, value: f32 },
    /// Wave width or height is zero
    EmptyWave { width: u32, height: u32 },
    /// Wave holds more than `MAX_WAVE_INVADERS`
    WaveTooLarge { width: u32, height: u32 },
    /// Fire delay range has min > max
    InvertedFireDelay { min: f32, max: f32 },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "invalid tuning json: {msg}"),
            Self::NonFinite { field } => write!(f, "{field} must be a finite number"),
            Self::NonPositive { field, value } => {
                write!(f, "{field} must be > 0 (got {value})")
            }
            Self::EmptyWave { width, height } => {
                write!(f, "wave must contain invaders (got {width}x{height})")
            }
            Self::WaveTooLarge { width, height } => write!(
                f,
                "wave of {width}x{height} exceeds {MAX_WAVE_INVADERS} invaders"
            ),
            Self::InvertedFireDelay { min, max } => {
                write!(f, "fire delay range is inverted: min={min}, max={max}")
            }
        }
    }
}

impl std::error::Error for TuningError {}

impl From<serde_json::Error> for TuningError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Invader, wave and difficulty-ramp settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    // === Invaders ===
    /// Peak lateral swing of the movement curve
    pub invader_amplitude: f32,
    /// Curve period, in invader-clock units per radian
    pub invader_period: f32,
    /// Curve sharpness (1 = sine, >1 spiky, <1 boxy)
    pub invader_exponent: f32,
    /// Invader clock rate; also their forward speed
    pub invader_speed: f32,

    // === Wave ===
    pub wave_width: u32,
    pub wave_height: u32,
    /// Delay between invader shots, seconds (x = min, y = max)
    pub wave_fire_delay_range: Vec2,

    // === Difficulty increase (applied per wave) ===
    pub amplitude_increase: f32,
    pub period_increase: f32,
    pub exponent_increase: f32,
    /// Use `1 / exponent` instead of `exponent`; toggled every wave
    pub invert_exponent: bool,
    pub speed_increase: f32,
    /// Added to both ends of the fire delay range
    pub fire_delay_increase: f32,
    /// Rows added per wave (may be negative; a wave keeps at least one row)
    pub wave_height_increase: i32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            invader_amplitude: 1.5,
            invader_period: 1.0,
            invader_exponent: 1.0,
            invader_speed: 0.6,

            wave_width: 8,
            wave_height: 3,
            wave_fire_delay_range: Vec2::new(0.6, 1.8),

            amplitude_increase: 0.5,
            period_increase: -0.05,
            exponent_increase: 0.5,
            invert_exponent: false,
            speed_increase: 0.1,
            fire_delay_increase: -0.1,
            wave_height_increase: 1,
        }
    }
}

impl GameSettings {
    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> String {
        // Plain data with finite floats always serializes
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check the settings describe a playable game
    pub fn validate(&self) -> Result<(), TuningError> {
        let floats = [
            ("invader_amplitude", self.invader_amplitude),
            ("invader_period", self.invader_period),
            ("invader_exponent", self.invader_exponent),
            ("invader_speed", self.invader_speed),
            ("wave_fire_delay_range.min", self.wave_fire_delay_range.x),
            ("wave_fire_delay_range.max", self.wave_fire_delay_range.y),
            ("amplitude_increase", self.amplitude_increase),
            ("period_increase", self.period_increase),
            ("exponent_increase", self.exponent_increase),
            ("speed_increase", self.speed_increase),
            ("fire_delay_increase", self.fire_delay_increase),
        ];
        if let Some(&(field, _)) = floats.iter().find(|(_, value)| !value.is_finite()) {
            return Err(TuningError::NonFinite { field });
        }

        let positive = [
            ("invader_period", self.invader_period),
            ("invader_exponent", self.invader_exponent),
            ("invader_speed", self.invader_speed),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(TuningError::NonPositive { field, value });
            }
        }

        if self.wave_width == 0 || self.wave_height == 0 {
            return Err(TuningError::EmptyWave {
                width: self.wave_width,
                height: self.wave_height,
            });
        }
        if u64::from(self.wave_width) * u64::from(self.wave_height)
            > u64::from(MAX_WAVE_INVADERS)
        {
            return Err(TuningError::WaveTooLarge {
                width: self.wave_width,
                height: self.wave_height,
            });
        }

        let range = self.wave_fire_delay_range;
        if range.x > range.y {
            return Err(TuningError::InvertedFireDelay {
                min: range.x,
                max: range.y,
            });
        }

        Ok(())
    }

    /// Ramp every setting by its increment; the exponent inversion flips.
    ///
    /// Speed and the curve parameters stay positive, and the wave keeps
    /// between one row and as many as `MAX_WAVE_INVADERS` allows.
    pub fn increase_difficulty(&mut self) {
        self.invader_amplitude += self.amplitude_increase;
        self.invader_period = (self.invader_period + self.period_increase).max(MIN_CURVE_PARAM);
        self.invader_exponent =
            (self.invader_exponent + self.exponent_increase).max(MIN_CURVE_PARAM);
        self.invert_exponent = !self.invert_exponent;
        self.invader_speed = (self.invader_speed + self.speed_increase).max(MIN_CURVE_PARAM);
        self.wave_fire_delay_range += Vec2::splat(self.fire_delay_increase);

        let max_rows = (MAX_WAVE_INVADERS / self.wave_width.max(1)).max(1);
        let rows = i64::from(self.wave_height) + i64::from(self.wave_height_increase);
        self.wave_height = rows.clamp(1, i64::from(max_rows)) as u32;
    }

    /// Exponent actually fed to the movement curve
    pub fn effective_exponent(&self) -> f32 {
        if self.invert_exponent {
            1.0 / self.invader_exponent
        } else {
            self.invader_exponent
        }
    }

    /// Movement curve parameters for the current settings
    pub fn path(&self) -> InvaderPath {
        InvaderPath {
            amplitude: self.invader_amplitude,
            period: self.invader_period,
            exponent: self.effective_exponent(),
        }
    }

    /// Number of invaders a wave spawns
    pub fn wave_size(&self) -> usize {
        (self.wave_width as usize).saturating_mul(self.wave_height as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(GameSettings::default().validate(), Ok(()));
    }

    #[test]
    fn test_increase_difficulty_is_additive() {
        let mut s = GameSettings::default();
        let before = s;
        s.increase_difficulty();

        assert!((s.invader_amplitude - (before.invader_amplitude + 0.5)).abs() < 1e-6);
        assert!((s.invader_period - (before.invader_period - 0.05)).abs() < 1e-6);
        assert!((s.invader_exponent - (before.invader_exponent + 0.5)).abs() < 1e-6);
        assert!((s.invader_speed - (before.invader_speed + 0.1)).abs() < 1e-6);
        assert!((s.wave_fire_delay_range.x - 0.5).abs() < 1e-6);
        assert!((s.wave_fire_delay_range.y - 1.7).abs() < 1e-6);
        assert_eq!(s.wave_height, before.wave_height + 1);
        assert_eq!(s.wave_width, before.wave_width);
    }

    #[test]
    fn test_exponent_inversion_toggles() {
        let mut s = GameSettings::default();
        assert!(!s.invert_exponent);
        assert_eq!(s.effective_exponent(), 1.0);

        s.increase_difficulty();
        assert!(s.invert_exponent);
        assert!((s.effective_exponent() - 1.0 / 1.5).abs() < 1e-6);

        s.increase_difficulty();
        assert!(!s.invert_exponent);
        assert!((s.effective_exponent() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_curve_params_never_collapse() {
        let mut s = GameSettings {
            period_increase: -10.0,
            exponent_increase: -10.0,
            ..Default::default()
        };
        s.increase_difficulty();
        assert!(s.invader_period > 0.0);
        assert!(s.invader_exponent > 0.0);
        assert!(s.effective_exponent().is_finite());
    }

    #[test]
    fn test_speed_never_reverses() {
        let mut s = GameSettings {
            speed_increase: -1.0,
            ..Default::default()
        };
        s.increase_difficulty();
        s.increase_difficulty();
        assert!(s.invader_speed > 0.0);
    }

    #[test]
    fn test_wave_height_ramp_saturates() {
        let mut s = GameSettings {
            wave_height_increase: i32::MAX,
            ..Default::default()
        };
        s.increase_difficulty();
        assert_eq!(s.wave_height, MAX_WAVE_INVADERS / s.wave_width);
        assert!(s.wave_size() <= MAX_WAVE_INVADERS as usize);
        assert_eq!(s.validate(), Ok(()));

        s.wave_height_increase = i32::MIN;
        s.increase_difficulty();
        assert_eq!(s.wave_height, 1);
    }

    #[test]
    fn test_from_json_rejects_huge_wave() {
        let err = GameSettings::from_json(r#"{ "wave_width": 100000, "wave_height": 100000 }"#)
            .unwrap_err();
        assert_eq!(
            err,
            TuningError::WaveTooLarge {
                width: 100000,
                height: 100000
            }
        );
    }

    #[test]
    fn test_from_json_rejects_infinite_fire_delay() {
        let err =
            GameSettings::from_json(r#"{ "wave_fire_delay_range": [0.5, 1e39] }"#).unwrap_err();
        assert_eq!(
            err,
            TuningError::NonFinite {
                field: "wave_fire_delay_range.max"
            }
        );

        let err = GameSettings::from_json(r#"{ "speed_increase": -1e40 }"#).unwrap_err();
        assert!(matches!(err, TuningError::NonFinite { field: "speed_increase" }));
    }

    #[test]
    fn test_from_json_partial_uses_defaults() {
        let s = GameSettings::from_json(r#"{ "wave_width": 4, "invader_speed": 2.0 }"#)
            .expect("valid json");
        assert_eq!(s.wave_width, 4);
        assert_eq!(s.invader_speed, 2.0);
        assert_eq!(s.wave_height, GameSettings::default().wave_height);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        let err = GameSettings::from_json(r#"{ "invader_period": 0.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::NonPositive { field: "invader_period", .. }));

        let err = GameSettings::from_json(r#"{ "wave_height": 0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::EmptyWave { .. }));

        let err = GameSettings::from_json(r#"{ "wave_fire_delay_range": [2.0, 1.0] }"#)
            .unwrap_err();
        assert!(matches!(err, TuningError::InvertedFireDelay { .. }));

        let err = GameSettings::from_json("not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
        assert!(err.to_string().starts_with("invalid tuning json"));
    }

    #[test]
    fn test_json_round_trip_preserves_ramp() {
        let mut s = GameSettings::default();
        s.increase_difficulty();
        let back = GameSettings::from_json(&s.to_json()).expect("round trip");
        assert_eq!(back, s);
    }
}
