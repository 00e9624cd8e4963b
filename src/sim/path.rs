//! Invader movement curve
//!
//! Invaders weave sideways while marching toward the player:
//!
//! ```text
//! x(t) = amplitude * sign(sin(t / period)) * |sin(t / period)|^exponent
//! y(t) = -t
//! ```
//!
//! `t` is the invader's own clock. Exponents above 1 sharpen the swing into
//! spikes, exponents below 1 flatten it into a near square wave.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Offset from an invader's spawn point after `t` units of its clock
#[inline]
pub fn invader_offset(t: f32, amplitude: f32, period: f32, exponent: f32) -> Vec2 {
    let s = (t / period).sin();
    // sign(0) counts as positive, so 0^exponent keeps x at zero either way
    let dx = s.signum() * s.abs().powf(exponent) * amplitude;
    Vec2::new(dx, -t)
}

/// The scalar parameters of the movement curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvaderPath {
    pub amplitude: f32,
    pub period: f32,
    /// Already inverted when the wave calls for it
    pub exponent: f32,
}

impl InvaderPath {
    /// Offset from the spawn point at clock `t`
    pub fn offset_at(&self, t: f32) -> Vec2 {
        invader_offset(t, self.amplitude, self.period, self.exponent)
    }

    /// Polyline of the first `length` clock units, `steps` segments long.
    ///
    /// Used for the path preview overlay.
    pub fn sample(&self, length: f32, steps: usize) -> Vec<Vec2> {
        if steps == 0 {
            return vec![self.offset_at(0.0)];
        }
        (0..=steps)
            .map(|i| self.offset_at(length * i as f32 / steps as f32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_origin_at_zero() {
        assert_eq!(invader_offset(0.0, 3.0, 1.0, 2.0), Vec2::ZERO);
    }

    #[test]
    fn test_exponent_one_is_plain_sine() {
        for i in 0..50 {
            let t = i as f32 * 0.37;
            let offset = invader_offset(t, 2.0, 1.5, 1.0);
            assert!((offset.x - 2.0 * (t / 1.5).sin()).abs() < 1e-5);
            assert_eq!(offset.y, -t);
        }
    }

    #[test]
    fn test_peak_reaches_amplitude() {
        let quarter = std::f32::consts::FRAC_PI_2;
        let offset = invader_offset(quarter, 4.0, 1.0, 3.0);
        assert!((offset.x - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_small_exponent_flattens_toward_amplitude() {
        // |sin|^0.2 sits much closer to 1 than |sin| away from the zero crossings
        let t = 0.3;
        let sharp = invader_offset(t, 1.0, 1.0, 1.0).x;
        let boxy = invader_offset(t, 1.0, 1.0, 0.2).x;
        assert!(boxy > sharp);
        assert!(boxy <= 1.0);
    }

    #[test]
    fn test_sample_covers_length() {
        let path = InvaderPath {
            amplitude: 1.0,
            period: 1.0,
            exponent: 1.0,
        };
        let points = path.sample(10.0, 100);
        assert_eq!(points.len(), 101);
        assert_eq!(points[0], Vec2::ZERO);
        assert!((points[100].y + 10.0).abs() < 1e-5);

        assert_eq!(path.sample(10.0, 0), vec![Vec2::ZERO]);
    }

    proptest! {
        #[test]
        fn prop_swing_bounded_by_amplitude(
            t in 0.0f32..200.0,
            amplitude in 0.0f32..10.0,
            period in 0.05f32..5.0,
            exponent in 0.05f32..5.0,
        ) {
            let offset = invader_offset(t, amplitude, period, exponent);
            prop_assert!(offset.x.abs() <= amplitude + 1e-4);
            prop_assert_eq!(offset.y, -t);
        }

        #[test]
        fn prop_swing_follows_sine_sign(
            t in 0.0f32..200.0,
            period in 0.05f32..5.0,
            exponent in 0.05f32..5.0,
        ) {
            let s = (t / period).sin();
            let x = invader_offset(t, 1.0, period, exponent).x;
            if s.abs() > 1e-3 {
                prop_assert_eq!(x.signum(), s.signum());
            }
        }
    }
}
