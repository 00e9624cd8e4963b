//! Collision detection for bullets, invaders and the player
//!
//! Everything collides as a circle. Bullets are fast relative to the tick
//! rate, so they are tested as a swept segment from their previous position
//! to their current one.

use glam::Vec2;

/// Result of a bullet sweep against a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Fraction of the sweep (0 = start, 1 = end) at the closest approach
    pub t: f32,
    /// Closest point on the sweep to the target center
    pub point: Vec2,
}

/// Check whether two circles overlap (touching counts)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}

/// Closest point to `p` on the segment `a..b`, as (parameter, point)
pub fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> (f32, Vec2) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return (0.0, a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (t, a + ab * t)
}

/// Sweep a circle of `radius` from `from` to `to` against a circle at
/// `center` with `target_radius`.
pub fn sweep_circle(
    from: Vec2,
    to: Vec2,
    radius: f32,
    center: Vec2,
    target_radius: f32,
) -> Option<SweepHit> {
    let (t, point) = closest_point_on_segment(from, to, center);
    if circles_overlap(point, radius, center, target_radius) {
        Some(SweepHit { t, point })
    } else {
        None
    }
}

/// Two moving circles: check overlap at the closest approach within the tick.
///
/// Works in the frame of `b` so only one segment needs sweeping.
pub fn sweep_pair(
    a_from: Vec2,
    a_to: Vec2,
    ra: f32,
    b_from: Vec2,
    b_to: Vec2,
    rb: f32,
) -> bool {
    let rel_from = a_from - b_from;
    let rel_to = a_to - b_to;
    sweep_circle(rel_from, rel_to, ra, Vec2::ZERO, rb).is_some()
}
