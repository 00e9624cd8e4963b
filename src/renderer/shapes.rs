//! Shape generation for 2D primitives
//!
//! Everything is emitted as a triangle list.

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::Vertex;

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Quad centered on `center` with half-size `half`, rotated by `angle` radians
pub fn quad(center: Vec2, half: Vec2, angle: f32, color: [f32; 4]) -> Vec<Vertex> {
    let rot = Vec2::from_angle(angle);
    let corners = [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
    .map(|c| center + rot.rotate(c));

    [0, 1, 2, 2, 3, 0]
        .iter()
        .map(|&i| Vertex::new(corners[i].x, corners[i].y, color))
        .collect()
}

/// Arrowhead ship hull pointing along +y, rotated by `angle` radians
pub fn ship(center: Vec2, size: f32, angle: f32, color: [f32; 4]) -> Vec<Vertex> {
    let rot = Vec2::from_angle(angle);
    let nose = Vec2::new(0.0, size);
    let left = Vec2::new(-size * 0.8, -size * 0.6);
    let notch = Vec2::new(0.0, -size * 0.25);
    let right = Vec2::new(size * 0.8, -size * 0.6);

    [nose, left, notch, nose, notch, right]
        .iter()
        .map(|p| {
            let p = center + rot.rotate(*p);
            Vertex::new(p.x, p.y, color)
        })
        .collect()
}

/// Thick open polyline, one quad per segment
pub fn polyline(points: &[Vec2], width: f32, color: [f32; 4]) -> Vec<Vertex> {
    if points.len() < 2 {
        return Vec::new();
    }

    let half = width * 0.5;
    let mut vertices = Vec::with_capacity((points.len() - 1) * 6);

    for pair in points.windows(2) {
        let (p1, p2) = (pair[0], pair[1]);
        let dir = (p2 - p1).normalize_or_zero();
        let perp = dir.perp() * half;

        let v1a = p1 + perp;
        let v1b = p1 - perp;
        let v2a = p2 + perp;
        let v2b = p2 - perp;

        vertices.push(Vertex::new(v1a.x, v1a.y, color));
        vertices.push(Vertex::new(v1b.x, v1b.y, color));
        vertices.push(Vertex::new(v2a.x, v2a.y, color));

        vertices.push(Vertex::new(v2a.x, v2a.y, color));
        vertices.push(Vertex::new(v1b.x, v1b.y, color));
        vertices.push(Vertex::new(v2b.x, v2b.y, color));
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [f32; 4] = [1.0; 4];

    #[test]
    fn test_circle_stays_on_radius() {
        let verts = circle(Vec2::new(1.0, 2.0), 0.5, WHITE, 12);
        assert_eq!(verts.len(), 36);
        for v in &verts {
            let d = Vec2::from(v.position).distance(Vec2::new(1.0, 2.0));
            assert!(d <= 0.5 + 1e-5);
        }
    }

    #[test]
    fn test_quad_rotation_keeps_extent() {
        let verts = quad(Vec2::ZERO, Vec2::new(1.0, 0.5), 0.7, WHITE);
        assert_eq!(verts.len(), 6);
        let r = Vec2::new(1.0, 0.5).length();
        for v in &verts {
            assert!((Vec2::from(v.position).length() - r).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ship_nose_points_up() {
        let verts = ship(Vec2::ZERO, 1.0, 0.0, WHITE);
        let top = verts
            .iter()
            .map(|v| v.position[1])
            .fold(f32::MIN, f32::max);
        assert!((top - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_polyline_segments() {
        assert!(polyline(&[Vec2::ZERO], 0.1, WHITE).is_empty());
        let pts = [Vec2::ZERO, Vec2::Y, Vec2::new(1.0, 1.0)];
        assert_eq!(polyline(&pts, 0.1, WHITE).len(), 12);
    }
}
