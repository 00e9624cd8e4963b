//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: [f32; 4],
    pub wall: [f32; 4],
    pub danger_line: [f32; 4],
    pub player: [f32; 4],
    pub player_light: [f32; 4],
    pub wreck: [f32; 4],
    pub invader: [f32; 4],
    pub invader_eye: [f32; 4],
    pub invader_frozen: [f32; 4],
    pub player_bullet: [f32; 4],
    pub invader_bullet: [f32; 4],
    pub debris: [f32; 4],
    pub round_ready: [f32; 4],
    pub round_spent: [f32; 4],
    pub path: [f32; 4],
}

impl Palette {
    pub const STANDARD: Palette = Palette {
        background: [0.02, 0.02, 0.05, 1.0],
        wall: [0.3, 0.3, 0.4, 1.0],
        danger_line: [0.6, 0.15, 0.15, 0.6],
        player: [0.2, 0.8, 0.4, 1.0],
        player_light: [1.0, 0.95, 0.6, 1.0],
        wreck: [0.25, 0.3, 0.25, 1.0],
        invader: [0.6, 0.2, 0.8, 1.0],
        invader_eye: [1.0, 0.4, 0.2, 1.0],
        invader_frozen: [0.4, 0.4, 0.5, 1.0],
        player_bullet: [1.0, 1.0, 1.0, 1.0],
        invader_bullet: [1.0, 0.4, 0.2, 1.0],
        debris: [0.5, 0.2, 0.6, 1.0],
        round_ready: [0.9, 0.85, 0.3, 1.0],
        round_spent: [0.25, 0.25, 0.2, 1.0],
        path: [0.4, 0.7, 1.0, 0.35],
    };

    pub const HIGH_CONTRAST: Palette = Palette {
        background: [0.0, 0.0, 0.0, 1.0],
        wall: [1.0, 1.0, 1.0, 1.0],
        danger_line: [1.0, 0.0, 0.0, 1.0],
        player: [0.0, 1.0, 0.0, 1.0],
        player_light: [1.0, 1.0, 0.0, 1.0],
        wreck: [0.5, 0.5, 0.5, 1.0],
        invader: [1.0, 0.0, 1.0, 1.0],
        invader_eye: [1.0, 1.0, 1.0, 1.0],
        invader_frozen: [0.6, 0.6, 0.6, 1.0],
        player_bullet: [1.0, 1.0, 1.0, 1.0],
        invader_bullet: [1.0, 0.5, 0.0, 1.0],
        debris: [1.0, 0.0, 1.0, 1.0],
        round_ready: [1.0, 1.0, 0.0, 1.0],
        round_spent: [0.3, 0.3, 0.3, 1.0],
        path: [0.0, 1.0, 1.0, 0.8],
    };

    pub fn for_settings(high_contrast: bool) -> &'static Palette {
        if high_contrast {
            &Self::HIGH_CONTRAST
        } else {
            &Self::STANDARD
        }
    }
}

/// Linear blend between two colors
pub fn mix(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}
