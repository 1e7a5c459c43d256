//! Vertex types for the projected scene

use bytemuck::{Pod, Zeroable};

/// Vertex already in normalized device coordinates, with RGBA color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, z: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y, z],
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
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for scene elements without a per-kind color
pub mod colors {
    pub const WALL: u32 = 0x334466;
    pub const PADDLE: u32 = 0x3399ff;
    pub const CANNON: u32 = 0xff6633;
    pub const LASER: u32 = 0xff3333;
    pub const SHIELD: u32 = 0x00ffff;
    pub const STAR: u32 = 0xffffff;
    pub const BACKGROUND: [f64; 3] = [0.0, 0.0, 0.067];
}
