//! GPU-ready layouts handed to the host renderer

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// One box instance: model matrix (scale baked in) plus color
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BoxInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl BoxInstance {
    pub fn new(model: Mat4, size: Vec3, color: [f32; 4]) -> Self {
        let model = model * Mat4::from_scale(size);
        Self {
            model: model.to_cols_array_2d(),
            color,
        }
    }
}

/// Surface boundary vertex
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
}

impl MeshVertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { position: [x, y, z] }
    }
}

impl From<Vec3> for MeshVertex {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Colors for game elements
pub mod colors {
    pub const BASE_SLAB: [f32; 4] = [0.55, 0.55, 0.6, 1.0];
    pub const PERFECT_GLOW: [f32; 4] = [1.0, 0.95, 0.6, 1.0];
    pub const FROZEN: [f32; 4] = [0.35, 0.35, 0.38, 1.0];
}
