//! Scene command types
//!
//! Every spawn carries its [`Renderable`] so the host never has to inspect an
//! entity to find out whether it can be drawn.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// What an entity is, for host-side bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Surface,
    Cursor,
    Block,
    Debris,
}

/// Entity handle, unique across all producers because the kind is part of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub kind: EntityKind,
    pub index: u32,
}

impl EntityId {
    pub const fn new(kind: EntityKind, index: u32) -> Self {
        Self { kind, index }
    }
}

/// Rigid world transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Decompose a rigid matrix (scale is discarded)
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (_, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// Transform a local-space point into world space
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }
}

/// Geometry of a renderable
#[derive(Debug, Clone, PartialEq)]
pub enum Mesh {
    /// Axis-aligned box centered on the entity origin
    Box { size: Vec3 },
    /// Arbitrary triangle mesh in entity-local space
    Triangles { vertices: Vec<Vec3>, indices: Vec<u32> },
}

/// Surface appearance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Plain lit color
    Lit([f32; 4]),
    /// Emissive reward flash (perfect placement)
    Glow([f32; 4]),
    /// Desaturated color for the frozen block after game over
    Frozen([f32; 4]),
    /// Writes depth only, hides virtual content behind real surfaces
    Occlusion,
}

impl Material {
    /// Base RGBA, or `None` for materials that draw no color
    pub fn color(&self) -> Option<[f32; 4]> {
        match *self {
            Material::Lit(c) | Material::Glow(c) | Material::Frozen(c) => Some(c),
            Material::Occlusion => None,
        }
    }

    /// Same color without the emissive flash
    pub fn steady(self) -> Self {
        match self {
            Material::Glow(c) => Material::Lit(c),
            other => other,
        }
    }
}

/// Mesh plus material: everything needed to draw an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    pub mesh: Mesh,
    pub material: Material,
}

impl Renderable {
    pub fn cuboid(size: Vec3, material: Material) -> Self {
        Self {
            mesh: Mesh::Box { size },
            material,
        }
    }
}

/// Requests to the host scene graph
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    Spawn {
        id: EntityId,
        renderable: Renderable,
        transform: Transform,
    },
    SetTransform {
        id: EntityId,
        transform: Transform,
    },
    SetMaterial {
        id: EntityId,
        material: Material,
    },
    SetVisible {
        id: EntityId,
        visible: bool,
    },
    Despawn {
        id: EntityId,
    },
    /// Hand a fragment to host physics; the host discards it after `lifetime` seconds
    SpawnDebris {
        id: EntityId,
        renderable: Renderable,
        transform: Transform,
        lifetime: f32,
    },
}

impl SceneCommand {
    /// Entity the command targets
    pub fn id(&self) -> EntityId {
        match self {
            SceneCommand::Spawn { id, .. }
            | SceneCommand::SetTransform { id, .. }
            | SceneCommand::SetMaterial { id, .. }
            | SceneCommand::SetVisible { id, .. }
            | SceneCommand::Despawn { id }
            | SceneCommand::SpawnDebris { id, .. } => *id,
        }
    }
}
