//! Reference scene mirror
//!
//! Applies [`SceneCommand`]s the way a host scene graph would, runs the
//! debris "physics" (straight fall, then discard after its lifetime) and packs
//! visible boxes into [`BoxInstance`]s.

use std::collections::BTreeMap;

use glam::Vec3;

use super::instance::{BoxInstance, MeshVertex};
use super::scene::{EntityId, EntityKind, Mesh, Renderable, SceneCommand, Transform};

/// Gravity applied to debris (m/s²)
const DEBRIS_GRAVITY: f32 = 9.81;

/// A mirrored entity
#[derive(Debug, Clone)]
pub struct RenderEntry {
    pub renderable: Renderable,
    pub transform: Transform,
    pub visible: bool,
    /// Remaining lifetime for fire-and-forget entities
    pub ttl: Option<f32>,
    /// Vertical speed for falling debris
    pub fall_speed: f32,
}

/// Host-side mirror of the scene
#[derive(Debug, Clone, Default)]
pub struct RenderList {
    entries: BTreeMap<EntityId, RenderEntry>,
}

impl RenderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a batch of commands in order
    pub fn apply_all(&mut self, commands: impl IntoIterator<Item = SceneCommand>) {
        for command in commands {
            self.apply(command);
        }
    }

    pub fn apply(&mut self, command: SceneCommand) {
        match command {
            SceneCommand::Spawn {
                id,
                renderable,
                transform,
            } => {
                self.entries.insert(
                    id,
                    RenderEntry {
                        renderable,
                        transform,
                        visible: true,
                        ttl: None,
                        fall_speed: 0.0,
                    },
                );
            }
            SceneCommand::SpawnDebris {
                id,
                renderable,
                transform,
                lifetime,
            } => {
                self.entries.insert(
                    id,
                    RenderEntry {
                        renderable,
                        transform,
                        visible: true,
                        ttl: Some(lifetime),
                        fall_speed: 0.0,
                    },
                );
            }
            SceneCommand::SetTransform { id, transform } => {
                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.transform = transform;
                }
            }
            SceneCommand::SetMaterial { id, material } => {
                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.renderable.material = material;
                }
            }
            SceneCommand::SetVisible { id, visible } => {
                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.visible = visible;
                }
            }
            SceneCommand::Despawn { id } => {
                self.entries.remove(&id);
            }
        }
    }

    /// Advance fire-and-forget entities by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        for entry in self.entries.values_mut() {
            if let Some(ttl) = entry.ttl.as_mut() {
                *ttl -= dt;
                entry.fall_speed += DEBRIS_GRAVITY * dt;
                entry.transform.translation.y -= entry.fall_speed * dt;
            }
        }
        self.entries
            .retain(|_, entry| entry.ttl.is_none_or(|ttl| ttl > 0.0));
    }

    pub fn get(&self, id: EntityId) -> Option<&RenderEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of live entities of a kind
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entries.keys().filter(|id| id.kind == kind).count()
    }

    /// Visible colored boxes, in stable id order
    pub fn box_instances(&self) -> Vec<BoxInstance> {
        self.entries
            .values()
            .filter(|entry| entry.visible)
            .filter_map(|entry| match (&entry.renderable.mesh, entry.renderable.material.color()) {
                (Mesh::Box { size }, Some(color)) => {
                    Some(BoxInstance::new(entry.transform.to_matrix(), *size, color))
                }
                _ => None,
            })
            .collect()
    }

    /// World-space vertices of every visible triangle mesh (occluders)
    pub fn occluder_vertices(&self) -> Vec<MeshVertex> {
        let mut out = Vec::new();
        for entry in self.entries.values().filter(|e| e.visible) {
            if let Mesh::Triangles { vertices, indices } = &entry.renderable.mesh {
                out.extend(indices.iter().filter_map(|&i| vertices.get(i as usize)).map(
                    |&v: &Vec3| MeshVertex::from(entry.transform.transform_point(v)),
                ));
            }
        }
        out
    }

    /// Instance buffer bytes ready for upload
    pub fn instance_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.box_instances()).to_vec()
    }
}
