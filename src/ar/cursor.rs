//! Placement cursor
//!
//! Each tick: query the viewer pose, cast a ray along the gaze, and park a
//! translucent slab on the nearest horizontal surface. Tapping while the slab
//! is visible confirms the board origin; the cursor then hides for good.

use glam::{Quat, Vec3};

use super::raycast::Ray;
use super::surface::{CollisionGroup, SurfaceRegistry};
use crate::consts::{CURSOR_COLOR, CURSOR_RAY_LENGTH, CURSOR_SIZE};
use crate::platform::PoseSource;
use crate::renderer::{EntityId, EntityKind, Material, Renderable, SceneCommand, Transform};
use crate::yaw_only;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No surface under the gaze (cursor hidden)
    Idle,
    /// Cursor resting on a surface
    Tracking,
    /// Board placed; cursor retired
    Confirmed,
}

/// What consumers may read about the cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementState {
    pub enabled: bool,
    pub position: Vec3,
    /// Upright, yaw only
    pub orientation: Quat,
}

impl Default for PlacementState {
    fn default() -> Self {
        Self {
            enabled: false,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlacementCursor {
    state: CursorState,
    placement: PlacementState,
    entity: EntityId,
    spawned: bool,
    ray_length: f32,
}

impl Default for PlacementCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementCursor {
    pub fn new() -> Self {
        Self {
            state: CursorState::Idle,
            placement: PlacementState::default(),
            entity: EntityId::new(EntityKind::Cursor, 0),
            spawned: false,
            ray_length: CURSOR_RAY_LENGTH,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn placement(&self) -> &PlacementState {
        &self.placement
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Per-tick update. A missing pose keeps the previous visual state.
    pub fn update(
        &mut self,
        poses: &mut dyn PoseSource,
        now: f64,
        registry: &SurfaceRegistry,
        commands: &mut Vec<SceneCommand>,
    ) {
        if self.state == CursorState::Confirmed {
            return;
        }
        self.ensure_spawned(commands);

        let Some(pose) = poses.current_pose(now) else {
            return;
        };
        let hit = Ray::new(pose.position, pose.forward(), self.ray_length)
            .and_then(|ray| registry.raycast(&ray, CollisionGroup::HORIZONTAL));

        match hit {
            Some(hit) => {
                let orientation = registry
                    .get(hit.id)
                    .map(|surface| yaw_only(surface.transform.rotation))
                    .unwrap_or(Quat::IDENTITY);
                self.placement.position = hit.point;
                self.placement.orientation = orientation;
                commands.push(SceneCommand::SetTransform {
                    id: self.entity,
                    transform: self.visual_transform(),
                });
                self.set_enabled(true, commands);
                self.state = CursorState::Tracking;
            }
            None => {
                self.set_enabled(false, commands);
                self.state = CursorState::Idle;
            }
        }
    }

    /// Confirm the current spot. Returns the board origin, or `None` if the
    /// cursor is not resting on a surface.
    pub fn confirm(&mut self, commands: &mut Vec<SceneCommand>) -> Option<Vec3> {
        if self.state != CursorState::Tracking {
            log::debug!("Placement tap ignored in {:?}", self.state);
            return None;
        }
        self.set_enabled(false, commands);
        self.state = CursorState::Confirmed;
        log::info!("Board placed at {:?}", self.placement.position);
        Some(self.placement.position)
    }

    fn ensure_spawned(&mut self, commands: &mut Vec<SceneCommand>) {
        if self.spawned {
            return;
        }
        commands.push(SceneCommand::Spawn {
            id: self.entity,
            renderable: Renderable::cuboid(Vec3::from(CURSOR_SIZE), Material::Lit(CURSOR_COLOR)),
            transform: self.visual_transform(),
        });
        commands.push(SceneCommand::SetVisible {
            id: self.entity,
            visible: false,
        });
        self.spawned = true;
    }

    fn set_enabled(&mut self, enabled: bool, commands: &mut Vec<SceneCommand>) {
        if self.placement.enabled == enabled {
            return;
        }
        self.placement.enabled = enabled;
        commands.push(SceneCommand::SetVisible {
            id: self.entity,
            visible: enabled,
        });
    }

    /// Slab rests on the surface: lift it by half its height
    fn visual_transform(&self) -> Transform {
        let lift = Vec3::Y * (CURSOR_SIZE[1] / 2.0);
        Transform::new(self.placement.position + lift, self.placement.orientation)
    }
}
