//! Surface registry
//!
//! Turns the host's plane add/update/remove stream into one static collider
//! and one occlusion mesh per plane, and answers the cursor's ray queries.

use std::collections::BTreeMap;

use glam::{Mat4, Vec3};

use super::raycast::{Aabb, Ray, RayHit, ray_triangle};
use crate::consts::MIN_SURFACE_EXTENT;
use crate::renderer::{EntityId, EntityKind, Material, Mesh, Renderable, SceneCommand, Transform};

/// Host-assigned plane identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Collision category bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionGroup(pub u32);

impl CollisionGroup {
    pub const NONE: Self = Self(0);
    /// Horizontal planes (tables, floors)
    pub const HORIZONTAL: Self = Self(1 << 31);
    pub const ALL: Self = Self(u32::MAX);

    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

/// Plane alignment reported by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceClass {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEventKind {
    Added,
    Updated,
    Removed,
}

/// Plane boundary triangulation in surface-local space
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl BoundaryMesh {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Axis-aligned rectangle in the local XZ plane, centered on the origin
    pub fn rectangle(width: f32, depth: f32) -> Self {
        let (hw, hd) = (width / 2.0, depth / 2.0);
        Self {
            vertices: vec![
                Vec3::new(-hw, 0.0, -hd),
                Vec3::new(hw, 0.0, -hd),
                Vec3::new(hw, 0.0, hd),
                Vec3::new(-hw, 0.0, hd),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// True if the mesh has at least one triangle and every index is in range
    pub fn is_well_formed(&self) -> bool {
        let n = self.vertices.len() as u32;
        !self.vertices.is_empty()
            && self.indices.len() >= 3
            && self.indices.iter().all(|&i| i < n)
    }

    fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ]
        })
    }
}

/// One plane event from the scanner
#[derive(Debug, Clone)]
pub struct SurfaceEvent {
    pub id: SurfaceId,
    pub kind: SurfaceEventKind,
    pub class: SurfaceClass,
    /// World-from-surface transform
    pub transform: Mat4,
    pub boundary: BoundaryMesh,
}

/// A registered plane
#[derive(Debug, Clone)]
pub struct Surface {
    pub id: SurfaceId,
    pub entity: EntityId,
    pub group: CollisionGroup,
    pub transform: Transform,
    pub mesh: BoundaryMesh,
    local_bounds: Aabb,
    world_bounds: Aabb,
}

impl Surface {
    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.world_bounds = world_bounds(&self.local_bounds, &transform);
    }

    /// Nearest triangle hit along `ray`
    fn raycast(&self, ray: &Ray) -> Option<f32> {
        self.world_bounds.intersect_ray(ray)?;
        self.mesh
            .triangles()
            .filter_map(|[a, b, c]| {
                ray_triangle(
                    ray,
                    self.transform.transform_point(a),
                    self.transform.transform_point(b),
                    self.transform.transform_point(c),
                )
            })
            .min_by(f32::total_cmp)
    }
}

fn world_bounds(local: &Aabb, transform: &Transform) -> Aabb {
    let corners = (0..8).map(|i| {
        let pick = |bit: u32, lo: f32, hi: f32| if i & bit == 0 { lo } else { hi };
        transform.transform_point(Vec3::new(
            pick(1, local.min.x, local.max.x),
            pick(2, local.min.y, local.max.y),
            pick(4, local.min.z, local.max.z),
        ))
    });
    // Corners are never empty
    Aabb::from_points(corners)
        .unwrap_or(*local)
        .expand(1e-3)
}

/// All registered planes, keyed by host id
#[derive(Debug, Clone, Default)]
pub struct SurfaceRegistry {
    surfaces: BTreeMap<SurfaceId, Surface>,
    next_index: u32,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one scanner event, appending the resulting scene commands
    pub fn process(&mut self, event: SurfaceEvent, commands: &mut Vec<SceneCommand>) {
        if event.kind == SurfaceEventKind::Removed {
            if let Some(surface) = self.surfaces.remove(&event.id) {
                log::debug!("Surface {:?} removed", event.id);
                commands.push(SceneCommand::Despawn { id: surface.entity });
            }
            return;
        }

        let transform = Transform::from_matrix(event.transform);

        if let Some(surface) = self.surfaces.get_mut(&event.id) {
            // Geometry is only built once; updates move the plane
            surface.set_transform(transform);
            commands.push(SceneCommand::SetTransform {
                id: surface.entity,
                transform,
            });
            return;
        }

        // Added, or an update for a plane we never saw
        if event.class != SurfaceClass::Horizontal {
            log::debug!("Ignoring non-horizontal surface {:?}", event.id);
            return;
        }
        if !event.boundary.is_well_formed() {
            log::debug!("Ignoring surface {:?} with malformed geometry", event.id);
            return;
        }
        let Some(local_bounds) = Aabb::from_points(event.boundary.vertices.iter().copied()) else {
            return;
        };
        let size = local_bounds.max - local_bounds.min;
        if size.x < MIN_SURFACE_EXTENT || size.z < MIN_SURFACE_EXTENT {
            log::debug!("Ignoring surface {:?}: too small ({:.2} x {:.2})", event.id, size.x, size.z);
            return;
        }

        let entity = EntityId::new(EntityKind::Surface, self.next_index);
        self.next_index += 1;

        commands.push(SceneCommand::Spawn {
            id: entity,
            renderable: Renderable {
                mesh: Mesh::Triangles {
                    vertices: event.boundary.vertices.clone(),
                    indices: event.boundary.indices.clone(),
                },
                material: Material::Occlusion,
            },
            transform,
        });

        let surface = Surface {
            id: event.id,
            entity,
            group: CollisionGroup::HORIZONTAL,
            transform,
            mesh: event.boundary,
            local_bounds,
            world_bounds: world_bounds(&local_bounds, &transform),
        };
        log::info!(
            "Surface {:?} registered ({} triangles)",
            event.id,
            surface.mesh.indices.len() / 3
        );
        self.surfaces.insert(event.id, surface);
    }

    /// Nearest hit among surfaces whose group intersects `mask`
    pub fn raycast(&self, ray: &Ray, mask: CollisionGroup) -> Option<RayHit<SurfaceId>> {
        self.surfaces
            .values()
            .filter(|s| s.group.intersects(mask))
            .filter_map(|s| s.raycast(ray).map(|t| (s.id, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, distance)| RayHit {
                id,
                point: ray.at(distance),
                distance,
            })
    }

    pub fn get(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_event(id: u64, kind: SurfaceEventKind, height: f32) -> SurfaceEvent {
        SurfaceEvent {
            id: SurfaceId(id),
            kind,
            class: SurfaceClass::Horizontal,
            transform: Mat4::from_translation(Vec3::new(0.0, height, -1.0)),
            boundary: BoundaryMesh::rectangle(1.0, 1.0),
        }
    }

    fn down_from(x: f32, z: f32) -> Ray {
        Ray::new(Vec3::new(x, 2.0, z), Vec3::NEG_Y, 3.0).unwrap()
    }

    #[test]
    fn test_add_builds_collider_and_renderable() {
        let mut registry = SurfaceRegistry::new();
        let mut commands = Vec::new();
        registry.process(table_event(1, SurfaceEventKind::Added, 0.7), &mut commands);

        assert_eq!(registry.len(), 1);
        assert_eq!(commands.len(), 1);
        assert!(matches!(
            &commands[0],
            SceneCommand::Spawn { renderable: Renderable { material: Material::Occlusion, .. }, .. }
        ));

        let hit = registry
            .raycast(&down_from(0.1, -1.1), CollisionGroup::HORIZONTAL)
            .unwrap();
        assert_eq!(hit.id, SurfaceId(1));
        assert!((hit.point.y - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_update_moves_without_rebuilding() {
        let mut registry = SurfaceRegistry::new();
        let mut commands = Vec::new();
        registry.process(table_event(1, SurfaceEventKind::Added, 0.7), &mut commands);
        commands.clear();

        let mut update = table_event(1, SurfaceEventKind::Updated, 0.9);
        // Geometry on update is ignored
        update.boundary = BoundaryMesh::rectangle(0.1, 0.1);
        registry.process(update, &mut commands);

        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], SceneCommand::SetTransform { .. }));
        let hit = registry.raycast(&down_from(0.4, -1.4), CollisionGroup::ALL).unwrap();
        assert!((hit.point.y - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_remove_discards() {
        let mut registry = SurfaceRegistry::new();
        let mut commands = Vec::new();
        registry.process(table_event(1, SurfaceEventKind::Added, 0.7), &mut commands);
        registry.process(table_event(1, SurfaceEventKind::Removed, 0.7), &mut commands);
        assert!(registry.is_empty());
        assert!(matches!(commands.last(), Some(SceneCommand::Despawn { .. })));
        assert!(registry.raycast(&down_from(0.0, -1.0), CollisionGroup::ALL).is_none());
    }

    #[test]
    fn test_malformed_and_vertical_ignored() {
        let mut registry = SurfaceRegistry::new();
        let mut commands = Vec::new();

        let mut empty = table_event(1, SurfaceEventKind::Added, 0.7);
        empty.boundary = BoundaryMesh::default();
        registry.process(empty, &mut commands);

        let mut bad_index = table_event(2, SurfaceEventKind::Added, 0.7);
        bad_index.boundary.indices.push(99);
        bad_index.boundary.indices.extend([0, 1]);
        registry.process(bad_index, &mut commands);

        let mut wall = table_event(3, SurfaceEventKind::Added, 0.7);
        wall.class = SurfaceClass::Vertical;
        registry.process(wall, &mut commands);

        assert!(registry.is_empty());
        assert!(commands.is_empty());
    }

    #[test]
    fn test_small_planes_ignored() {
        let mut registry = SurfaceRegistry::new();
        let mut commands = Vec::new();

        let mut shelf = table_event(1, SurfaceEventKind::Added, 0.7);
        shelf.boundary = BoundaryMesh::rectangle(1.0, 0.15);
        registry.process(shelf, &mut commands);
        assert!(registry.is_empty());
        assert!(commands.is_empty());

        let mut stool = table_event(2, SurfaceEventKind::Added, 0.5);
        stool.boundary = BoundaryMesh::rectangle(0.2, 0.2);
        registry.process(stool, &mut commands);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_update_for_unknown_surface_registers_it() {
        let mut registry = SurfaceRegistry::new();
        let mut commands = Vec::new();
        registry.process(table_event(5, SurfaceEventKind::Updated, 0.5), &mut commands);
        assert!(registry.get(SurfaceId(5)).is_some());
    }

    #[test]
    fn test_mask_filters_and_nearest_wins() {
        let mut registry = SurfaceRegistry::new();
        let mut commands = Vec::new();
        registry.process(table_event(1, SurfaceEventKind::Added, 0.0), &mut commands);
        registry.process(table_event(2, SurfaceEventKind::Added, 0.8), &mut commands);

        let hit = registry
            .raycast(&down_from(0.0, -1.0), CollisionGroup::HORIZONTAL)
            .unwrap();
        assert_eq!(hit.id, SurfaceId(2));
        assert!(registry.raycast(&down_from(0.0, -1.0), CollisionGroup::NONE).is_none());
    }
}
