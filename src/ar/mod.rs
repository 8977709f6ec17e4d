//! Surface scanning and board placement
//!
//! Plane events become static colliders in the [`SurfaceRegistry`]; the
//! [`PlacementCursor`] raycasts against them each tick until the player
//! confirms a spot for the board.

pub mod cursor;
pub mod raycast;
pub mod surface;

pub use cursor::{CursorState, PlacementCursor, PlacementState};
pub use raycast::{Aabb, Ray, RayHit};
pub use surface::{
    BoundaryMesh, CollisionGroup, Surface, SurfaceClass, SurfaceEvent, SurfaceEventKind,
    SurfaceId, SurfaceRegistry,
};
