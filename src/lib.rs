//! Tower Stack - A tabletop AR tower-stacking game
//!
//! Core modules:
//! - `ar`: Surface registry and placement cursor (plane events → colliders → board origin)
//! - `sim`: Deterministic stack simulation (spawn, oscillate, slice, score)
//! - `ui`: Presentation adapter (HUD text, banners, audio cues, records)
//! - `renderer`: Scene command queue and host-facing instance data
//! - `platform`: Pose sources and key-value storage supplied by the host
//! - `tuning`: Data-driven game balance

pub mod ar;
pub mod audio;
pub mod platform;
pub mod records;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use records::Records;
pub use session::GameSession;
pub use settings::Settings;
pub use tuning::Tuning;

use glam::{Quat, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the headset frame cadence)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta fed into the accumulator
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Smallest plane (either horizontal axis, meters) that can hold the board
    pub const MIN_SURFACE_EXTENT: f32 = 0.2;

    /// Placement ray length (meters)
    pub const CURSOR_RAY_LENGTH: f32 = 3.0;
    /// Cursor slab dimensions (meters)
    pub const CURSOR_SIZE: [f32; 3] = [0.4, 0.05, 0.4];
    /// Cursor tint (translucent green)
    pub const CURSOR_COLOR: [f32; 4] = [0.2, 0.9, 0.3, 0.6];

    /// Debris lifetime before the host discards it (seconds)
    pub const DEBRIS_LIFETIME: f32 = 2.0;
}

/// Strip pitch and roll from a rotation, keeping only the heading around +Y.
///
/// Uses the rotated local Z axis projected onto the floor. When that axis is
/// (nearly) vertical the heading is undefined and identity is returned.
pub fn yaw_only(rotation: Quat) -> Quat {
    let z = rotation * Vec3::Z;
    let flat = Vec3::new(z.x, 0.0, z.z);
    if flat.length_squared() < 1e-8 {
        return Quat::IDENTITY;
    }
    let flat = flat.normalize();
    Quat::from_rotation_y(flat.x.atan2(flat.z))
}
