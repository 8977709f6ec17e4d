//! Viewer pose sources
//!
//! The placement cursor only needs "where is the viewer and where are they
//! looking". On device that comes from the tracking sensor; in the simulator
//! and in tests it is a fixed synthetic pose. Both sit behind [`PoseSource`].

use glam::{Mat4, Quat, Vec3};

/// Viewer position and orientation in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose at `eye` looking toward `target` (world up is +Y).
    ///
    /// `target - eye` must not be parallel to +Y.
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        Self {
            position: eye,
            rotation,
        }
    }

    /// Decompose a rigid world transform (origin-from-device)
    pub fn from_matrix(transform: Mat4) -> Self {
        let (_, rotation, position) = transform.to_scale_rotation_translation();
        Self { position, rotation }
    }

    /// Forward axis (-Z in local space)
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }
}

/// Source of the viewer pose, queried once per tick
pub trait PoseSource {
    /// Current pose at `now` (seconds), or `None` if tracking is unavailable
    fn current_pose(&mut self, now: f64) -> Option<Pose>;

    /// Feed a device sample; synthetic sources ignore it
    fn record(&mut self, _timestamp: f64, _pose: Pose) {}
}

/// Synthetic pose that never moves (simulator / tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedPose {
    pub pose: Pose,
}

impl FixedPose {
    pub fn new(pose: Pose) -> Self {
        Self { pose }
    }
}

impl PoseSource for FixedPose {
    fn current_pose(&mut self, _now: f64) -> Option<Pose> {
        Some(self.pose)
    }
}

/// Live sensor feed: the host pushes timestamped samples, the cursor reads
/// the latest one as long as it is fresh enough.
#[derive(Debug, Clone)]
pub struct SensorFeed {
    latest: Option<(f64, Pose)>,
    max_age: f64,
}

impl Default for SensorFeed {
    fn default() -> Self {
        // Two frames at 60 Hz plus slack
        Self::new(0.05)
    }
}

impl SensorFeed {
    pub fn new(max_age: f64) -> Self {
        Self {
            latest: None,
            max_age,
        }
    }

    /// Record a new device sample
    pub fn push(&mut self, timestamp: f64, pose: Pose) {
        match self.latest {
            // Out-of-order samples are dropped
            Some((t, _)) if t > timestamp => {}
            _ => self.latest = Some((timestamp, pose)),
        }
    }

    /// Tracking lost
    pub fn clear(&mut self) {
        self.latest = None;
    }
}

impl PoseSource for SensorFeed {
    fn current_pose(&mut self, now: f64) -> Option<Pose> {
        let (timestamp, pose) = self.latest?;
        if now - timestamp > self.max_age {
            return None;
        }
        Some(pose)
    }

    fn record(&mut self, timestamp: f64, pose: Pose) {
        self.push(timestamp, pose);
    }
}
