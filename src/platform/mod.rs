//! Platform abstraction layer
//!
//! Everything the host headset provides lives behind these seams:
//! - Viewer pose (live sensor feed or a fixed synthetic pose)
//! - Key-value storage for persisted records

pub mod pose;
pub mod storage;

pub use pose::{FixedPose, Pose, PoseSource, SensorFeed};
pub use storage::{JsonFileStore, MemoryStore, RecordStore, StoreError};
