//! Tower state and core simulation types
//!
//! Everything the stack engine mutates lives in [`TowerState`]. Board-local
//! coordinates: the tower axis is x = z = 0, the base slab sits at y = 0 and
//! block `n` is centered at y = n × block_height.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::renderer::{EntityId, EntityKind, SceneCommand, Transform};
use crate::tuning::Tuning;

/// Current phase of the stack engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackPhase {
    /// Waiting for the board origin
    Idle,
    /// Next tick spawns a block
    Spawning,
    /// A block is oscillating, waiting for a tap
    Moving,
    /// Run ended; a tap restarts
    GameOver,
}

/// Horizontal movement axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    /// Component of a board-local point along this axis
    #[inline]
    pub fn of(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Z => v.z,
        }
    }

    #[inline]
    pub fn of_mut(self, v: &mut Vec3) -> &mut f32 {
        match self {
            Axis::X => &mut v.x,
            Axis::Z => &mut v.z,
        }
    }

    /// Component of an (x, z) center along this axis
    #[inline]
    pub fn of_center(self, c: Vec2) -> f32 {
        match self {
            Axis::X => c.x,
            Axis::Z => c.y,
        }
    }

    #[inline]
    pub fn of_center_mut(self, c: &mut Vec2) -> &mut f32 {
        match self {
            Axis::X => &mut c.x,
            Axis::Z => &mut c.y,
        }
    }
}

/// Width (X) × depth (Z) of a block cross-section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: f32,
    pub depth: f32,
}

impl Footprint {
    pub const fn new(width: f32, depth: f32) -> Self {
        Self { width, depth }
    }

    pub fn from_array([width, depth]: [f32; 2]) -> Self {
        Self { width, depth }
    }

    #[inline]
    pub fn extent(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.width,
            Axis::Z => self.depth,
        }
    }

    /// Copy with one axis replaced
    pub fn with_extent(self, axis: Axis, extent: f32) -> Self {
        match axis {
            Axis::X => Self {
                width: extent,
                ..self
            },
            Axis::Z => Self {
                depth: extent,
                ..self
            },
        }
    }

    /// Smaller of the two dimensions
    #[inline]
    pub fn min_extent(&self) -> f32 {
        self.width.min(self.depth)
    }

    /// Box size for a block of the given height
    pub fn size(&self, height: f32) -> Vec3 {
        Vec3::new(self.width, height, self.depth)
    }
}

/// The block currently in play
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveBlock {
    pub id: EntityId,
    pub axis: Axis,
    /// +1 or -1 along `axis`
    pub direction: f32,
    /// Board-local center
    pub position: Vec3,
    pub footprint: Footprint,
    pub color: [f32; 4],
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// No overlap with the block below
    Missed,
    /// Overlap left a sliver below the minimum size
    TooThin,
}

/// Things the presentation layer reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A new block started moving
    Spawned { height: u32, level: u32 },
    /// A block was committed to the tower
    Placed {
        height: u32,
        perfect: bool,
        /// Perfect streak after this placement (0 after a growth bonus)
        streak: u32,
        /// Consecutive perfect placements, not reset by the growth bonus
        perfect_run: u32,
        offset: f32,
    },
    /// A partial placement cut off a fragment
    Sliced {
        axis: Axis,
        debris_center: f32,
        debris_extent: f32,
    },
    /// Perfect streak bonus widened the footprint
    Grew { footprint: Footprint },
    /// Blocks move faster from now on
    SpeedUp { speed: f32 },
    /// Run ended at this height
    GameOver { height: u32, reason: GameOverReason },
    /// Tower cleared, next tick spawns
    Restarted,
}

/// Complete stack engine state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TowerState {
    pub tuning: Tuning,
    pub phase: StackPhase,
    /// Blocks spawned this run (the moving block included)
    pub height: u32,
    /// Footprint of the last committed block
    pub footprint: Footprint,
    /// (x, z) center of the last committed block
    pub last_center: Vec2,
    /// Distance per tick
    pub speed: f32,
    /// Consecutive perfects toward the growth bonus
    pub streak: u32,
    /// Consecutive perfects, survives the growth bonus
    pub perfect_run: u32,
    /// Successful placements this run
    pub placements: u32,
    pub active: Option<ActiveBlock>,
    /// World position of the board (meters)
    pub origin: Vec3,
    /// Base slab entity, kept across restarts
    pub base: Option<EntityId>,
    /// Committed block entities, cleared on restart
    pub blocks: Vec<EntityId>,
    /// Events since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Scene commands since the last drain
    #[serde(skip)]
    pub commands: Vec<SceneCommand>,
    next_block: u32,
    next_debris: u32,
}

impl TowerState {
    /// Fresh engine waiting for a board origin
    pub fn new(tuning: Tuning) -> Self {
        let footprint = Footprint::from_array(tuning.initial_footprint);
        let speed = tuning.initial_speed;
        Self {
            tuning,
            phase: StackPhase::Idle,
            height: 0,
            footprint,
            last_center: Vec2::ZERO,
            speed,
            streak: 0,
            perfect_run: 0,
            placements: 0,
            active: None,
            origin: Vec3::ZERO,
            base: None,
            blocks: Vec::new(),
            events: Vec::new(),
            commands: Vec::new(),
            next_block: 0,
            next_debris: 0,
        }
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.phase == StackPhase::Moving
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.phase == StackPhase::GameOver
    }

    /// Displayed score
    pub fn score(&self) -> u32 {
        self.height
    }

    pub fn level(&self) -> u32 {
        self.tuning.level_for_height(self.height)
    }

    pub fn next_block_id(&mut self) -> EntityId {
        let id = EntityId::new(EntityKind::Block, self.next_block);
        self.next_block += 1;
        id
    }

    pub fn next_debris_id(&mut self) -> EntityId {
        let id = EntityId::new(EntityKind::Debris, self.next_debris);
        self.next_debris += 1;
        id
    }

    /// World transform of a block centered at a board-local point
    pub fn world_transform(&self, local: Vec3) -> Transform {
        let lift = Vec3::Y * (self.tuning.block_height / 2.0);
        Transform::from_translation(self.origin + (local + lift) * self.tuning.board_scale)
    }

    /// World size of a block with the given footprint
    pub fn world_size(&self, footprint: Footprint) -> Vec3 {
        footprint.size(self.tuning.block_height) * self.tuning.board_scale
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_commands(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_axis_access() {
        let fp = Footprint::new(1.0, 0.5);
        assert_eq!(fp.extent(Axis::X), 1.0);
        assert_eq!(fp.extent(Axis::Z), 0.5);
        let cut = fp.with_extent(Axis::Z, 0.25);
        assert_eq!(cut, Footprint::new(1.0, 0.25));
        assert_eq!(cut.min_extent(), 0.25);
    }

    #[test]
    fn test_world_transform_scales_and_lifts() {
        let mut state = TowerState::new(Tuning {
            board_scale: 0.5,
            block_height: 0.2,
            ..Default::default()
        });
        state.origin = Vec3::new(1.0, 0.7, -1.0);
        let t = state.world_transform(Vec3::new(0.4, 0.2, 0.0));
        assert!((t.translation - Vec3::new(1.2, 0.85, -1.0)).length() < 1e-6);
        assert_eq!(state.world_size(Footprint::new(1.0, 1.0)), Vec3::new(0.5, 0.1, 0.5));
    }

    #[test]
    fn test_state_snapshot_roundtrip() {
        let mut state = TowerState::new(Tuning::default());
        state.height = 7;
        state.streak = 2;
        let json = serde_json::to_string(&state).unwrap();
        let restored: TowerState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.height, 7);
        assert_eq!(restored.streak, 2);
        assert_eq!(restored.phase, StackPhase::Idle);
    }
}
