//! Data-driven game balance
//!
//! Every gameplay constant of the stack simulation lives here so a host can
//! ship a JSON override without rebuilding.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Gameplay constants for the stack simulation.
///
/// Distances are in board units; `board_scale` converts them to meters when
/// the board is placed in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Footprint (width, depth) of the base slab and of the first block
    pub initial_footprint: [f32; 2],
    /// Upper bound for footprint growth on each axis
    pub max_footprint: [f32; 2],
    /// Vertical size of every block
    pub block_height: f32,
    /// Distance from the tower axis where a new block starts
    pub spawn_distance: f32,
    /// Oscillation bound: direction flips once |coordinate| exceeds it
    pub move_bound: f32,
    /// Distance travelled per tick at the start of a run
    pub initial_speed: f32,
    /// Speed added every `speed_up_every` successful placements
    pub speed_increment: f32,
    /// Successful placements between speed increases (0 disables)
    pub speed_up_every: u32,
    /// Offsets below this count as perfect placements
    pub perfect_tolerance: f32,
    /// Consecutive perfects needed for the growth bonus
    pub streak_threshold: u32,
    /// Footprint multiplier applied by the growth bonus
    pub growth_multiplier: f32,
    /// Any footprint dimension below this ends the run
    pub min_extent: f32,
    /// Blocks per level
    pub level_block_size: u32,
    /// Meters per board unit
    pub board_scale: f32,
    /// Seed for block colors
    pub color_seed: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            initial_footprint: [1.2, 1.2],
            max_footprint: [1.2, 1.2],
            block_height: 0.2,
            spawn_distance: 2.0,
            move_bound: 2.0,
            initial_speed: 0.02,
            speed_increment: 0.002,
            speed_up_every: 5,
            perfect_tolerance: 0.05,
            streak_threshold: 3,
            growth_multiplier: 2.0,
            min_extent: 0.02,
            level_block_size: 10,
            board_scale: 0.25,
            color_seed: 0x5EED_B10C,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load tuning from a JSON file, falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    tuning
                }
                Err(e) => {
                    log::warn!("Invalid tuning file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("No tuning file at {} ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Level for a given tower height (level 1 until the first block is spawned)
    pub fn level_for_height(&self, height: u32) -> u32 {
        let per_level = self.level_block_size.max(1);
        height.saturating_sub(1) / per_level + 1
    }
}
