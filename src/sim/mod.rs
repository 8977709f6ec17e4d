//! Deterministic stack simulation
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Output goes through the event and scene command queues

pub mod slice;
pub mod state;
pub mod tick;

pub use slice::{SliceResult, grow, perfect_window, slice};
pub use state::{
    ActiveBlock, Axis, Footprint, GameEvent, GameOverReason, StackPhase, TowerState,
};
pub use tick::{TickInput, begin, handle_tap, restart, tick};
