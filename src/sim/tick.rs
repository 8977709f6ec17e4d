//! Fixed timestep stack engine
//!
//! `tick` advances the oscillating block; a tap either places it (while
//! moving) or restarts the run (after game over).

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::slice::{SliceResult, grow, perfect_window, slice};
use super::state::{ActiveBlock, Axis, Footprint, GameEvent, GameOverReason, StackPhase, TowerState};
use crate::consts::DEBRIS_LIFETIME;
use crate::renderer::{Material, Renderable, SceneCommand, colors};

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Tap (place while moving, restart after game over)
    pub tap: bool,
    /// Demo mode - taps on its own when the block lines up
    pub auto_play: bool,
}

/// Advance the engine by one fixed timestep
pub fn tick(state: &mut TowerState, input: &TickInput) {
    let tap = input.tap || (input.auto_play && auto_play_wants_tap(state));
    if tap {
        handle_tap(state);
    }

    match state.phase {
        StackPhase::Spawning => spawn(state),
        StackPhase::Moving => advance(state),
        StackPhase::Idle | StackPhase::GameOver => {}
    }
}

/// Anchor the tower at `origin` (world meters) and queue the first block
pub fn begin(state: &mut TowerState, origin: Vec3) {
    if state.phase != StackPhase::Idle {
        log::debug!("begin() ignored in {:?}", state.phase);
        return;
    }
    state.origin = origin;

    let id = state.next_block_id();
    let renderable = Renderable::cuboid(
        state.world_size(state.footprint),
        Material::Lit(colors::BASE_SLAB),
    );
    state.commands.push(SceneCommand::Spawn {
        id,
        renderable,
        transform: state.world_transform(Vec3::ZERO),
    });
    state.base = Some(id);
    state.phase = StackPhase::Spawning;
    log::info!("Tower anchored at {:?}", origin);
}

/// Route a tap by phase
pub fn handle_tap(state: &mut TowerState) {
    match state.phase {
        StackPhase::Moving => place(state),
        StackPhase::GameOver => restart(state),
        StackPhase::Idle | StackPhase::Spawning => {
            log::debug!("Tap ignored in {:?}", state.phase);
        }
    }
}

/// Spawn the next block at the edge of the board
pub fn spawn(state: &mut TowerState) {
    state.height += 1;
    let height = state.height;

    // North, east, south, west
    let (axis, direction) = match height % 4 {
        0 => (Axis::Z, 1.0),
        1 => (Axis::X, -1.0),
        2 => (Axis::Z, -1.0),
        _ => (Axis::X, 1.0),
    };

    let mut position = Vec3::new(
        state.last_center.x,
        height as f32 * state.tuning.block_height,
        state.last_center.y,
    );
    *axis.of_mut(&mut position) = -direction * state.tuning.spawn_distance;

    let color = block_color(state.tuning.color_seed, height);
    let id = state.next_block_id();
    let footprint = state.footprint;

    state.commands.push(SceneCommand::Spawn {
        id,
        renderable: Renderable::cuboid(state.world_size(footprint), Material::Lit(color)),
        transform: state.world_transform(position),
    });
    state.active = Some(ActiveBlock {
        id,
        axis,
        direction,
        position,
        footprint,
        color,
    });
    state.phase = StackPhase::Moving;
    state.events.push(GameEvent::Spawned {
        height,
        level: state.level(),
    });
}

/// Move the active block one step, bouncing at the bound
pub fn advance(state: &mut TowerState) {
    let speed = state.speed;
    let bound = state.tuning.move_bound;
    let Some(active) = state.active.as_mut() else {
        return;
    };

    let coord = active.axis.of_mut(&mut active.position);
    *coord += speed * active.direction;
    // Only turn around while heading outward
    if coord.abs() > bound && coord.signum() == active.direction {
        active.direction = -active.direction;
    }

    let (id, position) = (active.id, active.position);
    let transform = state.world_transform(position);
    state
        .commands
        .push(SceneCommand::SetTransform { id, transform });
}

/// Drop the active block onto the tower
pub fn place(state: &mut TowerState) {
    let Some(mut active) = state.active.take() else {
        return;
    };
    let axis = active.axis;
    let tolerance = state.tuning.perfect_tolerance;
    let min_extent = state.tuning.min_extent;
    let prev_center = axis.of_center(state.last_center);
    let extent = state.footprint.extent(axis);
    let position = axis.of(active.position);
    let offset = position - prev_center;

    let window = perfect_window(tolerance, extent, min_extent);
    let result = slice(prev_center, extent, position, window);

    // Work out the candidate placement before committing anything
    let (center, footprint, perfect, debris) = match result {
        SliceResult::Perfect => (prev_center, state.footprint, true, None),
        SliceResult::Partial {
            center,
            extent,
            debris_center,
            debris_extent,
        } => (
            center,
            state.footprint.with_extent(axis, extent),
            false,
            Some((debris_center, debris_extent)),
        ),
        SliceResult::Miss => {
            game_over(state, active, GameOverReason::Missed);
            return;
        }
    };

    if footprint.min_extent() <= min_extent {
        game_over(state, active, GameOverReason::TooThin);
        return;
    }

    // Commit
    *axis.of_mut(&mut active.position) = center;
    *axis.of_center_mut(&mut state.last_center) = center;
    state.footprint = footprint;
    state.placements += 1;

    // The moving entity is replaced by the committed, possibly trimmed, block
    state.commands.push(SceneCommand::Despawn { id: active.id });
    let material = if perfect {
        Material::Glow(colors::PERFECT_GLOW)
    } else {
        Material::Lit(active.color)
    };
    let block_id = state.next_block_id();
    state.commands.push(SceneCommand::Spawn {
        id: block_id,
        renderable: Renderable::cuboid(state.world_size(footprint), material),
        transform: state.world_transform(active.position),
    });
    state.blocks.push(block_id);

    if let Some((debris_center, debris_extent)) = debris {
        spawn_debris(state, &active, debris_center, debris_extent);
        state.events.push(GameEvent::Sliced {
            axis,
            debris_center,
            debris_extent,
        });
    }

    if perfect {
        state.streak += 1;
        state.perfect_run += 1;
        if state.streak >= state.tuning.streak_threshold {
            let max = Footprint::from_array(state.tuning.max_footprint);
            state.footprint = grow(state.footprint, state.tuning.growth_multiplier, max);
            state.streak = 0;
            state.events.push(GameEvent::Grew {
                footprint: state.footprint,
            });
            log::debug!("Perfect streak bonus: footprint {:?}", state.footprint);
        }
    } else {
        state.streak = 0;
        state.perfect_run = 0;
    }

    state.events.push(GameEvent::Placed {
        height: state.height,
        perfect,
        streak: state.streak,
        perfect_run: state.perfect_run,
        offset,
    });

    let every = state.tuning.speed_up_every;
    if every > 0 && state.placements % every == 0 {
        state.speed += state.tuning.speed_increment;
        state.events.push(GameEvent::SpeedUp { speed: state.speed });
    }

    spawn(state);
}

/// Clear the tower and queue a fresh first block
pub fn restart(state: &mut TowerState) {
    for id in state.blocks.drain(..) {
        state.commands.push(SceneCommand::Despawn { id });
    }
    if let Some(active) = state.active.take() {
        state.commands.push(SceneCommand::Despawn { id: active.id });
    }

    state.height = 0;
    state.footprint = Footprint::from_array(state.tuning.initial_footprint);
    state.speed = state.tuning.initial_speed;
    state.streak = 0;
    state.perfect_run = 0;
    state.placements = 0;
    state.last_center = Vec2::ZERO;
    state.phase = StackPhase::Spawning;
    state.events.push(GameEvent::Restarted);
    log::info!("Run restarted");
}

fn game_over(state: &mut TowerState, active: ActiveBlock, reason: GameOverReason) {
    // Frozen where it was dropped
    state.commands.push(SceneCommand::SetMaterial {
        id: active.id,
        material: Material::Frozen(colors::FROZEN),
    });
    state.active = Some(active);
    state.phase = StackPhase::GameOver;
    state.events.push(GameEvent::GameOver {
        height: state.height,
        reason,
    });
    log::info!("Game over at height {} ({:?})", state.height, reason);
}

/// Hand the cut-off piece to host physics
fn spawn_debris(state: &mut TowerState, active: &ActiveBlock, center: f32, extent: f32) {
    let axis = active.axis;
    let mut position = active.position;
    *axis.of_mut(&mut position) = center;
    // The untouched axis keeps the pre-cut size
    let footprint = active.footprint.with_extent(axis, extent);

    let id = state.next_debris_id();
    state.commands.push(SceneCommand::SpawnDebris {
        id,
        renderable: Renderable::cuboid(state.world_size(footprint), Material::Lit(active.color)),
        transform: state.world_transform(position),
        lifetime: DEBRIS_LIFETIME,
    });
}

/// Demo mode: tap once the block is close enough, restart right away
fn auto_play_wants_tap(state: &TowerState) -> bool {
    match state.phase {
        StackPhase::GameOver => true,
        StackPhase::Moving => state.active.as_ref().is_some_and(|active| {
            let offset = active.axis.of(active.position) - active.axis.of_center(state.last_center);
            // Faster blocks can skip over the perfect window
            let window = (state.tuning.perfect_tolerance / 2.0).max(state.speed);
            offset.abs() < window
        }),
        _ => false,
    }
}

/// Deterministic per-height block color
fn block_color(seed: u64, height: u32) -> [f32; 4] {
    let mut rng = Pcg32::seed_from_u64(seed.wrapping_add((height as u64).wrapping_mul(2654435761)));
    let hue: f32 = rng.random();
    let (r, g, b) = hsv_to_rgb(hue, 0.55, 0.95);
    [r, g, b, 1.0]
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let h6 = (h.fract() * 6.0).min(5.999);
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{EntityKind, Mesh};
    use crate::tuning::Tuning;

    fn started(tuning: Tuning) -> TowerState {
        let mut state = TowerState::new(tuning);
        begin(&mut state, Vec3::ZERO);
        tick(&mut state, &TickInput::default());
        state
    }

    /// Park the active block at an offset from the last center along its axis
    fn park(state: &mut TowerState, offset: f32) {
        let last = state.last_center;
        let active = state.active.as_mut().unwrap();
        let axis = active.axis;
        *axis.of_mut(&mut active.position) = axis.of_center(last) + offset;
    }

    fn tap(state: &mut TowerState) {
        tick(
            state,
            &TickInput {
                tap: true,
                ..Default::default()
            },
        );
    }

    #[test]
    fn test_begin_then_spawn() {
        let mut state = TowerState::new(Tuning::default());
        assert_eq!(state.phase, StackPhase::Idle);

        // Taps before the board exists do nothing
        tap(&mut state);
        assert_eq!(state.phase, StackPhase::Idle);

        begin(&mut state, Vec3::new(0.0, 0.7, -1.0));
        assert_eq!(state.phase, StackPhase::Spawning);
        assert!(state.base.is_some());

        tick(&mut state, &TickInput::default());
        assert_eq!(state.phase, StackPhase::Moving);
        assert_eq!(state.height, 1);
        let active = state.active.as_ref().unwrap();
        assert_eq!(active.axis, Axis::X);
        assert!((active.position.y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_spawn_cycles_directions() {
        let mut state = started(Tuning::default());
        let mut seen = Vec::new();
        for _ in 0..4 {
            let active = state.active.as_ref().unwrap();
            seen.push((active.axis, active.direction));
            park(&mut state, 0.0);
            tap(&mut state);
        }
        assert_eq!(
            seen,
            vec![
                (Axis::X, -1.0),
                (Axis::Z, -1.0),
                (Axis::X, 1.0),
                (Axis::Z, 1.0),
            ]
        );
        // Consecutive blocks alternate axes
        assert!(seen.windows(2).all(|w| w[0].0 != w[1].0));
    }

    #[test]
    fn test_block_oscillates() {
        let mut state = started(Tuning {
            spawn_distance: 1.0,
            move_bound: 1.0,
            initial_speed: 0.1,
            ..Default::default()
        });
        // Starts at +1.0 moving toward -X
        let start = state.active.as_ref().unwrap().position.x;
        assert!((start - 1.0).abs() < 1e-6);

        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        for _ in 0..60 {
            tick(&mut state, &TickInput::default());
            let x = state.active.as_ref().unwrap().position.x;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
        }
        // Crossed to the far side and came back; never runs away
        assert!(min_x < -1.0 && min_x > -1.2);
        assert!(max_x > 1.0 && max_x < 1.2);
        assert_eq!(state.phase, StackPhase::Moving);
        assert_eq!(state.height, 1);
    }

    #[test]
    fn test_spawn_beyond_bound_heads_inward() {
        let mut state = started(Tuning {
            spawn_distance: 3.0,
            move_bound: 1.0,
            initial_speed: 0.1,
            ..Default::default()
        });
        // Starts at +3.0, outside the bound, already heading for the tower
        for _ in 0..10 {
            tick(&mut state, &TickInput::default());
        }
        let active = state.active.as_ref().unwrap();
        assert!((active.position.x - 2.0).abs() < 1e-4);
        assert_eq!(active.direction, -1.0);
    }

    #[test]
    fn test_perfect_streak_grows_capped() {
        let mut state = started(Tuning::default());
        for expected in [1, 2] {
            park(&mut state, 0.0);
            tap(&mut state);
            assert_eq!(state.streak, expected);
            assert_eq!(state.footprint, Footprint::new(1.2, 1.2));
        }
        park(&mut state, 0.0);
        tap(&mut state);
        assert_eq!(state.streak, 0);
        assert_eq!(state.perfect_run, 3);
        assert_eq!(state.footprint, Footprint::new(1.2, 1.2));
        let grew = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Grew { .. }))
            .count();
        assert_eq!(grew, 1);
    }

    #[test]
    fn test_growth_after_trim() {
        let mut state = started(Tuning::default());
        // Trim width to 0.6
        park(&mut state, 0.6);
        tap(&mut state);
        assert!((state.footprint.width - 0.6).abs() < 1e-5);

        for _ in 0..3 {
            park(&mut state, 0.01);
            tap(&mut state);
        }
        // 0.6 * 2 = 1.2, 1.2 * 2 capped to 1.2
        assert!((state.footprint.width - 1.2).abs() < 1e-5);
        assert!((state.footprint.depth - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_partial_slice_scenario() {
        let mut state = started(Tuning {
            initial_footprint: [1.0, 1.0],
            max_footprint: [1.0, 1.0],
            board_scale: 1.0,
            ..Default::default()
        });
        assert_eq!(state.active.as_ref().unwrap().axis, Axis::X);
        park(&mut state, 0.3);
        state.drain_commands();
        tap(&mut state);

        assert!((state.footprint.width - 0.7).abs() < 1e-5);
        assert!((state.footprint.depth - 1.0).abs() < 1e-6);
        assert!((state.last_center.x - 0.15).abs() < 1e-5);
        assert_eq!(state.streak, 0);

        let debris = state
            .drain_commands()
            .into_iter()
            .find_map(|c| match c {
                SceneCommand::SpawnDebris {
                    id,
                    renderable,
                    transform,
                    ..
                } => Some((id, renderable, transform)),
                _ => None,
            })
            .unwrap();
        assert_eq!(debris.0.kind, EntityKind::Debris);
        match debris.1.mesh {
            Mesh::Box { size } => {
                assert!((size.x - 0.3).abs() < 1e-5);
                assert!((size.z - 1.0).abs() < 1e-6);
            }
            _ => panic!("debris should be a box"),
        }
        // Outer edge: [0.5, 0.8]
        assert!((debris.2.translation.x - 0.65).abs() < 1e-5);

        // Next block spawned on top
        assert_eq!(state.height, 2);
        assert_eq!(state.phase, StackPhase::Moving);
    }

    #[test]
    fn test_too_thin_is_game_over() {
        let mut state = started(Tuning {
            initial_footprint: [0.05, 0.05],
            max_footprint: [0.05, 0.05],
            ..Default::default()
        });
        // Default tolerance 0.05, min size 0.02
        park(&mut state, 0.04);
        tap(&mut state);

        assert_eq!(state.phase, StackPhase::GameOver);
        assert_eq!(state.footprint, Footprint::new(0.05, 0.05));
        assert_eq!(state.placements, 0);
        assert!(state.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::GameOver {
                reason: GameOverReason::TooThin,
                ..
            }
        )));
    }

    #[test]
    fn test_narrow_block_miss_is_game_over() {
        // Footprint narrower than the perfect tolerance
        let mut state = started(Tuning {
            initial_footprint: [0.04, 0.04],
            max_footprint: [0.04, 0.04],
            ..Default::default()
        });
        park(&mut state, 0.045);
        tap(&mut state);

        assert_eq!(state.phase, StackPhase::GameOver);
        assert_eq!(state.streak, 0);
        assert_eq!(state.placements, 0);
        assert_eq!(state.footprint, Footprint::new(0.04, 0.04));
        assert!(state.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::GameOver {
                reason: GameOverReason::Missed,
                ..
            }
        )));
    }

    #[test]
    fn test_narrow_block_still_snaps_when_close() {
        let mut state = started(Tuning {
            initial_footprint: [0.05, 0.05],
            max_footprint: [0.05, 0.05],
            ..Default::default()
        });
        park(&mut state, 0.01);
        tap(&mut state);
        assert_eq!(state.phase, StackPhase::Moving);
        assert_eq!(state.streak, 1);
        assert_eq!(state.footprint, Footprint::new(0.05, 0.05));
    }

    #[test]
    fn test_full_miss_freezes() {
        let mut state = started(Tuning::default());
        park(&mut state, 1.2);
        let before = state.active.as_ref().unwrap().position;
        state.drain_commands();
        tap(&mut state);

        assert_eq!(state.phase, StackPhase::GameOver);
        assert_eq!(state.footprint, Footprint::new(1.2, 1.2));
        assert_eq!(state.height, 1);
        let frozen = state.active.as_ref().unwrap();
        assert_eq!(frozen.position, before);

        let commands = state.drain_commands();
        assert!(commands.iter().any(|c| matches!(
            c,
            SceneCommand::SetMaterial {
                material: Material::Frozen(_),
                ..
            }
        )));
        assert!(!commands.iter().any(|c| matches!(c, SceneCommand::Spawn { .. })));

        // Ticks do not move a frozen block
        for _ in 0..10 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.active.as_ref().unwrap().position, before);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut state = started(Tuning {
            speed_up_every: 1,
            ..Default::default()
        });
        park(&mut state, 0.3);
        tap(&mut state);
        park(&mut state, 0.0);
        tap(&mut state);
        assert!(state.speed > state.tuning.initial_speed);
        park(&mut state, 5.0);
        tap(&mut state);
        assert_eq!(state.phase, StackPhase::GameOver);
        state.drain_commands();

        // Restart tap
        let mut after_tap = state.clone();
        handle_tap(&mut after_tap);
        assert_eq!(after_tap.height, 0);
        assert_eq!(after_tap.footprint, Footprint::new(1.2, 1.2));
        assert_eq!(after_tap.speed, after_tap.tuning.initial_speed);
        assert_eq!(after_tap.streak, 0);
        assert_eq!(after_tap.phase, StackPhase::Spawning);
        assert!(after_tap.blocks.is_empty());
        let despawns = after_tap
            .drain_commands()
            .into_iter()
            .filter(|c| matches!(c, SceneCommand::Despawn { .. }))
            .count();
        // Two committed blocks plus the frozen one
        assert_eq!(despawns, 3);

        // Next tick spawns the first block again
        tick(&mut after_tap, &TickInput::default());
        assert_eq!(after_tap.height, 1);
        assert_eq!(after_tap.phase, StackPhase::Moving);
    }

    #[test]
    fn test_speed_up_cadence() {
        let mut state = started(Tuning {
            speed_up_every: 5,
            speed_increment: 0.002,
            ..Default::default()
        });
        for _ in 0..4 {
            park(&mut state, 0.0);
            tap(&mut state);
        }
        assert_eq!(state.speed, 0.02);
        park(&mut state, 0.0);
        tap(&mut state);
        assert!((state.speed - 0.022).abs() < 1e-6);
    }

    #[test]
    fn test_auto_play_places_blocks() {
        let mut state = started(Tuning::default());
        let input = TickInput {
            auto_play: true,
            ..Default::default()
        };
        for _ in 0..2000 {
            tick(&mut state, &input);
        }
        assert!(state.placements > 0 || state.height > 1);
    }

    #[test]
    fn test_block_colors_deterministic() {
        assert_eq!(block_color(7, 3), block_color(7, 3));
        let c = block_color(7, 3);
        assert!(c.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
