//! Game session
//!
//! Owns the registry, cursor, engine and presenter and drives them from the
//! host frame loop with a fixed-step accumulator. A single tap input is
//! routed by phase: it confirms the cursor while scanning, then goes to the
//! engine.

use crate::ar::{PlacementCursor, SurfaceEvent, SurfaceRegistry};
use crate::audio::{AudioBackend, AudioManager};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::platform::{Pose, PoseSource, RecordStore};
use crate::renderer::SceneCommand;
use crate::settings::Settings;
use crate::sim::{TickInput, TowerState, begin, tick};
use crate::tuning::Tuning;
use crate::ui::{HudView, Presenter};

/// Top-level session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Looking for a surface to put the board on
    Scanning,
    /// Board placed, the engine owns the taps
    Playing,
}

/// Host-facing services handed to a session
pub struct Services {
    pub poses: Box<dyn PoseSource>,
    pub audio: Box<dyn AudioBackend>,
    pub store: Box<dyn RecordStore>,
    pub hud: Box<dyn HudView>,
}

pub struct GameSession {
    phase: SessionPhase,
    registry: SurfaceRegistry,
    cursor: PlacementCursor,
    poses: Box<dyn PoseSource>,
    tower: TowerState,
    presenter: Presenter,
    input: TickInput,
    accumulator: f32,
    reward_flash: bool,
    commands: Vec<SceneCommand>,
}

impl GameSession {
    pub fn new(tuning: Tuning, settings: Settings, services: Services) -> Self {
        let Services {
            poses,
            audio,
            store,
            hud,
        } = services;
        let audio = AudioManager::new(audio, settings.effective_volume());
        let reward_flash = settings.effective_reward_flash();
        log::info!("Session started, scanning for surfaces");
        Self {
            phase: SessionPhase::Scanning,
            registry: SurfaceRegistry::new(),
            cursor: PlacementCursor::new(),
            poses,
            tower: TowerState::new(tuning),
            presenter: Presenter::new(audio, store, hud, settings),
            input: TickInput::default(),
            accumulator: 0.0,
            reward_flash,
            commands: Vec::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn tower(&self) -> &TowerState {
        &self.tower
    }

    pub fn cursor(&self) -> &PlacementCursor {
        &self.cursor
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.reward_flash = settings.effective_reward_flash();
        self.presenter.set_settings(settings);
    }

    /// Demo mode: the engine taps for itself
    pub fn set_auto_play(&mut self, enabled: bool) {
        self.input.auto_play = enabled;
        log::info!("Auto-play: {}", enabled);
    }

    /// Forward a device pose sample to the pose source
    pub fn push_pose(&mut self, timestamp: f64, pose: Pose) {
        self.poses.record(timestamp, pose);
    }

    /// Apply one scanner event (in arrival order)
    pub fn handle_surface_event(&mut self, event: SurfaceEvent) {
        self.registry.process(event, &mut self.commands);
    }

    /// The player's single input
    pub fn tap(&mut self) {
        match self.phase {
            SessionPhase::Scanning => {
                let Some(origin) = self.cursor.confirm(&mut self.commands) else {
                    return;
                };
                begin(&mut self.tower, origin);
                self.commands.extend(self.tower.drain_commands());
                self.phase = SessionPhase::Playing;
                log::info!("Board placed, game on");
            }
            // Consumed by the next tick
            SessionPhase::Playing => self.input.tap = true,
        }
    }

    /// Run fixed ticks for a host frame of `frame_dt` seconds ending at `now`
    pub fn update(&mut self, frame_dt: f32, now: f64) {
        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step(now);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.tap = false;
        }
        // Whatever the cap left over is dropped
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        self.presenter.refresh(&self.tower, now);
    }

    fn step(&mut self, now: f64) {
        match self.phase {
            SessionPhase::Scanning => {
                self.cursor
                    .update(self.poses.as_mut(), now, &self.registry, &mut self.commands);
            }
            SessionPhase::Playing => {
                tick(&mut self.tower, &self.input);
                let events = self.tower.drain_events();
                if !events.is_empty() {
                    self.presenter.observe(&self.tower, &events, now);
                }
                self.commands.extend(self.tower.drain_commands());
            }
        }
    }

    /// Scene commands since the last call, in order
    pub fn drain_commands(&mut self) -> Vec<SceneCommand> {
        let commands = std::mem::take(&mut self.commands);
        if self.reward_flash {
            return commands;
        }
        commands.into_iter().map(without_flash).collect()
    }
}

fn without_flash(command: SceneCommand) -> SceneCommand {
    match command {
        SceneCommand::Spawn {
            id,
            mut renderable,
            transform,
        } => {
            renderable.material = renderable.material.steady();
            SceneCommand::Spawn {
                id,
                renderable,
                transform,
            }
        }
        SceneCommand::SetMaterial { id, material } => SceneCommand::SetMaterial {
            id,
            material: material.steady(),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::{BoundaryMesh, CursorState, SurfaceClass, SurfaceEventKind, SurfaceId};
    use crate::audio::SilentBackend;
    use crate::platform::{FixedPose, MemoryStore, SensorFeed};
    use crate::renderer::{EntityKind, Material, RenderList};
    use crate::sim::StackPhase;
    use crate::ui::NullHud;
    use glam::{Mat4, Vec3};

    const TABLE: Vec3 = Vec3::new(0.0, 0.7, -1.0);

    fn services(pose: Pose) -> Services {
        Services {
            poses: Box::new(FixedPose::new(pose)),
            audio: Box::new(SilentBackend),
            store: Box::new(MemoryStore::new()),
            hud: Box::new(NullHud),
        }
    }

    fn table_event(kind: SurfaceEventKind) -> SurfaceEvent {
        SurfaceEvent {
            id: SurfaceId(7),
            kind,
            class: SurfaceClass::Horizontal,
            transform: Mat4::from_translation(TABLE),
            boundary: BoundaryMesh::rectangle(1.5, 1.0),
        }
    }

    fn session(settings: Settings) -> GameSession {
        let eye = Pose::looking_at(Vec3::new(0.0, 1.5, 0.0), TABLE);
        GameSession::new(Tuning::default(), settings, services(eye))
    }

    fn run(session: &mut GameSession, frames: u32, clock: &mut f64) {
        for _ in 0..frames {
            *clock += SIM_DT as f64;
            session.update(SIM_DT, *clock);
        }
    }

    fn placed_session() -> (GameSession, f64) {
        let mut s = session(Settings::default());
        let mut clock = 0.0;
        s.handle_surface_event(table_event(SurfaceEventKind::Added));
        run(&mut s, 1, &mut clock);
        s.tap();
        (s, clock)
    }

    #[test]
    fn test_scanning_then_confirm_starts_game() {
        let mut s = session(Settings::default());
        let mut clock = 0.0;

        // Nothing to hit yet
        run(&mut s, 2, &mut clock);
        assert_eq!(s.cursor().state(), CursorState::Idle);
        s.tap();
        assert_eq!(s.phase(), SessionPhase::Scanning);

        s.handle_surface_event(table_event(SurfaceEventKind::Added));
        run(&mut s, 1, &mut clock);
        assert_eq!(s.cursor().state(), CursorState::Tracking);

        s.tap();
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert_eq!(s.tower().phase, StackPhase::Spawning);
        assert!((s.tower().origin - TABLE).length() < 0.05);

        run(&mut s, 1, &mut clock);
        assert_eq!(s.tower().phase, StackPhase::Moving);
        assert_eq!(s.tower().height, 1);
    }

    #[test]
    fn test_host_mirror_sees_whole_scene() {
        let (mut s, mut clock) = placed_session();
        run(&mut s, 1, &mut clock);

        let mut list = RenderList::new();
        list.apply_all(s.drain_commands());
        assert_eq!(list.count(EntityKind::Surface), 1);
        assert_eq!(list.count(EntityKind::Cursor), 1);
        // Base slab and the moving block
        assert_eq!(list.count(EntityKind::Block), 2);
        assert!(s.drain_commands().is_empty());
    }

    #[test]
    fn test_frame_dt_is_clamped() {
        let (mut s, clock) = placed_session();
        s.update(5.0, clock + 5.0);
        let tower = s.tower();
        assert_eq!(tower.height, 1);
        let Some(active) = tower.active.as_ref() else {
            panic!("block should be moving");
        };
        // One spawn tick then a handful of moves, nowhere near 5 s worth
        let travelled = (active.position.x - tower.tuning.spawn_distance).abs();
        assert!(travelled <= tower.tuning.initial_speed * MAX_SUBSTEPS as f32 + 1e-4);
    }

    #[test]
    fn test_tap_goes_to_engine_after_placement() {
        let (mut s, mut clock) = placed_session();
        // Let the block travel most of the way, then drop it
        run(&mut s, 80, &mut clock);
        s.tap();
        run(&mut s, 1, &mut clock);
        assert_eq!(s.tower().placements, 1);
        assert_eq!(s.tower().height, 2);
    }

    #[test]
    fn test_auto_play_builds_a_tower() {
        let (mut s, mut clock) = placed_session();
        s.set_auto_play(true);
        run(&mut s, 60 * 30, &mut clock);
        assert!(s.tower().placements >= 5);
        assert!(s.presenter().records().best_height >= 5);
    }

    #[test]
    fn test_reduced_motion_drops_glow() {
        let (mut s, mut clock) = placed_session();
        s.set_settings(Settings {
            reduced_motion: true,
            ..Default::default()
        });
        s.set_auto_play(true);
        run(&mut s, 60 * 5, &mut clock);
        assert!(s.tower().placements >= 1);

        let glowing = s.drain_commands().into_iter().any(|c| {
            matches!(
                c,
                SceneCommand::Spawn {
                    renderable: crate::renderer::Renderable {
                        material: Material::Glow(_),
                        ..
                    },
                    ..
                }
            )
        });
        assert!(!glowing);
    }

    #[test]
    fn test_live_feed_drives_cursor() {
        let mut s = GameSession::new(
            Tuning::default(),
            Settings::default(),
            Services {
                poses: Box::new(SensorFeed::new(0.05)),
                ..services(Pose::new(Vec3::ZERO, glam::Quat::IDENTITY))
            },
        );
        let mut clock = 0.0;
        s.handle_surface_event(table_event(SurfaceEventKind::Added));

        // No samples yet
        run(&mut s, 1, &mut clock);
        assert_eq!(s.cursor().state(), CursorState::Idle);

        let eye = Vec3::new(0.0, 1.5, 0.0);
        s.push_pose(clock, Pose::looking_at(eye, TABLE));
        run(&mut s, 1, &mut clock);
        assert_eq!(s.cursor().state(), CursorState::Tracking);

        // Samples stop: the stale pose is dropped and the cursor holds
        run(&mut s, 60, &mut clock);
        assert_eq!(s.cursor().state(), CursorState::Tracking);
        assert!(s.cursor().placement().enabled);

        // Fresh sample looking away from the table
        s.push_pose(clock, Pose::looking_at(eye, Vec3::new(0.0, 3.0, -1.0)));
        run(&mut s, 1, &mut clock);
        assert_eq!(s.cursor().state(), CursorState::Idle);
    }

    #[test]
    fn test_surface_removed_while_scanning() {
        let mut s = session(Settings::default());
        let mut clock = 0.0;
        s.handle_surface_event(table_event(SurfaceEventKind::Added));
        run(&mut s, 1, &mut clock);
        assert_eq!(s.cursor().state(), CursorState::Tracking);

        s.handle_surface_event(table_event(SurfaceEventKind::Removed));
        run(&mut s, 1, &mut clock);
        assert!(s.registry().is_empty());
        assert_eq!(s.cursor().state(), CursorState::Idle);
    }
}
