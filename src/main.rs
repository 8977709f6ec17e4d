//! Tower Stack headless demo
//!
//! Drives a full session without a headset: a synthetic viewer looks at a
//! synthetic table, the board is placed on it, and auto-play stacks blocks.
//! Scene commands are mirrored into a `RenderList` the way a host renderer
//! would consume them.
//!
//! Usage: `tower-stack [seconds] [--tuning FILE] [--settings FILE] [--records FILE]`

use std::path::PathBuf;

use clap::Parser;
use glam::{Mat4, Vec3};
use tower_stack::ar::{BoundaryMesh, SurfaceClass, SurfaceEvent, SurfaceEventKind, SurfaceId};
use tower_stack::audio::SilentBackend;
use tower_stack::consts::SIM_DT;
use tower_stack::platform::{FixedPose, JsonFileStore, MemoryStore, Pose, RecordStore};
use tower_stack::renderer::{EntityKind, RenderList};
use tower_stack::session::{GameSession, Services, SessionPhase};
use tower_stack::ui::{HudFrame, HudView};
use tower_stack::{Settings, Tuning};

/// Table top in front of the viewer (meters)
const TABLE_CENTER: Vec3 = Vec3::new(0.0, 0.72, -0.9);
/// Viewer eye height (meters)
const EYE: Vec3 = Vec3::new(0.0, 1.55, 0.0);

/// Headless Tower Stack demo with auto-play.
#[derive(Debug, Parser)]
#[command(name = "tower-stack", version, about)]
struct Args {
    /// Seconds of simulated play.
    #[arg(value_name = "SECONDS", default_value_t = 60.0)]
    seconds: f32,
    /// Gameplay tuning JSON (defaults when absent).
    #[arg(long, value_name = "FILE")]
    tuning: Option<PathBuf>,
    /// Player settings JSON (defaults when absent).
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// Records JSON file; records stay in memory when absent.
    #[arg(long, value_name = "FILE")]
    records: Option<PathBuf>,
}

/// Prints the HUD through the log whenever it changes
#[derive(Default)]
struct LogHud {
    last_banners: Vec<String>,
}

impl HudView for LogHud {
    fn render(&mut self, frame: &HudFrame) {
        let banners: Vec<String> = frame.banners.iter().map(|b| b.text.clone()).collect();
        if banners != self.last_banners {
            for text in banners.iter().filter(|t| !self.last_banners.contains(t)) {
                log::info!("[banner] {}", text);
            }
            self.last_banners = banners;
        }
        let level = frame.level_text().unwrap_or_default();
        log::debug!(
            "[hud] {} {} | {} | streak {}",
            frame.score_text(),
            level,
            frame.records_text(),
            frame.streak
        );
    }
}

fn open_store(path: Option<PathBuf>) -> Box<dyn RecordStore> {
    let Some(path) = path else {
        return Box::new(MemoryStore::new());
    };
    match JsonFileStore::open(&path) {
        Ok(store) => {
            log::info!("Records file: {}", path.display());
            Box::new(store)
        }
        Err(e) => {
            log::warn!("Cannot open {}: {} - records stay in memory", path.display(), e);
            Box::new(MemoryStore::new())
        }
    }
}

fn table_event() -> SurfaceEvent {
    SurfaceEvent {
        id: SurfaceId(1),
        kind: SurfaceEventKind::Added,
        class: SurfaceClass::Horizontal,
        transform: Mat4::from_translation(TABLE_CENTER),
        boundary: BoundaryMesh::rectangle(1.2, 0.8),
    }
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Tower Stack (headless) starting...");

    let args = Args::parse();
    let tuning = args
        .tuning
        .as_deref()
        .map(Tuning::load_or_default)
        .unwrap_or_default();
    let settings = args
        .settings
        .as_deref()
        .map(Settings::load)
        .unwrap_or_default();
    let seconds = args.seconds.max(0.0);

    let services = Services {
        poses: Box::new(FixedPose::new(Pose::looking_at(EYE, TABLE_CENTER))),
        audio: Box::new(SilentBackend),
        store: open_store(args.records),
        hud: Box::new(LogHud::default()),
    };
    let mut session = GameSession::new(tuning, settings, services);
    let mut scene = RenderList::new();

    session.handle_surface_event(table_event());

    // 72 Hz display refresh, decoupled from the 60 Hz tick
    let frame_dt = 1.0 / 72.0;
    let frames = (seconds / frame_dt) as u32;
    let mut clock = 0.0f64;

    for _ in 0..frames {
        clock += frame_dt as f64;
        session.update(frame_dt, clock);

        if session.phase() == SessionPhase::Scanning && session.cursor().placement().enabled {
            // Pretend the player pinched as soon as the cursor shows up
            session.tap();
            session.set_auto_play(true);
        }

        scene.apply_all(session.drain_commands());
        scene.advance(frame_dt);
    }

    let tower = session.tower();
    let records = session.presenter().records();
    log::info!(
        "Ran {:.1}s ({} ticks/s): height {}, {} placements, level {}",
        seconds,
        (1.0 / SIM_DT).round(),
        tower.score(),
        tower.placements,
        tower.level()
    );
    log::info!(
        "Best height {}, best combo {}",
        records.best_height,
        records.best_combo
    );
    log::info!(
        "Scene: {} blocks, {} debris, {} bytes of instance data",
        scene.count(EntityKind::Block),
        scene.count(EntityKind::Debris),
        scene.instance_bytes().len()
    );
}
