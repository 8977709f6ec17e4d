//! Presenter: engine events in, HUD frames and audio cues out

use glam::Vec3;

use super::hud::{Banner, BannerKind, HudFrame, HudView};
use crate::audio::{AudioManager, SoundCue};
use crate::platform::RecordStore;
use crate::records::Records;
use crate::settings::Settings;
use crate::sim::{GameEvent, TowerState};

pub struct Presenter {
    audio: AudioManager,
    records: Records,
    store: Box<dyn RecordStore>,
    hud: Box<dyn HudView>,
    settings: Settings,
    banners: Vec<Banner>,
    /// NEW BEST already shown this run (height, combo)
    announced: (bool, bool),
    last_frame: Option<HudFrame>,
}

impl Presenter {
    /// Records are read from `store` once, here
    pub fn new(
        mut audio: AudioManager,
        store: Box<dyn RecordStore>,
        hud: Box<dyn HudView>,
        settings: Settings,
    ) -> Self {
        let records = Records::load(store.as_ref());
        audio.set_volume(settings.effective_volume());
        Self {
            audio,
            records,
            store,
            hud,
            settings,
            banners: Vec::new(),
            announced: (false, false),
            last_frame: None,
        }
    }

    pub fn records(&self) -> Records {
        self.records
    }

    pub fn banners(&self) -> &[Banner] {
        &self.banners
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.audio.set_volume(settings.effective_volume());
        self.settings = settings;
    }

    /// React to a batch of engine events, then redraw if anything changed
    pub fn observe(&mut self, state: &TowerState, events: &[GameEvent], now: f64) {
        for event in events {
            self.handle_event(state, event, now);
        }
        self.refresh(state, now);
    }

    /// Drop expired banners and redraw if the frame changed
    pub fn refresh(&mut self, state: &TowerState, now: f64) {
        self.banners.retain(|banner| !banner.is_expired(now));
        let frame = self.frame(state);
        if self.last_frame.as_ref() != Some(&frame) {
            self.hud.render(&frame);
            self.last_frame = Some(frame);
        }
    }

    /// Snapshot for the HUD
    pub fn frame(&self, state: &TowerState) -> HudFrame {
        HudFrame {
            score: state.score(),
            level: self.settings.show_level.then(|| state.level()),
            best_height: self.records.best_height,
            best_combo: self.records.best_combo,
            streak: state.streak,
            game_over: state.is_game_over(),
            banners: self.banners.clone(),
        }
    }

    fn handle_event(&mut self, state: &TowerState, event: &GameEvent, now: f64) {
        match *event {
            GameEvent::Placed {
                height,
                perfect,
                perfect_run,
                ..
            } => {
                let at = tower_top(state);
                self.audio.play(SoundCue::Hit, at);
                if perfect {
                    self.audio.play(SoundCue::Perfect, at);
                    self.show(BannerKind::Perfect, now);
                    if perfect_run >= 2 {
                        self.show(BannerKind::Combo(perfect_run), now);
                    }
                }

                let mut beaten = false;
                if self.records.submit_height(height, self.store.as_mut()) && !self.announced.0 {
                    self.announced.0 = true;
                    beaten = true;
                }
                if self.records.submit_combo(perfect_run, self.store.as_mut()) && !self.announced.1 {
                    self.announced.1 = true;
                    beaten = true;
                }
                if beaten {
                    log::info!(
                        "New record: height {}, combo {}",
                        self.records.best_height,
                        self.records.best_combo
                    );
                    self.audio.play(SoundCue::NewRecord, at);
                    self.show(BannerKind::NewBest, now);
                }
            }
            GameEvent::GameOver { height, reason } => {
                log::info!("Game over at height {} ({:?})", height, reason);
                self.audio.play(SoundCue::GameOver, tower_top(state));
                self.show(BannerKind::GameOver, now);
            }
            GameEvent::Restarted => {
                // Transient banners run out on their own
                self.banners.retain(|b| b.kind != BannerKind::GameOver);
                self.announced = (false, false);
            }
            GameEvent::Spawned { .. }
            | GameEvent::Sliced { .. }
            | GameEvent::Grew { .. }
            | GameEvent::SpeedUp { .. } => {}
        }
    }

    fn show(&mut self, kind: BannerKind, now: f64) {
        // One banner per kind; a repeat restarts its timer
        self.banners.retain(|b| !same_slot(b.kind, kind));
        self.banners
            .push(Banner::new(kind, now, self.settings.banner_duration));
    }
}

fn same_slot(a: BannerKind, b: BannerKind) -> bool {
    std::mem::discriminant(&a) == std::mem::discriminant(&b)
}

/// World position of the last committed block
fn tower_top(state: &TowerState) -> Vec3 {
    let y = state.height.saturating_sub(1) as f32 * state.tuning.block_height;
    let local = Vec3::new(state.last_center.x, y, state.last_center.y);
    state.world_transform(local).translation
}
