//! Audio cues
//!
//! Clips are loaded once into an [`AudioTable`] owned by the presentation
//! layer. Playback goes through the host's [`AudioBackend`]; a missing clip is
//! reported at load time and silently skipped afterwards.

use std::collections::HashMap;

use glam::Vec3;

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Block placed
    Hit,
    /// Block placed perfectly
    Perfect,
    /// Run ended
    GameOver,
    /// Best height or best combo beaten
    NewRecord,
}

impl SoundCue {
    pub const ALL: [SoundCue; 4] = [
        SoundCue::Hit,
        SoundCue::Perfect,
        SoundCue::GameOver,
        SoundCue::NewRecord,
    ];

    /// Bundled asset name
    pub fn clip_name(&self) -> &'static str {
        match self {
            SoundCue::Hit => "hit.mp3",
            SoundCue::Perfect => "perfect.mp3",
            SoundCue::GameOver => "gameover.mp3",
            SoundCue::NewRecord => "record.mp3",
        }
    }
}

/// Host-side clip handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipHandle(pub u32);

/// Host audio playback
pub trait AudioBackend {
    /// Load a bundled clip; `None` if the asset is missing
    fn load(&mut self, name: &str) -> Option<ClipHandle>;
    /// Play a clip from a world position
    fn play(&mut self, clip: ClipHandle, volume: f32, position: Vec3);
}

/// Backend with no assets (audio disabled)
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentBackend;

impl AudioBackend for SilentBackend {
    fn load(&mut self, _name: &str) -> Option<ClipHandle> {
        None
    }

    fn play(&mut self, _clip: ClipHandle, _volume: f32, _position: Vec3) {}
}

/// Cue → clip lookup, built once at startup
#[derive(Debug, Clone, Default)]
pub struct AudioTable {
    clips: HashMap<SoundCue, ClipHandle>,
}

impl AudioTable {
    /// Load every cue's clip, logging the ones that are missing
    pub fn load(backend: &mut dyn AudioBackend) -> Self {
        let mut clips = HashMap::new();
        for cue in SoundCue::ALL {
            match backend.load(cue.clip_name()) {
                Some(handle) => {
                    clips.insert(cue, handle);
                }
                None => log::warn!("Missing audio clip {} - {:?} will be silent", cue.clip_name(), cue),
            }
        }
        log::info!("Loaded {}/{} audio clips", clips.len(), SoundCue::ALL.len());
        Self { clips }
    }

    pub fn get(&self, cue: SoundCue) -> Option<ClipHandle> {
        self.clips.get(&cue).copied()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Box<dyn AudioBackend>,
    table: AudioTable,
    volume: f32,
}

impl AudioManager {
    /// Load the clip table from `backend` and keep both
    pub fn new(mut backend: Box<dyn AudioBackend>, volume: f32) -> Self {
        let table = AudioTable::load(backend.as_mut());
        Self::with_table(backend, table, volume)
    }

    pub fn with_table(backend: Box<dyn AudioBackend>, table: AudioTable, volume: f32) -> Self {
        Self {
            backend,
            table,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    /// Set effective volume (0.0 - 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn table(&self) -> &AudioTable {
        &self.table
    }

    /// Play a cue; missing clips and zero volume are no-ops
    pub fn play(&mut self, cue: SoundCue, position: Vec3) {
        if self.volume <= 0.0 {
            return;
        }
        let Some(clip) = self.table.get(cue) else {
            return;
        };
        self.backend.play(clip, self.volume, position);
    }
}
