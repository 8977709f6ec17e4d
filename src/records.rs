//! Personal records
//!
//! Best tower height and best perfect-placement run. Read once at startup,
//! written back only when beaten.

use serde::{Deserialize, Serialize};

use crate::platform::RecordStore;

/// Best results so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Records {
    pub best_height: u32,
    pub best_combo: u32,
}

impl Records {
    /// Store key for the best height
    pub const HEIGHT_KEY: &'static str = "best_height";
    /// Store key for the best combo
    pub const COMBO_KEY: &'static str = "best_combo";

    pub fn new() -> Self {
        Self::default()
    }

    /// Load both records; unreadable values count as 0
    pub fn load(store: &dyn RecordStore) -> Self {
        let read = |key: &str| match store.get(key) {
            Ok(value) => value.map(|v| v.clamp(0, u32::MAX as i64) as u32).unwrap_or(0),
            Err(e) => {
                log::warn!("Failed to read {}: {}", key, e);
                0
            }
        };
        let records = Self {
            best_height: read(Self::HEIGHT_KEY),
            best_combo: read(Self::COMBO_KEY),
        };
        log::info!(
            "Records loaded: best height {}, best combo {}",
            records.best_height,
            records.best_combo
        );
        records
    }

    /// Offer a height; persists and returns true if it beats the record
    pub fn submit_height(&mut self, height: u32, store: &mut dyn RecordStore) -> bool {
        if height <= self.best_height {
            return false;
        }
        self.best_height = height;
        Self::persist(store, Self::HEIGHT_KEY, height);
        true
    }

    /// Offer a combo; persists and returns true if it beats the record
    pub fn submit_combo(&mut self, combo: u32, store: &mut dyn RecordStore) -> bool {
        if combo <= self.best_combo {
            return false;
        }
        self.best_combo = combo;
        Self::persist(store, Self::COMBO_KEY, combo);
        true
    }

    fn persist(store: &mut dyn RecordStore, key: &str, value: u32) {
        if let Err(e) = store.set(key, value as i64) {
            log::warn!("Failed to save {}: {}", key, e);
        }
    }
}
