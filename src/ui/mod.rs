//! Presentation layer
//!
//! Turns engine events into HUD frames, banners, audio cues and record
//! updates. Nothing here writes back into the engine.

pub mod hud;
pub mod presenter;

pub use hud::{Banner, BannerKind, HudFrame, HudView, NullHud};
pub use presenter::Presenter;
