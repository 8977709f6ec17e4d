//! HUD data handed to the host's text renderer

/// Banner categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Perfect,
    Combo(u32),
    NewBest,
    /// Stays up until the run restarts
    GameOver,
}

impl BannerKind {
    pub fn text(&self) -> String {
        match self {
            BannerKind::Perfect => "PERFECT".to_string(),
            BannerKind::Combo(n) => format!("COMBO x{}", n),
            BannerKind::NewBest => "NEW BEST".to_string(),
            BannerKind::GameOver => "GAME OVER - tap to restart".to_string(),
        }
    }

    /// Whether the banner clears itself after a fixed time
    pub fn is_transient(&self) -> bool {
        !matches!(self, BannerKind::GameOver)
    }
}

/// A banner on screen
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
    /// Session time (seconds) at which a transient banner clears
    pub expires_at: Option<f64>,
}

impl Banner {
    pub fn new(kind: BannerKind, now: f64, duration: f32) -> Self {
        let expires_at = kind.is_transient().then(|| now + duration as f64);
        Self {
            kind,
            text: kind.text(),
            expires_at,
        }
    }

    #[inline]
    pub fn is_expired(&self, now: f64) -> bool {
        self.expires_at.is_some_and(|t| now >= t)
    }
}

/// Everything the HUD shows for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudFrame {
    pub score: u32,
    /// `None` when the level line is hidden
    pub level: Option<u32>,
    pub best_height: u32,
    pub best_combo: u32,
    pub streak: u32,
    pub game_over: bool,
    pub banners: Vec<Banner>,
}

impl HudFrame {
    /// Main score line
    pub fn score_text(&self) -> String {
        format!("{}", self.score)
    }

    pub fn level_text(&self) -> Option<String> {
        self.level.map(|level| format!("Level {}", level))
    }

    pub fn records_text(&self) -> String {
        format!("Best {}  Combo {}", self.best_height, self.best_combo)
    }
}

/// Host-side HUD renderer, called after every change
pub trait HudView {
    fn render(&mut self, frame: &HudFrame);
}

/// HUD that draws nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHud;

impl HudView for NullHud {
    fn render(&mut self, _frame: &HudFrame) {}
}
