//! Presentation
//!
//! Everything here reads simulation state and never mutates it. The view
//! helpers are target independent; `canvas` paints them with Canvas 2D.

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;

use crate::challenge::SubmissionState;
use crate::highscores::{HighScores, format_age};
use crate::session::Session;
use crate::sim::{Enemy, SessionState};

/// Score as shown in the HUD, zero padded to six digits
pub fn format_score(score: u64) -> String {
    format!("{:06}", score)
}

/// Tile colors by sprite index (1-based)
pub const SPRITE_COLORS: [&str; 4] = ["#ff4d6d", "#4dd2ff", "#b36bff", "#ffd24d"];

pub fn sprite_color(sprite: u8) -> &'static str {
    let idx = (sprite.max(1) as usize - 1) % SPRITE_COLORS.len();
    SPRITE_COLORS[idx]
}

/// Word label split for drawing: typed letters dimmed, the rest bright
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordLabel<'a> {
    pub typed: &'a str,
    pub rest: &'a str,
    pub locked: bool,
}

impl<'a> WordLabel<'a> {
    pub fn of(enemy: &'a Enemy, locked_target: Option<u32>) -> Self {
        Self {
            typed: enemy.typed_part(),
            rest: enemy.remaining(),
            locked: locked_target == Some(enemy.id),
        }
    }
}

/// Which overlay covers the playfield
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Menu,
    None,
    Paused,
    GameOver,
}

impl Overlay {
    pub fn for_state(state: SessionState) -> Self {
        match state {
            SessionState::Idle => Overlay::Menu,
            SessionState::Running => Overlay::None,
            SessionState::Paused => Overlay::Paused,
            SessionState::Ended => Overlay::GameOver,
        }
    }
}

/// Numbers for the HUD strip
#[derive(Debug, Clone, PartialEq)]
pub struct HudView {
    pub score: String,
    pub best: String,
    pub phase: &'static str,
    pub wave: u32,
    pub streak: u32,
    pub accuracy: u32,
    /// Only under the lives policy
    pub lives: Option<u8>,
}

impl HudView {
    pub fn from_session(session: &Session) -> Self {
        let game = &session.game;
        Self {
            score: format_score(game.stats.score),
            best: format_score(session.high_scores().best()),
            phase: game.phase.as_str(),
            wave: game.stats.wave(),
            streak: game.stats.streak,
            accuracy: game.stats.accuracy,
            lives: game.lives,
        }
    }
}

/// One leaderboard line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub score: String,
    pub wpm: u32,
    pub accuracy: u32,
    pub wave: u32,
    pub age: String,
}

pub fn leaderboard_rows(scores: &HighScores, now: f64) -> Vec<LeaderboardRow> {
    scores
        .entries
        .iter()
        .enumerate()
        .map(|(i, e)| LeaderboardRow {
            rank: i + 1,
            score: format_score(e.score),
            wpm: e.wpm,
            accuracy: e.accuracy,
            wave: e.wave,
            age: format_age(now, e.timestamp),
        })
        .collect()
}

/// Status line under the game-over card, if any
pub fn submission_message(state: &SubmissionState) -> Option<String> {
    match state {
        SubmissionState::NotRequired => None,
        SubmissionState::Pending => Some("Submitting score...".to_string()),
        SubmissionState::Submitted(follow_up) => Some(match follow_up.message() {
            Some(next) => format!("Score submitted! {}", next),
            None => "Score submitted!".to_string(),
        }),
        SubmissionState::Failed(reason) => Some(format!("Submission failed: {}", reason)),
    }
}
