//! Scoring
//!
//! Live per-kill points and the end-of-run composite. The composite is a pure
//! function of the run's aggregate counters, so any party holding them can
//! reproduce a settlement score.

use serde::{Deserialize, Serialize};

use super::phase::Phase;
use super::state::RunStats;

/// Points for a kill; `new_streak` is the streak including this kill
pub fn points_for_kill(word_len: usize, phase: Phase, new_streak: u32) -> u64 {
    let base = 10 + word_len.min(10) as u64 * 2;
    let streak_bonus = (new_streak as u64 * 2).min(20);
    base + phase.kill_bonus() + streak_bonus
}

/// Kills per minute; runs shorter than a second count as one second
pub fn words_per_minute(destroyed: u32, elapsed_ms: f64) -> u32 {
    let minutes = (elapsed_ms / 60_000.0).max(1.0 / 60.0);
    (destroyed as f64 / minutes).round() as u32
}

/// End-of-run score reported for challenges and high scores
pub fn composite_score(stats: &RunStats, elapsed_ms: f64) -> u64 {
    let wpm = words_per_minute(stats.destroyed, elapsed_ms) as i64;
    let total = stats.score as i64 + wpm * 10 + stats.accuracy as i64 * 5
        - stats.wrong_keystrokes as i64 * 4
        + stats.longest_streak as i64 * 2
        + stats.destroyed as i64;
    total.max(0) as u64
}

/// Final numbers of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Composite score
    pub score: u64,
    /// Live kill score before the composite
    pub kill_score: u64,
    pub wpm: u32,
    pub accuracy: u32,
    pub destroyed: u32,
    pub longest_streak: u32,
    pub errors: u32,
    pub wave: u32,
    pub duration_seconds: f64,
}

impl RunSummary {
    pub fn from_run(stats: &RunStats, elapsed_ms: f64) -> Self {
        Self {
            score: composite_score(stats, elapsed_ms),
            kill_score: stats.score,
            wpm: words_per_minute(stats.destroyed, elapsed_ms),
            accuracy: stats.accuracy,
            destroyed: stats.destroyed,
            longest_streak: stats.longest_streak,
            errors: stats.wrong_keystrokes,
            wave: stats.wave(),
            duration_seconds: elapsed_ms.max(0.0) / 1000.0,
        }
    }

    /// Brag text for free-play runs
    pub fn share_text(&self) -> String {
        format!(
            "Just scored {} points in ArbiStrike!\n\n{} WPM typing speed\n{}% accuracy\n{} enemies destroyed\nReached Wave {}\n\nPlay this space typing shooter!",
            self.score, self.wpm, self.accuracy, self.destroyed, self.wave
        )
    }
}
