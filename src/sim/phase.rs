//! Difficulty scheduler
//!
//! Maps elapsed run time to a difficulty tier. Pure: the answer depends on the
//! elapsed milliseconds only, never on earlier calls.

use serde::{Deserialize, Serialize};

/// Named difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Easy,
    Medium,
    Hard,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Easy => "EASY",
            Phase::Medium => "MEDIUM",
            Phase::Hard => "HARD",
        }
    }

    /// Flat bonus added to every kill made during this tier
    pub fn kill_bonus(&self) -> u64 {
        match self {
            Phase::Easy => 0,
            Phase::Medium => 5,
            Phase::Hard => 10,
        }
    }
}

/// Spawn and motion parameters for one tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseConfig {
    pub phase: Phase,
    /// Fall speed given to enemies spawned in this tier (pixels/second)
    pub speed: f32,
    pub spawn_interval_ms: f64,
    pub max_concurrent: usize,
    pub min_word_len: usize,
    pub max_word_len: usize,
}

/// Tier table, easiest first. `until_ms` is an exclusive upper bound; the last
/// tier has none and lasts forever.
pub const PHASES: [(Option<f64>, PhaseConfig); 3] = [
    (
        Some(10_000.0),
        PhaseConfig {
            phase: Phase::Easy,
            speed: 45.0,
            spawn_interval_ms: 1200.0,
            max_concurrent: 6,
            min_word_len: 3,
            max_word_len: 6,
        },
    ),
    (
        Some(45_000.0),
        PhaseConfig {
            phase: Phase::Medium,
            speed: 70.0,
            spawn_interval_ms: 850.0,
            max_concurrent: 9,
            min_word_len: 4,
            max_word_len: 8,
        },
    ),
    (
        None,
        PhaseConfig {
            phase: Phase::Hard,
            speed: 105.0,
            spawn_interval_ms: 600.0,
            max_concurrent: 12,
            min_word_len: 5,
            max_word_len: 10,
        },
    ),
];

/// Difficulty for the given elapsed run time (pause excluded).
///
/// Boundaries are exclusive: `phase_for(9_999.0)` is easy, `phase_for(10_000.0)`
/// is medium, `phase_for(45_000.0)` is hard. Negative input is treated as zero.
pub fn phase_for(elapsed_ms: f64) -> PhaseConfig {
    let elapsed = elapsed_ms.max(0.0);
    for (until, config) in PHASES.iter() {
        match until {
            Some(limit) if elapsed < *limit => return *config,
            Some(_) => continue,
            None => return *config,
        }
    }
    PHASES[PHASES.len() - 1].1
}
