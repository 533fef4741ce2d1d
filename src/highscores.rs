//! Local best score and leaderboard
//!
//! Persisted through platform storage. The best score only ever grows; the
//! leaderboard keeps the top 10 runs with their speed and accuracy.

use serde::{Deserialize, Serialize};

use crate::platform;
use crate::sim::RunSummary;

/// Maximum number of leaderboard rows
pub const MAX_HIGH_SCORES: usize = 10;

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Composite score
    pub score: u64,
    pub wpm: u32,
    pub accuracy: u32,
    /// Wave reached
    pub wave: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    /// Best composite score ever seen on this device
    #[serde(default)]
    best: u64,
    #[serde(default)]
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    const STORAGE_KEY: &'static str = "arbistrike_highscores";
    /// Bare number written by older builds
    const LEGACY_KEY: &'static str = "ztype_hiscore";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Whether a score would enter the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Record a finished run. Raises the best score if beaten and returns the
    /// leaderboard rank (1-indexed), or None if the run did not place.
    pub fn record(&mut self, summary: &RunSummary, timestamp: f64) -> Option<usize> {
        if summary.score > self.best {
            log::info!("New best score: {} (was {})", summary.score, self.best);
            self.best = summary.score;
        }
        if !self.qualifies(summary.score) {
            return None;
        }

        let entry = HighScoreEntry {
            score: summary.score,
            wpm: summary.wpm,
            accuracy: summary.accuracy,
            wave: summary.wave,
            timestamp,
        };

        // Sorted descending; ties keep the older run first
        let pos = self
            .entries
            .iter()
            .position(|e| summary.score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(pos + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse stored data, falling back to the legacy bare-number format
    fn parse(json: Option<&str>, legacy: Option<&str>) -> Self {
        let mut scores = json
            .and_then(|j| match serde_json::from_str::<HighScores>(j) {
                Ok(scores) => Some(scores),
                Err(e) => {
                    log::warn!("Discarding unreadable high scores: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        if let Some(old) = legacy.and_then(|v| v.trim().parse::<u64>().ok()) {
            scores.best = scores.best.max(old);
        }
        let top = scores.entries.first().map_or(0, |e| e.score);
        scores.best = scores.best.max(top);
        scores
    }

    pub fn load() -> Self {
        let json = platform::storage_get(Self::STORAGE_KEY);
        let legacy = platform::storage_get(Self::LEGACY_KEY);
        let scores = Self::parse(json.as_deref(), legacy.as_deref());
        // Move a legacy best into the current format once
        if legacy.is_some() && scores.save() {
            platform::storage_remove(Self::LEGACY_KEY);
        }
        log::info!(
            "Loaded high scores: best {}, {} entries",
            scores.best,
            scores.entries.len()
        );
        scores
    }

    /// Returns true once the data is in storage
    pub fn save(&self) -> bool {
        match serde_json::to_string(self) {
            Ok(json) => {
                let stored = platform::storage_set(Self::STORAGE_KEY, &json);
                if stored {
                    log::info!("High scores saved ({} entries)", self.entries.len());
                }
                stored
            }
            Err(e) => {
                log::warn!("Could not serialize high scores: {}", e);
                false
            }
        }
    }
}

/// Relative age of a timestamp, e.g. "3 mins ago"
pub fn format_age(now: f64, timestamp: f64) -> String {
    let mins = ((now - timestamp) / 60_000.0).max(0.0);
    let hours = mins / 60.0;
    let days = hours / 24.0;

    if days >= 1.0 {
        match days.floor() as i64 {
            1 => "Yesterday".to_string(),
            n => format!("{} days ago", n),
        }
    } else if hours >= 1.0 {
        match hours.floor() as i64 {
            1 => "1 hour ago".to_string(),
            n => format!("{} hours ago", n),
        }
    } else if mins >= 1.0 {
        match mins.floor() as i64 {
            1 => "1 min ago".to_string(),
            n => format!("{} mins ago", n),
        }
    } else {
        "Just now".to_string()
    }
}
