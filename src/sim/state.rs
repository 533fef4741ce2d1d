//! Game state and core simulation types
//!
//! Everything a run mutates lives in `GameState`. In-progress runs are never
//! persisted, so only the pieces that leave the engine are serializable.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::phase::{Phase, PhaseConfig, phase_for};
use crate::consts::*;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Menu shown, no enemies
    Idle,
    /// Active gameplay
    Running,
    /// Simulation clock frozen
    Paused,
    /// Run finished; only `start` leaves this state
    Ended,
}

/// What happens when an enemy reaches the ship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// The first breach ends the run
    #[default]
    SessionEnding,
    /// Each breach removes the enemy and costs a life; the run ends at zero
    Lives(u8),
}

/// Engine configuration fixed for the lifetime of a `GameState`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GameConfig {
    pub policy: FailurePolicy,
}

/// Visible play area in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Playfield {
    /// Build a playfield, never smaller than the minimum board size
    pub fn new(width: f32, height: f32) -> Self {
        let width = if width.is_finite() { width } else { DEFAULT_WIDTH };
        let height = if height.is_finite() { height } else { DEFAULT_HEIGHT };
        Self {
            width: width.max(MIN_WIDTH),
            height: height.max(MIN_HEIGHT),
        }
    }

    /// Leftmost x a tile may occupy
    pub fn min_x(&self) -> f32 {
        EDGE_MARGIN
    }

    /// Rightmost x a tile may occupy while staying fully on screen
    pub fn max_x(&self) -> f32 {
        (self.width - TILE_SIZE - EDGE_MARGIN).max(self.min_x())
    }

    pub fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(self.min_x(), self.max_x())
    }

    /// An enemy whose top edge reaches this y has hit the ship
    pub fn failure_y(&self) -> f32 {
        self.height - FAILURE_MARGIN
    }
}

/// A falling word target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub word: String,
    /// Length of the correctly typed prefix, `0..=word.len()`
    pub typed: usize,
    /// Top-left corner of the tile
    pub pos: Vec2,
    /// Pixels per second, fixed at spawn
    pub speed: f32,
    /// Cosmetic alien sprite, 1..=4
    pub sprite: u8,
}

impl Enemy {
    /// Next character the player must type
    pub fn next_char(&self) -> Option<char> {
        self.word[self.typed..].chars().next()
    }

    pub fn is_complete(&self) -> bool {
        self.typed >= self.word.len()
    }

    pub fn typed_part(&self) -> &str {
        &self.word[..self.typed]
    }

    pub fn remaining(&self) -> &str {
        &self.word[self.typed..]
    }
}

/// Per-run aggregates, reset at run start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Live score from kills only
    pub score: u64,
    pub destroyed: u32,
    pub streak: u32,
    pub longest_streak: u32,
    pub correct_keystrokes: u32,
    pub wrong_keystrokes: u32,
    /// Rounded percentage, 100 before any keystroke
    pub accuracy: u32,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            score: 0,
            destroyed: 0,
            streak: 0,
            longest_streak: 0,
            correct_keystrokes: 0,
            wrong_keystrokes: 0,
            accuracy: 100,
        }
    }
}

impl RunStats {
    /// A keystroke that matched nothing, or mismatched the locked target
    pub fn record_miss(&mut self) {
        self.wrong_keystrokes += 1;
        self.streak = 0;
        self.recompute_accuracy();
    }

    /// A keystroke that advanced the locked target
    pub fn record_hit(&mut self) {
        self.correct_keystrokes += 1;
        self.recompute_accuracy();
    }

    /// Count a kill and return the streak it produced
    pub fn record_kill(&mut self) -> u32 {
        self.destroyed += 1;
        self.streak += 1;
        self.longest_streak = self.longest_streak.max(self.streak);
        self.streak
    }

    pub fn recompute_accuracy(&mut self) {
        self.accuracy = accuracy_percent(self.correct_keystrokes, self.wrong_keystrokes);
    }

    /// Displayed wave, one per ten kills
    pub fn wave(&self) -> u32 {
        self.destroyed / KILLS_PER_WAVE + 1
    }
}

/// `round(correct / (correct + wrong) * 100)`, 100 when nothing was typed
pub fn accuracy_percent(correct: u32, wrong: u32) -> u32 {
    let total = correct as u64 + wrong as u64;
    if total == 0 {
        return 100;
    }
    (correct as f64 / total as f64 * 100.0).round() as u32
}

/// Presentation-facing things that happened during a tick or keystroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted,
    /// Correct letter on the locked target
    Shot { enemy_id: u32 },
    Killed { enemy_id: u32, points: u64 },
    /// Wrong or unmatched letter
    Miss,
    /// Enemy reached the ship
    Breached { enemy_id: u32 },
    LifeLost { remaining: u8 },
    PhaseChanged(Phase),
    Paused,
    Resumed,
    RunEnded,
}

/// Complete state of one engine instance
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: GameConfig,
    pub status: SessionState,
    pub playfield: Playfield,
    /// Active enemies in spawn order
    pub enemies: Vec<Enemy>,
    /// Enemy currently receiving keystrokes
    pub locked_target: Option<u32>,
    pub stats: RunStats,
    /// Remaining lives under `FailurePolicy::Lives`
    pub lives: Option<u8>,
    /// Simulation time since run start; never advances while paused
    pub elapsed_ms: f64,
    /// Simulation time of the last successful spawn
    pub last_spawn_ms: Option<f64>,
    /// Tier seen on the previous tick
    pub phase: Phase,
    /// Events since the host last drained them
    pub events: Vec<GameEvent>,
    rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Create an idle engine
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            status: SessionState::Idle,
            playfield: Playfield::default(),
            enemies: Vec::new(),
            locked_target: None,
            stats: RunStats::default(),
            lives: None,
            elapsed_ms: 0.0,
            last_spawn_ms: None,
            phase: Phase::Easy,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Reset every run field and enter `Running`. Valid from any state.
    pub fn start(&mut self, seed: u64) {
        self.enemies.clear();
        self.locked_target = None;
        self.stats = RunStats::default();
        self.lives = match self.config.policy {
            FailurePolicy::SessionEnding => None,
            FailurePolicy::Lives(n) => Some(n.max(1)),
        };
        self.elapsed_ms = 0.0;
        self.last_spawn_ms = None;
        self.phase = Phase::Easy;
        self.events.clear();
        self.rng = Pcg32::seed_from_u64(seed);
        self.next_id = 1;
        self.status = SessionState::Running;
        self.events.push(GameEvent::RunStarted);
        log::info!("Run started (seed {}, policy {:?})", seed, self.config.policy);
    }

    /// Running <-> Paused; ignored in other states. Returns true if it toggled.
    pub fn toggle_pause(&mut self) -> bool {
        match self.status {
            SessionState::Running => {
                self.status = SessionState::Paused;
                self.events.push(GameEvent::Paused);
                true
            }
            SessionState::Paused => {
                self.status = SessionState::Running;
                self.events.push(GameEvent::Resumed);
                true
            }
            _ => false,
        }
    }

    /// Enter `Ended`. Only the first call of a run succeeds.
    pub fn end_run(&mut self) -> bool {
        match self.status {
            SessionState::Running | SessionState::Paused => {
                self.status = SessionState::Ended;
                self.locked_target = None;
                self.events.push(GameEvent::RunEnded);
                log::info!(
                    "Run ended after {:.1}s: score {}, destroyed {}",
                    self.elapsed_ms / 1000.0,
                    self.stats.score,
                    self.stats.destroyed
                );
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionState::Running
    }

    /// Allocate a new enemy id; ids are never reused within a run
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Difficulty for the current simulation time
    pub fn phase_config(&self) -> PhaseConfig {
        phase_for(self.elapsed_ms)
    }

    pub fn locked_enemy(&self) -> Option<&Enemy> {
        let id = self.locked_target?;
        self.enemies.iter().find(|e| e.id == id)
    }

    /// Drop a lock whose enemy is gone
    pub fn heal_lock(&mut self) {
        if let Some(id) = self.locked_target {
            if !self.enemies.iter().any(|e| e.id == id) {
                log::debug!("Clearing stale lock on enemy {}", id);
                self.locked_target = None;
            }
        }
    }

    /// Change the board size; positions are re-clamped on the next tick
    pub fn resize(&mut self, width: f32, height: f32) {
        self.playfield = Playfield::new(width, height);
        for enemy in &mut self.enemies {
            enemy.pos.x = self.playfield.clamp_x(enemy.pos.x);
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Typed-count bounds and lock validity
    pub fn invariants_hold(&self) -> bool {
        let typed_ok = self.enemies.iter().all(|e| e.typed <= e.word.len());
        let lock_ok = self
            .locked_target
            .is_none_or(|id| self.enemies.iter().any(|e| e.id == id));
        typed_ok && lock_ok && self.stats.accuracy <= 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = GameState::new(GameConfig::default(), 1);
        assert_eq!(state.status, SessionState::Idle);
        assert!(state.enemies.is_empty());
        assert_eq!(state.stats.accuracy, 100);
    }

    #[test]
    fn test_start_resets_run() {
        let mut state = GameState::new(GameConfig::default(), 1);
        state.start(7);
        state.stats.score = 120;
        state.stats.wrong_keystrokes = 3;
        state.elapsed_ms = 5_000.0;
        let id = state.next_entity_id();
        state.locked_target = Some(id);
        state.end_run();

        state.start(8);
        assert_eq!(state.status, SessionState::Running);
        assert_eq!(state.stats, RunStats::default());
        assert_eq!(state.elapsed_ms, 0.0);
        assert_eq!(state.locked_target, None);
        assert_eq!(state.next_entity_id(), 1);
    }

    #[test]
    fn test_end_run_only_once() {
        let mut state = GameState::new(GameConfig::default(), 1);
        assert!(!state.end_run(), "idle state cannot end");
        state.start(1);
        assert!(state.end_run());
        assert!(!state.end_run());
        let ended = state
            .drain_events()
            .iter()
            .filter(|e| **e == GameEvent::RunEnded)
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_pause_toggle() {
        let mut state = GameState::new(GameConfig::default(), 1);
        assert!(!state.toggle_pause());
        state.start(1);
        assert!(state.toggle_pause());
        assert_eq!(state.status, SessionState::Paused);
        assert!(state.toggle_pause());
        assert_eq!(state.status, SessionState::Running);
    }

    #[test]
    fn test_lives_policy_sets_lives() {
        let mut state = GameState::new(
            GameConfig {
                policy: FailurePolicy::Lives(3),
            },
            1,
        );
        state.start(1);
        assert_eq!(state.lives, Some(3));
    }

    #[test]
    fn test_accuracy_percent() {
        assert_eq!(accuracy_percent(0, 0), 100);
        assert_eq!(accuracy_percent(0, 4), 0);
        assert_eq!(accuracy_percent(9, 1), 90);
        assert_eq!(accuracy_percent(2, 1), 67);
    }

    #[test]
    fn test_playfield_minimum_and_clamp() {
        let field = Playfield::new(100.0, f32::NAN);
        assert_eq!(field.width, MIN_WIDTH);
        assert_eq!(field.height, DEFAULT_HEIGHT);
        assert_eq!(field.clamp_x(-40.0), EDGE_MARGIN);
        assert_eq!(field.clamp_x(10_000.0), MIN_WIDTH - TILE_SIZE - EDGE_MARGIN);
    }

    #[test]
    fn test_heal_lock() {
        let mut state = GameState::new(GameConfig::default(), 1);
        state.start(1);
        state.locked_target = Some(42);
        assert!(!state.invariants_hold());
        state.heal_lock();
        assert_eq!(state.locked_target, None);
        assert!(state.invariants_hold());
    }
}
