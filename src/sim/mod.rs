//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Simulation time only (paused wall time never enters)
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod motion;
pub mod phase;
pub mod scoring;
pub mod spawn;
pub mod state;
pub mod targeting;
pub mod tick;
pub mod words;

pub use phase::{PHASES, Phase, PhaseConfig, phase_for};
pub use scoring::{RunSummary, composite_score, points_for_kill, words_per_minute};
pub use state::{
    Enemy, FailurePolicy, GameConfig, GameEvent, GameState, Playfield, RunStats, SessionState,
    accuracy_percent,
};
pub use targeting::{KeyOutcome, normalize_key, on_key_press};
pub use tick::tick;
