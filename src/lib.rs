//! ArbiStrike - a falling-words typing arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, targeting, motion, scoring)
//! - `session`: Run lifecycle, fixed-timestep clock, end-of-run effects
//! - `challenge`: Head-to-head wager contracts (submission, winner resolution)
//! - `renderer`: Canvas 2D presentation (reads simulation state only)
//! - `platform`: Browser/native platform abstraction
//! - `net`: Challenge API client over browser fetch

pub mod audio;
pub mod challenge;
pub mod highscores;
#[cfg(target_arch = "wasm32")]
pub mod net;
pub mod platform;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;

pub use challenge::{ChallengeContext, PlayerRole, ScoreSubmission, SubmissionState};
pub use highscores::HighScores;
pub use session::Session;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest wall-clock frame delta fed to the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Playfield dimensions (logical pixels)
    pub const DEFAULT_WIDTH: f32 = 900.0;
    pub const DEFAULT_HEIGHT: f32 = 550.0;
    pub const MIN_WIDTH: f32 = 320.0;
    pub const MIN_HEIGHT: f32 = 420.0;

    /// Enemies are drawn as square tiles
    pub const TILE_SIZE: f32 = 56.0;
    /// Horizontal gap kept between a tile and the playfield edge
    pub const EDGE_MARGIN: f32 = 8.0;
    /// Spawn height, just above the visible top edge
    pub const SPAWN_Y: f32 = -TILE_SIZE - 6.0;
    /// Distance above the bottom edge where an enemy reaches the ship
    pub const FAILURE_MARGIN: f32 = 50.0;

    /// Lives for the life-based failure policy
    pub const START_LIVES: u8 = 3;
    /// Kills per displayed wave
    pub const KILLS_PER_WAVE: u32 = 10;
}
