//! Word bank
//!
//! Three pools of lowercase ASCII words, one per difficulty tier. Lengths roughly
//! follow the tier bounds but the spawner still enforces them.

use super::phase::Phase;

pub const WORDS_EASY: &[&str] = &[
    "cat", "dog", "sun", "run", "map", "code", "star", "moon", "ship", "laser", "alien", "orbit",
    "beam", "bolt", "byte", "core", "dust", "echo", "fire", "glow", "hack", "iron", "jet",
    "key", "lamp", "mars", "nova", "pod", "ray", "rock", "sky", "void", "warp", "zap", "fuel",
    "gear", "hull", "ion", "node", "port", "rust", "type", "word", "fast", "aim", "hit",
];

pub const WORDS_MEDIUM: &[&str] = &[
    "planet", "rocket", "comet", "galaxy", "meteor", "photon", "plasma", "shield", "vector",
    "cannon", "engine", "pilot", "radar", "signal", "sector", "quasar", "nebula", "cosmic",
    "thrust", "turret", "hangar", "module", "orbital", "payload", "capsule", "station",
    "mission", "airlock", "gravity", "reactor", "voltage", "charger", "stealth", "frigate",
    "blaster", "cockpit", "beacon", "cipher", "keyboard", "striker",
];

pub const WORDS_HARD: &[&str] = &[
    "asteroid", "spaceship", "satellite", "telescope", "hyperdrive", "starlight", "wormhole",
    "supernova", "blackhole", "propulsion", "trajectory", "navigator", "commander",
    "interceptor", "dreadnought", "battlestar", "moonbase", "stardust", "lightyear",
    "antimatter", "quarantine", "frequency", "algorithm", "momentum", "spacewalk",
    "transmitter", "expedition", "constellation", "magnetar", "singularity", "terraform",
    "blockchain", "stablecoin", "challenger", "typewriter",
];

/// Pool for a difficulty tier
pub fn pool_for(phase: Phase) -> &'static [&'static str] {
    match phase {
        Phase::Easy => WORDS_EASY,
        Phase::Medium => WORDS_MEDIUM,
        Phase::Hard => WORDS_HARD,
    }
}
