//! Enemy spawner
//!
//! Emits at most one enemy per call, gated by the tier's spawn interval and
//! on-screen cap. All randomness comes from the run's seeded RNG.

use glam::Vec2;
use rand::Rng;

use super::phase::PhaseConfig;
use super::state::{Enemy, GameState};
use super::words::pool_for;
use crate::consts::*;

/// Draws attempted while looking for a word that already fits the tier
const WORD_DRAW_ATTEMPTS: usize = 8;

/// Spawn an enemy if the interval has elapsed and the cap allows it.
///
/// A spawn blocked by the cap leaves the timer untouched, so a freed slot is
/// filled on the very next tick. Returns the new enemy's id.
pub fn try_spawn(state: &mut GameState, config: &PhaseConfig) -> Option<u32> {
    let now = state.elapsed_ms;
    if let Some(last) = state.last_spawn_ms {
        if now - last < config.spawn_interval_ms {
            return None;
        }
    }
    if state.enemies.len() >= config.max_concurrent {
        return None;
    }

    let playfield = state.playfield;
    let rng = state.rng_mut();
    let word = pick_word(rng, config);
    let x = playfield.clamp_x(rng.random::<f32>() * (playfield.width - TILE_SIZE));
    let sprite = rng.random_range(1..=4u8);

    let id = state.next_entity_id();
    log::debug!("Spawned enemy {} '{}' ({:?})", id, word, config.phase);
    state.enemies.push(Enemy {
        id,
        word,
        typed: 0,
        pos: Vec2::new(x, SPAWN_Y),
        speed: config.speed,
        sprite,
    });
    state.last_spawn_ms = Some(now);
    Some(id)
}

/// Choose a word for the tier.
///
/// Draws uniformly until one fits `[min_word_len, max_word_len]`; after a few
/// misses the last draw is truncated to the maximum. Short words are never padded.
pub fn pick_word<R: Rng + ?Sized>(rng: &mut R, config: &PhaseConfig) -> String {
    let pool = pool_for(config.phase);
    let mut word = pool[rng.random_range(0..pool.len())];
    for _ in 1..WORD_DRAW_ATTEMPTS {
        if (config.min_word_len..=config.max_word_len).contains(&word.len()) {
            break;
        }
        word = pool[rng.random_range(0..pool.len())];
    }
    word.chars().take(config.max_word_len).collect()
}
