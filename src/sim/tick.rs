//! Fixed timestep simulation tick
//!
//! Advances the run by one step: difficulty lookup, spawning, motion, then the
//! failure check. Keystrokes are applied between ticks by `targeting`.

use super::motion::{advance, resolve_breaches};
use super::spawn::try_spawn;
use super::state::{GameEvent, GameState, SessionState};

/// Advance the game state by one timestep of `dt` seconds
pub fn tick(state: &mut GameState, dt: f32) {
    // Paused, idle and ended runs keep their clock frozen
    if state.status != SessionState::Running {
        return;
    }

    state.elapsed_ms += dt as f64 * 1000.0;

    let config = state.phase_config();
    if config.phase != state.phase {
        log::info!(
            "Phase {} -> {} at {:.1}s",
            state.phase.as_str(),
            config.phase.as_str(),
            state.elapsed_ms / 1000.0
        );
        state.phase = config.phase;
        state.events.push(GameEvent::PhaseChanged(config.phase));
    }

    try_spawn(state, &config);
    advance(state, dt);

    if resolve_breaches(state) {
        state.end_run();
    }

    state.heal_lock();
    debug_assert!(state.invariants_hold());
}
