//! Enemy motion and breach detection

use super::state::{FailurePolicy, GameEvent, GameState};

/// Move every enemy down by `speed * dt` and keep it inside the playfield.
pub fn advance(state: &mut GameState, dt: f32) {
    let playfield = state.playfield;
    for enemy in &mut state.enemies {
        enemy.pos.y += enemy.speed * dt;
        enemy.pos.x = playfield.clamp_x(enemy.pos.x);
    }
}

/// Apply the failure policy to enemies at or past the failure line.
///
/// Returns true when the run must end.
pub fn resolve_breaches(state: &mut GameState) -> bool {
    let failure_y = state.playfield.failure_y();
    match state.config.policy {
        FailurePolicy::SessionEnding => {
            let Some(enemy) = state.enemies.iter().find(|e| e.pos.y >= failure_y) else {
                return false;
            };
            let enemy_id = enemy.id;
            log::info!("Enemy {} reached the ship", enemy_id);
            state.events.push(GameEvent::Breached { enemy_id });
            true
        }
        FailurePolicy::Lives(_) => {
            let breached: Vec<u32> = state
                .enemies
                .iter()
                .filter(|e| e.pos.y >= failure_y)
                .map(|e| e.id)
                .collect();
            if breached.is_empty() {
                return false;
            }
            state.enemies.retain(|e| e.pos.y < failure_y);
            state.heal_lock();

            let mut lives = state.lives.unwrap_or(1);
            for enemy_id in breached {
                state.events.push(GameEvent::Breached { enemy_id });
                lives = lives.saturating_sub(1);
                state.events.push(GameEvent::LifeLost { remaining: lives });
                log::info!("Enemy {} breached, {} lives left", enemy_id, lives);
                if lives == 0 {
                    break;
                }
            }
            state.lives = Some(lives);
            lives == 0
        }
    }
}
