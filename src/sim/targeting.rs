//! Keystroke targeting
//!
//! Each letter either locks onto an enemy, advances the locked enemy, or counts
//! as a miss. Keys are applied one at a time as they arrive; nothing is batched.

use super::scoring::points_for_kill;
use super::state::{GameEvent, GameState};

/// Result of one key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not a letter, or the run is not accepting input
    Ignored,
    /// Wrong letter, or no enemy expects it
    Miss,
    /// Correct letter, word not finished
    Hit { enemy_id: u32 },
    /// Correct letter that finished the word
    Kill { enemy_id: u32, points: u64 },
}

/// Lowercase a single ASCII letter; anything else is not a typing key
pub fn normalize_key(key: &str) -> Option<char> {
    let mut chars = key.chars();
    let c = chars.next()?;
    if chars.next().is_some() || !c.is_ascii_alphabetic() {
        return None;
    }
    Some(c.to_ascii_lowercase())
}

/// Apply one key press to the running game
pub fn on_key_press(state: &mut GameState, key: char) -> KeyOutcome {
    if !state.is_running() || !key.is_ascii_alphabetic() {
        return KeyOutcome::Ignored;
    }
    let key = key.to_ascii_lowercase();

    state.heal_lock();
    let locked_index = state
        .locked_target
        .and_then(|id| state.enemies.iter().position(|e| e.id == id));

    let index = match locked_index {
        Some(index) => index,
        None => match state
            .enemies
            .iter()
            .position(|e| e.next_char() == Some(key))
        {
            Some(index) => {
                state.locked_target = Some(state.enemies[index].id);
                index
            }
            None => {
                state.stats.record_miss();
                state.events.push(GameEvent::Miss);
                return KeyOutcome::Miss;
            }
        },
    };

    let enemy = &mut state.enemies[index];
    if enemy.next_char() != Some(key) {
        // Wrong letter keeps the lock and the progress
        state.stats.record_miss();
        state.events.push(GameEvent::Miss);
        return KeyOutcome::Miss;
    }

    enemy.typed += 1;
    let enemy_id = enemy.id;
    let finished = enemy.is_complete();
    state.stats.record_hit();
    state.events.push(GameEvent::Shot { enemy_id });

    if !finished {
        return KeyOutcome::Hit { enemy_id };
    }

    let enemy = state.enemies.remove(index);
    state.locked_target = None;
    let streak = state.stats.record_kill();
    let points = points_for_kill(enemy.word.len(), state.phase_config().phase, streak);
    state.stats.score += points;
    state.events.push(GameEvent::Killed { enemy_id, points });
    log::debug!(
        "Destroyed '{}' for {} points (streak {})",
        enemy.word,
        points,
        streak
    );
    KeyOutcome::Kill { enemy_id, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SPAWN_Y;
    use crate::sim::state::{Enemy, GameConfig, SessionState};
    use glam::Vec2;
    use proptest::prelude::*;

    fn state_with_words(words: &[&str]) -> GameState {
        let mut state = GameState::new(GameConfig::default(), 1);
        state.start(1);
        for word in words {
            let id = state.next_entity_id();
            state.enemies.push(Enemy {
                id,
                word: word.to_string(),
                typed: 0,
                pos: Vec2::new(100.0, SPAWN_Y),
                speed: 45.0,
                sprite: 1,
            });
        }
        state
    }

    fn type_str(state: &mut GameState, text: &str) -> Vec<KeyOutcome> {
        text.chars().map(|c| on_key_press(state, c)).collect()
    }

    #[test]
    fn test_kill_cat_scores_eighteen() {
        let mut state = state_with_words(&["cat"]);
        let outcomes = type_str(&mut state, "cat");
        assert_eq!(outcomes[0], KeyOutcome::Hit { enemy_id: 1 });
        assert_eq!(outcomes[2], KeyOutcome::Kill { enemy_id: 1, points: 18 });
        assert_eq!(state.stats.score, 18);
        assert_eq!(state.stats.destroyed, 1);
        assert_eq!(state.stats.streak, 1);
        assert_eq!(state.stats.correct_keystrokes, 3);
        assert!(state.enemies.is_empty());
        assert_eq!(state.locked_target, None);
    }

    #[test]
    fn test_empty_board_counts_miss() {
        let mut state = state_with_words(&[]);
        assert_eq!(on_key_press(&mut state, 'q'), KeyOutcome::Miss);
        assert_eq!(state.stats.wrong_keystrokes, 1);
        assert_eq!(state.stats.score, 0);
        assert_eq!(state.stats.accuracy, 0);
    }

    #[test]
    fn test_lock_picks_first_match_in_spawn_order() {
        let mut state = state_with_words(&["dog", "door", "cat"]);
        on_key_press(&mut state, 'd');
        assert_eq!(state.locked_target, Some(1));
        // Another enemy also expects 'o' but the lock holds
        on_key_press(&mut state, 'o');
        assert_eq!(state.enemies[0].typed, 2);
        assert_eq!(state.enemies[1].typed, 0);
    }

    #[test]
    fn test_wrong_key_keeps_lock_and_progress() {
        let mut state = state_with_words(&["rover", "cat"]);
        type_str(&mut state, "ro");
        state.stats.streak = 5;
        // 'c' matches the other enemy, but the lock stays on the rover
        assert_eq!(on_key_press(&mut state, 'c'), KeyOutcome::Miss);
        assert_eq!(state.locked_target, Some(1));
        assert_eq!(state.enemies[0].typed, 2);
        assert_eq!(state.enemies[1].typed, 0);
        assert_eq!(state.stats.streak, 0);
        assert_eq!(state.stats.wrong_keystrokes, 1);
    }

    #[test]
    fn test_partial_progress_leaves_streak() {
        let mut state = state_with_words(&["cat", "moon"]);
        type_str(&mut state, "cat");
        type_str(&mut state, "mo");
        assert_eq!(state.stats.streak, 1);
        assert_eq!(state.stats.destroyed, 1);
        on_key_press(&mut state, 'o');
        on_key_press(&mut state, 'n');
        assert_eq!(state.stats.streak, 2);
        assert_eq!(state.stats.longest_streak, 2);
        // Second kill: 10 + 8 + 0 + 4
        assert_eq!(state.stats.score, 18 + 22);
    }

    #[test]
    fn test_uppercase_is_case_insensitive() {
        let mut state = state_with_words(&["cat"]);
        type_str(&mut state, "CAT");
        assert_eq!(state.stats.destroyed, 1);
    }

    #[test]
    fn test_stale_lock_self_heals() {
        let mut state = state_with_words(&["cat", "dog"]);
        on_key_press(&mut state, 'c');
        state.enemies.remove(0);
        assert_eq!(on_key_press(&mut state, 'd'), KeyOutcome::Hit { enemy_id: 2 });
        assert_eq!(state.locked_target, Some(2));
    }

    #[test]
    fn test_non_letters_ignored() {
        let mut state = state_with_words(&["cat"]);
        assert_eq!(on_key_press(&mut state, '1'), KeyOutcome::Ignored);
        assert_eq!(on_key_press(&mut state, ' '), KeyOutcome::Ignored);
        assert_eq!(state.stats.wrong_keystrokes, 0);
        assert_eq!(normalize_key("Escape"), None);
        assert_eq!(normalize_key("A"), Some('a'));
        assert_eq!(normalize_key("7"), None);
        assert_eq!(normalize_key(""), None);
    }

    #[test]
    fn test_paused_ignores_keys() {
        let mut state = state_with_words(&["cat"]);
        state.toggle_pause();
        assert_eq!(state.status, SessionState::Paused);
        assert_eq!(on_key_press(&mut state, 'c'), KeyOutcome::Ignored);
        assert_eq!(state.enemies[0].typed, 0);
    }

    #[test]
    fn test_kill_increments_streak_by_one() {
        let mut state = state_with_words(&["ab", "cd"]);
        type_str(&mut state, "ab");
        let before = state.stats.streak;
        type_str(&mut state, "cd");
        assert_eq!(state.stats.streak, before + 1);
    }

    proptest! {
        #[test]
        fn prop_invariants_hold_under_any_typing(keys in proptest::collection::vec(proptest::char::range('a', 'z'), 0..200)) {
            let mut state = state_with_words(&["cat", "rocket", "orbit", "zap", "nova"]);
            for key in keys {
                let wrong_before = state.stats.wrong_keystrokes;
                let outcome = on_key_press(&mut state, key);
                prop_assert!(state.invariants_hold());
                prop_assert!(state.stats.accuracy <= 100);
                if outcome == KeyOutcome::Miss {
                    prop_assert_eq!(state.stats.streak, 0);
                    prop_assert_eq!(state.stats.wrong_keystrokes, wrong_before + 1);
                }
            }
        }
    }
}
