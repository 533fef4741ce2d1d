//! Run lifecycle around the simulation
//!
//! `Session` owns one engine instance and everything that happens when a run
//! finishes: the summary, the local high score, and the single challenge
//! submission. The host drives it with frame deltas and key events and performs
//! the asynchronous submission itself (`take_submission` / `record_submission_result`).

use crate::challenge::{self, Challenge, ChallengeContext, FollowUp, ScoreSubmission, SubmissionState};
use crate::consts::*;
use crate::highscores::HighScores;
use crate::platform;
use crate::sim::{
    GameConfig, GameEvent, GameState, KeyOutcome, RunSummary, SessionState, normalize_key,
    on_key_press, tick,
};

/// Fixed-timestep accumulator fed with wall-clock frame deltas
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator: f32,
}

impl FrameClock {
    /// Number of `SIM_DT` steps owed for a frame of `frame_dt` seconds
    pub fn steps(&mut self, frame_dt: f32) -> u32 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }
        self.accumulator += frame_dt.min(MAX_FRAME_DT);

        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS {
            // Drop the backlog instead of fast-forwarding later
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        steps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// One player's game session: many runs, one engine
#[derive(Debug)]
pub struct Session {
    pub game: GameState,
    clock: FrameClock,
    challenge: Option<ChallengeContext>,
    challenge_info: Option<Challenge>,
    /// A challenge accepts one score from this player
    challenge_reported: bool,
    summary: Option<RunSummary>,
    submission: SubmissionState,
    outbox: Option<ScoreSubmission>,
    high_scores: HighScores,
    new_best: bool,
}

impl Session {
    pub fn new(config: GameConfig, high_scores: HighScores, seed: u64) -> Self {
        Self {
            game: GameState::new(config, seed),
            clock: FrameClock::default(),
            challenge: None,
            challenge_info: None,
            challenge_reported: false,
            summary: None,
            submission: SubmissionState::NotRequired,
            outbox: None,
            high_scores,
            new_best: false,
        }
    }

    /// Play the next run for a challenge
    pub fn set_challenge(&mut self, context: ChallengeContext) {
        log::info!(
            "Challenge mode: challenge {} as {}",
            context.challenge_id,
            context.role.as_str()
        );
        self.challenge = Some(context);
        self.challenge_reported = false;
    }

    /// Stored challenge record, used to pick the post-submission follow-up
    pub fn set_challenge_info(&mut self, info: Challenge) {
        self.challenge_info = Some(info);
    }

    pub fn challenge(&self) -> Option<&ChallengeContext> {
        self.challenge.as_ref()
    }

    pub fn challenge_info(&self) -> Option<&Challenge> {
        self.challenge_info.as_ref()
    }

    pub fn status(&self) -> SessionState {
        self.game.status
    }

    /// A new run may not begin while a submission is in flight
    pub fn can_start(&self) -> bool {
        self.submission != SubmissionState::Pending
    }

    /// Reset and begin a run (Idle/Ended -> Running). Returns false if blocked.
    pub fn start(&mut self, seed: u64) -> bool {
        if !self.can_start() {
            log::warn!("Start ignored: score submission still pending");
            return false;
        }
        self.game.start(seed);
        self.clock.reset();
        self.summary = None;
        self.new_best = false;
        if self.challenge_reported || self.challenge.is_none() {
            self.submission = SubmissionState::NotRequired;
        }
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        let toggled = self.game.toggle_pause();
        if toggled {
            self.clock.reset();
        }
        toggled
    }

    /// Pause a running game (tab hidden, window blur)
    pub fn auto_pause(&mut self) {
        if self.game.status == SessionState::Running {
            self.toggle_pause();
            log::info!("Auto-paused");
        }
    }

    /// Handle a host key name: Escape pauses, single letters type
    pub fn handle_key(&mut self, key: &str) -> KeyOutcome {
        if key == "Escape" {
            self.toggle_pause();
            return KeyOutcome::Ignored;
        }
        match normalize_key(key) {
            Some(c) => self.key_press(c),
            None => KeyOutcome::Ignored,
        }
    }

    /// Apply one letter immediately
    pub fn key_press(&mut self, key: char) -> KeyOutcome {
        let outcome = on_key_press(&mut self.game, key);
        self.check_ended();
        outcome
    }

    /// Advance the simulation by a wall-clock frame delta (seconds)
    pub fn frame(&mut self, frame_dt: f32) {
        if self.game.status != SessionState::Running {
            self.clock.reset();
            return;
        }
        let steps = self.clock.steps(frame_dt);
        for _ in 0..steps {
            tick(&mut self.game, SIM_DT);
            if self.game.status != SessionState::Running {
                break;
            }
        }
        self.check_ended();
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.game.resize(width, height);
    }

    fn check_ended(&mut self) {
        if self.game.status == SessionState::Ended {
            self.finish_run();
        }
    }

    /// End-of-run effects. Runs at most once per run; returns true the first time.
    pub fn finish_run(&mut self) -> bool {
        if self.summary.is_some() {
            return false;
        }
        self.game.end_run();
        if self.game.status != SessionState::Ended {
            return false;
        }

        let summary = RunSummary::from_run(&self.game.stats, self.game.elapsed_ms);
        log::info!(
            "Run summary: score {}, {} WPM, {}% accuracy, {} destroyed",
            summary.score,
            summary.wpm,
            summary.accuracy,
            summary.destroyed
        );

        let previous_best = self.high_scores.best();
        if self.high_scores.record(&summary, platform::now_ms()).is_some()
            || summary.score > previous_best
        {
            self.high_scores.save();
        }
        self.new_best = summary.score > previous_best;

        if let Some(context) = &self.challenge {
            if !self.challenge_reported {
                self.outbox = Some(ScoreSubmission::new(context, &summary));
                self.submission = SubmissionState::Pending;
                self.challenge_reported = true;
            }
        }

        self.summary = Some(summary);
        true
    }

    /// Hand the queued submission to the host, once
    pub fn take_submission(&mut self) -> Option<ScoreSubmission> {
        self.outbox.take()
    }

    /// Outcome of the host's submission call; ignored unless one is pending
    pub fn record_submission_result(&mut self, result: challenge::Result<FollowUp>) {
        if self.submission != SubmissionState::Pending {
            return;
        }
        self.submission = match result {
            Ok(follow_up) => SubmissionState::Submitted(follow_up),
            Err(e) => {
                log::warn!("Score submission failed: {}", e);
                SubmissionState::Failed(e.to_string())
            }
        };
    }

    pub fn submission_state(&self) -> &SubmissionState {
        &self.submission
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn is_new_best(&self) -> bool {
        self.new_best
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.game.drain_events()
    }

    /// Stop everything; the session returns to the menu with no pending work
    pub fn dispose(&mut self) {
        self.game.status = SessionState::Idle;
        self.game.enemies.clear();
        self.game.locked_target = None;
        self.game.events.clear();
        self.clock.reset();
        // A queued score that never left is dropped; one in flight still reports back
        if self.outbox.take().is_some() {
            self.submission = SubmissionState::NotRequired;
            self.challenge_reported = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::tests::{MockNotifier, MockStore, block_on};
    use crate::challenge::{ChallengeStatus, PlayerIdentity, PlayerRole, PlayerSlot, report_score};
    use crate::sim::FailurePolicy;

    fn session() -> Session {
        Session::new(GameConfig::default(), HighScores::new(), 1)
    }

    fn challenge_context() -> ChallengeContext {
        ChallengeContext {
            challenge_id: 13,
            role: PlayerRole::Creator,
            player: PlayerIdentity::from_fid(100),
        }
    }

    /// Let enemies fall until the run ends
    fn play_until_end(session: &mut Session) {
        for _ in 0..10_000 {
            session.frame(1.0 / 60.0);
            if session.status() == SessionState::Ended {
                return;
            }
        }
        panic!("run never ended");
    }

    #[test]
    fn test_frame_clock_fixed_steps() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.steps(SIM_DT * 2.5), 2);
        assert_eq!(clock.steps(SIM_DT * 0.75), 1);
        assert_eq!(clock.steps(0.0), 0);
        assert_eq!(clock.steps(f32::NAN), 0);
        // Huge frames are clamped and capped
        assert_eq!(clock.steps(5.0), MAX_SUBSTEPS);
        assert_eq!(clock.steps(0.0), 0);
    }

    #[test]
    fn test_lifecycle() {
        let mut s = session();
        assert_eq!(s.status(), SessionState::Idle);
        assert!(s.start(5));
        assert_eq!(s.status(), SessionState::Running);
        s.handle_key("Escape");
        assert_eq!(s.status(), SessionState::Paused);
        s.handle_key("Escape");
        assert_eq!(s.status(), SessionState::Running);
        play_until_end(&mut s);
        assert!(s.summary().is_some());
        assert!(s.start(6));
        assert_eq!(s.status(), SessionState::Running);
        assert!(s.summary().is_none());
        assert_eq!(s.game.stats.wrong_keystrokes, 0);
    }

    #[test]
    fn test_paused_frames_do_not_advance_clock() {
        let mut s = session();
        s.start(1);
        s.frame(0.05);
        let elapsed = s.game.elapsed_ms;
        s.toggle_pause();
        for _ in 0..100 {
            s.frame(0.1);
        }
        assert_eq!(s.game.elapsed_ms, elapsed);
        s.toggle_pause();
        s.frame(SIM_DT);
        assert!(s.game.elapsed_ms - elapsed < 20.0);
    }

    #[test]
    fn test_summary_computed_once() {
        let mut s = session();
        s.start(3);
        play_until_end(&mut s);
        let first = s.summary().cloned().unwrap();
        assert!(!s.finish_run());
        s.frame(0.1);
        assert_eq!(s.summary(), Some(&first));
    }

    #[test]
    fn test_free_play_has_no_submission() {
        let mut s = session();
        s.start(3);
        play_until_end(&mut s);
        assert_eq!(*s.submission_state(), SubmissionState::NotRequired);
        assert!(s.take_submission().is_none());
    }

    #[test]
    fn test_challenge_submits_exactly_once() {
        let mut s = session();
        s.set_challenge(challenge_context());
        s.start(3);
        play_until_end(&mut s);

        // Overlapping end triggers
        assert!(!s.finish_run());
        s.game.end_run();
        assert!(!s.finish_run());

        let store = MockStore::default();
        let notifier = MockNotifier::default();
        while let Some(submission) = s.take_submission() {
            let result = block_on(report_score(
                &store,
                &notifier,
                &submission,
                PlayerRole::Creator,
                None,
            ));
            s.record_submission_result(result);
        }
        assert_eq!(store.submissions.borrow().len(), 1);
        let sent = &store.submissions.borrow()[0];
        assert_eq!(sent.score, s.summary().unwrap().score);
        assert_eq!(sent.player_fid, 100);
        assert_eq!(*s.submission_state(), SubmissionState::Submitted(FollowUp::None));
    }

    #[test]
    fn test_pending_submission_blocks_restart() {
        let mut s = session();
        s.set_challenge(challenge_context());
        s.start(3);
        play_until_end(&mut s);
        assert_eq!(*s.submission_state(), SubmissionState::Pending);
        assert!(!s.start(4));
        assert_eq!(s.status(), SessionState::Ended);
    }

    #[test]
    fn test_failed_submission_keeps_summary() {
        let mut s = session();
        s.set_challenge(challenge_context());
        s.set_challenge_info(Challenge {
            id: 13,
            creator: PlayerSlot {
                address: "0xc".into(),
                fid: 100,
                name: None,
            },
            opponent: None,
            bet_amount: 1_000_000,
            status: ChallengeStatus::Created,
            winner: None,
        });
        s.start(3);
        play_until_end(&mut s);

        let store = MockStore {
            reject: true,
            ..Default::default()
        };
        let notifier = MockNotifier::default();
        let submission = s.take_submission().unwrap();
        let info = s.challenge_info().cloned();
        let result = block_on(report_score(
            &store,
            &notifier,
            &submission,
            PlayerRole::Creator,
            info.as_ref(),
        ));
        s.record_submission_result(result);

        assert!(matches!(s.submission_state(), SubmissionState::Failed(msg) if msg.contains("rejected")));
        assert!(s.summary().is_some());
        // Late duplicate answers are ignored
        s.record_submission_result(Ok(FollowUp::None));
        assert!(matches!(s.submission_state(), SubmissionState::Failed(_)));

        // The challenge already has this player's run; the next one is free play
        assert!(s.start(9));
        play_until_end(&mut s);
        assert!(s.take_submission().is_none());
        assert_eq!(*s.submission_state(), SubmissionState::NotRequired);
    }

    #[test]
    fn test_high_score_is_monotonic() {
        let mut s = session();
        s.start(3);
        // Type the first word to bank some points
        s.frame(SIM_DT);
        let word = s.game.enemies[0].word.clone();
        for c in word.chars() {
            s.key_press(c);
        }
        play_until_end(&mut s);
        let best = s.high_scores().best();
        assert_eq!(best, s.summary().unwrap().score);
        assert!(s.is_new_best());

        // A worse run (all misses) leaves the best alone
        s.start(4);
        for _ in 0..200 {
            s.key_press('q');
        }
        play_until_end(&mut s);
        assert!(s.summary().unwrap().score < best);
        assert_eq!(s.high_scores().best(), best);
        assert!(!s.is_new_best());
    }

    #[test]
    fn test_lives_policy_session() {
        let mut s = Session::new(
            GameConfig {
                policy: FailurePolicy::Lives(2),
            },
            HighScores::new(),
            1,
        );
        s.start(2);
        play_until_end(&mut s);
        assert_eq!(s.game.lives, Some(0));
        assert!(s.summary().is_some());
    }

    #[test]
    fn test_dispose_releases_unsent_submission() {
        let mut s = session();
        s.set_challenge(challenge_context());
        s.start(3);
        play_until_end(&mut s);
        assert_eq!(*s.submission_state(), SubmissionState::Pending);

        s.dispose();
        assert_eq!(*s.submission_state(), SubmissionState::NotRequired);
        assert!(s.take_submission().is_none());
        assert!(s.can_start());

        // The challenge still wants this player's score
        assert!(s.start(4));
        play_until_end(&mut s);
        assert!(s.take_submission().is_some());
    }

    #[test]
    fn test_dispose_keeps_in_flight_submission() {
        let mut s = session();
        s.set_challenge(challenge_context());
        s.start(3);
        play_until_end(&mut s);
        let sent = s.take_submission();
        assert!(sent.is_some());

        s.dispose();
        assert_eq!(*s.submission_state(), SubmissionState::Pending);
        s.record_submission_result(Ok(FollowUp::None));
        assert_eq!(*s.submission_state(), SubmissionState::Submitted(FollowUp::None));
        assert!(s.can_start());
    }

    #[test]
    fn test_dispose_stops_run() {
        let mut s = session();
        s.start(1);
        s.frame(0.05);
        s.dispose();
        assert_eq!(s.status(), SessionState::Idle);
        assert!(s.game.enemies.is_empty());
        let elapsed = s.game.elapsed_ms;
        s.frame(0.1);
        assert_eq!(s.game.elapsed_ms, elapsed);
    }
}
