//! Head-to-head challenges
//!
//! Two players stake USDC on who posts the higher composite score. The engine
//! only produces a `ScoreSubmission`; storage, notifications and on-chain
//! settlement are collaborators behind the traits below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::RunSummary;

/// USDC has six decimals
pub const USDC_DECIMALS: u32 = 6;

/// Errors talking to the challenge store or notifier
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("score rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("player {0} is not part of this challenge")]
    NotAParticipant(u64),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SubmitError>;

/// Errors resolving or paying out a challenge
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("challenge {id} cannot be settled while {status:?}")]
    NotReady { id: u64, status: ChallengeStatus },

    #[error("challenge {0} has no opponent")]
    MissingOpponent(u64),

    #[error("settlement call failed: {0}")]
    Failed(String),
}

/// Which seat the local player occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerRole {
    Creator,
    Opponent,
}

impl PlayerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerRole::Creator => "creator",
            PlayerRole::Opponent => "opponent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "creator" => Some(PlayerRole::Creator),
            "opponent" => Some(PlayerRole::Opponent),
            _ => None,
        }
    }
}

/// Social-graph id plus payout address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub fid: u64,
    pub address: String,
}

impl PlayerIdentity {
    /// Identity for a player whose wallet is not known yet
    pub fn from_fid(fid: u64) -> Self {
        Self {
            fid,
            address: format!("fid:{}", fid),
        }
    }
}

/// Present when a run is played for a challenge; absent in free play
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeContext {
    pub challenge_id: u64,
    pub role: PlayerRole,
    pub player: PlayerIdentity,
}

impl ChallengeContext {
    /// Build from URL-style parameters: `challengeId`, `role`, `fid`, optional `address`.
    ///
    /// Returns None when any required parameter is missing or malformed.
    pub fn from_params<F>(get: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let challenge_id = get("challengeId")?.trim().parse().ok()?;
        let role = PlayerRole::from_str(&get("role")?)?;
        let fid = get("fid")?.trim().parse().ok()?;
        let player = match get("address").filter(|a| !a.trim().is_empty()) {
            Some(address) => PlayerIdentity { fid, address },
            None => PlayerIdentity::from_fid(fid),
        };
        Some(Self {
            challenge_id,
            role,
            player,
        })
    }
}

/// Lifecycle of a stored challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    /// Bet placed, creator has not played
    Created,
    /// Creator played, opponent invited
    WaitingOpponent,
    /// Opponent staked and may play
    Accepted,
    /// Winner decided
    Completed,
}

/// One seat of a challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub address: String,
    pub fid: u64,
    #[serde(default)]
    pub name: Option<String>,
}

/// A wager between two players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: u64,
    pub creator: PlayerSlot,
    #[serde(default)]
    pub opponent: Option<PlayerSlot>,
    /// Stake in USDC base units
    pub bet_amount: u64,
    pub status: ChallengeStatus,
    #[serde(default)]
    pub winner: Option<String>,
}

impl Challenge {
    /// Seat held by the given fid
    pub fn role_of(&self, fid: u64) -> Option<PlayerRole> {
        if self.creator.fid == fid {
            Some(PlayerRole::Creator)
        } else if self.opponent.as_ref().is_some_and(|o| o.fid == fid) {
            Some(PlayerRole::Opponent)
        } else {
            None
        }
    }
}

/// `1500000` -> `"1.5 USDC"`, `2000000` -> `"2 USDC"`
pub fn format_usdc(amount: u64) -> String {
    let unit = 10u64.pow(USDC_DECIMALS);
    let fraction = amount % unit;
    if fraction == 0 {
        return format!("{} USDC", amount / unit);
    }
    let digits = format!("{:0width$}", fraction, width = USDC_DECIMALS as usize);
    format!("{}.{} USDC", amount / unit, digits.trim_end_matches('0'))
}

/// Challenge as the challenge API serves it (flat, stake as a decimal string)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRecord {
    pub id: u64,
    pub creator: String,
    pub creator_fid: u64,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub opponent_fid: Option<u64>,
    #[serde(default)]
    pub opponent_name: Option<String>,
    pub bet_amount: String,
    pub status: ChallengeStatus,
    #[serde(default)]
    pub winner: Option<String>,
}

impl TryFrom<ChallengeRecord> for Challenge {
    type Error = String;

    fn try_from(record: ChallengeRecord) -> std::result::Result<Self, Self::Error> {
        let bet_amount = record
            .bet_amount
            .trim()
            .parse()
            .map_err(|_| format!("bad bet amount {:?}", record.bet_amount))?;
        let opponent = match (record.opponent, record.opponent_fid) {
            (Some(address), Some(fid)) => Some(PlayerSlot {
                address,
                fid,
                name: record.opponent_name,
            }),
            _ => None,
        };
        Ok(Challenge {
            id: record.id,
            creator: PlayerSlot {
                address: record.creator,
                fid: record.creator_fid,
                name: record.creator_name,
            },
            opponent,
            bet_amount,
            status: record.status,
            winner: record.winner,
        })
    }
}

/// Notification asking the opponent to play
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentInvite {
    pub target_fid: u64,
    pub challenger_name: String,
    pub usdc_amount: String,
    pub challenge_id: u64,
    pub challenge_url: String,
}

impl OpponentInvite {
    /// None until the challenge has an opponent
    pub fn new(challenge: &Challenge, origin: &str) -> Option<Self> {
        let opponent = challenge.opponent.as_ref()?;
        Some(Self {
            target_fid: opponent.fid,
            challenger_name: challenge
                .creator
                .name
                .clone()
                .unwrap_or_else(|| "Someone".to_string()),
            usdc_amount: format_usdc(challenge.bet_amount),
            challenge_id: challenge.id,
            challenge_url: format!("{}/challenge/{}", origin.trim_end_matches('/'), challenge.id),
        })
    }
}

/// The result a run reports to the challenge store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub challenge_id: u64,
    pub player_address: String,
    pub player_fid: u64,
    /// Composite score
    pub score: u64,
    pub wpm: u32,
    pub accuracy: u32,
    /// Seconds of unpaused play
    pub duration: f64,
}

impl ScoreSubmission {
    pub fn new(context: &ChallengeContext, summary: &RunSummary) -> Self {
        Self {
            challenge_id: context.challenge_id,
            player_address: context.player.address.clone(),
            player_fid: context.player.fid,
            score: summary.score,
            wpm: summary.wpm,
            accuracy: summary.accuracy,
            duration: summary.duration_seconds,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Progress of the end-of-run submission, observed by the UI
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    /// Free play, nothing to submit
    #[default]
    NotRequired,
    /// Handed to the store, no answer yet
    Pending,
    Submitted(FollowUp),
    /// Not retried
    Failed(String),
}

/// Side message shown after a successful submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowUp {
    #[default]
    None,
    /// Creator's first score: challenge opened to the opponent
    OpponentNotified,
    /// Opponent's score is in; the result is being settled
    ResultsPending,
}

impl FollowUp {
    /// What a successful submission leads to, given the status at run end
    pub fn after_submission(status: ChallengeStatus, role: PlayerRole) -> Self {
        match (status, role) {
            (ChallengeStatus::Created, PlayerRole::Creator) => FollowUp::OpponentNotified,
            (ChallengeStatus::Accepted, PlayerRole::Opponent) => FollowUp::ResultsPending,
            _ => FollowUp::None,
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            FollowUp::None => None,
            FollowUp::OpponentNotified => Some("Challenge ready - your opponent has been notified"),
            FollowUp::ResultsPending => Some("Both scores are in - the winner is being settled"),
        }
    }
}

/// Persistent challenge records
#[allow(async_fn_in_trait)]
pub trait ChallengeStore {
    async fn fetch_challenge(&self, challenge_id: u64) -> Result<Challenge>;

    async fn submit_score(&self, submission: &ScoreSubmission) -> Result<()>;

    /// `Created` -> `WaitingOpponent`
    async fn mark_creator_played(&self, challenge_id: u64) -> Result<()>;
}

/// Push notifications to players
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify_opponent(&self, challenge: &Challenge) -> Result<()>;
    async fn notify_winner(&self, settlement: &Settlement) -> Result<()>;
    async fn notify_loser(&self, settlement: &Settlement) -> Result<()>;
}

/// On-chain payout
#[allow(async_fn_in_trait)]
pub trait SettlementService {
    /// Returns the transaction hash
    async fn set_winner(
        &self,
        challenge_id: u64,
        winner_address: &str,
    ) -> std::result::Result<String, SettlementError>;
}

/// Submit a finished run and perform the follow-up its challenge status calls for.
///
/// An unknown challenge record is looked up before submitting, since the
/// follow-up depends on the status the run ended under. Only the submission
/// itself can fail; lookup and follow-up errors are logged.
pub async fn report_score<S, N>(
    store: &S,
    notifier: &N,
    submission: &ScoreSubmission,
    role: PlayerRole,
    challenge: Option<&Challenge>,
) -> Result<FollowUp>
where
    S: ChallengeStore,
    N: Notifier,
{
    let fetched;
    let challenge = match challenge {
        Some(challenge) => Some(challenge),
        None => match store.fetch_challenge(submission.challenge_id).await {
            Ok(record) => {
                fetched = record;
                Some(&fetched)
            }
            Err(e) => {
                log::warn!(
                    "Challenge {} lookup failed before submission: {}",
                    submission.challenge_id,
                    e
                );
                None
            }
        },
    };

    store.submit_score(submission).await?;
    log::info!(
        "Score {} submitted for challenge {}",
        submission.score,
        submission.challenge_id
    );

    let Some(challenge) = challenge else {
        return Ok(FollowUp::None);
    };
    let follow_up = FollowUp::after_submission(challenge.status, role);
    if follow_up == FollowUp::OpponentNotified {
        if let Err(e) = store.mark_creator_played(challenge.id).await {
            log::warn!("Failed to mark creator played on {}: {}", challenge.id, e);
        }
        if let Err(e) = notifier.notify_opponent(challenge).await {
            log::warn!("Failed to notify opponent of {}: {}", challenge.id, e);
        }
    }
    Ok(follow_up)
}

/// Higher score wins; ties go to higher WPM, then to the creator
pub fn resolve_winner(creator: &ScoreSubmission, opponent: &ScoreSubmission) -> PlayerRole {
    if creator.score != opponent.score {
        if creator.score > opponent.score {
            PlayerRole::Creator
        } else {
            PlayerRole::Opponent
        }
    } else if creator.wpm >= opponent.wpm {
        PlayerRole::Creator
    } else {
        PlayerRole::Opponent
    }
}

/// Outcome of a settled challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub challenge_id: u64,
    pub winner: PlayerRole,
    pub winner_address: String,
    pub winner_fid: u64,
    pub loser_fid: u64,
    pub winner_score: u64,
    pub loser_score: u64,
    pub usdc_amount: String,
    pub transaction_hash: Option<String>,
}

/// Decide an accepted challenge once both scores are in.
///
/// The challenge is marked completed before the payout call; a failed payout or
/// notification is logged and leaves `transaction_hash` empty.
pub async fn settle<S, N>(
    challenge: &mut Challenge,
    creator_score: &ScoreSubmission,
    opponent_score: &ScoreSubmission,
    settlement_service: &S,
    notifier: &N,
) -> std::result::Result<Settlement, SettlementError>
where
    S: SettlementService,
    N: Notifier,
{
    if challenge.status != ChallengeStatus::Accepted {
        return Err(SettlementError::NotReady {
            id: challenge.id,
            status: challenge.status,
        });
    }
    let opponent = challenge
        .opponent
        .clone()
        .ok_or(SettlementError::MissingOpponent(challenge.id))?;

    let winner = resolve_winner(creator_score, opponent_score);
    let (winner_slot, loser_slot, winner_score, loser_score) = match winner {
        PlayerRole::Creator => (
            challenge.creator.clone(),
            opponent,
            creator_score.score,
            opponent_score.score,
        ),
        PlayerRole::Opponent => (
            opponent,
            challenge.creator.clone(),
            opponent_score.score,
            creator_score.score,
        ),
    };

    challenge.winner = Some(winner_slot.address.clone());
    challenge.status = ChallengeStatus::Completed;
    log::info!(
        "Challenge {} won by {} ({} vs {})",
        challenge.id,
        winner.as_str(),
        winner_score,
        loser_score
    );

    let transaction_hash = match settlement_service
        .set_winner(challenge.id, &winner_slot.address)
        .await
    {
        Ok(hash) => Some(hash),
        Err(e) => {
            log::warn!("Payout for challenge {} failed: {}", challenge.id, e);
            None
        }
    };

    let settlement = Settlement {
        challenge_id: challenge.id,
        winner,
        winner_address: winner_slot.address,
        winner_fid: winner_slot.fid,
        loser_fid: loser_slot.fid,
        winner_score,
        loser_score,
        usdc_amount: format_usdc(challenge.bet_amount),
        transaction_hash,
    };

    if let Err(e) = notifier.notify_winner(&settlement).await {
        log::warn!("Winner notification for {} failed: {}", challenge.id, e);
    }
    if let Err(e) = notifier.notify_loser(&settlement).await {
        log::warn!("Loser notification for {} failed: {}", challenge.id, e);
    }
    Ok(settlement)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::future::Future;
    use std::task::{Context, Poll, Waker};

    /// Drive a future whose collaborators never actually suspend
    pub(crate) fn block_on<F: Future>(fut: F) -> F::Output {
        let mut fut = std::pin::pin!(fut);
        let mut cx = Context::from_waker(Waker::noop());
        loop {
            if let Poll::Ready(v) = fut.as_mut().poll(&mut cx) {
                return v;
            }
        }
    }

    #[derive(Default)]
    pub(crate) struct MockStore {
        pub submissions: RefCell<Vec<ScoreSubmission>>,
        pub marked: Cell<u32>,
        pub reject: bool,
        /// Served by `fetch_challenge`; None answers 404
        pub record: Option<Challenge>,
        pub lookups: Cell<u32>,
    }

    impl ChallengeStore for MockStore {
        async fn fetch_challenge(&self, _challenge_id: u64) -> Result<Challenge> {
            self.lookups.set(self.lookups.get() + 1);
            self.record.clone().ok_or_else(|| SubmitError::Rejected {
                status: 404,
                message: "Challenge not found".into(),
            })
        }

        async fn submit_score(&self, submission: &ScoreSubmission) -> Result<()> {
            if self.reject {
                return Err(SubmitError::Rejected {
                    status: 400,
                    message: "challenge not accepted".into(),
                });
            }
            self.submissions.borrow_mut().push(submission.clone());
            Ok(())
        }

        async fn mark_creator_played(&self, _challenge_id: u64) -> Result<()> {
            self.marked.set(self.marked.get() + 1);
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct MockNotifier {
        pub opponent: Cell<u32>,
        pub winners: RefCell<Vec<u64>>,
        pub losers: RefCell<Vec<u64>>,
        pub fail: bool,
    }

    impl Notifier for MockNotifier {
        async fn notify_opponent(&self, _challenge: &Challenge) -> Result<()> {
            self.opponent.set(self.opponent.get() + 1);
            if self.fail {
                return Err(SubmitError::Transport("offline".into()));
            }
            Ok(())
        }

        async fn notify_winner(&self, settlement: &Settlement) -> Result<()> {
            self.winners.borrow_mut().push(settlement.winner_fid);
            Ok(())
        }

        async fn notify_loser(&self, settlement: &Settlement) -> Result<()> {
            self.losers.borrow_mut().push(settlement.loser_fid);
            Ok(())
        }
    }

    struct MockChain {
        fail: bool,
    }

    impl SettlementService for MockChain {
        async fn set_winner(
            &self,
            _challenge_id: u64,
            winner_address: &str,
        ) -> std::result::Result<String, SettlementError> {
            if self.fail {
                return Err(SettlementError::Failed("reverted".into()));
            }
            Ok(format!("0xabc-{}", winner_address))
        }
    }

    fn challenge(status: ChallengeStatus) -> Challenge {
        Challenge {
            id: 13,
            creator: PlayerSlot {
                address: "0xcreator".into(),
                fid: 100,
                name: Some("alice".into()),
            },
            opponent: Some(PlayerSlot {
                address: "0xopponent".into(),
                fid: 200,
                name: None,
            }),
            bet_amount: 2_500_000,
            status,
            winner: None,
        }
    }

    fn submission(fid: u64, score: u64, wpm: u32) -> ScoreSubmission {
        ScoreSubmission {
            challenge_id: 13,
            player_address: format!("fid:{}", fid),
            player_fid: fid,
            score,
            wpm,
            accuracy: 95,
            duration: 61.5,
        }
    }

    #[test]
    fn test_record_to_challenge() {
        let json = r#"{
            "id": 7,
            "creator": "0xaaa",
            "creatorFid": 100,
            "creatorName": "alice",
            "opponent": "0xbbb",
            "opponentFid": 200,
            "betAmount": "2500000",
            "status": "waiting_opponent",
            "createdAt": "2025-01-01T00:00:00Z"
        }"#;
        let record: ChallengeRecord = serde_json::from_str(json).unwrap();
        let challenge = Challenge::try_from(record).unwrap();
        assert_eq!(challenge.bet_amount, 2_500_000);
        assert_eq!(challenge.status, ChallengeStatus::WaitingOpponent);
        assert_eq!(challenge.role_of(200), Some(PlayerRole::Opponent));
        assert_eq!(challenge.creator.name.as_deref(), Some("alice"));

        let invite = OpponentInvite::new(&challenge, "https://arbistrike.app/").unwrap();
        assert_eq!(invite.target_fid, 200);
        assert_eq!(invite.usdc_amount, "2.5 USDC");
        assert_eq!(invite.challenge_url, "https://arbistrike.app/challenge/7");
        let wire = serde_json::to_value(&invite).unwrap();
        assert_eq!(wire["challengerName"], "alice");
    }

    #[test]
    fn test_record_rejects_bad_stake() {
        let record = ChallengeRecord {
            id: 1,
            creator: "0xaaa".into(),
            creator_fid: 1,
            creator_name: None,
            opponent: None,
            opponent_fid: None,
            opponent_name: None,
            bet_amount: "lots".into(),
            status: ChallengeStatus::Created,
            winner: None,
        };
        let challenge = Challenge::try_from(record.clone());
        assert!(challenge.is_err());

        let open = Challenge::try_from(ChallengeRecord {
            bet_amount: "1".into(),
            ..record
        })
        .unwrap();
        assert!(open.opponent.is_none());
        assert!(OpponentInvite::new(&open, "https://x").is_none());
    }

    #[test]
    fn test_context_from_params() {
        let params = |key: &str| match key {
            "challengeId" => Some("13".to_string()),
            "role" => Some("Opponent".to_string()),
            "fid" => Some("200".to_string()),
            _ => None,
        };
        let ctx = ChallengeContext::from_params(params).unwrap();
        assert_eq!(ctx.challenge_id, 13);
        assert_eq!(ctx.role, PlayerRole::Opponent);
        assert_eq!(ctx.player.address, "fid:200");

        let missing_role = |key: &str| match key {
            "challengeId" => Some("13".to_string()),
            "fid" => Some("200".to_string()),
            _ => None,
        };
        assert!(ChallengeContext::from_params(missing_role).is_none());
    }

    #[test]
    fn test_role_of() {
        let c = challenge(ChallengeStatus::Accepted);
        assert_eq!(c.role_of(100), Some(PlayerRole::Creator));
        assert_eq!(c.role_of(200), Some(PlayerRole::Opponent));
        assert_eq!(c.role_of(300), None);
    }

    #[test]
    fn test_format_usdc() {
        assert_eq!(format_usdc(2_500_000), "2.5 USDC");
        assert_eq!(format_usdc(1), "0.000001 USDC");
        assert_eq!(format_usdc(0), "0 USDC");
        assert_eq!(format_usdc(3_000_000), "3 USDC");
        assert_eq!(format_usdc(1_250_000), "1.25 USDC");
    }

    #[test]
    fn test_submission_wire_format() {
        let json = submission(100, 1166, 20).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["challengeId"], 13);
        assert_eq!(value["playerAddress"], "fid:100");
        assert_eq!(value["playerFid"], 100);
        assert_eq!(value["score"], 1166);
        assert_eq!(value["wpm"], 20);
        assert_eq!(value["duration"], 61.5);
    }

    #[test]
    fn test_challenge_status_names() {
        let json = serde_json::to_string(&ChallengeStatus::WaitingOpponent).unwrap();
        assert_eq!(json, "\"waiting_opponent\"");
    }

    #[test]
    fn test_resolve_winner() {
        assert_eq!(
            resolve_winner(&submission(100, 900, 10), &submission(200, 800, 50)),
            PlayerRole::Creator
        );
        assert_eq!(
            resolve_winner(&submission(100, 800, 10), &submission(200, 900, 5)),
            PlayerRole::Opponent
        );
        assert_eq!(
            resolve_winner(&submission(100, 900, 30), &submission(200, 900, 31)),
            PlayerRole::Opponent
        );
        assert_eq!(
            resolve_winner(&submission(100, 900, 30), &submission(200, 900, 30)),
            PlayerRole::Creator
        );
    }

    #[test]
    fn test_report_score_creator_first_play() {
        let store = MockStore::default();
        let notifier = MockNotifier::default();
        let c = challenge(ChallengeStatus::Created);
        let result = block_on(report_score(
            &store,
            &notifier,
            &submission(100, 500, 20),
            PlayerRole::Creator,
            Some(&c),
        ));
        assert_eq!(result.unwrap(), FollowUp::OpponentNotified);
        assert_eq!(store.submissions.borrow().len(), 1);
        assert_eq!(store.marked.get(), 1);
        assert_eq!(notifier.opponent.get(), 1);
    }

    #[test]
    fn test_report_score_looks_up_missing_record() {
        let store = MockStore {
            record: Some(challenge(ChallengeStatus::Created)),
            ..Default::default()
        };
        let notifier = MockNotifier::default();
        let result = block_on(report_score(
            &store,
            &notifier,
            &submission(100, 500, 20),
            PlayerRole::Creator,
            None,
        ));
        assert_eq!(result.unwrap(), FollowUp::OpponentNotified);
        assert_eq!(store.lookups.get(), 1);
        assert_eq!(store.marked.get(), 1);
        assert_eq!(notifier.opponent.get(), 1);
    }

    #[test]
    fn test_report_score_survives_failed_lookup() {
        let store = MockStore::default();
        let notifier = MockNotifier::default();
        let result = block_on(report_score(
            &store,
            &notifier,
            &submission(100, 500, 20),
            PlayerRole::Creator,
            None,
        ));
        assert_eq!(result.unwrap(), FollowUp::None);
        assert_eq!(store.submissions.borrow().len(), 1);
        assert_eq!(notifier.opponent.get(), 0);
    }

    #[test]
    fn test_report_score_known_record_skips_lookup() {
        let store = MockStore::default();
        let notifier = MockNotifier::default();
        let c = challenge(ChallengeStatus::Accepted);
        let result = block_on(report_score(
            &store,
            &notifier,
            &submission(200, 500, 20),
            PlayerRole::Opponent,
            Some(&c),
        ));
        assert_eq!(result.unwrap(), FollowUp::ResultsPending);
        assert_eq!(store.lookups.get(), 0);
    }

    #[test]
    fn test_report_score_notification_failure_is_not_fatal() {
        let store = MockStore::default();
        let notifier = MockNotifier {
            fail: true,
            ..Default::default()
        };
        let c = challenge(ChallengeStatus::Created);
        let result = block_on(report_score(
            &store,
            &notifier,
            &submission(100, 500, 20),
            PlayerRole::Creator,
            Some(&c),
        ));
        assert!(result.is_ok());
    }

    #[test]
    fn test_report_score_rejected() {
        let store = MockStore {
            reject: true,
            ..Default::default()
        };
        let notifier = MockNotifier::default();
        let result = block_on(report_score(
            &store,
            &notifier,
            &submission(200, 500, 20),
            PlayerRole::Opponent,
            None,
        ));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("400"));
        assert_eq!(notifier.opponent.get(), 0);
    }

    #[test]
    fn test_settle_accepted_challenge() {
        let mut c = challenge(ChallengeStatus::Accepted);
        let notifier = MockNotifier::default();
        let outcome = block_on(settle(
            &mut c,
            &submission(100, 700, 20),
            &submission(200, 950, 25),
            &MockChain { fail: false },
            &notifier,
        ))
        .unwrap();
        assert_eq!(outcome.winner, PlayerRole::Opponent);
        assert_eq!(outcome.winner_address, "0xopponent");
        assert_eq!(outcome.usdc_amount, "2.5 USDC");
        assert_eq!(outcome.transaction_hash.as_deref(), Some("0xabc-0xopponent"));
        assert_eq!(c.status, ChallengeStatus::Completed);
        assert_eq!(c.winner.as_deref(), Some("0xopponent"));
        assert_eq!(*notifier.winners.borrow(), vec![200]);
        assert_eq!(*notifier.losers.borrow(), vec![100]);
    }

    #[test]
    fn test_settle_payout_failure_keeps_result() {
        let mut c = challenge(ChallengeStatus::Accepted);
        let outcome = block_on(settle(
            &mut c,
            &submission(100, 700, 20),
            &submission(200, 600, 25),
            &MockChain { fail: true },
            &MockNotifier::default(),
        ))
        .unwrap();
        assert_eq!(outcome.winner, PlayerRole::Creator);
        assert_eq!(outcome.transaction_hash, None);
        assert_eq!(c.status, ChallengeStatus::Completed);
    }

    #[test]
    fn test_settle_requires_accepted() {
        let mut c = challenge(ChallengeStatus::WaitingOpponent);
        let result = block_on(settle(
            &mut c,
            &submission(100, 700, 20),
            &submission(200, 600, 25),
            &MockChain { fail: false },
            &MockNotifier::default(),
        ));
        assert!(matches!(result, Err(SettlementError::NotReady { id: 13, .. })));
        assert_eq!(c.status, ChallengeStatus::WaitingOpponent);
    }
}
