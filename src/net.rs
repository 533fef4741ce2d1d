//! Challenge API over browser fetch

use serde::Deserialize;
use serde_json::json;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::challenge::{
    Challenge, ChallengeRecord, ChallengeStore, Notifier, OpponentInvite, Result, ScoreSubmission,
    Settlement, SubmitError,
};

fn js_error(e: JsValue) -> SubmitError {
    SubmitError::Transport(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

/// Same-origin client for the challenge endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    origin: String,
}

#[derive(Deserialize)]
struct ScoresResponse {
    challenge: ChallengeRecord,
}

impl ApiClient {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }

    /// Client for the page's own origin
    pub fn from_location() -> Option<Self> {
        let origin = web_sys::window()?.location().origin().ok()?;
        Some(Self::new(origin))
    }

    async fn request(&self, method: &str, path: &str, body: Option<String>) -> Result<String> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::SameOrigin);
        if let Some(body) = &body {
            opts.set_body(&JsValue::from_str(body));
        }

        let url = format!("{}{}", self.origin, path);
        let request = Request::new_with_str_and_init(&url, &opts).map_err(js_error)?;
        if body.is_some() {
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(js_error)?;
        }

        let window = web_sys::window().ok_or_else(|| SubmitError::Transport("no window".into()))?;
        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;

        let text = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?
            .as_string()
            .unwrap_or_default();

        if !response.ok() {
            return Err(SubmitError::Rejected {
                status: response.status(),
                message: text,
            });
        }
        Ok(text)
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<()> {
        self.request("POST", path, Some(body.to_string())).await?;
        Ok(())
    }
}

impl ChallengeStore for ApiClient {
    async fn fetch_challenge(&self, challenge_id: u64) -> Result<Challenge> {
        let text = self
            .request("GET", &format!("/api/challenges/{}/scores", challenge_id), None)
            .await?;
        let response: ScoresResponse = serde_json::from_str(&text)?;
        Challenge::try_from(response.challenge).map_err(SubmitError::Transport)
    }

    async fn submit_score(&self, submission: &ScoreSubmission) -> Result<()> {
        let body = submission.to_json()?;
        self.request("POST", "/api/challenges/score", Some(body)).await?;
        Ok(())
    }

    async fn mark_creator_played(&self, challenge_id: u64) -> Result<()> {
        self.request(
            "POST",
            &format!("/api/challenges/{}/creator-played", challenge_id),
            Some("{}".to_string()),
        )
        .await?;
        Ok(())
    }
}

impl Notifier for ApiClient {
    async fn notify_opponent(&self, challenge: &Challenge) -> Result<()> {
        let Some(invite) = OpponentInvite::new(challenge, &self.origin) else {
            log::warn!("Challenge {} has no opponent to notify", challenge.id);
            return Ok(());
        };
        self.post_json("/api/notify-challenge", &serde_json::to_value(&invite)?)
            .await
    }

    async fn notify_winner(&self, settlement: &Settlement) -> Result<()> {
        let body = json!({
            "winnerFid": settlement.winner_fid,
            "usdcAmount": settlement.usdc_amount,
            "challengeId": settlement.challenge_id,
            "finalScore": settlement.winner_score,
            "opponentScore": settlement.loser_score,
            "transactionHash": settlement.transaction_hash,
        });
        self.post_json("/api/notify-winner", &body).await
    }

    async fn notify_loser(&self, settlement: &Settlement) -> Result<()> {
        let body = json!({
            "loserFid": settlement.loser_fid,
            "usdcAmount": settlement.usdc_amount,
            "challengeId": settlement.challenge_id,
            "loserScore": settlement.loser_score,
            "winnerScore": settlement.winner_score,
        });
        self.post_json("/api/notify-loser", &body).await
    }
}
