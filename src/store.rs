use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::ModelPair;
use crate::session::Label;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vote store is not configured")]
    ConnectionUnavailable,
    #[error("store returned {status}")]
    Query { status: StatusCode, body: String },
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Insert payload for the votes table. The loser columns are derived from
/// the winner in the constructor, so winner != loser holds by construction.
#[derive(Debug, Clone, Serialize)]
pub struct NewVote {
    pub prompt: String,
    pub winner: Label,
    pub loser: Label,
    pub winner_model: String,
    pub loser_model: String,
}

impl NewVote {
    /// Snapshots the model ids at vote time; historical rows are never
    /// relabeled if the lineup changes later.
    pub fn new(prompt: &str, winner: Label, models: &ModelPair) -> Self {
        let loser = winner.opponent();
        Self {
            prompt: prompt.to_string(),
            winner,
            loser,
            winner_model: models.get(winner).id.clone(),
            loser_model: models.get(loser).id.clone(),
        }
    }
}

/// A persisted vote row. `id` and `created_at` are store-assigned; the
/// timestamp stays an opaque ISO-8601 string since ordering is done
/// server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct Vote {
    #[serde(default)]
    pub id: Option<i64>,
    pub prompt: String,
    pub winner: Label,
    pub loser: Label,
    #[serde(default)]
    pub winner_model: String,
    #[serde(default)]
    pub loser_model: String,
    #[serde(default)]
    pub created_at: String,
}

impl Vote {
    /// Outcome rendered from the row itself, not the current lineup, so
    /// history stays truthful after the contestants change.
    pub fn outcome_line(&self) -> String {
        format!(
            "Model {} ({}) beat Model {} ({})",
            self.winner.as_str(),
            self.winner_model,
            self.loser.as_str(),
            self.loser_model,
        )
    }

    /// Date part of the store-assigned timestamp, empty when absent.
    pub fn created_date(&self) -> &str {
        self.created_at.get(..10).unwrap_or("")
    }

    /// Row number shown in the recent-votes list, "#?" before the store
    /// has echoed the row back.
    pub fn row_tag(&self) -> String {
        match self.id {
            Some(id) => format!("#{id}"),
            None => "#?".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelStats {
    pub wins: u64,
    pub total: u64,
}

impl ModelStats {
    /// Win rate as a percentage. 0 when no votes involve the model, never a
    /// division by zero.
    pub fn win_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.wins as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    a: ModelStats,
    b: ModelStats,
}

impl ArenaStats {
    pub fn get(&self, label: Label) -> ModelStats {
        match label {
            Label::A => self.a,
            Label::B => self.b,
        }
    }

    fn slot_mut(&mut self, label: Label) -> &mut ModelStats {
        match label {
            Label::A => &mut self.a,
            Label::B => &mut self.b,
        }
    }

    /// Number of recorded votes. Each vote counts toward both totals.
    pub fn vote_count(&self) -> u64 {
        (self.a.total + self.b.total) / 2
    }
}

/// Folds winner labels into per-model stats: the winner gains a win and a
/// total, the loser gains a total.
pub fn fold_stats<I>(winners: I) -> ArenaStats
where
    I: IntoIterator<Item = Label>,
{
    let mut stats = ArenaStats::default();
    for winner in winners {
        let loser = winner.opponent();
        let slot = stats.slot_mut(winner);
        slot.wins += 1;
        slot.total += 1;
        stats.slot_mut(loser).total += 1;
    }
    stats
}

#[derive(Deserialize)]
struct WinnerRow {
    winner: Label,
}

/// PostgREST client for the append-only `votes` table.
#[derive(Clone)]
pub struct VoteStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VoteStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/votes", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Appends one vote row. The store assigns id and created_at.
    pub async fn insert_vote(&self, vote: &NewVote) -> Result<(), StoreError> {
        debug!(winner = vote.winner.as_str(), "recording vote");

        let response = self
            .authorize(self.client.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(vote)
            .send()
            .await?;

        check_status(response).await.map(|_| ())
    }

    /// Up to `limit` most recent votes, newest first. An empty table is an
    /// empty list, not an error.
    pub async fn recent_votes(&self, limit: usize) -> Result<Vec<Vote>, StoreError> {
        let response = self
            .authorize(self.client.get(self.table_url()))
            .query(&recent_votes_query(limit))
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Scans the winner column and folds it into per-model stats. Any
    /// failure degrades to the zero-value stats so the leaderboard always
    /// renders.
    pub async fn compute_stats(&self) -> ArenaStats {
        match self.fetch_winners().await {
            Ok(winners) => fold_stats(winners),
            Err(err) => {
                warn!(error = %err, "stats query failed, degrading to empty leaderboard");
                ArenaStats::default()
            }
        }
    }

    async fn fetch_winners(&self) -> Result<Vec<Label>, StoreError> {
        let response = self
            .authorize(self.client.get(self.table_url()))
            .query(&[("select", "winner")])
            .send()
            .await?;

        let response = check_status(response).await?;
        let rows: Vec<WinnerRow> = response.json().await?;
        Ok(rows.into_iter().map(|row| row.winner).collect())
    }
}

fn recent_votes_query(limit: usize) -> [(&'static str, String); 3] {
    [
        ("select", "*".to_string()),
        ("order", "created_at.desc".to_string()),
        ("limit", limit.to_string()),
    ]
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!(%status, "vote store request failed");
    Err(StoreError::Query { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn models() -> ModelPair {
        ModelPair::from_config(&Config::default())
    }

    #[test]
    fn test_new_vote_derives_loser() {
        let vote = NewVote::new("Explain gravity", Label::B, &models());
        assert_eq!(vote.winner, Label::B);
        assert_eq!(vote.loser, Label::A);
        assert_ne!(vote.winner, vote.loser);
        assert_eq!(vote.winner_model, "openai/gpt-4o-mini");
        assert_eq!(vote.loser_model, "openai/chatgpt-4o-latest");
    }

    #[test]
    fn test_new_vote_serializes_labels_as_strings() {
        let vote = NewVote::new("p", Label::A, &models());
        let json = serde_json::to_value(&vote).unwrap();
        assert_eq!(json["winner"], "A");
        assert_eq!(json["loser"], "B");
        assert_eq!(json["prompt"], "p");
    }

    #[test]
    fn test_vote_row_deserializes_from_postgrest() {
        let body = r#"[{
            "id": 42,
            "prompt": "Explain gravity",
            "winner": "B",
            "loser": "A",
            "winner_model": "openai/gpt-4o-mini",
            "loser_model": "openai/chatgpt-4o-latest",
            "created_at": "2026-08-06T12:00:00.000000+00:00"
        }]"#;
        let votes: Vec<Vote> = serde_json::from_str(body).unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].id, Some(42));
        assert_eq!(votes[0].winner, Label::B);
        assert_eq!(votes[0].created_at, "2026-08-06T12:00:00.000000+00:00");
        assert_eq!(votes[0].created_date(), "2026-08-06");
        assert_eq!(
            votes[0].outcome_line(),
            "Model B (openai/gpt-4o-mini) beat Model A (openai/chatgpt-4o-latest)"
        );
    }

    #[test]
    fn test_fold_stats_totals() {
        let winners = vec![Label::A, Label::B, Label::A, Label::A, Label::B];
        let stats = fold_stats(winners.clone());
        let n = winners.len() as u64;

        // Every vote counts toward both totals
        assert_eq!(
            stats.get(Label::A).total + stats.get(Label::B).total,
            2 * n
        );
        assert_eq!(stats.get(Label::A).wins + stats.get(Label::B).wins, n);
        assert_eq!(stats.get(Label::A).wins, 3);
        assert_eq!(stats.get(Label::B).wins, 2);
        assert_eq!(stats.get(Label::A).total, n);
        assert_eq!(stats.get(Label::B).total, n);
        assert_eq!(stats.vote_count(), n);
    }

    #[test]
    fn test_empty_stats_have_zero_win_rate() {
        let stats = ArenaStats::default();
        assert_eq!(stats.get(Label::A).win_rate(), 0.0);
        assert_eq!(stats.get(Label::B).win_rate(), 0.0);
        assert_eq!(stats.vote_count(), 0);
    }

    #[test]
    fn test_win_rate_stays_in_bounds() {
        let stats = fold_stats(vec![Label::A; 7]);
        assert_eq!(stats.get(Label::A).win_rate(), 100.0);
        assert_eq!(stats.get(Label::B).win_rate(), 0.0);

        let stats = fold_stats(vec![Label::A, Label::B, Label::A, Label::B]);
        let rate = stats.get(Label::A).win_rate();
        assert!((0.0..=100.0).contains(&rate));
        assert!((rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vote_scenario_increments_stats() {
        // vote("left") with display_order [B, A] resolves to B; afterward
        // B gains a win and both gain a total.
        let before = fold_stats(vec![Label::A]);
        let after = fold_stats(vec![Label::A, Label::B]);
        assert_eq!(after.get(Label::B).wins, before.get(Label::B).wins + 1);
        assert_eq!(after.get(Label::B).total, before.get(Label::B).total + 1);
        assert_eq!(after.get(Label::A).total, before.get(Label::A).total + 1);
        assert_eq!(after.get(Label::A).wins, before.get(Label::A).wins);
    }

    #[test]
    fn test_recent_votes_query_shape() {
        let query = recent_votes_query(5);
        assert_eq!(query[0], ("select", "*".to_string()));
        assert_eq!(query[1], ("order", "created_at.desc".to_string()));
        assert_eq!(query[2], ("limit", "5".to_string()));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let store = VoteStore::new("https://project.supabase.co/", "key");
        assert_eq!(store.table_url(), "https://project.supabase.co/rest/v1/votes");
    }
}
