use tokio::task::JoinHandle;
use tracing::warn;

use crate::config::Config;
use crate::leaderboard::{Leaderboard, RECENT_VOTES_LIMIT};
use crate::models::ModelPair;
use crate::openrouter::{CompletionError, OpenRouterClient};
use crate::session::{ComparisonSession, Label, Position};
use crate::store::{NewVote, StoreError, VoteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

/// Top-level application state. All network work runs in spawned tasks whose
/// handles live here; the event loop polls them on Tick, so the session only
/// ever has a single writer.
pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    pub session: ComparisonSession,
    pub models: ModelPair,
    pub completions: Option<OpenRouterClient>,
    pub store: Option<VoteStore>,
    pub leaderboard: Leaderboard,

    /// Startup warnings for missing credentials; shown as long as the
    /// features stay disabled.
    pub warnings: Vec<String>,

    // Prompt input box
    pub prompt_input: String,
    pub prompt_cursor: usize,

    // Response panels share one scroll offset
    pub response_scroll: u16,

    pub status: Option<StatusLine>,
    pub loading: bool,
    pub animation_frame: u8,

    fetch_task: Option<JoinHandle<(String, String)>>,
    vote_task: Option<JoinHandle<(Position, Result<(), StoreError>)>>,
    board_task: Option<JoinHandle<Leaderboard>>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let models = ModelPair::from_config(config);
        let completions = config.openrouter_api_key.as_deref().map(OpenRouterClient::new);
        let store = match (config.supabase_url.as_deref(), config.supabase_key.as_deref()) {
            (Some(url), Some(key)) => Some(VoteStore::new(url, key)),
            _ => None,
        };

        let mut warnings = Vec::new();
        if completions.is_none() {
            warnings.push("OPENROUTER_API_KEY is not set: completions are disabled".to_string());
        }
        if store.is_none() {
            warnings.push(
                "SUPABASE_URL / SUPABASE_KEY are not set: voting and the leaderboard are disabled"
                    .to_string(),
            );
        }

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            session: ComparisonSession::new(),
            models,
            completions,
            store,
            leaderboard: Leaderboard::default(),
            warnings,

            prompt_input: String::new(),
            prompt_cursor: 0,

            response_scroll: 0,

            status: None,
            loading: false,
            animation_frame: 0,

            fetch_task: None,
            vote_task: None,
            board_task: None,
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error,
        });
    }

    /// Submits the prompt box and kicks off the dual fetch. A blank prompt
    /// or a round already in flight is a no-op.
    pub fn submit_prompt(&mut self) {
        if self.fetch_task.is_some() {
            return;
        }
        let text = self.prompt_input.clone();
        if !self.session.submit_prompt(&text) {
            return;
        }

        let prompt = self.session.prompt().to_string();
        let client = self.completions.clone();
        let models = self.models.clone();

        self.loading = true;
        self.response_scroll = 0;
        self.status = None;
        self.fetch_task = Some(tokio::spawn(fetch_responses(client, prompt, models)));
    }

    /// Casts a vote for the response at the given panel position. The
    /// session is only marked voted once the store accepts the row.
    pub fn cast_vote(&mut self, position: Position) {
        if !self.session.can_vote() || self.vote_task.is_some() {
            return;
        }
        let Some(store) = self.store.clone() else {
            self.set_status(
                format!(
                    "Cannot record vote: {}",
                    StoreError::ConnectionUnavailable
                ),
                true,
            );
            return;
        };

        let winner = self.session.resolve(position);
        let vote = NewVote::new(self.session.prompt(), winner, &self.models);
        self.vote_task = Some(tokio::spawn(async move {
            let outcome = store.insert_vote(&vote).await;
            (position, outcome)
        }));
    }

    /// Refetches stats and recent votes in the background. No-op while a
    /// refresh is already running or when the store is disabled.
    pub fn refresh_leaderboard(&mut self) {
        if self.board_task.is_some() {
            return;
        }
        let Some(store) = self.store.clone() else {
            return;
        };
        self.board_task = Some(tokio::spawn(async move {
            let stats = store.compute_stats().await;
            let recent = store
                .recent_votes(RECENT_VOTES_LIMIT)
                .await
                .unwrap_or_else(|err| {
                    warn!(error = %err, "recent votes query failed");
                    Vec::new()
                });
            Leaderboard { stats, recent }
        }));
    }

    /// Back to an empty round with a freshly drawn display order.
    pub fn start_new_round(&mut self) {
        if self.fetch_task.is_some() || self.vote_task.is_some() {
            return;
        }
        self.session.reset();
        self.prompt_input.clear();
        self.prompt_cursor = 0;
        self.response_scroll = 0;
        self.status = None;
        self.input_mode = InputMode::Editing;
    }

    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Harvests finished background tasks. Called on every Tick.
    pub async fn poll_tasks(&mut self) {
        if let Some(task) = self.fetch_task.take() {
            if task.is_finished() {
                self.loading = false;
                match task.await {
                    Ok((text_a, text_b)) => {
                        self.session.set_response(Label::A, text_a);
                        self.session.set_response(Label::B, text_b);
                    }
                    Err(err) => {
                        warn!(error = %err, "completion task aborted");
                        let text = "Error: completion task aborted".to_string();
                        self.session.set_response(Label::A, text.clone());
                        self.session.set_response(Label::B, text);
                    }
                }
            } else {
                self.fetch_task = Some(task);
            }
        }

        if let Some(task) = self.vote_task.take() {
            if task.is_finished() {
                match task.await {
                    Ok((position, Ok(()))) => {
                        self.session.mark_voted();
                        let side = match position {
                            Position::Left => "left",
                            Position::Right => "right",
                        };
                        self.set_status(
                            format!("Vote recorded for the {side} response! Press n for a new test."),
                            false,
                        );
                        self.refresh_leaderboard();
                    }
                    Ok((_, Err(err))) => {
                        // Session stays votable; the same vote can be retried.
                        self.set_status(format!("Error recording vote: {err}"), true);
                    }
                    Err(err) => {
                        warn!(error = %err, "vote task aborted");
                        self.set_status("Error recording vote: task aborted", true);
                    }
                }
            } else {
                self.vote_task = Some(task);
            }
        }

        if let Some(task) = self.board_task.take() {
            if task.is_finished() {
                match task.await {
                    Ok(board) => self.leaderboard = board,
                    Err(err) => warn!(error = %err, "leaderboard refresh aborted"),
                }
            } else {
                self.board_task = Some(task);
            }
        }
    }
}

/// Fetches both contestants' responses. The calls are independent: each slot
/// ends up with either the answer or an inline error string, and one model
/// failing never skips the other.
async fn fetch_responses(
    client: Option<OpenRouterClient>,
    prompt: String,
    models: ModelPair,
) -> (String, String) {
    let Some(client) = client else {
        // Checked before any network call
        let text = slot_text(Err(CompletionError::MissingCredential));
        return (text.clone(), text);
    };

    let (a, b) = tokio::join!(
        client.complete(&prompt, models.get(Label::A)),
        client.complete(&prompt, models.get(Label::B)),
    );
    (slot_text(a), slot_text(b))
}

fn slot_text(result: Result<String, CompletionError>) -> String {
    match result {
        Ok(text) => text,
        Err(err) => format!("Error: {err}"),
    }
}
