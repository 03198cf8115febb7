use rand::Rng;
use serde::{Deserialize, Serialize};

/// The two anonymized contestants. Serializes as "A"/"B", which is also the
/// wire form the vote store uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    A,
    B,
}

impl Label {
    pub fn opponent(self) -> Label {
        match self {
            Label::A => Label::B,
            Label::B => Label::A,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::A => "A",
            Label::B => "B",
        }
    }
}

/// Screen position of a response panel. Votes are cast by position; the
/// session maps them back to a label through the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingResponses,
    AwaitingVote,
    Voted,
}

/// One round of comparison: prompt in, two responses out, one vote.
///
/// The display order is drawn when the session is created and redrawn on
/// reset; it stays fixed for the whole round so the panel a user voted for
/// is guaranteed to be the model the vote is attributed to.
#[derive(Debug, Clone)]
pub struct ComparisonSession {
    phase: Phase,
    prompt: String,
    response_a: Option<String>,
    response_b: Option<String>,
    display_order: [Label; 2],
    has_voted: bool,
}

impl ComparisonSession {
    pub fn new() -> Self {
        Self::with_rng(&mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng>(rng: &mut R) -> Self {
        Self {
            phase: Phase::Idle,
            prompt: String::new(),
            response_a: None,
            response_b: None,
            display_order: random_order(rng),
            has_voted: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn has_voted(&self) -> bool {
        self.has_voted
    }

    pub fn display_order(&self) -> [Label; 2] {
        self.display_order
    }

    pub fn response(&self, label: Label) -> Option<&str> {
        match label {
            Label::A => self.response_a.as_deref(),
            Label::B => self.response_b.as_deref(),
        }
    }

    /// Idle -> AwaitingResponses. Blank prompts are rejected as a no-op, as
    /// is a submit in any other phase. Returns whether the transition
    /// happened.
    pub fn submit_prompt(&mut self, text: &str) -> bool {
        if self.phase != Phase::Idle || text.trim().is_empty() {
            return false;
        }
        self.prompt = text.to_string();
        self.phase = Phase::AwaitingResponses;
        true
    }

    /// Stores one model's result. The text is either the answer or an inline
    /// error string; the session does not care which. Once both slots are
    /// filled the round moves to AwaitingVote.
    pub fn set_response(&mut self, label: Label, text: String) {
        if self.phase != Phase::AwaitingResponses {
            return;
        }
        match label {
            Label::A => self.response_a = Some(text),
            Label::B => self.response_b = Some(text),
        }
        if self.response_a.is_some() && self.response_b.is_some() {
            self.phase = Phase::AwaitingVote;
        }
    }

    /// Maps a panel position to the model currently shown there.
    pub fn resolve(&self, position: Position) -> Label {
        match position {
            Position::Left => self.display_order[0],
            Position::Right => self.display_order[1],
        }
    }

    pub fn can_vote(&self) -> bool {
        self.phase == Phase::AwaitingVote && !self.has_voted
    }

    /// Called only after the store accepted the vote. A store failure leaves
    /// the session in AwaitingVote so the same vote can be retried.
    pub fn mark_voted(&mut self) {
        if self.phase == Phase::AwaitingVote {
            self.phase = Phase::Voted;
            self.has_voted = true;
        }
    }

    pub fn reset(&mut self) {
        self.reset_with(&mut rand::thread_rng());
    }

    /// Back to Idle: clears the round and draws a fresh display order,
    /// independent of the previous one.
    pub fn reset_with<R: Rng>(&mut self, rng: &mut R) {
        self.phase = Phase::Idle;
        self.prompt.clear();
        self.response_a = None;
        self.response_b = None;
        self.has_voted = false;
        self.display_order = random_order(rng);
    }
}

impl Default for ComparisonSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform draw over the two possible orderings.
fn random_order<R: Rng>(rng: &mut R) -> [Label; 2] {
    if rng.gen_bool(0.5) {
        [Label::A, Label::B]
    } else {
        [Label::B, Label::A]
    }
}
