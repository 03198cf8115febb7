use crate::store::{ArenaStats, Vote};

/// Recent votes shown under the stats table.
pub const RECENT_VOTES_LIMIT: usize = 5;

/// Prompt preview length in the recent-votes list.
pub const PROMPT_PREVIEW_CHARS: usize = 50;

/// Read model for the leaderboard panel: aggregate stats plus the recent
/// vote history. Rebuilt wholesale on every refresh, never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    pub stats: ArenaStats,
    pub recent: Vec<Vote>,
}

impl Leaderboard {
    pub fn vote_count(&self) -> u64 {
        self.stats.vote_count()
    }

    pub fn is_empty(&self) -> bool {
        self.vote_count() == 0
    }
}

/// First 50 characters of a prompt, with an ellipsis when it was cut.
/// Counts characters rather than bytes so multi-byte text never splits a
/// code point.
pub fn truncate_prompt(prompt: &str) -> String {
    if prompt.chars().count() <= PROMPT_PREVIEW_CHARS {
        prompt.to_string()
    } else {
        let head: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
        format!("{head}...")
    }
}

pub fn format_win_rate(rate: f64) -> String {
    format!("{rate:.1}%")
}
