use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LEADERBOARD_CAP: usize = 10;
pub const MAX_INITIALS: usize = 3;
pub const MAX_JERSEY: u8 = 99;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeaderboardError {
    #[error("initials must contain at least one letter or digit")]
    EmptyInitials,
    #[error("jersey number {0} is outside 0..=99")]
    JerseyOutOfRange(u32),
}

/// Uppercases and keeps the first three ASCII alphanumerics.
pub fn normalize_initials(raw: &str) -> Result<String, LeaderboardError> {
    let initials: String = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_INITIALS)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if initials.is_empty() {
        return Err(LeaderboardError::EmptyInitials);
    }
    Ok(initials)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub initials: String,
    pub jersey_number: u8,
    pub score: u64,
    pub wave: u32,
    pub tackles: u32,
    pub timestamp: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn new(
        initials: &str,
        jersey_number: u32,
        score: u64,
        wave: u32,
        tackles: u32,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, LeaderboardError> {
        let initials = normalize_initials(initials)?;
        let jersey_number = u8::try_from(jersey_number)
            .ok()
            .filter(|n| *n <= MAX_JERSEY)
            .ok_or(LeaderboardError::JerseyOutOfRange(jersey_number))?;
        Ok(Self {
            initials,
            jersey_number,
            score,
            wave,
            tackles,
            timestamp,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Would `score` make the board right now?
    pub fn qualifies(&self, score: u64) -> bool {
        self.entries.len() < LEADERBOARD_CAP
            || self.entries.last().is_some_and(|e| score > e.score)
    }

    /// Inserts, re-sorts by score descending and truncates to the cap. Ties keep
    /// insertion order, so a new entry ranks below existing equal scores.
    ///
    /// Returns the zero-based rank, or `None` if the entry fell off the board.
    pub fn insert(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let seq = self.entries.len();
        self.entries.push(entry);
        let mut indexed: Vec<(usize, LeaderboardEntry)> =
            self.entries.drain(..).enumerate().collect();
        indexed.sort_by(|a, b| b.1.score.cmp(&a.1.score));

        let rank = indexed.iter().position(|(i, _)| *i == seq);
        indexed.truncate(LEADERBOARD_CAP);
        self.entries = indexed.into_iter().map(|(_, e)| e).collect();
        rank.filter(|r| *r < LEADERBOARD_CAP)
    }

    /// Re-applies ordering and the cap, for boards loaded from storage.
    pub fn normalize(&mut self) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(LEADERBOARD_CAP);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
