//! Top-score ranking
//!
//! Keeps the best [`CAPACITY`] submissions, highest first. Ties keep
//! submission order, so an earlier score outranks a later equal one. The
//! document is a plain JSON array of `{name, score}` objects.
//!
//! Blank or whitespace-only names are stored as `"anonymous"`, not only
//! missing ones, so the board never shows an empty row.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::game::constants::leaderboard::{ANONYMOUS, CAPACITY};
use crate::net::protocol::ScoreSubmission;

/// Leaderboard errors
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("leaderboard io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid leaderboard document: {0}")]
    Json(#[from] serde_json::Error),
}

/// One ranked entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
}

/// Entry with its 1-based rank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking<'a> {
    pub rank: u32,
    pub name: &'a str,
    pub score: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submission. Returns the rank it landed at, or None if it
    /// did not make the board.
    pub fn submit(&mut self, submission: ScoreSubmission) -> Option<u32> {
        let name = if submission.name.trim().is_empty() {
            ANONYMOUS.to_string()
        } else {
            submission.name
        };
        let score = submission.score;

        // First position strictly below the new score keeps ties stable
        let position = self.entries.partition_point(|e| e.score >= score);
        if position >= CAPACITY {
            debug!(score, "score below leaderboard cutoff");
            return None;
        }

        self.entries.insert(position, LeaderboardEntry { name, score });
        self.entries.truncate(CAPACITY);
        Some(position as u32 + 1)
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn rankings(&self) -> impl Iterator<Item = Ranking<'_>> {
        self.entries.iter().enumerate().map(|(i, e)| Ranking {
            rank: i as u32 + 1,
            name: &e.name,
            score: e.score,
        })
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

    /// Whether `score` would make the board
    pub fn qualifies(&self, score: u64) -> bool {
        self.entries.partition_point(|e| e.score >= score) < CAPACITY
    }

    /// Parse a document, re-ranking it in case it was edited by hand
    pub fn from_json(data: &str) -> Result<Self, LeaderboardError> {
        let entries: Vec<LeaderboardEntry> = serde_json::from_str(data)?;
        let mut board = Self::new();
        for entry in entries {
            board.submit(ScoreSubmission {
                name: entry.name,
                score: entry.score,
            });
        }
        Ok(board)
    }

    pub fn to_json(&self) -> Result<String, LeaderboardError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load from disk. A missing file is an empty board.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LeaderboardError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(data) => Self::from_json(&data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no leaderboard file, starting empty");
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LeaderboardError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), entries = self.len(), "leaderboard saved");
        Ok(())
    }
}
