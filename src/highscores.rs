//! High score leaderboard
//!
//! Top 10 runs, persisted to LocalStorage on wasm32 and kept in memory on
//! native.

use serde::{Deserialize, Serialize};

use crate::storage;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Invaders shot down
    pub score: u32,
    /// Wave the run ended on
    pub wave: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard, sorted best first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    const STORAGE_KEY: &'static str = "invader_waves_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Add a run to the leaderboard.
    ///
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify.
    /// Ties rank below the earlier run.
    pub fn add_score(&mut self, score: u32, wave: u32, timestamp: f64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let idx = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            idx,
            HighScoreEntry {
                score,
                wave,
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);

        log::info!("High score #{}: {} (wave {})", idx + 1, score, wave);
        Some(idx + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }

    pub fn load() -> Self {
        match storage::load_json::<HighScores>(Self::STORAGE_KEY) {
            Some(scores) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            None => Self::new(),
        }
    }

    pub fn save(&self) {
        if storage::save_json(Self::STORAGE_KEY, self) {
            log::info!("High scores saved ({} entries)", self.entries.len());
        }
    }
}

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Short relative age of a timestamp ("3 mins ago")
pub fn format_age(timestamp: f64, now: f64) -> String {
    let mins = ((now - timestamp) / 60_000.0).max(0.0).floor() as u64;
    let hours = mins / 60;
    let days = hours / 24;

    match (days, hours, mins) {
        (0, 0, 0) => "Just now".to_string(),
        (0, 0, 1) => "1 min ago".to_string(),
        (0, 0, m) => format!("{m} mins ago"),
        (0, 1, _) => "1 hour ago".to_string(),
        (0, h, _) => format!("{h} hours ago"),
        (1, _, _) => "Yesterday".to_string(),
        (d, _, _) => format!("{d} days ago"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_never_qualifies() {
        let scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert!(scores.qualifies(1));
    }

    #[test]
    fn test_sorted_descending_with_ranks() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(10, 2, 0.0), Some(1));
        assert_eq!(scores.add_score(30, 4, 0.0), Some(1));
        assert_eq!(scores.add_score(20, 3, 0.0), Some(2));
        // Ties go below the existing entry
        assert_eq!(scores.add_score(20, 5, 0.0), Some(3));

        let order: Vec<u32> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(order, vec![30, 20, 20, 10]);
        assert_eq!(scores.top_score(), Some(30));
    }

    #[test]
    fn test_table_is_capped() {
        let mut scores = HighScores::new();
        for s in 1..=15 {
            scores.add_score(s, 1, 0.0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.score), Some(6));

        assert!(!scores.qualifies(6));
        assert_eq!(scores.add_score(3, 1, 0.0), None);
        assert_eq!(scores.add_score(7, 1, 0.0), Some(10));
    }

    #[test]
    fn test_json_round_trip() {
        let mut scores = HighScores::new();
        scores.add_score(12, 3, 1_700_000_000_000.0);
        let json = serde_json::to_string(&scores).expect("serialize");
        let back: HighScores = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.entries, scores.entries);
    }

    #[test]
    fn test_format_age() {
        let now = 10.0 * 86_400_000.0;
        assert_eq!(format_age(now, now), "Just now");
        assert_eq!(format_age(now - 90_000.0, now), "1 min ago");
        assert_eq!(format_age(now - 5.0 * 60_000.0, now), "5 mins ago");
        assert_eq!(format_age(now - 3.0 * 3_600_000.0, now), "3 hours ago");
        assert_eq!(format_age(now - 30.0 * 3_600_000.0, now), "Yesterday");
        assert_eq!(format_age(now - 4.0 * 86_400_000.0, now), "4 days ago");
    }
}
