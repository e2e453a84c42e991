use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::corpus::WordId;
use crate::session::result::TestResult;

const MASTERY_MIN_ATTEMPTS: u32 = 3;

/// Per-word difficulty, derived from test history on demand.
#[derive(Clone, Debug, PartialEq)]
pub struct WordDifficulty {
    pub word_id: WordId,
    /// 0 (always perfect) to 100 (never perfect).
    pub difficulty: u32,
    pub attempts: u32,
    pub success_rate: f64,
    pub last_seen: Option<DateTime<Utc>>,
}

impl WordDifficulty {
    pub fn mastered(&self) -> bool {
        self.attempts >= MASTERY_MIN_ATTEMPTS && self.success_rate >= 1.0
    }

    /// Whether the word meets a learned threshold of `min_attempts` tests at
    /// `min_success_rate` or better.
    pub fn meets(&self, min_attempts: u32, min_success_rate: f64) -> bool {
        self.attempts >= min_attempts.max(1) && self.success_rate >= min_success_rate
    }
}

pub fn analyze(word_id: WordId, history: &[TestResult]) -> WordDifficulty {
    let mut attempts = 0u32;
    let mut perfect = 0u32;
    let mut last_seen: Option<DateTime<Utc>> = None;

    for result in history.iter().filter(|r| r.includes(word_id)) {
        attempts += 1;
        if result.is_perfect() {
            perfect += 1;
        }
        last_seen = Some(match last_seen {
            Some(seen) => seen.max(result.date),
            None => result.date,
        });
    }

    let success_rate = if attempts == 0 {
        0.0
    } else {
        perfect as f64 / attempts as f64
    };

    WordDifficulty {
        word_id,
        difficulty: ((1.0 - success_rate) * 100.0).round() as u32,
        attempts,
        success_rate,
        last_seen,
    }
}

/// Difficulty of every word that appears in history, ordered by id.
pub fn analyze_all(history: &[TestResult]) -> Vec<WordDifficulty> {
    let ids: BTreeSet<WordId> = history
        .iter()
        .flat_map(|r| r.words.iter().copied())
        .collect();
    ids.into_iter().map(|id| analyze(id, history)).collect()
}

/// The hardest words seen so far: highest difficulty first, then the most
/// attempted.
pub fn hardest(history: &[TestResult], limit: usize) -> Vec<WordDifficulty> {
    let mut all = analyze_all(history);
    all.sort_by(|a, b| {
        b.difficulty
            .cmp(&a.difficulty)
            .then(b.attempts.cmp(&a.attempts))
            .then(a.word_id.cmp(&b.word_id))
    });
    all.truncate(limit);
    all
}
