use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::engine::{difficulty, leveling, spaced_repetition, streak};
use crate::session::result::TestType;
use crate::store::schema::UserProgress;

const RECENT_DAYS: i64 = 7;

/// Aggregate figures for a progress overview.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardStats {
    pub total_words: usize,
    pub learned_words: usize,
    pub completion_percent: u32,
    pub mastered_words: usize,
    pub due_reviews: usize,
    pub total_tests: usize,
    pub average_test_score: f64,
    /// Mean percentage across all tests.
    pub test_accuracy: u32,
    pub average_time_per_word: f64,
    pub tests_by_type: BTreeMap<TestType, usize>,
    pub tests_last_7_days: usize,
    pub score_last_7_days: u64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub level: u32,
    pub experience: u64,
    pub xp_to_next_level: u64,
    pub level_progress_percent: u32,
    pub achievements_unlocked: usize,
    pub achievements_total: usize,
}

pub fn compute(
    progress: &UserProgress,
    total_words: usize,
    achievements_total: usize,
    now: DateTime<Utc>,
) -> DashboardStats {
    let history = &progress.test_history;
    let total_tests = progress.total_tests();
    let learned_words = progress.learned.len();

    let completion_percent = if total_words == 0 {
        0
    } else {
        (learned_words as f64 / total_words as f64 * 100.0).round() as u32
    };

    let average_test_score = if total_tests == 0 {
        0.0
    } else {
        progress.total_score as f64 / total_tests as f64
    };

    let test_accuracy = if total_tests == 0 {
        0
    } else {
        (history.iter().map(|r| r.accuracy()).sum::<f64>() / total_tests as f64 * 100.0).round()
            as u32
    };

    let average_time_per_word = if learned_words == 0 {
        0.0
    } else {
        progress.total_time_spent as f64 / learned_words as f64
    };

    let mut tests_by_type = BTreeMap::new();
    for result in history {
        *tests_by_type.entry(result.test_type).or_insert(0) += 1;
    }

    let cutoff = now - Duration::days(RECENT_DAYS);
    let recent: Vec<_> = history.iter().filter(|r| r.date > cutoff).collect();

    let mastered_words = difficulty::analyze_all(history)
        .iter()
        .filter(|d| d.mastered())
        .count();

    DashboardStats {
        total_words,
        learned_words,
        completion_percent,
        mastered_words,
        due_reviews: spaced_repetition::due_cards(&progress.review_cards, now).len(),
        total_tests,
        average_test_score,
        test_accuracy,
        average_time_per_word,
        tests_by_type,
        tests_last_7_days: recent.len(),
        score_last_7_days: recent.iter().map(|r| r.score as u64).sum(),
        current_streak: streak::displayed_streak(
            progress.streak_days,
            progress.last_active_date,
            now.date_naive(),
        ),
        best_streak: progress.best_streak.max(progress.streak_days),
        level: progress.level,
        experience: progress.experience,
        xp_to_next_level: leveling::xp_to_next_level(progress.level),
        level_progress_percent: leveling::level_progress_percent(
            progress.level,
            progress.experience,
        ),
        achievements_unlocked: progress.achievements.len(),
        achievements_total,
    }
}
