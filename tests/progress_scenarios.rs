use std::collections::BTreeSet;
use std::fs;

use chrono::NaiveDate;
use regex::Regex;
use tempfile::TempDir;

use wordup::engine::achievements::{self, AchievementCatalog};
use wordup::engine::difficulty;
use wordup::session::answer::Answer;
use wordup::session::result::{Difficulty, TestType};
use wordup::session::test::{TestCompletion, TestSession};
use wordup::store::json_store::JsonStore;
use wordup::{
    EngineError, FixedClock, LearningPolicy, ProgressCoordinator, UserProgress, WordCorpus, WordId,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn answer(word_id: WordId, correct: bool, time_remaining_secs: u32) -> Answer {
    Answer {
        word_id,
        correct,
        hint_used: false,
        time_remaining_secs,
    }
}

fn completion(test_type: TestType, difficulty: Difficulty, answers: Vec<Answer>) -> TestCompletion {
    TestCompletion {
        test_type,
        difficulty,
        answers,
        time_spent_secs: 45,
    }
}

fn fixtures() -> (WordCorpus, AchievementCatalog) {
    (
        WordCorpus::bundled().unwrap(),
        AchievementCatalog::standard().unwrap(),
    )
}

fn coordinator_on<'a>(
    corpus: &'a WordCorpus,
    catalog: &'a AchievementCatalog,
    d: u32,
) -> ProgressCoordinator<'a, FixedClock> {
    ProgressCoordinator::new(corpus, catalog, LearningPolicy::default(), FixedClock::on(day(d)))
}

#[test]
fn hard_spelling_test_levels_up_and_unlocks_level_5() {
    let (corpus, catalog) = fixtures();
    let progress = UserProgress {
        level: 4,
        experience: 380,
        achievements: ["first_correct", "perfect_score"]
            .into_iter()
            .map(String::from)
            .collect(),
        ..UserProgress::default()
    };

    let outcome = coordinator_on(&corpus, &catalog, 1)
        .apply_test_completion(
            &progress,
            &completion(TestType::Spelling, Difficulty::Hard, vec![answer(1, true, 9)]),
        )
        .unwrap();

    assert_eq!(outcome.result.score, 61);
    assert_eq!(outcome.levels_gained, 1);
    assert_eq!(outcome.newly_unlocked, vec!["level_5".to_string()]);
    // 441 - 400 carried over, plus the level_5 reward
    assert_eq!(outcome.progress.level, 5);
    assert_eq!(outcome.progress.experience, 41 + 50);
    assert_eq!(outcome.progress.total_score, 61);
    assert_eq!(outcome.progress.streak_days, 1);
    assert_eq!(outcome.progress.last_active_date, Some(day(1)));
}

#[test]
fn first_test_on_fresh_profile() {
    let (corpus, catalog) = fixtures();
    let outcome = coordinator_on(&corpus, &catalog, 1)
        .apply_test_completion(
            &UserProgress::default(),
            &completion(
                TestType::MultipleChoice,
                Difficulty::Medium,
                vec![answer(1, true, 12), answer(2, false, 0), answer(3, true, 0)],
            ),
        )
        .unwrap();

    // 42 + 0 + 20 against a par of 60, but word 2 was missed
    assert_eq!(outcome.result.score, 62);
    assert_eq!(outcome.result.total_possible, 60);
    assert_eq!(outcome.result.missed, vec![2]);
    assert!(!outcome.result.is_perfect());

    assert_eq!(outcome.newly_unlocked, vec!["first_correct".to_string()]);
    assert_eq!(outcome.progress.correct, BTreeSet::from([1, 3]));
    assert!(outcome.progress.learned.is_empty());
    assert_eq!(outcome.progress.review_cards.len(), 3);
    assert_eq!(outcome.progress.review_cards[&2].repetitions, 0);
}

#[test]
fn always_missed_word_is_never_learned() {
    let (corpus, catalog) = fixtures();
    let mut progress = UserProgress::default();

    for d in 1..=3 {
        let mut session = TestSession::new(TestType::RapidFire, Difficulty::Easy, vec![1, 2]);
        session.answer(true, false, 30);
        session.answer(false, false, 0);
        let outcome = coordinator_on(&corpus, &catalog, d)
            .apply_test_completion(&progress, &session.finish(20))
            .unwrap();
        assert!(outcome.result.score > outcome.result.total_possible);
        assert!(!outcome.result.is_perfect());
        progress = outcome.progress;
    }

    let word2 = difficulty::analyze(2, &progress.test_history);
    assert!(!progress.correct.contains(&2));
    assert!(!progress.learned.contains(&2));
    assert!(!word2.mastered());
    assert_eq!(word2.difficulty, 100);
    assert!(!progress.achievements.contains("perfect_score"));
}

#[test]
fn three_days_of_perfect_tests_learn_a_word() {
    let (corpus, catalog) = fixtures();
    let mut progress = UserProgress::default();
    let mut learned_on = None;

    for d in 1..=3 {
        let outcome = coordinator_on(&corpus, &catalog, d)
            .apply_test_completion(
                &progress,
                &completion(TestType::MultipleChoice, Difficulty::Medium, vec![answer(7, true, 0)]),
            )
            .unwrap();
        if outcome.newly_learned.contains(&7) {
            learned_on = Some(d);
        }
        progress = outcome.progress;
    }

    assert_eq!(learned_on, Some(3));
    assert_eq!(progress.streak_days, 3);
    assert_eq!(progress.best_streak, 3);
    assert!(progress.achievements.contains("streak_3"));

    let card = &progress.review_cards[&7];
    assert_eq!(card.repetitions, 3);
    assert_eq!(card.interval, 15);
}

#[test]
fn missed_day_resets_streak_but_keeps_best() {
    let (corpus, catalog) = fixtures();
    let mut progress = UserProgress::default();
    for d in [1, 2, 5] {
        progress = coordinator_on(&corpus, &catalog, d)
            .apply_test_completion(
                &progress,
                &completion(TestType::RapidFire, Difficulty::Easy, vec![answer(4, true, 0)]),
            )
            .unwrap()
            .progress;
    }
    assert_eq!(progress.streak_days, 1);
    assert_eq!(progress.best_streak, 2);
}

#[test]
fn clock_before_last_activity_is_rejected() {
    let (corpus, catalog) = fixtures();
    let progress = UserProgress {
        streak_days: 4,
        last_active_date: Some(day(10)),
        ..UserProgress::default()
    };
    let err = coordinator_on(&corpus, &catalog, 9)
        .apply_test_completion(
            &progress,
            &completion(TestType::Matching, Difficulty::Easy, vec![answer(1, true, 0)]),
        )
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTimestamp {
            last_active: day(10),
            today: day(9),
        }
    );
}

#[test]
fn unknown_word_leaves_progress_unchanged() {
    let (corpus, catalog) = fixtures();
    let progress = UserProgress::default();
    let err = coordinator_on(&corpus, &catalog, 1)
        .apply_test_completion(
            &progress,
            &completion(
                TestType::Matching,
                Difficulty::Easy,
                vec![answer(1, true, 0), answer(9999, true, 0)],
            ),
        )
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidWordReference { word_id: 9999 });
    assert_eq!(progress, UserProgress::default());
}

#[test]
fn fifty_learned_words_unlock_learned_50_only() {
    let (_, catalog) = fixtures();
    let progress = UserProgress {
        learned: (1..=50).collect(),
        ..UserProgress::default()
    };
    let unlocked = achievements::evaluate(&catalog, &progress);
    assert!(unlocked.contains("learned_20"));
    assert!(unlocked.contains("learned_50"));
    assert!(!unlocked.contains("learned_100"));
    assert_eq!(unlocked, achievements::evaluate(&catalog, &progress));
}

#[test]
fn progress_survives_store_round_trip() {
    let (corpus, catalog) = fixtures();
    let dir = TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();

    let mut progress = UserProgress::default();
    let tests = [
        (1, TestType::Spelling),
        (2, TestType::FillBlank),
        (2, TestType::Matching),
    ];
    for (d, test_type) in tests {
        progress = coordinator_on(&corpus, &catalog, d)
            .apply_test_completion(
                &progress,
                &completion(
                    test_type,
                    Difficulty::Medium,
                    vec![answer(5, true, 7), answer(6, false, 0)],
                ),
            )
            .unwrap()
            .progress;
    }
    store.save_progress(&progress).unwrap();

    let (loaded, issues) = store.load_progress();
    assert!(issues.is_empty(), "unexpected repairs: {issues:?}");
    assert_eq!(loaded, progress);
}

#[test]
fn corrupt_fields_are_repaired_on_load() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    fs::write(
        dir.path().join("progress.json"),
        r#"{"level": 3, "experience": -5, "streak_days": "lots", "learned": [1, 2]}"#,
    )
    .unwrap();

    let (progress, issues) = store.load_progress();
    assert_eq!(progress.level, 3);
    assert_eq!(progress.experience, 0);
    assert_eq!(progress.streak_days, 0);
    assert_eq!(progress.learned, BTreeSet::from([1, 2]));
    assert!(issues.contains(&EngineError::CorruptProgressRecord { field: "experience" }));
    assert!(issues.contains(&EngineError::CorruptProgressRecord {
        field: "streak_days"
    }));
}

#[test]
fn catalog_ids_are_snake_case() {
    let (_, catalog) = fixtures();
    let id_pattern = Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)*$").unwrap();
    for achievement in catalog.iter() {
        assert!(
            id_pattern.is_match(&achievement.id),
            "achievement id `{}` is not snake_case",
            achievement.id
        );
        assert!(achievement.xp_reward > 0);
    }
}
