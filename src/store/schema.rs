use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::corpus::WordId;
use crate::engine::leveling;
use crate::engine::spaced_repetition::SpacedRepetitionCard;
use crate::error::EngineError;
use crate::session::result::TestResult;

pub const SCHEMA_VERSION: u32 = 1;

/// A learner's complete progress snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProgress {
    pub schema_version: u32,
    pub level: u32,
    pub experience: u64,
    pub streak_days: u32,
    pub best_streak: u32,
    pub last_active_date: Option<NaiveDate>,
    pub total_score: u64,
    pub learned: BTreeSet<WordId>,
    pub correct: BTreeSet<WordId>,
    /// Every achievement ever unlocked. Only grows.
    pub achievements: BTreeSet<String>,
    pub test_history: Vec<TestResult>,
    pub total_time_spent: u64,
    pub review_cards: BTreeMap<WordId, SpacedRepetitionCard>,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            level: 1,
            experience: 0,
            streak_days: 0,
            best_streak: 0,
            last_active_date: None,
            total_score: 0,
            learned: BTreeSet::new(),
            correct: BTreeSet::new(),
            achievements: BTreeSet::new(),
            test_history: Vec::new(),
            total_time_spent: 0,
            review_cards: BTreeMap::new(),
        }
    }
}

impl UserProgress {
    pub fn total_tests(&self) -> usize {
        self.test_history.len()
    }

    /// Build a snapshot from loosely-shaped JSON, keeping every field that
    /// parses and substituting defaults for the rest. Each substitution is
    /// reported as `CorruptProgressRecord`.
    pub fn from_json_value(value: &Value) -> (Self, Vec<EngineError>) {
        let mut issues = Vec::new();
        let Some(obj) = value.as_object() else {
            issues.push(EngineError::CorruptProgressRecord { field: "record" });
            return (Self::default(), issues);
        };

        let defaults = Self::default();
        let mut progress = Self {
            schema_version: field(obj, "schema_version", SCHEMA_VERSION, &mut issues),
            level: field(obj, "level", defaults.level, &mut issues),
            experience: field(obj, "experience", 0, &mut issues),
            streak_days: field(obj, "streak_days", 0, &mut issues),
            best_streak: field(obj, "best_streak", 0, &mut issues),
            last_active_date: field(obj, "last_active_date", None, &mut issues),
            total_score: field(obj, "total_score", 0, &mut issues),
            learned: field(obj, "learned", BTreeSet::new(), &mut issues),
            correct: field(obj, "correct", BTreeSet::new(), &mut issues),
            achievements: field(obj, "achievements", BTreeSet::new(), &mut issues),
            test_history: history_field(obj, &mut issues),
            total_time_spent: field(obj, "total_time_spent", 0, &mut issues),
            review_cards: field(obj, "review_cards", BTreeMap::new(), &mut issues),
        };
        issues.extend(progress.sanitize());
        (progress, issues)
    }

    /// Repair cross-field invariants in place, returning what was repaired.
    pub fn sanitize(&mut self) -> Vec<EngineError> {
        let mut issues = Vec::new();

        if self.level == 0 {
            self.level = 1;
            issues.push(EngineError::CorruptProgressRecord { field: "level" });
        }
        if self.experience >= leveling::xp_to_next_level(self.level) {
            let (level, experience) = leveling::add_experience(self.level, 0, self.experience);
            self.level = level;
            self.experience = experience;
            issues.push(EngineError::CorruptProgressRecord { field: "experience" });
        }

        let history_score: u64 = self.test_history.iter().map(|r| r.score as u64).sum();
        if self.total_score != history_score {
            self.total_score = history_score;
            issues.push(EngineError::CorruptProgressRecord {
                field: "total_score",
            });
        }

        self.best_streak = self.best_streak.max(self.streak_days);
        let card_count = self.review_cards.len();
        self.review_cards.retain(|id, card| card.word_id == *id);
        let mut cards_repaired = self.review_cards.len() != card_count;
        for card in self.review_cards.values_mut() {
            cards_repaired |= card.repair();
        }
        if cards_repaired {
            issues.push(EngineError::CorruptProgressRecord {
                field: "review_cards",
            });
        }
        issues
    }
}

fn field<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    name: &'static str,
    default: T,
    issues: &mut Vec<EngineError>,
) -> T {
    match obj.get(name) {
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|_| {
            issues.push(EngineError::CorruptProgressRecord { field: name });
            default
        }),
        None => {
            issues.push(EngineError::CorruptProgressRecord { field: name });
            default
        }
    }
}

/// History entries are parsed one by one so a single bad entry does not
/// discard the rest.
fn history_field(obj: &Map<String, Value>, issues: &mut Vec<EngineError>) -> Vec<TestResult> {
    let Some(Value::Array(entries)) = obj.get("test_history") else {
        issues.push(EngineError::CorruptProgressRecord {
            field: "test_history",
        });
        return Vec::new();
    };

    let mut history = Vec::with_capacity(entries.len());
    let mut dropped = false;
    for entry in entries {
        match serde_json::from_value::<TestResult>(entry.clone()) {
            Ok(result) => history.push(result),
            Err(_) => dropped = true,
        }
    }
    if dropped {
        issues.push(EngineError::CorruptProgressRecord {
            field: "test_history",
        });
    }
    history
}

pub const EXPORT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub wordup_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub config: Config,
    pub progress: UserProgress,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::engine::spaced_repetition::MINIMUM_EASE;
    use crate::session::result::{Difficulty, TestType};

    fn sample() -> UserProgress {
        let date = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();
        let mut progress = UserProgress {
            level: 3,
            experience: 120,
            streak_days: 2,
            best_streak: 4,
            last_active_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            total_score: 42,
            total_time_spent: 90,
            ..UserProgress::default()
        };
        progress.learned.insert(1);
        progress.correct.extend([1, 2]);
        progress.achievements.insert("first_correct".to_string());
        progress.test_history.push(TestResult {
            id: 1,
            date,
            test_type: TestType::Spelling,
            difficulty: Difficulty::Medium,
            score: 42,
            total_possible: 80,
            time_spent: 90,
            words: vec![1, 2],
            missed: vec![2],
        });
        progress
            .review_cards
            .insert(1, SpacedRepetitionCard::initial(1, date));
        progress
    }

    #[test]
    fn round_trip_is_identical() {
        let progress = sample();
        let json = serde_json::to_string(&progress).unwrap();
        let back: UserProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, progress);

        let value = serde_json::to_value(&progress).unwrap();
        let (healed, issues) = UserProgress::from_json_value(&value);
        assert!(issues.is_empty(), "unexpected repairs: {issues:?}");
        assert_eq!(healed, progress);
    }

    #[test]
    fn negative_values_are_reset() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["experience"] = json!(-50);
        value["streak_days"] = json!(-3);

        let (progress, issues) = UserProgress::from_json_value(&value);
        assert_eq!(progress.experience, 0);
        assert_eq!(progress.streak_days, 0);
        assert_eq!(progress.level, 3);
        assert!(issues.contains(&EngineError::CorruptProgressRecord { field: "experience" }));
        assert!(issues.contains(&EngineError::CorruptProgressRecord { field: "streak_days" }));
    }

    #[test]
    fn out_of_range_cards_are_repaired() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["review_cards"]["1"]["ease_factor"] = json!(0.4);
        value["review_cards"]["1"]["repetitions"] = json!(3);
        value["review_cards"]["1"]["interval"] = json!(0);

        let (progress, issues) = UserProgress::from_json_value(&value);
        let card = &progress.review_cards[&1];
        assert_eq!(card.ease_factor, MINIMUM_EASE);
        assert_eq!(card.interval, 1);
        assert_eq!(card.repetitions, 3);
        assert_eq!(
            issues,
            vec![EngineError::CorruptProgressRecord {
                field: "review_cards"
            }]
        );
    }

    #[test]
    fn missing_fields_take_defaults() {
        let (progress, issues) = UserProgress::from_json_value(&json!({ "level": 4 }));
        assert_eq!(progress.level, 4);
        assert!(progress.test_history.is_empty());
        assert!(!issues.is_empty());
    }

    #[test]
    fn bad_history_entry_is_dropped_alone() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["test_history"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "id": 2, "score": "lots" }));

        let (progress, issues) = UserProgress::from_json_value(&value);
        assert_eq!(progress.test_history.len(), 1);
        assert!(issues.contains(&EngineError::CorruptProgressRecord { field: "test_history" }));
    }

    #[test]
    fn sanitize_repairs_invariants() {
        let mut progress = sample();
        progress.level = 0;
        progress.experience = 250;
        progress.total_score = 7;
        progress.streak_days = 9;

        let issues = progress.sanitize();
        // level 1 -> 2 consumes 100, 2 -> 3 consumes 200 would need 300
        assert_eq!((progress.level, progress.experience), (2, 150));
        assert_eq!(progress.total_score, 42);
        assert_eq!(progress.best_streak, 9);
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn non_object_record_is_reset() {
        let (progress, issues) = UserProgress::from_json_value(&json!([1, 2, 3]));
        assert_eq!(progress, UserProgress::default());
        assert_eq!(issues.len(), 1);
    }
}
