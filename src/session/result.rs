use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::corpus::WordId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestType {
    MultipleChoice,
    FillBlank,
    Matching,
    Spelling,
    RapidFire,
}

impl TestType {
    pub fn all() -> &'static [TestType] {
        &[
            TestType::MultipleChoice,
            TestType::FillBlank,
            TestType::Matching,
            TestType::Spelling,
            TestType::RapidFire,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TestType::MultipleChoice => "multipleChoice",
            TestType::FillBlank => "fillBlank",
            TestType::Matching => "matching",
            TestType::Spelling => "spelling",
            TestType::RapidFire => "rapidFire",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.as_str() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            TestType::MultipleChoice => "Multiple Choice",
            TestType::FillBlank => "Fill in the Blank",
            TestType::Matching => "Matching Pairs",
            TestType::Spelling => "Spelling Test",
            TestType::RapidFire => "Rapid Fire",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn multiplier(self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    /// Seconds allowed per question.
    pub fn time_limit_secs(self) -> u32 {
        match self {
            Difficulty::Easy => 30,
            Difficulty::Medium => 20,
            Difficulty::Hard => 15,
        }
    }

    pub fn hints_allowed(self) -> bool {
        self != Difficulty::Hard
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Outcome band shown after a test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestGrade {
    Outstanding,
    Great,
    Good,
    Complete,
}

impl TestGrade {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage > 90 {
            TestGrade::Outstanding
        } else if percentage > 75 {
            TestGrade::Great
        } else if percentage > 60 {
            TestGrade::Good
        } else {
            TestGrade::Complete
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            TestGrade::Outstanding => "Outstanding!",
            TestGrade::Great => "Great Job!",
            TestGrade::Good => "Good Work!",
            TestGrade::Complete => "Test Complete!",
        }
    }
}

const PASS_PERCENTAGE: u32 = 70;

/// One completed test. Never modified after it is appended to history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: u32,
    pub date: DateTime<Utc>,
    pub test_type: TestType,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub score: u32,
    pub total_possible: u32,
    pub time_spent: u64,
    pub words: Vec<WordId>,
    /// Words that missed full credit in this test: answered wrong, or right
    /// only with a hint.
    #[serde(default)]
    pub missed: Vec<WordId>,
}

impl TestResult {
    /// Every answer correct without a hint. Time bonus can lift the score
    /// above `total_possible` but never makes up for a miss.
    pub fn is_perfect(&self) -> bool {
        self.total_possible > 0 && self.missed.is_empty() && self.score >= self.total_possible
    }

    /// Score as a fraction of the possible points, capped at 1.
    pub fn accuracy(&self) -> f64 {
        if self.total_possible == 0 {
            return 0.0;
        }
        (self.score as f64 / self.total_possible as f64).min(1.0)
    }

    pub fn percentage(&self) -> u32 {
        (self.accuracy() * 100.0).round() as u32
    }

    pub fn passed(&self) -> bool {
        self.percentage() >= PASS_PERCENTAGE
    }

    pub fn grade(&self) -> TestGrade {
        TestGrade::from_percentage(self.percentage())
    }

    pub fn includes(&self, word_id: WordId) -> bool {
        self.words.contains(&word_id)
    }
}
