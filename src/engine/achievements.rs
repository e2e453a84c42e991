//! Achievement rules and evaluation.
//!
//! Rules are plain data so a catalog can be shipped as TOML, inspected and
//! tested without running any application code. Evaluation is a pure
//! function of a progress snapshot.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::assets::bundled_text;
use crate::error::{EngineError, Result};
use crate::store::schema::UserProgress;

const BUNDLED_CATALOG: &str = "achievements.toml";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Learning,
    Performance,
    Consistency,
    Mastery,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    CorrectWords { at_least: usize },
    LearnedWords { at_least: usize },
    PerfectTest,
    /// The last `window` tests all scored at least `min_ratio`.
    RecentAccuracy { window: usize, min_ratio: f64 },
    StreakDays { at_least: u32 },
    Level { at_least: u32 },
    DistinctTestTypes { at_least: usize },
}

impl Rule {
    pub fn holds(&self, progress: &UserProgress) -> bool {
        match *self {
            Rule::CorrectWords { at_least } => progress.correct.len() >= at_least,
            Rule::LearnedWords { at_least } => progress.learned.len() >= at_least,
            Rule::PerfectTest => progress.test_history.iter().any(|r| r.is_perfect()),
            Rule::RecentAccuracy { window, min_ratio } => {
                let history = &progress.test_history;
                window > 0
                    && history.len() >= window
                    && history[history.len() - window..]
                        .iter()
                        .all(|r| r.accuracy() >= min_ratio)
            }
            Rule::StreakDays { at_least } => progress.streak_days >= at_least,
            Rule::Level { at_least } => progress.level >= at_least,
            Rule::DistinctTestTypes { at_least } => {
                let types: HashSet<_> = progress.test_history.iter().map(|r| r.test_type).collect();
                types.len() >= at_least
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: AchievementCategory,
    pub tier: AchievementTier,
    pub xp_reward: u64,
    pub rule: Rule,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AchievementCatalog {
    #[serde(rename = "achievement", default)]
    achievements: Vec<Achievement>,
}

impl AchievementCatalog {
    pub fn new(achievements: Vec<Achievement>) -> Result<Self> {
        let mut seen = HashSet::new();
        for achievement in &achievements {
            if !seen.insert(achievement.id.as_str()) {
                return Err(EngineError::Catalog(format!(
                    "duplicate achievement id `{}`",
                    achievement.id
                )));
            }
        }
        Ok(Self { achievements })
    }

    pub fn standard() -> Result<Self> {
        let text = bundled_text(BUNDLED_CATALOG)
            .ok_or_else(|| EngineError::Catalog("bundled catalog is missing".to_string()))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let parsed: AchievementCatalog =
            toml::from_str(text).map_err(|e| EngineError::Catalog(e.to_string()))?;
        Self::new(parsed.achievements)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading achievement catalog {}", path.display()))?;
        Ok(Self::from_toml(&text)?)
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements.iter()
    }

    pub fn len(&self) -> usize {
        self.achievements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.achievements.is_empty()
    }
}

/// Ids of every achievement whose rule holds for `progress`.
pub fn evaluate(catalog: &AchievementCatalog, progress: &UserProgress) -> BTreeSet<String> {
    catalog
        .iter()
        .filter(|a| a.rule.holds(progress))
        .map(|a| a.id.clone())
        .collect()
}
