use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::session::result::{Difficulty, TestType};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tests a word must appear in before it can count as learned.
    #[serde(default = "default_learned_min_attempts")]
    pub learned_min_attempts: u32,
    /// Fraction of those tests that must be perfect.
    #[serde(default = "default_learned_min_success_rate")]
    pub learned_min_success_rate: f64,
    #[serde(default = "default_xp_per_point")]
    pub xp_per_point: u64,
    #[serde(default = "default_words_per_test")]
    pub words_per_test: usize,
    #[serde(default = "default_test_type")]
    pub default_test_type: String,
    #[serde(default = "default_difficulty")]
    pub default_difficulty: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Optional word list replacing the bundled one.
    #[serde(default)]
    pub word_list: Option<String>,
    /// Optional achievement catalog replacing the bundled one.
    #[serde(default)]
    pub achievement_catalog: Option<String>,
}

fn default_learned_min_attempts() -> u32 {
    3
}
fn default_learned_min_success_rate() -> f64 {
    1.0
}
fn default_xp_per_point() -> u64 {
    1
}
fn default_words_per_test() -> usize {
    10
}
fn default_test_type() -> String {
    TestType::MultipleChoice.as_str().to_string()
}
fn default_difficulty() -> String {
    "medium".to_string()
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wordup")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            learned_min_attempts: default_learned_min_attempts(),
            learned_min_success_rate: default_learned_min_success_rate(),
            xp_per_point: default_xp_per_point(),
            words_per_test: default_words_per_test(),
            default_test_type: default_test_type(),
            default_difficulty: default_difficulty(),
            data_dir: default_data_dir(),
            word_list: None,
            achievement_catalog: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str::<Config>(&content)?
        } else {
            Config::default()
        };
        config.validate();
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordup")
            .join("config.toml")
    }

    /// Clamp values into range and reset unknown keys to their defaults.
    /// Call after deserialization to handle hand-edited configs.
    pub fn validate(&mut self) {
        self.learned_min_attempts = self.learned_min_attempts.clamp(1, 20);
        if !self.learned_min_success_rate.is_finite() {
            self.learned_min_success_rate = default_learned_min_success_rate();
        }
        self.learned_min_success_rate = self.learned_min_success_rate.clamp(0.0, 1.0);
        self.xp_per_point = self.xp_per_point.clamp(1, 10);
        self.words_per_test = self.words_per_test.clamp(1, 50);
        if TestType::from_key(&self.default_test_type).is_none() {
            self.default_test_type = default_test_type();
        }
        if Difficulty::from_key(&self.default_difficulty).is_none() {
            self.default_difficulty = default_difficulty();
        }
    }

    pub fn test_type(&self) -> TestType {
        TestType::from_key(&self.default_test_type).unwrap_or(TestType::MultipleChoice)
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_key(&self.default_difficulty).unwrap_or_default()
    }
}
