use icu_normalizer::ComposingNormalizerBorrowed;
use serde::{Deserialize, Serialize};

use crate::corpus::WordId;
use crate::session::result::Difficulty;

/// One answered question of a test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub word_id: WordId,
    pub correct: bool,
    #[serde(default)]
    pub hint_used: bool,
    #[serde(default)]
    pub time_remaining_secs: u32,
}

impl Answer {
    /// This answer with the time remaining capped at the question's limit
    /// and the hint dropped where `difficulty` does not offer hints.
    pub fn within_limits(&self, difficulty: Difficulty) -> Self {
        Self {
            word_id: self.word_id,
            correct: self.correct,
            hint_used: self.hint_used && difficulty.hints_allowed(),
            time_remaining_secs: self.time_remaining_secs.min(difficulty.time_limit_secs()),
        }
    }
}

/// Case-insensitive comparison of a typed answer against the headword.
/// Both sides are NFC-normalized so composed and decomposed accents match.
pub fn check_spelling(attempt: &str, headword: &str) -> bool {
    normalize(attempt) == normalize(headword)
}

fn normalize(text: &str) -> String {
    let nfc = ComposingNormalizerBorrowed::new_nfc();
    nfc.normalize(text.trim()).to_lowercase()
}
