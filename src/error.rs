use chrono::NaiveDate;
use thiserror::Error;

use crate::corpus::WordId;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the progress engine.
///
/// `CorruptProgressRecord` is only ever produced while repairing a loaded
/// record; the repair proceeds with defaults and the error is reported, not
/// propagated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("word {word_id} is not in the corpus")]
    InvalidWordReference { word_id: WordId },

    #[error("test completion contains no words")]
    EmptyWordSet,

    #[error("current date {today} precedes last activity on {last_active}")]
    InvalidTimestamp {
        last_active: NaiveDate,
        today: NaiveDate,
    },

    #[error("progress record field `{field}` was out of range and has been reset")]
    CorruptProgressRecord { field: &'static str },

    #[error("achievement catalog: {0}")]
    Catalog(String),
}
