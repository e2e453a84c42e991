//! Learning progress engine for a vocabulary trainer.
//!
//! Test completions go in, an updated [`store::schema::UserProgress`]
//! snapshot comes out: scoring, day streaks, experience and levels,
//! achievements, per-word difficulty and SM-2 review scheduling.

pub mod clock;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod session;
pub mod store;

mod assets;

pub use clock::{Clock, FixedClock, SystemClock};
pub use corpus::{WordCorpus, WordEntry, WordId};
pub use engine::{CompletionOutcome, LearningPolicy, ProgressCoordinator};
pub use error::{EngineError, Result};
pub use store::schema::UserProgress;
