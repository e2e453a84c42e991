pub mod achievements;
pub mod coordinator;
pub mod difficulty;
pub mod leveling;
pub mod scoring;
pub mod spaced_repetition;
pub mod stats;
pub mod streak;

pub use coordinator::{CompletionOutcome, LearningPolicy, ProgressCoordinator};
