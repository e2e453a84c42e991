use crate::session::result::{Difficulty, TestType};

const TIME_BONUS_STEP_SECS: u32 = 5;
const HINT_PENALTY: u32 = 10;

/// Points for a correct answer before difficulty is applied. Production
/// tasks (spelling) score above recognition tasks.
pub fn base_points(test_type: TestType) -> u32 {
    match test_type {
        TestType::RapidFire => 5,
        TestType::MultipleChoice => 10,
        TestType::Matching => 10,
        TestType::FillBlank => 15,
        TestType::Spelling => 20,
    }
}

/// Points a correct answer earns without time bonus or hint.
pub fn par_points(test_type: TestType, difficulty: Difficulty) -> u32 {
    base_points(test_type) * difficulty.multiplier()
}

pub fn compute_score(
    test_type: TestType,
    difficulty: Difficulty,
    correct: bool,
    time_remaining_secs: u32,
    hint_used: bool,
) -> u32 {
    if !correct {
        return 0;
    }
    let points = par_points(test_type, difficulty) + time_remaining_secs / TIME_BONUS_STEP_SECS;
    if hint_used {
        points.saturating_sub(HINT_PENALTY)
    } else {
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medium_correct_with_time_bonus() {
        let score = compute_score(TestType::Spelling, Difficulty::Medium, true, 12, false);
        assert_eq!(score, 2 * 20 + 2);
    }

    #[test]
    fn test_hard_spelling() {
        assert_eq!(
            compute_score(TestType::Spelling, Difficulty::Hard, true, 9, false),
            61
        );
    }

    #[test]
    fn test_incorrect_always_zero() {
        for &t in TestType::all() {
            assert_eq!(compute_score(t, Difficulty::Hard, false, 30, false), 0);
            assert_eq!(compute_score(t, Difficulty::Easy, false, 0, true), 0);
        }
    }

    #[test]
    fn test_hint_penalty_clamps_at_zero() {
        // 5 base, no time left: 5 - 10 clamps to 0
        assert_eq!(
            compute_score(TestType::RapidFire, Difficulty::Easy, true, 0, true),
            0
        );
        assert_eq!(
            compute_score(TestType::Spelling, Difficulty::Easy, true, 10, true),
            12
        );
    }

    #[test]
    fn test_production_outscores_recognition() {
        assert!(base_points(TestType::Spelling) > base_points(TestType::MultipleChoice));
        assert!(base_points(TestType::FillBlank) > base_points(TestType::RapidFire));
    }

    #[test]
    fn test_deterministic() {
        let a = compute_score(TestType::Matching, Difficulty::Medium, true, 17, false);
        let b = compute_score(TestType::Matching, Difficulty::Medium, true, 17, false);
        assert_eq!(a, b);
    }
}
