use chrono::NaiveDate;

use crate::error::{EngineError, Result};

/// Advance the day streak for activity on `today`.
///
/// Returns the new streak and the new last-active date, which is always
/// `today` on success.
pub fn update(
    streak_days: u32,
    last_active: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(u32, NaiveDate)> {
    let Some(last) = last_active else {
        return Ok((1, today));
    };

    let diff = today.signed_duration_since(last).num_days();
    let streak = match diff {
        d if d < 0 => {
            return Err(EngineError::InvalidTimestamp {
                last_active: last,
                today,
            });
        }
        0 => streak_days,
        1 => streak_days + 1,
        _ => 1,
    };
    Ok((streak, today))
}

/// Streak is alive if there was activity today or yesterday.
pub fn is_active(last_active: Option<NaiveDate>, today: NaiveDate) -> bool {
    match last_active {
        Some(last) => {
            let diff = today.signed_duration_since(last).num_days();
            (0..=1).contains(&diff)
        }
        None => false,
    }
}

/// Streak to show on `today`: zero once a full day has been missed.
pub fn displayed_streak(
    streak_days: u32,
    last_active: Option<NaiveDate>,
    today: NaiveDate,
) -> u32 {
    if is_active(last_active, today) {
        streak_days
    } else {
        0
    }
}
