//! SM-2 review scheduling.
//!
//! Each answered word is treated as a review graded on the 0-5 SM-2 scale:
//! a correct answer grades 4, an incorrect one 2, and a hint costs one grade.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::corpus::WordId;

pub const INITIAL_EASE: f64 = 2.5;
pub const MINIMUM_EASE: f64 = 1.3;
const PASSING_QUALITY: u8 = 3;
const SECOND_INTERVAL_DAYS: u32 = 6;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpacedRepetitionCard {
    pub word_id: WordId,
    pub interval: u32,
    pub ease_factor: f64,
    pub repetitions: u32,
    pub last_review: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
}

impl SpacedRepetitionCard {
    /// State of a word that has never been reviewed.
    pub fn initial(word_id: WordId, now: DateTime<Utc>) -> Self {
        Self {
            word_id,
            interval: 0,
            ease_factor: INITIAL_EASE,
            repetitions: 0,
            last_review: now,
            next_review: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }

    /// Pull a card loaded from storage back within the scheduler's bounds.
    /// Returns whether anything had to change.
    pub fn repair(&mut self) -> bool {
        let mut repaired = false;
        if !self.ease_factor.is_finite() {
            self.ease_factor = INITIAL_EASE;
            repaired = true;
        } else if self.ease_factor < MINIMUM_EASE {
            self.ease_factor = MINIMUM_EASE;
            repaired = true;
        }
        if self.repetitions > 0 && self.interval == 0 {
            self.interval = 1;
            repaired = true;
        }
        repaired
    }
}

pub fn quality_from_answer(correct: bool, hint_used: bool) -> u8 {
    let quality: u8 = if correct { 4 } else { 2 };
    if hint_used {
        quality.saturating_sub(1)
    } else {
        quality
    }
}

pub fn next_ease_factor(ease_factor: f64, quality: u8) -> f64 {
    let q = 5.0 - quality.min(5) as f64;
    (ease_factor + (0.1 - q * (0.08 + q * 0.02))).max(MINIMUM_EASE)
}

/// Apply one review of `quality` to `card`, returning the updated card.
pub fn review(
    card: &SpacedRepetitionCard,
    quality: u8,
    now: DateTime<Utc>,
) -> SpacedRepetitionCard {
    let ease_factor = next_ease_factor(card.ease_factor, quality);

    let (repetitions, interval) = if quality < PASSING_QUALITY {
        (0, 1)
    } else {
        let repetitions = card.repetitions + 1;
        let interval = match repetitions {
            1 => 1,
            2 => SECOND_INTERVAL_DAYS,
            _ => ((card.interval as f64 * ease_factor).round() as u32).max(1),
        };
        (repetitions, interval)
    };

    SpacedRepetitionCard {
        word_id: card.word_id,
        interval,
        ease_factor,
        repetitions,
        last_review: now,
        next_review: now + Duration::days(interval as i64),
    }
}

/// Review `word_id` in `cards`, creating its card on first review.
pub fn review_word(
    cards: &mut BTreeMap<WordId, SpacedRepetitionCard>,
    word_id: WordId,
    quality: u8,
    now: DateTime<Utc>,
) -> &SpacedRepetitionCard {
    let current = cards
        .get(&word_id)
        .cloned()
        .unwrap_or_else(|| SpacedRepetitionCard::initial(word_id, now));
    let updated = review(&current, quality, now);
    cards.insert(word_id, updated);
    &cards[&word_id]
}

/// Cards due at `now`, most overdue first.
pub fn due_cards(
    cards: &BTreeMap<WordId, SpacedRepetitionCard>,
    now: DateTime<Utc>,
) -> Vec<&SpacedRepetitionCard> {
    let mut due: Vec<&SpacedRepetitionCard> = cards.values().filter(|c| c.is_due(now)).collect();
    due.sort_by(|a, b| a.next_review.cmp(&b.next_review).then(a.word_id.cmp(&b.word_id)));
    due
}
