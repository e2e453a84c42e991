use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::Config;
use crate::corpus::{WordCorpus, WordId};
use crate::engine::achievements::{self, AchievementCatalog};
use crate::engine::{difficulty, leveling, scoring, spaced_repetition, streak};
use crate::error::{EngineError, Result};
use crate::session::answer::Answer;
use crate::session::result::TestResult;
use crate::session::test::TestCompletion;
use crate::store::schema::UserProgress;

/// Knobs that decide when a word counts as learned and how score turns
/// into experience.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LearningPolicy {
    pub learned_min_attempts: u32,
    pub learned_min_success_rate: f64,
    pub xp_per_point: u64,
}

impl Default for LearningPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl LearningPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            learned_min_attempts: config.learned_min_attempts,
            learned_min_success_rate: config.learned_min_success_rate,
            xp_per_point: config.xp_per_point,
        }
    }
}

/// Everything a test completion produced.
#[derive(Clone, Debug)]
pub struct CompletionOutcome {
    pub progress: UserProgress,
    pub result: TestResult,
    /// Achievements unlocked by this completion, in unlock order.
    pub newly_unlocked: Vec<String>,
    pub newly_learned: Vec<WordId>,
    pub levels_gained: u32,
}

pub struct ProgressCoordinator<'a, C: Clock> {
    corpus: &'a WordCorpus,
    catalog: &'a AchievementCatalog,
    policy: LearningPolicy,
    clock: C,
}

impl<'a, C: Clock> ProgressCoordinator<'a, C> {
    pub fn new(
        corpus: &'a WordCorpus,
        catalog: &'a AchievementCatalog,
        policy: LearningPolicy,
        clock: C,
    ) -> Self {
        Self {
            corpus,
            catalog,
            policy,
            clock,
        }
    }

    /// Apply one finished test to `progress`, returning the new snapshot.
    /// On error `progress` is untouched and nothing is produced.
    pub fn apply_test_completion(
        &self,
        progress: &UserProgress,
        completion: &TestCompletion,
    ) -> Result<CompletionOutcome> {
        if completion.answers.is_empty() {
            return Err(EngineError::EmptyWordSet);
        }
        if let Some(missing) = completion
            .answers
            .iter()
            .find(|a| !self.corpus.contains(a.word_id))
        {
            return Err(EngineError::InvalidWordReference {
                word_id: missing.word_id,
            });
        }

        let now = self.clock.now();
        let today = self.clock.today();
        let (streak_days, last_active) =
            streak::update(progress.streak_days, progress.last_active_date, today)?;

        let answers: Vec<Answer> = completion
            .answers
            .iter()
            .map(|a| a.within_limits(completion.difficulty))
            .collect();

        let mut next = progress.clone();

        let result = build_result(next_result_id(progress), now, completion, &answers);
        debug!(
            test_type = result.test_type.as_str(),
            score = result.score,
            total_possible = result.total_possible,
            words = result.words.len(),
            "applying test completion"
        );
        next.total_score += result.score as u64;
        next.total_time_spent += result.time_spent;
        next.test_history.push(result.clone());

        next.streak_days = streak_days;
        next.best_streak = next.best_streak.max(streak_days);
        next.last_active_date = Some(last_active);

        for answer in answers.iter().filter(|a| a.correct) {
            next.correct.insert(answer.word_id);
        }
        let newly_learned = self.mark_learned(&mut next, &result.words);

        let start_level = next.level;
        self.grant_experience(&mut next, result.score as u64 * self.policy.xp_per_point);

        for (word_id, (correct, hint_used)) in review_outcomes(&answers) {
            let quality = spaced_repetition::quality_from_answer(correct, hint_used);
            spaced_repetition::review_word(&mut next.review_cards, word_id, quality, now);
        }

        let newly_unlocked = self.unlock_achievements(&mut next);
        let levels_gained = next.level - start_level;
        if levels_gained > 0 {
            info!(level = next.level, levels_gained, "level up");
        }

        Ok(CompletionOutcome {
            progress: next,
            result,
            newly_unlocked,
            newly_learned,
            levels_gained,
        })
    }

    /// Add every achievement that currently holds to the unlocked set and
    /// grant its reward. Rewards can raise the level and unlock more, so
    /// this repeats until nothing new appears.
    pub fn unlock_achievements(&self, progress: &mut UserProgress) -> Vec<String> {
        let mut unlocked = Vec::new();
        loop {
            let fresh: Vec<String> = achievements::evaluate(self.catalog, progress)
                .into_iter()
                .filter(|id| !progress.achievements.contains(id))
                .collect();
            if fresh.is_empty() {
                break;
            }
            for id in fresh {
                let reward = self.catalog.get(&id).map(|a| a.xp_reward).unwrap_or(0);
                info!(achievement = %id, reward, "achievement unlocked");
                progress.achievements.insert(id.clone());
                self.grant_experience(progress, reward);
                unlocked.push(id);
            }
        }
        unlocked
    }

    fn grant_experience(&self, progress: &mut UserProgress, gained: u64) {
        let (level, experience) =
            leveling::add_experience(progress.level, progress.experience, gained);
        progress.level = level;
        progress.experience = experience;
    }

    fn mark_learned(&self, progress: &mut UserProgress, words: &[WordId]) -> Vec<WordId> {
        let mut newly_learned = Vec::new();
        let unique: BTreeSet<WordId> = words.iter().copied().collect();
        for word_id in unique {
            if progress.learned.contains(&word_id) {
                continue;
            }
            let analysis = difficulty::analyze(word_id, &progress.test_history);
            if analysis.meets(
                self.policy.learned_min_attempts,
                self.policy.learned_min_success_rate,
            ) {
                progress.learned.insert(word_id);
                newly_learned.push(word_id);
            }
        }
        newly_learned
    }
}

fn next_result_id(progress: &UserProgress) -> u32 {
    progress
        .test_history
        .iter()
        .map(|r| r.id)
        .max()
        .map_or(1, |id| id + 1)
}

/// `answers` must already be within the completion's difficulty limits.
fn build_result(
    id: u32,
    now: chrono::DateTime<chrono::Utc>,
    completion: &TestCompletion,
    answers: &[Answer],
) -> TestResult {
    let par = scoring::par_points(completion.test_type, completion.difficulty);
    let mut score: u32 = 0;
    let mut total_possible: u32 = 0;
    let mut missed = BTreeSet::new();
    for answer in answers {
        score = score.saturating_add(scoring::compute_score(
            completion.test_type,
            completion.difficulty,
            answer.correct,
            answer.time_remaining_secs,
            answer.hint_used,
        ));
        total_possible = total_possible.saturating_add(par);
        if !answer.correct || answer.hint_used {
            missed.insert(answer.word_id);
        }
    }

    TestResult {
        id,
        date: now,
        test_type: completion.test_type,
        difficulty: completion.difficulty,
        score,
        total_possible,
        time_spent: completion.time_spent_secs,
        words: completion.word_ids(),
        missed: missed.into_iter().collect(),
    }
}

/// Collapse answers into one review per word: correct only if every answer
/// to it was, hinted if any was.
fn review_outcomes(answers: &[Answer]) -> BTreeMap<WordId, (bool, bool)> {
    let mut outcomes = BTreeMap::new();
    for answer in answers {
        let (correct, hint_used) = outcomes.entry(answer.word_id).or_insert((true, false));
        *correct &= answer.correct;
        *hint_used |= answer.hint_used;
    }
    outcomes
}

/// Recompute totals and streaks by replaying `progress.test_history`.
/// Used after an import or history edit; achievements are left as they are
/// because they are never revoked.
pub fn rebuild_from_history(progress: &mut UserProgress) {
    progress.total_score = 0;
    progress.total_time_spent = 0;
    progress.streak_days = 0;
    progress.best_streak = 0;
    progress.last_active_date = None;

    for result in &progress.test_history {
        progress.total_score += result.score as u64;
        progress.total_time_spent += result.time_spent;

        let day = result.date.date_naive();
        match streak::update(progress.streak_days, progress.last_active_date, day) {
            Ok((days, last)) => {
                progress.streak_days = days;
                progress.last_active_date = Some(last);
            }
            // Out-of-order entry: it still counts toward totals only.
            Err(_) => continue,
        }
        progress.best_streak = progress.best_streak.max(progress.streak_days);
    }
}
