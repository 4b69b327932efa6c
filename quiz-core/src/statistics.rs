use chrono::NaiveDate;
use quiz_types::AccountStats;
use rand::Rng;
use std::ops::RangeInclusive;

/// Coarse rank badge. The value inside a bucket is drawn at random on every
/// recompute, so rank is not a leaderboard position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBucket {
    Top,
    Middle,
    Low,
}

impl RankBucket {
    pub fn for_average(average_score: u32) -> Self {
        if average_score > 80 {
            RankBucket::Top
        } else if average_score > 60 {
            RankBucket::Middle
        } else {
            RankBucket::Low
        }
    }

    pub fn range(&self) -> RangeInclusive<u32> {
        match self {
            RankBucket::Top => 1..=50,
            RankBucket::Middle => 51..=150,
            RankBucket::Low => 151..=350,
        }
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.range())
    }
}

/// Incremental mean using the pre-increment count as the weight of the old
/// average. O(1) regardless of history length, so every recorded score must
/// pass through here for the average to stay the mean of the history.
pub fn incremental_average(old_average: u32, old_count: u32, score: u32) -> u32 {
    let new_count = old_count as f64 + 1.0;
    let total = old_average as f64 * old_count as f64 + score as f64;
    (total / new_count).round() as u32
}

/// Consecutive UTC days with at least one attempt.
pub fn next_streak(current: u32, last_attempt: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match last_attempt {
        Some(last) if last == today => current.max(1),
        Some(last) if today.pred_opt() == Some(last) => current + 1,
        _ => 1,
    }
}

pub fn level_for(total_quizzes: u32) -> u32 {
    1 + total_quizzes / 10
}

/// Fold one attempt into the aggregate statistics.
pub fn apply_attempt<R: Rng + ?Sized>(
    stats: &mut AccountStats,
    score: u32,
    time_spent_seconds: u32,
    last_attempt: Option<NaiveDate>,
    today: NaiveDate,
    rng: &mut R,
) {
    let old_count = stats.total_quizzes;

    stats.total_quizzes = old_count + 1;
    stats.average_score = incremental_average(stats.average_score, old_count, score);
    stats.total_time_seconds = stats.total_time_seconds.saturating_add(time_spent_seconds);
    stats.rank = RankBucket::for_average(stats.average_score).roll(rng);
    stats.streak = next_streak(stats.streak, last_attempt, today);
    stats.level = level_for(stats.total_quizzes);
}
