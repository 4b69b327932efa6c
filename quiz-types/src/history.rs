use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::Account;

/// One completed, persisted quiz attempt. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryRecord {
    pub id: i32,
    pub user_id: String,
    pub quiz_name: String,
    pub category: String,
    /// Percentage, 0..=100.
    pub score: u32,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub time_spent_seconds: u32,
    pub date: String, // ISO 8601 string
}

/// What an attempt contributes to the store: the history row fields plus the
/// inputs of the aggregate recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AttemptSummary {
    pub quiz_name: String,
    pub category: String,
    /// Percentage, 0..=100. Raw correct counts travel in `correct_answers`.
    pub score: u32,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub time_spent_seconds: u32,
}

/// Outcome of recording an attempt: the recomputed account and its new
/// history row, written in one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecordedAttempt {
    pub account: Account,
    pub history: HistoryRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryAverage {
    pub category: String,
    pub attempts: u32,
    pub average_score: u32,
}
