use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::{AttemptId, OptionId, QuestionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum AttemptMode {
    #[default]
    Normal,
    Review,
}

/// A scored attempt. Keeps both answer maps so review mode can be rebuilt
/// from this snapshot alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AttemptResult {
    pub attempt_id: AttemptId,
    pub quiz_id: String,
    pub quiz_name: String,
    pub category: String,
    /// Count of correct answers.
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub date: String, // ISO 8601 string
    pub user_answers: BTreeMap<QuestionId, OptionId>,
    pub correct_answers: BTreeMap<QuestionId, OptionId>,
    pub time_spent_seconds: Option<u32>,
    pub time_left_seconds: Option<u32>,
}

impl AttemptResult {
    pub fn grade(&self) -> ResultGrade {
        ResultGrade::from_percentage(self.percentage)
    }
}

/// One question as shown in review mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReviewedQuestion {
    pub question_id: QuestionId,
    pub selected: Option<OptionId>,
    pub correct: Option<OptionId>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ResultGrade {
    Excellent,
    GreatJob,
    GoodTry,
    KeepPracticing,
}

impl ResultGrade {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => ResultGrade::Excellent,
            75..=89 => ResultGrade::GreatJob,
            50..=74 => ResultGrade::GoodTry,
            _ => ResultGrade::KeepPracticing,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ResultGrade::Excellent => "Excellent!",
            ResultGrade::GreatJob => "Great Job!",
            ResultGrade::GoodTry => "Good Try!",
            ResultGrade::KeepPracticing => "Keep Practicing!",
        }
    }
}
