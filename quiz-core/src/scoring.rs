use quiz_types::{OptionId, QuestionId, ReviewedQuestion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static mapping from question to its single correct option. Supplied with
/// the quiz content, never derived at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey(BTreeMap<QuestionId, OptionId>);

impl AnswerKey {
    pub fn new(answers: BTreeMap<QuestionId, OptionId>) -> Self {
        Self(answers)
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        pairs
            .iter()
            .map(|(question, option)| (question.to_string(), option.to_string()))
            .collect()
    }

    pub fn correct_option(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.0.contains_key(question_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &OptionId)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &BTreeMap<QuestionId, OptionId> {
        &self.0
    }
}

impl FromIterator<(QuestionId, OptionId)> for AnswerKey {
    fn from_iter<I: IntoIterator<Item = (QuestionId, OptionId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Score selections against the key. Every keyed question counts toward
    /// the total; unanswered ones are simply incorrect. Selections for
    /// questions outside the key are ignored.
    pub fn score(answer_key: &AnswerKey, selections: &BTreeMap<QuestionId, OptionId>) -> Tally {
        let total = answer_key.len() as u32;
        let correct = answer_key
            .iter()
            .filter(|(question, option)| selections.get(*question) == Some(*option))
            .count() as u32;

        Tally {
            correct,
            total,
            percentage: Self::percentage(correct, total),
        }
    }

    /// `round(100 * correct / total)`; an empty quiz scores 0.
    pub fn percentage(correct: u32, total: u32) -> u32 {
        if total == 0 {
            return 0;
        }
        (100.0 * correct as f64 / total as f64).round() as u32
    }

    /// Rebuild the per-question review from a stored result's answer maps.
    /// Covers every keyed question plus any answered question outside the key.
    pub fn review(
        user_answers: &BTreeMap<QuestionId, OptionId>,
        correct_answers: &BTreeMap<QuestionId, OptionId>,
    ) -> Vec<ReviewedQuestion> {
        let mut questions: Vec<&QuestionId> = correct_answers.keys().collect();
        questions.extend(
            user_answers
                .keys()
                .filter(|question| !correct_answers.contains_key(*question)),
        );
        questions.sort();

        questions
            .into_iter()
            .map(|question| {
                let selected = user_answers.get(question).cloned();
                let correct = correct_answers.get(question).cloned();
                let is_correct = selected.is_some() && selected == correct;
                ReviewedQuestion {
                    question_id: question.clone(),
                    selected,
                    correct,
                    is_correct,
                }
            })
            .collect()
    }
}
