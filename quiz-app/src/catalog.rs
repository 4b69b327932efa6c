use quiz_core::{AnswerKey, AttemptConfig, QuizDefinition};
use quiz_types::QuizError;
use std::time::Duration;

pub const HTML_FUNDAMENTALS: &str = "html-fundamentals";
pub const WEB_BASICS_PRACTICE: &str = "web-basics-practice";

/// The static quizzes and their answer keys.
#[derive(Debug, Clone)]
pub struct QuizCatalog {
    quizzes: Vec<QuizDefinition>,
}

impl QuizCatalog {
    pub fn new(quizzes: Vec<QuizDefinition>) -> Self {
        Self { quizzes }
    }

    pub fn builtin(time_limit: Duration) -> Self {
        let html = QuizDefinition::new(
            HTML_FUNDAMENTALS,
            "HTML Fundamentals",
            "html",
            numbered_key(&["a", "c", "b", "b", "b", "b", "c", "a", "b", "b"]),
        )
        .with_config(AttemptConfig::timed(time_limit));

        let practice = QuizDefinition::new(
            WEB_BASICS_PRACTICE,
            "Web Basics Practice",
            "web",
            numbered_key(&[
                "a", "a", "b", "a", "b", "a", "a", "a", "a", "a", "b", "b", "a", "a", "a",
            ]),
        )
        .with_config(AttemptConfig::untimed().result_only());

        Self::new(vec![html, practice])
    }

    pub fn get(&self, quiz_id: &str) -> Result<&QuizDefinition, QuizError> {
        self.quizzes
            .iter()
            .find(|quiz| quiz.id == quiz_id)
            .ok_or_else(|| QuizError::QuizNotFound {
                quiz_id: quiz_id.to_string(),
            })
    }

    pub fn quizzes(&self) -> &[QuizDefinition] {
        &self.quizzes
    }
}

/// Answer key for questions named q1, q2, ... in order.
fn numbered_key(options: &[&str]) -> AnswerKey {
    options
        .iter()
        .enumerate()
        .map(|(i, option)| (format!("q{}", i + 1), option.to_string()))
        .collect()
}
