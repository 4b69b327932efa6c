#![allow(dead_code)]

use async_trait::async_trait;
use quiz_core::{
    AnswerKey, AttemptConfig, AttemptEvent, AttemptEventHandler, AttemptRecorder, Handoff,
    QuizDefinition, SessionContext,
};
use quiz_types::{
    Account, AccountStats, AttemptSummary, HistoryRecord, Identity, QuizError, RecordedAttempt,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Creates the three-question quiz used across attempt tests
pub fn create_test_quiz() -> QuizDefinition {
    QuizDefinition::new(
        "abc",
        "ABC Quiz",
        "html",
        AnswerKey::from_pairs(&[("q1", "a"), ("q2", "b"), ("q3", "c")]),
    )
}

/// Creates a timed variant of the test quiz
pub fn create_timed_quiz(limit: Duration) -> QuizDefinition {
    create_test_quiz().with_config(AttemptConfig::timed(limit))
}

pub fn create_test_identity(name: &str) -> Identity {
    Identity {
        email: format!("{}@example.com", name.to_lowercase()),
        username: name.to_string(),
        display_name: name.to_string(),
    }
}

/// Session for a fresh page load with a signed-in account
pub fn signed_in_session(name: &str) -> SessionContext {
    let handoff = Arc::new(Handoff::new());
    handoff.set_identity(create_test_identity(name));
    SessionContext::load(handoff)
}

pub fn guest_session() -> SessionContext {
    SessionContext::load(Arc::new(Handoff::new()))
}

/// Event collector for testing event emissions
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<AttemptEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_events(&self) -> Vec<AttemptEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn count_matching(&self, check_fn: impl Fn(&AttemptEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| check_fn(e)).count()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&AttemptEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl AttemptEventHandler for EventCollector {
    fn handle_event(&mut self, event: AttemptEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Recorder that keeps summaries in memory and can be told to fail
#[derive(Clone, Default)]
pub struct MockRecorder {
    recorded: Arc<Mutex<Vec<(String, AttemptSummary)>>>,
    failing: Arc<Mutex<bool>>,
}

impl MockRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn recorded(&self) -> Vec<(String, AttemptSummary)> {
        self.recorded.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttemptRecorder for MockRecorder {
    async fn record_attempt(
        &self,
        email: &str,
        summary: AttemptSummary,
    ) -> Result<RecordedAttempt, QuizError> {
        if *self.failing.lock().unwrap() {
            return Err(QuizError::TransactionFailed {
                message: "transaction aborted".to_string(),
            });
        }

        let mut recorded = self.recorded.lock().unwrap();
        recorded.push((email.to_string(), summary.clone()));

        Ok(RecordedAttempt {
            account: Account {
                email: email.to_string(),
                username: "mock".to_string(),
                display_name: "Mock".to_string(),
                avatar: "img/avatar.png".to_string(),
                created_at: String::new(),
                last_login: String::new(),
                last_attempt_at: None,
                stats: AccountStats {
                    total_quizzes: recorded.len() as u32,
                    ..AccountStats::new_account()
                },
            },
            history: HistoryRecord {
                id: recorded.len() as i32,
                user_id: email.to_string(),
                quiz_name: summary.quiz_name,
                category: summary.category,
                score: summary.score,
                total_questions: summary.total_questions,
                correct_answers: summary.correct_answers,
                time_spent_seconds: summary.time_spent_seconds,
                date: String::new(),
            },
        })
    }
}
