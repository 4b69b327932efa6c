use async_trait::async_trait;
use quiz_types::{
    AttemptId, AttemptMode, AttemptResult, AttemptSummary, Destination, OptionId, QuestionId,
    QuizError, RecordedAttempt, ReviewedQuestion,
};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    AnswerKey, AttemptEvent, AttemptEventBus, AttemptEventHandler, Countdown, ScoringEngine,
    SessionContext,
};

pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(10 * 60);

/// Capability flags that select the attempt flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptConfig {
    pub has_timer: bool,
    /// Record stats and a history row on submit. Without it only the latest
    /// result snapshot is kept.
    pub persists_history: bool,
    pub time_limit: Duration,
}

impl AttemptConfig {
    pub fn timed(time_limit: Duration) -> Self {
        Self {
            has_timer: true,
            persists_history: true,
            time_limit,
        }
    }

    pub fn untimed() -> Self {
        Self {
            has_timer: false,
            persists_history: true,
            time_limit: DEFAULT_TIME_LIMIT,
        }
    }

    pub fn result_only(mut self) -> Self {
        self.persists_history = false;
        self
    }
}

impl Default for AttemptConfig {
    fn default() -> Self {
        Self::untimed()
    }
}

/// Static quiz content: identity, answer key and the flow it runs under.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizDefinition {
    pub id: String,
    pub name: String,
    pub category: String,
    pub answer_key: AnswerKey,
    pub config: AttemptConfig,
}

impl QuizDefinition {
    pub fn new(id: &str, name: &str, category: &str, answer_key: AnswerKey) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            answer_key,
            config: AttemptConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AttemptConfig) -> Self {
        self.config = config;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    InProgress,
    /// Latched while the result is being persisted.
    Submitting,
    Submitted,
    Reviewing,
}

/// Persists a finished attempt: aggregate recompute and history append in a
/// single transaction.
#[async_trait]
pub trait AttemptRecorder: Send + Sync {
    async fn record_attempt(
        &self,
        email: &str,
        summary: AttemptSummary,
    ) -> Result<RecordedAttempt, QuizError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub result: AttemptResult,
    /// `None` for result-only quizzes and guest attempts.
    pub recorded: Option<RecordedAttempt>,
    pub destination: Destination,
}

/// One quiz attempt from first selection to submission, or a read-only
/// replay of a stored result. A new attempt needs a new engine.
#[derive(Debug)]
pub struct AttemptEngine {
    id: AttemptId,
    quiz: QuizDefinition,
    mode: AttemptMode,
    phase: AttemptPhase,
    selections: BTreeMap<QuestionId, OptionId>,
    countdown: Option<Countdown>,
    started_at: Instant,
    result: Option<AttemptResult>,
    review: Vec<ReviewedQuestion>,
    event_bus: AttemptEventBus,
}

impl AttemptEngine {
    pub fn new(quiz: QuizDefinition, mode: AttemptMode) -> Self {
        let countdown = (quiz.config.has_timer && mode == AttemptMode::Normal)
            .then(|| Countdown::start(quiz.config.time_limit));

        Self {
            id: Uuid::new_v4(),
            quiz,
            mode,
            phase: AttemptPhase::InProgress,
            selections: BTreeMap::new(),
            countdown,
            started_at: Instant::now(),
            result: None,
            review: Vec::new(),
            event_bus: AttemptEventBus::new(),
        }
    }

    /// Engine for a page load. A session in review mode replays its stored
    /// result when it belongs to this quiz.
    pub fn for_session(quiz: QuizDefinition, session: &SessionContext) -> Self {
        match session.review_result() {
            Some(result) if result.quiz_id == quiz.id => {
                let mut engine = Self::new(quiz, AttemptMode::Review);
                engine.enter_review(result);
                engine
            }
            _ => Self::new(quiz, AttemptMode::Normal),
        }
    }

    /// Handlers attached to a live attempt first receive `AttemptStarted`.
    pub fn add_handler(&mut self, mut handler: Box<dyn AttemptEventHandler>) {
        if self.phase == AttemptPhase::InProgress && self.mode == AttemptMode::Normal {
            handler.handle_event(AttemptEvent::AttemptStarted {
                attempt_id: self.id,
                quiz_id: self.quiz.id.clone(),
                timed: self.countdown.is_some(),
            });
        }
        self.event_bus.add_handler(handler);
    }

    pub fn id(&self) -> AttemptId {
        self.id
    }

    pub fn quiz(&self) -> &QuizDefinition {
        &self.quiz
    }

    pub fn mode(&self) -> AttemptMode {
        self.mode
    }

    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    pub fn is_locked(&self) -> bool {
        self.mode == AttemptMode::Review || self.phase != AttemptPhase::InProgress
    }

    pub fn selections(&self) -> &BTreeMap<QuestionId, OptionId> {
        &self.selections
    }

    pub fn selection(&self, question_id: &str) -> Option<&str> {
        self.selections.get(question_id).map(String::as_str)
    }

    pub fn answered_count(&self) -> usize {
        self.quiz
            .answer_key
            .iter()
            .filter(|(question, _)| self.selections.contains_key(*question))
            .count()
    }

    pub fn remaining_time(&self) -> Option<Duration> {
        self.countdown.as_ref().map(Countdown::remaining)
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.countdown.as_ref()
    }

    pub fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }

    pub fn review(&self) -> &[ReviewedQuestion] {
        &self.review
    }

    /// Single-select: overwrites any earlier choice for the question.
    /// Returns whether the selection changed.
    pub fn select_option(&mut self, question_id: &str, option_id: &str) -> Result<bool, QuizError> {
        if self.mode == AttemptMode::Review || self.phase == AttemptPhase::Reviewing {
            self.event_bus.publish(AttemptEvent::SelectionRejected {
                attempt_id: self.id,
                question_id: question_id.to_string(),
            });
            return Err(QuizError::ReviewLocked);
        }
        if self.phase != AttemptPhase::InProgress {
            return Err(QuizError::AlreadySubmitted);
        }
        if self.selection(question_id) == Some(option_id) {
            return Ok(false);
        }

        self.selections
            .insert(question_id.to_string(), option_id.to_string());
        self.event_bus.publish(AttemptEvent::OptionSelected {
            attempt_id: self.id,
            question_id: question_id.to_string(),
            option_id: option_id.to_string(),
        });
        Ok(true)
    }

    /// Score, persist and hand off the result. Persistence failures release
    /// the latch so the whole submission can be retried.
    pub async fn submit<R>(
        &mut self,
        session: &SessionContext,
        recorder: &R,
    ) -> Result<SubmitOutcome, QuizError>
    where
        R: AttemptRecorder + ?Sized,
    {
        self.begin_submit()?;

        let result = self.build_result();
        let recorded = match self.persist(session, recorder, &result).await {
            Ok(recorded) => recorded,
            Err(err) => {
                warn!("Attempt {} could not be recorded: {}", self.id, err);
                self.phase = AttemptPhase::InProgress;
                return Err(err);
            }
        };

        self.phase = AttemptPhase::Submitted;
        session.handoff().store_latest_result(result.clone());
        self.result = Some(result.clone());

        info!(
            "Attempt {} on '{}' submitted: {}/{} ({}%)",
            self.id, self.quiz.id, result.score, result.total, result.percentage
        );
        self.event_bus.publish(AttemptEvent::AttemptSubmitted {
            attempt_id: self.id,
            percentage: result.percentage,
            persisted: recorded.is_some(),
        });

        Ok(SubmitOutcome {
            result,
            recorded,
            destination: Destination::Results,
        })
    }

    /// Forces submission once the countdown runs out. Shares the submit latch
    /// with manual submission, so it never submits twice.
    pub async fn poll_timer<R>(
        &mut self,
        session: &SessionContext,
        recorder: &R,
    ) -> Result<Option<SubmitOutcome>, QuizError>
    where
        R: AttemptRecorder + ?Sized,
    {
        if self.phase != AttemptPhase::InProgress {
            return Ok(None);
        }
        let fired = self.countdown.as_mut().is_some_and(Countdown::fire);
        if !fired {
            return Ok(None);
        }

        info!("Time is up for attempt {}, submitting", self.id);
        self.event_bus
            .publish(AttemptEvent::TimerExpired { attempt_id: self.id });
        self.submit(session, recorder).await.map(Some)
    }

    /// Read-only replay of a stored result. Repeating it yields the same view.
    pub fn enter_review(&mut self, result: &AttemptResult) -> &[ReviewedQuestion] {
        self.review = ScoringEngine::review(&result.user_answers, &result.correct_answers);
        self.selections = result.user_answers.clone();
        self.result = Some(result.clone());
        self.mode = AttemptMode::Review;
        self.phase = AttemptPhase::Reviewing;
        self.countdown = None;

        let correct = self.review.iter().filter(|q| q.is_correct).count() as u32;
        debug!(
            "Attempt {} reviewing result {} ({} questions)",
            self.id,
            result.attempt_id,
            self.review.len()
        );
        self.event_bus.publish(AttemptEvent::ReviewEntered {
            attempt_id: self.id,
            correct,
            reviewed: self.review.len() as u32,
        });

        &self.review
    }

    fn begin_submit(&mut self) -> Result<(), QuizError> {
        if self.mode == AttemptMode::Review {
            return Err(QuizError::ReviewLocked);
        }
        match self.phase {
            AttemptPhase::InProgress => {
                self.phase = AttemptPhase::Submitting;
                Ok(())
            }
            AttemptPhase::Reviewing => Err(QuizError::ReviewLocked),
            AttemptPhase::Submitting | AttemptPhase::Submitted => Err(QuizError::AlreadySubmitted),
        }
    }

    fn elapsed_seconds(&self) -> u32 {
        match &self.countdown {
            Some(countdown) => countdown.elapsed().as_secs() as u32,
            None => self.started_at.elapsed().as_secs() as u32,
        }
    }

    fn build_result(&self) -> AttemptResult {
        let tally = ScoringEngine::score(&self.quiz.answer_key, &self.selections);

        AttemptResult {
            attempt_id: self.id,
            quiz_id: self.quiz.id.clone(),
            quiz_name: self.quiz.name.clone(),
            category: self.quiz.category.clone(),
            score: tally.correct,
            total: tally.total,
            percentage: tally.percentage,
            date: chrono::Utc::now().to_rfc3339(),
            user_answers: self.selections.clone(),
            correct_answers: self.quiz.answer_key.as_map().clone(),
            time_spent_seconds: self
                .countdown
                .as_ref()
                .map(|countdown| countdown.elapsed().as_secs() as u32),
            time_left_seconds: self
                .countdown
                .as_ref()
                .map(|countdown| countdown.remaining().as_secs() as u32),
        }
    }

    async fn persist<R>(
        &self,
        session: &SessionContext,
        recorder: &R,
        result: &AttemptResult,
    ) -> Result<Option<RecordedAttempt>, QuizError>
    where
        R: AttemptRecorder + ?Sized,
    {
        if !self.quiz.config.persists_history {
            return Ok(None);
        }
        let Some(identity) = session.identity() else {
            debug!("Guest attempt {} is kept as latest result only", self.id);
            return Ok(None);
        };

        let summary = AttemptSummary {
            quiz_name: self.quiz.name.clone(),
            category: self.quiz.category.clone(),
            score: result.percentage,
            total_questions: result.total,
            correct_answers: result.score,
            time_spent_seconds: self.elapsed_seconds(),
        };

        recorder
            .record_attempt(&identity.email, summary)
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Handoff;
    use quiz_types::{Account, AccountStats, HistoryRecord};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingStub {
        calls: Mutex<Vec<(String, AttemptSummary)>>,
        fail: bool,
    }

    #[async_trait]
    impl AttemptRecorder for RecordingStub {
        async fn record_attempt(
            &self,
            email: &str,
            summary: AttemptSummary,
        ) -> Result<RecordedAttempt, QuizError> {
            if self.fail {
                return Err(QuizError::TransactionFailed {
                    message: "disk full".to_string(),
                });
            }
            self.calls
                .lock()
                .unwrap()
                .push((email.to_string(), summary.clone()));

            Ok(RecordedAttempt {
                account: Account {
                    email: email.to_string(),
                    username: "tester".to_string(),
                    display_name: "Tester".to_string(),
                    avatar: String::new(),
                    created_at: String::new(),
                    last_login: String::new(),
                    last_attempt_at: None,
                    stats: AccountStats::new_account(),
                },
                history: HistoryRecord {
                    id: 1,
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

    fn quiz() -> QuizDefinition {
        QuizDefinition::new(
            "abc",
            "ABC",
            "html",
            AnswerKey::from_pairs(&[("q1", "a"), ("q2", "b"), ("q3", "c")]),
        )
    }

    fn signed_in_session() -> SessionContext {
        let mut session = SessionContext::load(Arc::new(Handoff::new()));
        session.sign_in(quiz_types::Identity {
            email: "alice@example.com".to_string(),
            username: "Alice".to_string(),
            display_name: "Alice".to_string(),
        });
        session
    }

    #[test]
    fn test_selection_is_idempotent_and_single_select() {
        let mut engine = AttemptEngine::new(quiz(), AttemptMode::Normal);

        assert!(engine.select_option("q1", "a").unwrap());
        assert!(!engine.select_option("q1", "a").unwrap());
        assert!(engine.select_option("q1", "b").unwrap());

        assert_eq!(engine.selection("q1"), Some("b"));
        assert_eq!(engine.selections().len(), 1);
        assert_eq!(engine.answered_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_scores_and_records_percentage() {
        let recorder = RecordingStub::default();
        let session = signed_in_session();
        let mut engine = AttemptEngine::new(quiz(), AttemptMode::Normal);

        engine.select_option("q1", "a").unwrap();
        engine.select_option("q2", "x").unwrap();

        let outcome = engine.submit(&session, &recorder).await.unwrap();
        assert_eq!(outcome.result.score, 1);
        assert_eq!(outcome.result.total, 3);
        assert_eq!(outcome.result.percentage, 33);
        assert_eq!(outcome.destination, Destination::Results);
        assert!(outcome.recorded.is_some());
        assert_eq!(engine.phase(), AttemptPhase::Submitted);

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "alice@example.com");
        assert_eq!(calls[0].1.score, 33);
        assert_eq!(calls[0].1.correct_answers, 1);
        assert_eq!(calls[0].1.total_questions, 3);

        assert_eq!(session.handoff().latest_result(), Some(outcome.result));
    }

    #[tokio::test]
    async fn test_submitted_attempt_is_terminal() {
        let recorder = RecordingStub::default();
        let session = signed_in_session();
        let mut engine = AttemptEngine::new(quiz(), AttemptMode::Normal);

        engine.submit(&session, &recorder).await.unwrap();

        assert_eq!(
            engine.submit(&session, &recorder).await,
            Err(QuizError::AlreadySubmitted)
        );
        assert_eq!(
            engine.select_option("q1", "a"),
            Err(QuizError::AlreadySubmitted)
        );
        assert_eq!(recorder.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_persistence_releases_latch() {
        let failing = RecordingStub {
            fail: true,
            ..Default::default()
        };
        let session = signed_in_session();
        let mut engine = AttemptEngine::new(quiz(), AttemptMode::Normal);
        engine.select_option("q1", "a").unwrap();

        let err = engine.submit(&session, &failing).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(engine.phase(), AttemptPhase::InProgress);
        assert!(session.handoff().latest_result().is_none());

        let recorder = RecordingStub::default();
        let outcome = engine.submit(&session, &recorder).await.unwrap();
        assert_eq!(outcome.result.score, 1);
    }

    #[tokio::test]
    async fn test_result_only_quiz_is_not_recorded() {
        let recorder = RecordingStub::default();
        let session = signed_in_session();
        let quiz = quiz().with_config(AttemptConfig::untimed().result_only());
        let mut engine = AttemptEngine::new(quiz, AttemptMode::Normal);

        let outcome = engine.submit(&session, &recorder).await.unwrap();
        assert!(outcome.recorded.is_none());
        assert!(recorder.calls.lock().unwrap().is_empty());
        assert!(session.handoff().latest_result().is_some());
    }

    #[tokio::test]
    async fn test_guest_attempt_is_not_recorded() {
        let recorder = RecordingStub::default();
        let session = SessionContext::load(Arc::new(Handoff::new()));
        let mut engine = AttemptEngine::new(quiz(), AttemptMode::Normal);

        let outcome = engine.submit(&session, &recorder).await.unwrap();
        assert!(outcome.recorded.is_none());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timer_forces_single_submission() {
        let recorder = RecordingStub::default();
        let session = signed_in_session();
        let quiz = quiz().with_config(AttemptConfig::timed(Duration::ZERO));
        let mut engine = AttemptEngine::new(quiz, AttemptMode::Normal);

        let outcome = engine.poll_timer(&session, &recorder).await.unwrap();
        let outcome = outcome.expect("expired countdown submits");
        assert_eq!(outcome.result.time_left_seconds, Some(0));

        assert!(engine.poll_timer(&session, &recorder).await.unwrap().is_none());
        assert_eq!(
            engine.submit(&session, &recorder).await,
            Err(QuizError::AlreadySubmitted)
        );
        assert_eq!(recorder.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_manual_submit_before_timer_fires() {
        let recorder = RecordingStub::default();
        let session = signed_in_session();
        let quiz = quiz().with_config(AttemptConfig::timed(Duration::ZERO));
        let mut engine = AttemptEngine::new(quiz, AttemptMode::Normal);

        engine.submit(&session, &recorder).await.unwrap();
        assert!(engine.poll_timer(&session, &recorder).await.unwrap().is_none());
        assert_eq!(recorder.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_untimed_attempt_never_fires() {
        let recorder = RecordingStub::default();
        let session = signed_in_session();
        let mut engine = AttemptEngine::new(quiz(), AttemptMode::Normal);

        assert!(engine.remaining_time().is_none());
        assert!(engine.poll_timer(&session, &recorder).await.unwrap().is_none());
        assert_eq!(engine.phase(), AttemptPhase::InProgress);
    }

    #[tokio::test]
    async fn test_review_replays_and_locks() {
        let recorder = RecordingStub::default();
        let session = signed_in_session();
        let mut engine = AttemptEngine::new(quiz(), AttemptMode::Normal);
        engine.select_option("q1", "a").unwrap();
        engine.select_option("q2", "x").unwrap();
        let outcome = engine.submit(&session, &recorder).await.unwrap();

        let mut review = AttemptEngine::new(quiz(), AttemptMode::Normal);
        let first: Vec<ReviewedQuestion> = review.enter_review(&outcome.result).to_vec();
        let second: Vec<ReviewedQuestion> = review.enter_review(&outcome.result).to_vec();
        assert_eq!(first, second);

        for (question, selected) in &outcome.result.user_answers {
            let reviewed = first.iter().find(|q| &q.question_id == question).unwrap();
            assert_eq!(
                reviewed.is_correct,
                Some(selected) == outcome.result.correct_answers.get(question)
            );
        }

        let before = review.selections().clone();
        assert_eq!(review.select_option("q2", "b"), Err(QuizError::ReviewLocked));
        assert_eq!(review.select_option("q3", "c"), Err(QuizError::ReviewLocked));
        assert_eq!(review.selections(), &before);
        assert_eq!(
            review.submit(&session, &recorder).await,
            Err(QuizError::ReviewLocked)
        );
        assert_eq!(review.phase(), AttemptPhase::Reviewing);
    }
}
