mod common;

use common::*;
use quiz_app::catalog::{HTML_FUNDAMENTALS, WEB_BASICS_PRACTICE};
use quiz_core::AttemptPhase;
use quiz_types::{AttemptMode, Destination, QuizError, ResultGrade};
use std::time::Duration;

#[tokio::test]
async fn test_protected_pages_require_login() {
    let platform = create_test_platform().await;

    let err = platform.load_quiz_page(HTML_FUNDAMENTALS).unwrap_err();
    assert_eq!(err, QuizError::NotAuthenticated);
    assert_eq!(err.destination(), Some(Destination::Login));
    assert_eq!(platform.profile().await.unwrap_err(), QuizError::NotAuthenticated);
}

#[tokio::test]
async fn test_unknown_quiz() {
    let platform = create_test_platform().await;
    sign_in(&platform, "Alice").await;

    assert!(matches!(
        platform.load_quiz_page("css-layout"),
        Err(QuizError::QuizNotFound { .. })
    ));
}

#[tokio::test]
async fn test_full_quiz_flow_records_history() {
    let platform = create_test_platform().await;
    let email = sign_in(&platform, "Alice").await;
    let key = builtin_catalog()
        .get(HTML_FUNDAMENTALS)
        .unwrap()
        .answer_key
        .clone();

    let mut page = platform.load_quiz_page(HTML_FUNDAMENTALS).unwrap();
    assert_eq!(page.engine.mode(), AttemptMode::Normal);
    assert!(page.engine.remaining_time().is_some());

    for (question, option) in key.iter() {
        page.engine.select_option(question, option).unwrap();
    }
    let outcome = platform.submit(&mut page).await.unwrap();
    assert_eq!(outcome.result.percentage, 100);
    assert_eq!(outcome.result.grade(), ResultGrade::Excellent);
    assert_eq!(outcome.destination, Destination::Results);

    let recorded = outcome.recorded.unwrap();
    assert_eq!(recorded.account.stats.total_quizzes, 1);
    assert_eq!(recorded.account.stats.average_score, 100);

    let history = platform.history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user_id, email);
    assert_eq!(history[0].correct_answers, 10);
    assert_eq!(platform.latest_result(), Some(outcome.result));
}

#[tokio::test]
async fn test_practice_quiz_keeps_result_only() {
    let platform = create_test_platform().await;
    sign_in(&platform, "Bob").await;

    let mut page = platform.load_quiz_page(WEB_BASICS_PRACTICE).unwrap();
    assert!(page.engine.remaining_time().is_none());
    page.engine.select_option("q1", "a").unwrap();

    let outcome = platform.submit(&mut page).await.unwrap();
    assert!(outcome.recorded.is_none());
    assert_eq!(outcome.result.score, 1);
    assert_eq!(outcome.result.total, 15);

    assert!(platform.history().await.unwrap().is_empty());
    let profile = platform.profile().await.unwrap();
    assert_eq!(profile.account.stats.total_quizzes, 0);
    assert!(platform.latest_result().is_some());
}

#[tokio::test]
async fn test_review_flag_is_one_shot() {
    let platform = create_test_platform().await;
    sign_in(&platform, "Carol").await;

    assert_eq!(platform.open_review(), None);

    let mut page = platform.load_quiz_page(HTML_FUNDAMENTALS).unwrap();
    page.engine.select_option("q1", "a").unwrap();
    page.engine.select_option("q2", "a").unwrap();
    platform.submit(&mut page).await.unwrap();

    let destination = platform.open_review().unwrap();
    assert_eq!(
        destination,
        Destination::Quiz {
            quiz_id: HTML_FUNDAMENTALS.to_string()
        }
    );

    let mut review = platform.load_quiz_page(HTML_FUNDAMENTALS).unwrap();
    assert_eq!(review.engine.mode(), AttemptMode::Review);
    assert_eq!(review.engine.phase(), AttemptPhase::Reviewing);
    assert_eq!(review.engine.review().len(), 10);
    assert_eq!(
        review.engine.select_option("q2", "c"),
        Err(QuizError::ReviewLocked)
    );
    assert!(platform.submit(&mut review).await.is_err());

    let fresh = platform.load_quiz_page(HTML_FUNDAMENTALS).unwrap();
    assert_eq!(fresh.engine.mode(), AttemptMode::Normal);
    assert!(fresh.engine.selections().is_empty());
}

#[tokio::test]
async fn test_timer_auto_submits() {
    let platform = create_platform_with_time_limit(Duration::ZERO).await;
    sign_in(&platform, "Dave").await;

    let mut page = platform.load_quiz_page(HTML_FUNDAMENTALS).unwrap();
    page.engine.select_option("q1", "a").unwrap();

    let outcome = platform.poll_timer(&mut page).await.unwrap().unwrap();
    assert_eq!(outcome.result.score, 1);
    assert!(platform.poll_timer(&mut page).await.unwrap().is_none());
    assert_eq!(
        platform.submit(&mut page).await.unwrap_err(),
        QuizError::AlreadySubmitted
    );
    assert_eq!(platform.history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_account_logs_out() {
    let platform = create_test_platform().await;
    let email = sign_in(&platform, "Erin").await;

    let mut page = platform.load_quiz_page(HTML_FUNDAMENTALS).unwrap();
    platform.submit(&mut page).await.unwrap();

    assert_eq!(platform.delete_account().await.unwrap(), Destination::Login);
    assert!(platform.current_identity().is_none());
    assert!(platform.latest_result().is_none());
    assert!(matches!(
        platform.login(&email, "password123").await,
        Err(QuizError::AccountNotFound { .. })
    ));
}

#[tokio::test]
async fn test_logout_returns_to_login() {
    let platform = create_test_platform().await;
    sign_in(&platform, "Frank").await;

    assert_eq!(platform.logout(), Destination::Login);
    assert_eq!(platform.history().await.unwrap_err(), QuizError::NotAuthenticated);
}
