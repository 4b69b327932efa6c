#![allow(dead_code)]

use quiz_app::catalog::QuizCatalog;
use quiz_app::config::Config;
use quiz_app::platform::QuizPlatform;
use quiz_types::Registration;
use std::time::Duration;

/// Platform over a fresh in-memory store
pub async fn create_test_platform() -> QuizPlatform {
    create_platform_with_time_limit(Duration::from_secs(600)).await
}

pub async fn create_platform_with_time_limit(time_limit: Duration) -> QuizPlatform {
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        quiz_time_limit: time_limit,
        ..Config::default()
    };
    QuizPlatform::open(&config).await.unwrap()
}

/// Registers and signs in a user
pub async fn sign_in(platform: &QuizPlatform, name: &str) -> String {
    let email = format!("{}@example.com", name.to_lowercase());
    platform
        .register(Registration::new(&email, "password123", name))
        .await
        .unwrap();
    platform.login(&email, "password123").await.unwrap();
    email
}

pub fn builtin_catalog() -> QuizCatalog {
    QuizCatalog::builtin(Duration::from_secs(600))
}
