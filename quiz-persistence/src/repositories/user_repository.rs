use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::{apply_attempt, AttemptRecorder};
use quiz_types::{
    Account, AccountStats, AttemptSummary, CategoryAverage, CredentialChange, HistoryRecord,
    ProfilePatch, QuizError, RecordedAttempt, Registration, Settings, SettingsPatch, Theme,
    Visibility,
};
use sea_orm::ActiveValue::{NotSet, Set};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::entities::prelude::{History, Users};
use crate::entities::{history, settings, users};
use crate::store::{index, CollectionName, RecordStore, StoreError, StoreTransaction, TxMode};

pub const DEFAULT_AVATAR: &str = "img/avatar.png";

/// Account lifecycle, credentials, settings and the aggregate statistics
/// recompute. All score recording must go through `record_attempt` for the
/// running average to stay the mean of the history.
pub struct UserRepository {
    store: Arc<RecordStore>,
}

impl UserRepository {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    fn model_to_account(model: users::Model) -> Account {
        let stats = Self::stats_of(&model);
        Account {
            email: model.email,
            username: model.username,
            display_name: model.display_name,
            avatar: model.avatar,
            created_at: model.created_at.to_rfc3339(),
            last_login: model.last_login.to_rfc3339(),
            last_attempt_at: model.last_attempt_at.map(|at| at.to_rfc3339()),
            stats,
        }
    }

    fn stats_of(model: &users::Model) -> AccountStats {
        AccountStats {
            total_quizzes: model.total_quizzes.max(0) as u32,
            average_score: model.average_score.max(0) as u32,
            total_time_seconds: model.total_time_seconds.max(0) as u32,
            rank: model.rank.max(0) as u32,
            streak: model.streak.max(0) as u32,
            level: model.level.max(0) as u32,
        }
    }

    fn store_stats(model: &mut users::Model, stats: &AccountStats) {
        model.total_quizzes = stats.total_quizzes as i32;
        model.average_score = stats.average_score as i32;
        model.total_time_seconds = stats.total_time_seconds as i32;
        model.rank = stats.rank as i32;
        model.streak = stats.streak as i32;
        model.level = stats.level as i32;
    }

    fn model_to_settings(model: settings::Model) -> Settings {
        Settings {
            profile_visibility: Visibility::parse(&model.profile_visibility)
                .unwrap_or(Visibility::Public),
            theme: Theme::parse(&model.theme).unwrap_or(Theme::Light),
            user_id: model.user_id,
            email_notifications: model.email_notifications,
            quiz_reminders: model.quiz_reminders,
            achievement_alerts: model.achievement_alerts,
            show_on_leaderboard: model.show_on_leaderboard,
            allow_messages: model.allow_messages,
        }
    }

    fn settings_to_model(settings: &Settings) -> settings::Model {
        settings::Model {
            user_id: settings.user_id.clone(),
            email_notifications: settings.email_notifications,
            quiz_reminders: settings.quiz_reminders,
            achievement_alerts: settings.achievement_alerts,
            profile_visibility: settings.profile_visibility.as_str().to_string(),
            show_on_leaderboard: settings.show_on_leaderboard,
            allow_messages: settings.allow_messages,
            theme: settings.theme.as_str().to_string(),
        }
    }

    fn model_to_history(model: history::Model) -> HistoryRecord {
        HistoryRecord {
            id: model.id,
            user_id: model.user_id,
            quiz_name: model.quiz_name,
            category: model.category,
            score: model.score.max(0) as u32,
            total_questions: model.total_questions.max(0) as u32,
            correct_answers: model.correct_answers.max(0) as u32,
            time_spent_seconds: model.time_spent.max(0) as u32,
            date: model.date.to_rfc3339(),
        }
    }

    /// Loads an account inside a transaction, failing when it does not exist.
    async fn require_user(txn: &StoreTransaction, email: &str) -> Result<users::Model, QuizError> {
        txn.get::<Users>(email)
            .await?
            .ok_or_else(|| QuizError::AccountNotFound {
                email: email.to_string(),
            })
    }

    /// Stored settings, or the defaults for an existing account without any.
    async fn load_settings(txn: &StoreTransaction, email: &str) -> Result<Settings, QuizError> {
        match txn.get::<settings::Entity>(email).await? {
            Some(model) => Ok(Self::model_to_settings(model)),
            None => {
                Self::require_user(txn, email).await?;
                Ok(Settings::defaults_for(email))
            }
        }
    }

    fn recompute_stats(user: &users::Model, summary: &AttemptSummary, now: DateTime<Utc>) -> AccountStats {
        let mut stats = Self::stats_of(user);
        let mut rng = rand::thread_rng();
        apply_attempt(
            &mut stats,
            summary.score.min(100),
            summary.time_spent_seconds,
            user.last_attempt_at.map(|at| at.date_naive()),
            now.date_naive(),
            &mut rng,
        );
        stats
    }

    /// Creates the account and its default settings together; neither exists
    /// if either insert fails.
    pub async fn register(&self, registration: Registration) -> Result<Account, QuizError> {
        registration.validate()?;

        let now = Utc::now();
        let stats = AccountStats::new_account();
        let model = users::Model {
            email: registration.email.clone(),
            username: registration.derived_username(),
            credential: registration.credential.clone(),
            display_name: registration.display_name.clone(),
            avatar: DEFAULT_AVATAR.to_string(),
            created_at: now,
            last_login: now,
            last_attempt_at: None,
            total_quizzes: stats.total_quizzes as i32,
            average_score: stats.average_score as i32,
            total_time_seconds: stats.total_time_seconds as i32,
            rank: stats.rank as i32,
            streak: stats.streak as i32,
            level: stats.level as i32,
        };

        let defaults = Self::settings_to_model(&Settings::defaults_for(&registration.email));
        let record = model.clone();
        let email = registration.email.clone();

        self.store
            .run_transaction::<_, _, QuizError>(
                &[CollectionName::Users, CollectionName::Settings],
                TxMode::ReadWrite,
                move |txn| {
                    Box::pin(async move {
                        txn.add::<Users>(record).await.map_err(|err| match err {
                            StoreError::DuplicateKey { .. } => QuizError::DuplicateAccount { email },
                            other => other.into(),
                        })?;
                        txn.add::<settings::Entity>(defaults).await?;
                        Ok(())
                    })
                },
            )
            .await?;

        info!("Registered account {}", model.email);
        Ok(Self::model_to_account(model))
    }

    /// Verifies the credential and stamps the login time.
    pub async fn authenticate(&self, email: &str, credential: &str) -> Result<Account, QuizError> {
        let email = email.trim().to_string();
        let credential = credential.to_string();

        let account = self
            .store
            .run_transaction::<_, _, QuizError>(
                &[CollectionName::Users],
                TxMode::ReadWrite,
                move |txn| {
                    Box::pin(async move {
                        let mut user = Self::require_user(txn, &email).await?;
                        if user.credential != credential {
                            return Err(QuizError::InvalidCredential);
                        }

                        user.last_login = Utc::now();
                        txn.put::<Users>(user.clone()).await?;
                        Ok(Self::model_to_account(user))
                    })
                },
            )
            .await?;

        info!("{} signed in", account.email);
        Ok(account)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, QuizError> {
        let user = self.store.get::<Users>(email).await?;
        Ok(user.map(Self::model_to_account))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Vec<Account>, QuizError> {
        let users = self
            .store
            .get_by_index::<Users>(index::USERNAME, username)
            .await?;
        Ok(users.into_iter().map(Self::model_to_account).collect())
    }

    /// All accounts, oldest first.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, QuizError> {
        let mut users = self.store.get_all::<Users>().await?;
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users.into_iter().map(Self::model_to_account).collect())
    }

    pub async fn update_profile(&self, email: &str, patch: ProfilePatch) -> Result<Account, QuizError> {
        for (field, value) in [
            ("display_name", &patch.display_name),
            ("username", &patch.username),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(QuizError::Validation {
                    field: field.to_string(),
                    message: "This field cannot be empty.".to_string(),
                });
            }
        }

        let email = email.to_string();
        self.store
            .run_transaction::<_, _, QuizError>(
                &[CollectionName::Users],
                TxMode::ReadWrite,
                move |txn| {
                    Box::pin(async move {
                        let mut user = Self::require_user(txn, &email).await?;
                        if let Some(display_name) = patch.display_name {
                            user.display_name = display_name.trim().to_string();
                        }
                        if let Some(username) = patch.username {
                            user.username = username.trim().to_string();
                        }
                        if let Some(avatar) = patch.avatar {
                            user.avatar = avatar;
                        }

                        txn.put::<Users>(user.clone()).await?;
                        Ok(Self::model_to_account(user))
                    })
                },
            )
            .await
    }

    pub async fn change_credential(&self, email: &str, change: CredentialChange) -> Result<(), QuizError> {
        change.validate()?;

        let email = email.to_string();
        self.store
            .run_transaction::<_, _, QuizError>(
                &[CollectionName::Users],
                TxMode::ReadWrite,
                move |txn| {
                    Box::pin(async move {
                        let mut user = Self::require_user(txn, &email).await?;
                        if user.credential != change.current {
                            return Err(QuizError::InvalidCredential);
                        }

                        user.credential = change.new;
                        txn.put::<Users>(user).await?;
                        info!("Credential changed for {}", email);
                        Ok(())
                    })
                },
            )
            .await
    }

    /// Folds the attempt into the account statistics and appends its history
    /// row in one transaction spanning both collections.
    pub async fn record_attempt(
        &self,
        email: &str,
        summary: AttemptSummary,
    ) -> Result<RecordedAttempt, QuizError> {
        let email = email.to_string();

        let recorded = self
            .store
            .run_transaction::<_, _, QuizError>(
                &[CollectionName::Users, CollectionName::History],
                TxMode::ReadWrite,
                move |txn| {
                    Box::pin(async move {
                        let mut user = Self::require_user(txn, &email).await?;
                        let now = Utc::now();

                        let stats = Self::recompute_stats(&user, &summary, now);
                        Self::store_stats(&mut user, &stats);
                        user.last_attempt_at = Some(now);
                        txn.put::<Users>(user.clone()).await?;

                        let row = history::ActiveModel {
                            id: NotSet,
                            user_id: Set(email.clone()),
                            quiz_name: Set(summary.quiz_name.clone()),
                            category: Set(summary.category.clone()),
                            score: Set(summary.score.min(100) as i32),
                            total_questions: Set(summary.total_questions as i32),
                            correct_answers: Set(summary.correct_answers as i32),
                            time_spent: Set(summary.time_spent_seconds as i32),
                            date: Set(now),
                        };
                        let id = txn.add::<History>(row).await?;

                        Ok(RecordedAttempt {
                            account: Self::model_to_account(user),
                            history: HistoryRecord {
                                id,
                                user_id: email,
                                quiz_name: summary.quiz_name,
                                category: summary.category,
                                score: summary.score.min(100),
                                total_questions: summary.total_questions,
                                correct_answers: summary.correct_answers,
                                time_spent_seconds: summary.time_spent_seconds,
                                date: now.to_rfc3339(),
                            },
                        })
                    })
                },
            )
            .await?;

        info!(
            "Recorded attempt #{} for {}: {}% (average now {}%)",
            recorded.history.id,
            recorded.account.email,
            recorded.history.score,
            recorded.account.stats.average_score
        );
        Ok(recorded)
    }

    /// The account's attempts, newest first.
    pub async fn history(&self, email: &str) -> Result<Vec<HistoryRecord>, QuizError> {
        let rows = self
            .store
            .get_by_index::<History>(index::USER_ID, email)
            .await?;
        Ok(Self::newest_first(rows))
    }

    pub async fn history_in_category(
        &self,
        email: &str,
        category: &str,
    ) -> Result<Vec<HistoryRecord>, QuizError> {
        let rows = self
            .store
            .get_by_index::<History>(index::CATEGORY, category)
            .await?
            .into_iter()
            .filter(|row| row.user_id == email)
            .collect();
        Ok(Self::newest_first(rows))
    }

    /// Rounded mean score per category, alphabetical.
    pub async fn category_averages(&self, email: &str) -> Result<Vec<CategoryAverage>, QuizError> {
        let mut totals: BTreeMap<String, (u32, u32)> = BTreeMap::new();
        for record in self.history(email).await? {
            let entry = totals.entry(record.category).or_default();
            entry.0 += record.score;
            entry.1 += 1;
        }

        Ok(totals
            .into_iter()
            .map(|(category, (sum, attempts))| CategoryAverage {
                category,
                attempts,
                average_score: (sum as f64 / attempts as f64).round() as u32,
            })
            .collect())
    }

    fn newest_first(mut rows: Vec<history::Model>) -> Vec<HistoryRecord> {
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        rows.into_iter().map(Self::model_to_history).collect()
    }

    pub async fn get_settings(&self, email: &str) -> Result<Settings, QuizError> {
        let email = email.to_string();
        self.store
            .run_transaction::<_, _, QuizError>(
                &[CollectionName::Users, CollectionName::Settings],
                TxMode::ReadWrite,
                move |txn| {
                    Box::pin(async move {
                        if let Some(model) = txn.get::<settings::Entity>(email.clone()).await? {
                            return Ok(Self::model_to_settings(model));
                        }

                        Self::require_user(txn, &email).await?;
                        debug!("Backfilling default settings for {}", email);
                        let settings = Settings::defaults_for(&email);
                        txn.put::<settings::Entity>(Self::settings_to_model(&settings)).await?;
                        Ok(settings)
                    })
                },
            )
            .await
    }

    /// Partial merge over the stored (or backfilled) settings.
    pub async fn update_settings(&self, email: &str, patch: SettingsPatch) -> Result<Settings, QuizError> {
        let email = email.to_string();
        self.store
            .run_transaction::<_, _, QuizError>(
                &[CollectionName::Users, CollectionName::Settings],
                TxMode::ReadWrite,
                move |txn| {
                    Box::pin(async move {
                        let mut settings = Self::load_settings(txn, &email).await?;
                        settings.apply(&patch);
                        txn.put::<settings::Entity>(Self::settings_to_model(&settings)).await?;
                        Ok(settings)
                    })
                },
            )
            .await
    }

    /// Removes history, settings and the account as one unit.
    pub async fn delete_account(&self, email: &str) -> Result<(), QuizError> {
        let email = email.to_string();
        self.store
            .run_transaction::<_, _, QuizError>(
                &CollectionName::ALL,
                TxMode::ReadWrite,
                move |txn| {
                    Box::pin(async move {
                        Self::require_user(txn, &email).await?;

                        let removed = txn
                            .delete_by_index::<History>(index::USER_ID, email.clone())
                            .await?;
                        txn.delete::<settings::Entity>(email.clone()).await?;
                        if !txn.delete::<Users>(email.clone()).await? {
                            return Err(QuizError::TransactionFailed {
                                message: format!("account {} vanished during deletion", email),
                            });
                        }

                        info!("Deleted account {} and {} history records", email, removed);
                        Ok(())
                    })
                },
            )
            .await
    }
}

#[async_trait]
impl AttemptRecorder for UserRepository {
    async fn record_attempt(
        &self,
        email: &str,
        summary: AttemptSummary,
    ) -> Result<RecordedAttempt, QuizError> {
        UserRepository::record_attempt(self, email, summary).await
    }
}
