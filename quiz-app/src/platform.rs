use quiz_core::{AttemptEngine, Handoff, SessionContext, SubmitOutcome};
use quiz_persistence::{RecordStore, UserRepository};
use quiz_types::{
    Account, AttemptResult, CategoryAverage, CredentialChange, Destination, HistoryRecord, Identity,
    ProfilePatch, QuizError, Registration, Settings, SettingsPatch,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::catalog::QuizCatalog;
use crate::config::Config;

/// Everything the profile page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub account: Account,
    pub history: Vec<HistoryRecord>,
    pub category_averages: Vec<CategoryAverage>,
    pub settings: Settings,
}

/// A loaded quiz page: the page's session view and its attempt.
#[derive(Debug)]
pub struct QuizPage {
    pub session: SessionContext,
    pub engine: AttemptEngine,
}

/// Page flows over one store, one repository and the cross-page handoff.
pub struct QuizPlatform {
    repository: Arc<UserRepository>,
    catalog: Arc<QuizCatalog>,
    handoff: Arc<Handoff>,
}

impl QuizPlatform {
    pub fn new(repository: Arc<UserRepository>, catalog: QuizCatalog) -> Self {
        Self {
            repository,
            catalog: Arc::new(catalog),
            handoff: Arc::new(Handoff::new()),
        }
    }

    /// Opens the store at the configured schema version and wires the flows.
    pub async fn open(config: &Config) -> Result<Self, QuizError> {
        let store = RecordStore::connect(&config.database_url, config.schema_version).await?;
        info!(
            "Record store open at schema version {}",
            store.schema_version()
        );

        let repository = Arc::new(UserRepository::new(Arc::new(store)));
        Ok(Self::new(
            repository,
            QuizCatalog::builtin(config.quiz_time_limit),
        ))
    }

    pub fn catalog(&self) -> &QuizCatalog {
        &self.catalog
    }

    pub fn repository(&self) -> &UserRepository {
        &self.repository
    }

    /// Session view for a page load. Consumes a pending review request.
    pub fn session(&self) -> SessionContext {
        SessionContext::load(Arc::clone(&self.handoff))
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.handoff.identity()
    }

    pub async fn register(&self, registration: Registration) -> Result<Account, QuizError> {
        self.repository.register(registration).await
    }

    pub async fn login(&self, email: &str, credential: &str) -> Result<Destination, QuizError> {
        let account = self.repository.authenticate(email, credential).await?;
        self.handoff.set_identity(Identity::from(&account));
        Ok(Destination::Home)
    }

    pub fn logout(&self) -> Destination {
        self.handoff.clear_identity();
        self.handoff.clear_latest_result();
        Destination::Login
    }

    pub async fn profile(&self) -> Result<ProfileView, QuizError> {
        let identity = self.require_identity()?;
        let account = self
            .repository
            .find_by_email(&identity.email)
            .await?
            .ok_or_else(|| QuizError::AccountNotFound {
                email: identity.email.clone(),
            })?;

        Ok(ProfileView {
            account,
            history: self.repository.history(&identity.email).await?,
            category_averages: self.repository.category_averages(&identity.email).await?,
            settings: self.repository.get_settings(&identity.email).await?,
        })
    }

    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<Account, QuizError> {
        let identity = self.require_identity()?;
        let account = self.repository.update_profile(&identity.email, patch).await?;
        self.handoff.set_identity(Identity::from(&account));
        Ok(account)
    }

    pub async fn change_credential(&self, change: CredentialChange) -> Result<(), QuizError> {
        let identity = self.require_identity()?;
        self.repository
            .change_credential(&identity.email, change)
            .await
    }

    pub async fn settings(&self) -> Result<Settings, QuizError> {
        let identity = self.require_identity()?;
        self.repository.get_settings(&identity.email).await
    }

    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, QuizError> {
        let identity = self.require_identity()?;
        self.repository
            .update_settings(&identity.email, patch)
            .await
    }

    pub async fn history(&self) -> Result<Vec<HistoryRecord>, QuizError> {
        let identity = self.require_identity()?;
        self.repository.history(&identity.email).await
    }

    /// Loads a quiz page. A pending review request for this quiz replays the
    /// latest result read-only instead of starting a new attempt.
    pub fn load_quiz_page(&self, quiz_id: &str) -> Result<QuizPage, QuizError> {
        let quiz = self.catalog.get(quiz_id)?.clone();
        let session = self.session();
        session.require_identity()?;

        let engine = AttemptEngine::for_session(quiz, &session);
        Ok(QuizPage { session, engine })
    }

    pub async fn submit(&self, page: &mut QuizPage) -> Result<SubmitOutcome, QuizError> {
        page.engine
            .submit(&page.session, self.repository.as_ref())
            .await
    }

    /// Auto-submits a timed page whose countdown ran out.
    pub async fn poll_timer(&self, page: &mut QuizPage) -> Result<Option<SubmitOutcome>, QuizError> {
        page.engine
            .poll_timer(&page.session, self.repository.as_ref())
            .await
    }

    pub fn latest_result(&self) -> Option<AttemptResult> {
        self.handoff.latest_result()
    }

    /// Flags the next quiz page load as a review of the latest result.
    /// `None` when there is nothing to review.
    pub fn open_review(&self) -> Option<Destination> {
        let result = self.handoff.latest_result()?;
        self.handoff.request_review();
        Some(Destination::Quiz {
            quiz_id: result.quiz_id,
        })
    }

    pub async fn delete_account(&self) -> Result<Destination, QuizError> {
        let identity = self.require_identity()?;
        self.repository.delete_account(&identity.email).await?;
        Ok(self.logout())
    }

    fn require_identity(&self) -> Result<Identity, QuizError> {
        self.handoff.identity().ok_or(QuizError::NotAuthenticated)
    }
}
