use quiz_types::{AttemptMode, AttemptResult, Destination, Identity, QuizError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct HandoffState {
    identity: Option<Identity>,
    review_requested: bool,
    latest_result: Option<AttemptResult>,
}

/// Signals that outlive a single page: the signed-in identity, the one-shot
/// review flag and the latest result snapshot. Constructed once and shared.
#[derive(Debug, Default)]
pub struct Handoff {
    state: Mutex<HandoffState>,
}

impl Handoff {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HandoffState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().identity.clone()
    }

    pub fn set_identity(&self, identity: Identity) {
        self.lock().identity = Some(identity);
    }

    pub fn clear_identity(&self) {
        self.lock().identity = None;
    }

    pub fn request_review(&self) {
        self.lock().review_requested = true;
    }

    /// Reads and clears the review flag.
    pub fn take_review_request(&self) -> bool {
        std::mem::take(&mut self.lock().review_requested)
    }

    pub fn latest_result(&self) -> Option<AttemptResult> {
        self.lock().latest_result.clone()
    }

    pub fn store_latest_result(&self, result: AttemptResult) {
        self.lock().latest_result = Some(result);
    }

    pub fn clear_latest_result(&self) {
        self.lock().latest_result = None;
    }
}

/// Per-page view of who is signed in and whether the page replays a result.
#[derive(Debug)]
pub struct SessionContext {
    handoff: Arc<Handoff>,
    identity: Option<Identity>,
    mode: AttemptMode,
    review_result: Option<AttemptResult>,
}

impl SessionContext {
    /// Page load. Consumes the review flag; review mode needs a stored result.
    pub fn load(handoff: Arc<Handoff>) -> Self {
        let identity = handoff.identity();
        let review_result = if handoff.take_review_request() {
            handoff.latest_result()
        } else {
            None
        };
        let mode = if review_result.is_some() {
            AttemptMode::Review
        } else {
            AttemptMode::Normal
        };

        if mode == AttemptMode::Review {
            tracing::debug!("Page loaded in review mode");
        }

        Self {
            handoff,
            identity,
            mode,
            review_result,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Guard for protected pages.
    pub fn require_identity(&self) -> Result<&Identity, QuizError> {
        self.identity.as_ref().ok_or(QuizError::NotAuthenticated)
    }

    pub fn mode(&self) -> AttemptMode {
        self.mode
    }

    pub fn review_result(&self) -> Option<&AttemptResult> {
        self.review_result.as_ref()
    }

    pub fn sign_in(&mut self, identity: Identity) {
        self.handoff.set_identity(identity.clone());
        self.identity = Some(identity);
    }

    pub fn sign_out(&mut self) -> Destination {
        self.handoff.clear_identity();
        self.identity = None;
        Destination::Login
    }

    pub fn handoff(&self) -> &Handoff {
        &self.handoff
    }

    /// Shared handle for the next page load.
    pub fn handoff_arc(&self) -> Arc<Handoff> {
        Arc::clone(&self.handoff)
    }
}
