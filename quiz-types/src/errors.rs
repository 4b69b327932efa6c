use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use validator::ValidationErrors;

use crate::Destination;

/// Errors surfaced by the repository, the attempt engine and the page flows.
/// Lower-level storage failures are always translated into one of these.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum QuizError {
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },
    #[error("store schema error: {message}")]
    SchemaError { message: String },
    #[error("an account already exists for {email}")]
    DuplicateAccount { email: String },
    #[error("no account found for {email}")]
    AccountNotFound { email: String },
    #[error("invalid credential")]
    InvalidCredential,
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
    #[error("sign-in required")]
    NotAuthenticated,
    #[error("attempt is read-only in review mode")]
    ReviewLocked,
    #[error("attempt already submitted")]
    AlreadySubmitted,
    #[error("unknown quiz: {quiz_id}")]
    QuizNotFound { quiz_id: String },
    #[error("transaction failed: {message}")]
    TransactionFailed { message: String },
}

/// How an error is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ErrorSurface {
    /// Rendered inline next to a form field.
    Field { field: String },
    /// Page-level notice that blocks the dependent action.
    Page,
    /// Not shown at all.
    Silent,
}

impl QuizError {
    pub fn surface(&self) -> ErrorSurface {
        match self {
            QuizError::DuplicateAccount { .. } => ErrorSurface::Field {
                field: "email".to_string(),
            },
            QuizError::AccountNotFound { .. } => ErrorSurface::Field {
                field: "email".to_string(),
            },
            QuizError::InvalidCredential => ErrorSurface::Field {
                field: "credential".to_string(),
            },
            QuizError::Validation { field, .. } => ErrorSurface::Field {
                field: field.clone(),
            },
            QuizError::ReviewLocked => ErrorSurface::Silent,
            QuizError::StorageUnavailable { .. }
            | QuizError::SchemaError { .. }
            | QuizError::NotAuthenticated
            | QuizError::AlreadySubmitted
            | QuizError::QuizNotFound { .. }
            | QuizError::TransactionFailed { .. } => ErrorSurface::Page,
        }
    }

    /// Whether the whole logical operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QuizError::TransactionFailed { .. } | QuizError::StorageUnavailable { .. }
        )
    }

    pub fn destination(&self) -> Option<Destination> {
        match self {
            QuizError::NotAuthenticated => Some(Destination::Login),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            QuizError::StorageUnavailable { .. } => {
                "Storage is unavailable right now. Please try again later.".to_string()
            }
            QuizError::SchemaError { .. } => {
                "Your saved data was written by a newer version and cannot be opened.".to_string()
            }
            QuizError::DuplicateAccount { .. } => "Email already exists.".to_string(),
            QuizError::AccountNotFound { .. } | QuizError::InvalidCredential => {
                "Invalid email or password.".to_string()
            }
            QuizError::TransactionFailed { .. } => {
                "Your changes could not be saved. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<ValidationErrors> for QuizError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|(a, _), (b, _)| a.cmp(b));

        match fields.into_iter().next() {
            Some((field, field_errors)) => {
                let message = field_errors
                    .iter()
                    .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                QuizError::Validation {
                    field: field.to_string(),
                    message,
                }
            }
            None => QuizError::Validation {
                field: "form".to_string(),
                message: errors.to_string(),
            },
        }
    }
}
