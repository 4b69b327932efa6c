use quiz_types::QuizError;
use sea_orm::DbErr;
use thiserror::Error;

use super::CollectionName;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store has not been opened")]
    NotInitialized,
    #[error("record store unavailable: {0}")]
    StorageUnavailable(String),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("duplicate key in {collection}")]
    DuplicateKey { collection: CollectionName },
    #[error("{collection} has no index named '{index}'")]
    UnknownIndex {
        collection: CollectionName,
        index: String,
    },
    #[error("{collection} is outside the transaction scope")]
    OutOfScope { collection: CollectionName },
    #[error("write to {collection} in a read-only transaction")]
    ReadOnly { collection: CollectionName },
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl From<StoreError> for QuizError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotInitialized => QuizError::StorageUnavailable {
                message: err.to_string(),
            },
            StoreError::StorageUnavailable(message) => QuizError::StorageUnavailable { message },
            StoreError::Schema(message) => QuizError::SchemaError { message },
            other => QuizError::TransactionFailed {
                message: other.to_string(),
            },
        }
    }
}
