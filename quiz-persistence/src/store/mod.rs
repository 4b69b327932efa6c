mod collection;
mod error;
mod transaction;

pub use collection::{index, Collection, CollectionName};
pub use error::StoreError;
pub use transaction::{PrimaryKeyOf, StoreTransaction, TxMode};

use futures_util::future::BoxFuture;
use migration::{Migrator, MigratorTrait};
use sea_orm::{DatabaseConnection, DbErr, IntoActiveModel, TransactionTrait, Value};
use tracing::{debug, info};

use crate::connection::connect_to_database;

/// Transactional record storage over the users, settings and history
/// collections. Every operation fails `NotInitialized` until `open` succeeds.
#[derive(Debug, Default)]
pub struct RecordStore {
    connection: Option<DatabaseConnection>,
    version: u32,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a fresh store at the requested schema version.
    pub async fn connect(database_url: &str, version: u32) -> Result<Self, StoreError> {
        let mut store = Self::new();
        store.open(database_url, version).await?;
        Ok(store)
    }

    /// Opens the database and brings it to `version`. Missing collections and
    /// indices are created; existing ones are never dropped. A version lower
    /// than the stored one, or higher than any known migration, is rejected.
    pub async fn open(&mut self, database_url: &str, version: u32) -> Result<u32, StoreError> {
        let db = connect_to_database(database_url)
            .await
            .map_err(|err| StoreError::StorageUnavailable(err.to_string()))?;

        let latest = migration::latest_version();
        if version == 0 || version > latest {
            return Err(StoreError::Schema(format!(
                "unknown schema version {} (latest known is {})",
                version, latest
            )));
        }

        let stored = Migrator::get_applied_migrations(&db)
            .await
            .map_err(schema_error)?
            .len() as u32;

        if version < stored {
            return Err(StoreError::Schema(format!(
                "store is at schema version {}, newer than requested {}",
                stored, version
            )));
        }

        if version > stored {
            info!("Upgrading record store schema {} -> {}", stored, version);
            Migrator::up(&db, Some(version - stored))
                .await
                .map_err(schema_error)?;
        } else {
            debug!("Record store already at schema version {}", version);
        }

        self.connection = Some(db);
        self.version = version;
        Ok(version)
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Schema version of the open store; 0 when closed.
    pub fn schema_version(&self) -> u32 {
        self.version
    }

    pub async fn close(&mut self) -> Result<(), StoreError> {
        if let Some(db) = self.connection.take() {
            db.close().await?;
        }
        self.version = 0;
        Ok(())
    }

    pub async fn begin(
        &self,
        scope: &[CollectionName],
        mode: TxMode,
    ) -> Result<StoreTransaction, StoreError> {
        let db = self.connection()?;
        let txn = db.begin().await?;
        Ok(StoreTransaction::new(txn, scope, mode))
    }

    /// Runs `body` in one transaction. It commits if `body` succeeds and rolls
    /// back otherwise; callers never observe a partial write.
    pub async fn run_transaction<F, T, E>(
        &self,
        scope: &[CollectionName],
        mode: TxMode,
        body: F,
    ) -> Result<T, E>
    where
        F: for<'t> FnOnce(&'t StoreTransaction) -> BoxFuture<'t, Result<T, E>>,
        E: From<StoreError> + std::fmt::Display,
    {
        let txn = self.begin(scope, mode).await?;

        let outcome = body(&txn).await;
        match outcome {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(err) => {
                debug!("Transaction over {:?} rolled back: {}", scope, err);
                txn.rollback().await;
                Err(err)
            }
        }
    }

    pub async fn get<E: Collection>(
        &self,
        key: impl Into<PrimaryKeyOf<E>>,
    ) -> Result<Option<E::Model>, StoreError> {
        let txn = self.begin(&[E::NAME], TxMode::ReadOnly).await?;
        let record = txn.get::<E>(key).await?;
        txn.commit().await?;
        Ok(record)
    }

    pub async fn get_all<E: Collection>(&self) -> Result<Vec<E::Model>, StoreError> {
        let txn = self.begin(&[E::NAME], TxMode::ReadOnly).await?;
        let records = txn.get_all::<E>().await?;
        txn.commit().await?;
        Ok(records)
    }

    pub async fn get_by_index<E: Collection>(
        &self,
        index: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<E::Model>, StoreError> {
        let txn = self.begin(&[E::NAME], TxMode::ReadOnly).await?;
        let records = txn.get_by_index::<E>(index, value).await?;
        txn.commit().await?;
        Ok(records)
    }

    pub async fn put<E: Collection>(&self, record: E::Model) -> Result<(), StoreError>
    where
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        let txn = self.begin(&[E::NAME], TxMode::ReadWrite).await?;
        txn.put::<E>(record).await?;
        txn.commit().await
    }

    pub async fn add<E: Collection>(
        &self,
        record: impl IntoActiveModel<E::ActiveModel>,
    ) -> Result<PrimaryKeyOf<E>, StoreError>
    where
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        let txn = self.begin(&[E::NAME], TxMode::ReadWrite).await?;
        let key = txn.add::<E>(record).await?;
        txn.commit().await?;
        Ok(key)
    }

    pub async fn delete<E: Collection>(
        &self,
        key: impl Into<PrimaryKeyOf<E>>,
    ) -> Result<bool, StoreError> {
        let txn = self.begin(&[E::NAME], TxMode::ReadWrite).await?;
        let deleted = txn.delete::<E>(key).await?;
        txn.commit().await?;
        Ok(deleted)
    }

    pub async fn delete_by_index<E: Collection>(
        &self,
        index: &str,
        value: impl Into<Value>,
    ) -> Result<u64, StoreError> {
        let txn = self.begin(&[E::NAME], TxMode::ReadWrite).await?;
        let deleted = txn.delete_by_index::<E>(index, value).await?;
        txn.commit().await?;
        Ok(deleted)
    }

    fn connection(&self) -> Result<&DatabaseConnection, StoreError> {
        self.connection.as_ref().ok_or(StoreError::NotInitialized)
    }
}

fn schema_error(err: DbErr) -> StoreError {
    StoreError::Schema(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MEMORY_DATABASE_URL;
    use crate::entities::{history, settings, users};
    use sea_orm::ActiveValue::{NotSet, Set};

    async fn setup_test_store() -> RecordStore {
        RecordStore::connect(MEMORY_DATABASE_URL, migration::latest_version())
            .await
            .unwrap()
    }

    fn user(email: &str, username: &str) -> users::Model {
        let now = chrono::Utc::now();
        users::Model {
            email: email.to_string(),
            username: username.to_string(),
            credential: "secret".to_string(),
            display_name: username.to_string(),
            avatar: "img/avatar.png".to_string(),
            created_at: now,
            last_login: now,
            last_attempt_at: None,
            total_quizzes: 0,
            average_score: 0,
            total_time_seconds: 0,
            rank: 999,
            streak: 0,
            level: 1,
        }
    }

    fn history_row(user_id: &str, category: &str, score: i32) -> history::ActiveModel {
        history::ActiveModel {
            id: NotSet,
            user_id: Set(user_id.to_string()),
            quiz_name: Set("Quiz".to_string()),
            category: Set(category.to_string()),
            score: Set(score),
            total_questions: Set(10),
            correct_answers: Set(score / 10),
            time_spent: Set(60),
            date: Set(chrono::Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_operations_before_open_fail() {
        let store = RecordStore::new();
        assert!(!store.is_open());
        assert!(matches!(
            store.get::<users::Entity>("alice@example.com").await,
            Err(StoreError::NotInitialized)
        ));
        assert!(matches!(
            store.begin(&[CollectionName::Users], TxMode::ReadOnly).await,
            Err(StoreError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_put_upserts_and_get_reads_back() {
        let store = setup_test_store().await;

        store.put::<users::Entity>(user("alice@example.com", "Alice")).await.unwrap();
        let mut updated = user("alice@example.com", "Ally");
        updated.total_quizzes = 4;
        store.put::<users::Entity>(updated).await.unwrap();

        let found = store
            .get::<users::Entity>("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.username, "Ally");
        assert_eq!(found.total_quizzes, 4);
        assert_eq!(store.get_all::<users::Entity>().await.unwrap().len(), 1);

        assert!(store
            .get::<users::Entity>("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_add_rejects_existing_key() {
        let store = setup_test_store().await;

        let key = store
            .add::<users::Entity>(user("alice@example.com", "Alice"))
            .await
            .unwrap();
        assert_eq!(key, "alice@example.com");

        let err = store
            .add::<users::Entity>(user("alice@example.com", "Impostor"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::DuplicateKey {
                collection: CollectionName::Users
            }
        ));

        let original = store
            .get::<users::Entity>("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(original.username, "Alice");
    }

    #[tokio::test]
    async fn test_add_generates_sequential_keys() {
        let store = setup_test_store().await;

        let first = store
            .add::<history::Entity>(history_row("alice@example.com", "html", 50))
            .await
            .unwrap();
        let second = store
            .add::<history::Entity>(history_row("alice@example.com", "css", 70))
            .await
            .unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_index_lookup_and_delete() {
        let store = setup_test_store().await;

        for (owner, category) in [
            ("alice@example.com", "html"),
            ("alice@example.com", "css"),
            ("bob@example.com", "html"),
        ] {
            store
                .add::<history::Entity>(history_row(owner, category, 80))
                .await
                .unwrap();
        }

        let alice = store
            .get_by_index::<history::Entity>(index::USER_ID, "alice@example.com")
            .await
            .unwrap();
        assert_eq!(alice.len(), 2);

        let html = store
            .get_by_index::<history::Entity>(index::CATEGORY, "html")
            .await
            .unwrap();
        assert_eq!(html.len(), 2);

        let removed = store
            .delete_by_index::<history::Entity>(index::USER_ID, "alice@example.com")
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(store
            .get_by_index::<history::Entity>(index::USER_ID, "alice@example.com")
            .await
            .unwrap()
            .is_empty());

        assert!(matches!(
            store
                .get_by_index::<settings::Entity>("theme", "dark")
                .await,
            Err(StoreError::UnknownIndex { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_not_an_error() {
        let store = setup_test_store().await;
        assert!(!store
            .delete::<users::Entity>("nobody@example.com")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_transaction_guards_scope_and_mode() {
        let store = setup_test_store().await;

        let txn = store
            .begin(&[CollectionName::Users], TxMode::ReadOnly)
            .await
            .unwrap();
        assert!(matches!(
            txn.get::<settings::Entity>("alice@example.com").await,
            Err(StoreError::OutOfScope { .. })
        ));
        assert!(matches!(
            txn.put::<users::Entity>(user("alice@example.com", "Alice")).await,
            Err(StoreError::ReadOnly { .. })
        ));
        txn.rollback().await;

        assert!(store.get_all::<users::Entity>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_transaction_leaves_nothing_behind() {
        let store = setup_test_store().await;

        let result = store
            .run_transaction::<_, (), StoreError>(
                &[CollectionName::Users, CollectionName::History],
                TxMode::ReadWrite,
                |txn| {
                    Box::pin(async move {
                        txn.add::<users::Entity>(user("alice@example.com", "Alice"))
                            .await?;
                        txn.add::<history::Entity>(history_row("alice@example.com", "html", 90))
                            .await?;
                        // Out of scope: aborts the whole unit
                        txn.add::<settings::Entity>(settings::ActiveModel {
                            user_id: Set("alice@example.com".to_string()),
                            ..Default::default()
                        })
                        .await?;
                        Ok(())
                    })
                },
            )
            .await;

        assert!(matches!(result, Err(StoreError::OutOfScope { .. })));
        assert!(store.get_all::<users::Entity>().await.unwrap().is_empty());
        assert!(store.get_all::<history::Entity>().await.unwrap().is_empty());
    }
}
