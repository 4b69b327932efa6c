use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseTransaction, EntityTrait, IdenStatic,
    IntoActiveModel, Iterable, PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter, QueryOrder,
    Select, SqlErr, Value,
};
use tracing::warn;

use super::{Collection, CollectionName, StoreError};

pub type PrimaryKeyOf<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// A unit of work over a declared set of collections. Reads see one
/// snapshot; writes land together on `commit` or not at all. Dropping the
/// transaction without committing rolls it back.
pub struct StoreTransaction {
    txn: DatabaseTransaction,
    scope: Vec<CollectionName>,
    mode: TxMode,
}

impl StoreTransaction {
    pub(crate) fn new(txn: DatabaseTransaction, scope: &[CollectionName], mode: TxMode) -> Self {
        Self {
            txn,
            scope: scope.to_vec(),
            mode,
        }
    }

    pub fn mode(&self) -> TxMode {
        self.mode
    }

    pub fn scope(&self) -> &[CollectionName] {
        &self.scope
    }

    pub async fn get<E: Collection>(
        &self,
        key: impl Into<PrimaryKeyOf<E>>,
    ) -> Result<Option<E::Model>, StoreError> {
        self.readable::<E>()?;
        Ok(E::find_by_id(key).one(&self.txn).await?)
    }

    /// Every record of the collection in primary key order.
    pub async fn get_all<E: Collection>(&self) -> Result<Vec<E::Model>, StoreError> {
        self.readable::<E>()?;
        Ok(by_primary_key(E::find()).all(&self.txn).await?)
    }

    /// Records whose indexed field equals `value`, ordered by index then key.
    pub async fn get_by_index<E: Collection>(
        &self,
        index: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<E::Model>, StoreError> {
        self.readable::<E>()?;
        let column = index_column::<E>(index)?;

        let select = E::find().filter(column.eq(value)).order_by_asc(column);
        Ok(by_primary_key(select).all(&self.txn).await?)
    }

    /// Upsert by primary key.
    pub async fn put<E: Collection>(&self, record: E::Model) -> Result<(), StoreError>
    where
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        self.writable::<E>()?;

        let keys: Vec<E::Column> = E::PrimaryKey::iter()
            .map(|key| key.into_column())
            .collect();
        let values: Vec<E::Column> = E::Column::iter()
            .filter(|column| !keys.iter().any(|key| key.as_str() == column.as_str()))
            .collect();

        let mut on_conflict = OnConflict::columns(keys);
        if values.is_empty() {
            on_conflict.do_nothing();
        } else {
            on_conflict.update_columns(values);
        }

        E::insert(record.into_active_model())
            .on_conflict(on_conflict)
            .exec_without_returning(&self.txn)
            .await?;
        Ok(())
    }

    /// Insert-only. Returns the stored key, generated when the collection
    /// auto-increments.
    pub async fn add<E: Collection>(
        &self,
        record: impl IntoActiveModel<E::ActiveModel>,
    ) -> Result<PrimaryKeyOf<E>, StoreError>
    where
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        self.writable::<E>()?;

        match E::insert(record.into_active_model()).exec(&self.txn).await {
            Ok(inserted) => Ok(inserted.last_insert_id),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(StoreError::DuplicateKey { collection: E::NAME })
                }
                _ => Err(err.into()),
            },
        }
    }

    /// Returns whether a record was removed. A missing key is not an error.
    pub async fn delete<E: Collection>(
        &self,
        key: impl Into<PrimaryKeyOf<E>>,
    ) -> Result<bool, StoreError> {
        self.writable::<E>()?;
        let deleted = E::delete_by_id(key).exec(&self.txn).await?;
        Ok(deleted.rows_affected > 0)
    }

    /// Removes every record matching an index value, returning the count.
    pub async fn delete_by_index<E: Collection>(
        &self,
        index: &str,
        value: impl Into<Value>,
    ) -> Result<u64, StoreError> {
        self.writable::<E>()?;
        let column = index_column::<E>(index)?;

        let deleted = E::delete_many()
            .filter(column.eq(value))
            .exec(&self.txn)
            .await?;
        Ok(deleted.rows_affected)
    }

    pub async fn commit(self) -> Result<(), StoreError> {
        Ok(self.txn.commit().await?)
    }

    pub async fn rollback(self) {
        if let Err(err) = self.txn.rollback().await {
            warn!("Rollback failed: {}", err);
        }
    }

    fn readable<E: Collection>(&self) -> Result<(), StoreError> {
        if self.scope.contains(&E::NAME) {
            Ok(())
        } else {
            Err(StoreError::OutOfScope {
                collection: E::NAME,
            })
        }
    }

    fn writable<E: Collection>(&self) -> Result<(), StoreError> {
        self.readable::<E>()?;
        match self.mode {
            TxMode::ReadWrite => Ok(()),
            TxMode::ReadOnly => Err(StoreError::ReadOnly {
                collection: E::NAME,
            }),
        }
    }
}

fn index_column<E: Collection>(index: &str) -> Result<E::Column, StoreError> {
    E::index_column(index).ok_or_else(|| StoreError::UnknownIndex {
        collection: E::NAME,
        index: index.to_string(),
    })
}

fn by_primary_key<E: EntityTrait>(mut select: Select<E>) -> Select<E> {
    for key in E::PrimaryKey::iter() {
        select = select.order_by_asc(key.into_column());
    }
    select
}
