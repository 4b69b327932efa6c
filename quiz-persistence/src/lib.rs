pub mod connection;
pub mod entities;
pub mod repositories;
pub mod store;

pub use repositories::UserRepository;
pub use store::{Collection, CollectionName, RecordStore, StoreError, StoreTransaction, TxMode};
