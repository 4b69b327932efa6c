pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240101_000002_create_settings_table;
mod m20240101_000003_create_history_table;

/// Ordered schema history. The number of applied migrations is the stored
/// schema version.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_settings_table::Migration),
            Box::new(m20240101_000003_create_history_table::Migration),
        ]
    }
}

/// Highest schema version this build knows how to create.
pub fn latest_version() -> u32 {
    Migrator::migrations().len() as u32
}
