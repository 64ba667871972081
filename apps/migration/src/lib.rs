//! Schema migrations for the daylog database.

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_journal;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240101_000001_create_journal::Migration)]
    }
}
