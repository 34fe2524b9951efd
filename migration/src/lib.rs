pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20261019_000001_market_tables;
mod m20261019_000002_seed_categories;

pub use m20261019_000002_seed_categories::DEFAULT_CATEGORIES;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261019_000001_market_tables::Migration),
            Box::new(m20261019_000002_seed_categories::Migration),
        ]
    }
}
