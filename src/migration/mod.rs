//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_reports;
mod m20260301_000002_create_metrics;
mod m20260301_000003_create_alerts;
mod m20260301_000004_create_analyses;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_reports::Migration),
            Box::new(m20260301_000002_create_metrics::Migration),
            Box::new(m20260301_000003_create_alerts::Migration),
            Box::new(m20260301_000004_create_analyses::Migration),
        ]
    }
}
