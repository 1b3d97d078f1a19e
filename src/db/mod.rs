//! Database module providing connection management and per-entity queries.

pub mod alerts;
pub mod analyses;
pub mod metrics;
pub mod reports;

use sea_orm::{Database, DatabaseConnection};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::migration::{Migrator, MigratorTrait};

/// Database connection wrapper shared across services.
///
/// SeaORM's `DatabaseConnection` is internally pooled, so this is cheap to
/// clone and safe to use from concurrent workers.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect to the database given a connection URL.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let conn = Database::connect(database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        info!("Database connection established");

        Ok(Self { conn })
    }

    /// Wrap an existing connection (used by tests and embedders).
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Run pending migrations.
    pub async fn migrate(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))?;

        info!("Database migrations complete");

        Ok(())
    }

    /// Get access to the underlying connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}
