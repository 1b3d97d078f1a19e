//! Migration: Create metrics table.
//!
//! Metrics are append-only facts extracted from report text; they are
//! deleted only through the parent report cascade.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE metrics (
                    id BIGSERIAL PRIMARY KEY,
                    report_id UUID NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
                    metric_type VARCHAR(100) NOT NULL,
                    value DOUBLE PRECISION NOT NULL,
                    unit VARCHAR(50) NOT NULL,
                    period VARCHAR(50),
                    confidence DOUBLE PRECISION NOT NULL
                        CHECK (confidence >= 0 AND confidence <= 1),
                    extraction_method VARCHAR(20) NOT NULL
                        CHECK (extraction_method IN ('pattern', 'model')),
                    source_snippet TEXT,
                    extracted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Index for fetching a report's metrics
                CREATE INDEX idx_metrics_report_id ON metrics(report_id);

                -- Index for cross-report metric type queries
                CREATE INDEX idx_metrics_metric_type ON metrics(metric_type);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS metrics CASCADE;")
            .await?;

        Ok(())
    }
}
