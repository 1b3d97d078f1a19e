//! Migration: Create alerts table.
//!
//! Alerts are written once by the rules engine and never updated.

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
                CREATE TABLE alerts (
                    id BIGSERIAL PRIMARY KEY,
                    report_id UUID NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
                    alert_type VARCHAR(50) NOT NULL
                        CHECK (alert_type IN (
                            'margin_drop', 'revenue_drop', 'critical_risk',
                            'operational_risk', 'macro_risk', 'opportunity_detected',
                            'merger_acquisition', 'strong_growth'
                        )),
                    severity VARCHAR(20) NOT NULL
                        CHECK (severity IN ('critical', 'high', 'medium', 'info')),
                    title VARCHAR(255) NOT NULL,
                    message TEXT NOT NULL,
                    trigger_metric VARCHAR(100),
                    matched_keywords JSONB,
                    threshold DOUBLE PRECISION,
                    actual_value DOUBLE PRECISION,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Index for fetching a report's alerts
                CREATE INDEX idx_alerts_report_id ON alerts(report_id);

                -- Index for severity-filtered dashboards
                CREATE INDEX idx_alerts_severity ON alerts(severity);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS alerts CASCADE;")
            .await?;

        Ok(())
    }
}
