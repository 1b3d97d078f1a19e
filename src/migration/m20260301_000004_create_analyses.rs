//! Migration: Create analyses table.
//!
//! At most one analysis per report, enforced by the unique constraint the
//! idempotent upsert conflicts against.

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
                CREATE TABLE analyses (
                    id BIGSERIAL PRIMARY KEY,
                    report_id UUID NOT NULL UNIQUE REFERENCES reports(id) ON DELETE CASCADE,
                    executive_summary TEXT NOT NULL,
                    key_highlights JSONB NOT NULL DEFAULT '[]',
                    strategic_initiatives JSONB NOT NULL DEFAULT '[]',
                    market_outlook TEXT,
                    risk_factors JSONB NOT NULL DEFAULT '[]',
                    competitive_position TEXT,
                    investment_thesis TEXT,
                    sentiment_score DOUBLE PRECISION NOT NULL
                        CHECK (sentiment_score >= 0 AND sentiment_score <= 1),
                    sentiment_label VARCHAR(20) NOT NULL,
                    confidence DOUBLE PRECISION NOT NULL
                        CHECK (confidence >= 0 AND confidence <= 1),
                    model VARCHAR(100) NOT NULL,
                    processing_ms BIGINT NOT NULL DEFAULT 0,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Trigger to update updated_at
                CREATE TRIGGER update_analyses_updated_at
                    BEFORE UPDATE ON analyses
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_analyses_updated_at ON analyses;
                DROP TABLE IF EXISTS analyses CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
