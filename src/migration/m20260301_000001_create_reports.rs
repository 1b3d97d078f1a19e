//! Migration: Create reports table and shared trigger function.
//!
//! Reports represent one ingested source document and its metadata.
//! Also creates the shared updated_at trigger function.

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
                -- Shared trigger function for updated_at
                CREATE OR REPLACE FUNCTION update_updated_at_column()
                RETURNS TRIGGER AS $$
                BEGIN
                    NEW.updated_at = NOW();
                    RETURN NEW;
                END;
                $$ LANGUAGE plpgsql;

                -- Reports table
                CREATE TABLE reports (
                    id UUID PRIMARY KEY,
                    company_name VARCHAR(255) NOT NULL,
                    report_type VARCHAR(100) NOT NULL,
                    title VARCHAR(500) NOT NULL,
                    source_url VARCHAR(2000) NOT NULL UNIQUE,
                    download_url VARCHAR(2000),
                    file_path VARCHAR(1000),
                    file_size BIGINT,
                    fiscal_quarter VARCHAR(10),
                    fiscal_year INTEGER,
                    published_date TIMESTAMPTZ,
                    region VARCHAR(100),
                    sector VARCHAR(100),
                    extracted_text TEXT,
                    page_count INTEGER,
                    language VARCHAR(10),
                    required_ocr BOOLEAN NOT NULL DEFAULT FALSE,

                    -- Producer-supplied tags and free-form metadata
                    tags JSONB,
                    metadata JSONB,

                    status VARCHAR(20) NOT NULL DEFAULT 'ingested'
                        CHECK (status IN ('ingested', 'processing', 'complete', 'failed')),
                    error_message TEXT,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    processed_at TIMESTAMPTZ
                );

                -- Index for listing reports by status
                CREATE INDEX idx_reports_status ON reports(status);

                -- Index for company-scoped queries
                CREATE INDEX idx_reports_company_name ON reports(company_name);

                -- Index for listing by creation date
                CREATE INDEX idx_reports_created_at ON reports(created_at DESC);

                -- Trigger to update updated_at
                CREATE TRIGGER update_reports_updated_at
                    BEFORE UPDATE ON reports
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
                DROP TRIGGER IF EXISTS update_reports_updated_at ON reports;
                DROP TABLE IF EXISTS reports CASCADE;
                DROP FUNCTION IF EXISTS update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }
}
