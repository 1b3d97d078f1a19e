//! Database queries for analyses.
//!
//! The single-row-per-report invariant is enforced by a unique constraint on
//! `report_id`; writes go through an atomic `INSERT ... ON CONFLICT DO
//! UPDATE` so concurrent regeneration never needs row locking.

use std::time::Duration;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::warn;
use uuid::Uuid;

use crate::entity::analysis::{self, ActiveModel, Column, Entity as Analysis};
use crate::error::{AppError, AppResult};
use crate::models::GeneratedAnalysis;

use super::DbPool;

impl DbPool {
    /// Idempotently upsert the analysis for a report.
    ///
    /// The insert either creates the row or, on conflict with an existing
    /// `report_id`, replaces its content in place. `created_at` survives the
    /// update.
    pub async fn upsert_analysis(
        &self,
        report_id: Uuid,
        generated: &GeneratedAnalysis,
    ) -> AppResult<()> {
        let now = Utc::now();
        let content = &generated.content;

        let model = ActiveModel {
            report_id: Set(report_id),
            executive_summary: Set(content.executive_summary.clone()),
            key_highlights: Set(serde_json::to_value(&content.key_highlights)?),
            strategic_initiatives: Set(serde_json::to_value(&content.strategic_initiatives)?),
            market_outlook: Set(content.market_outlook.clone()),
            risk_factors: Set(serde_json::to_value(&content.risk_factors)?),
            competitive_position: Set(content.competitive_position.clone()),
            investment_thesis: Set(content.investment_thesis.clone()),
            sentiment_score: Set(content.sentiment_score),
            sentiment_label: Set(content.sentiment_label.clone()),
            confidence: Set(generated.confidence),
            model: Set(generated.model.clone()),
            processing_ms: Set(generated.processing_ms),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Analysis::insert(model)
            .on_conflict(
                OnConflict::column(Column::ReportId)
                    .update_columns([
                        Column::ExecutiveSummary,
                        Column::KeyHighlights,
                        Column::StrategicInitiatives,
                        Column::MarketOutlook,
                        Column::RiskFactors,
                        Column::CompetitivePosition,
                        Column::InvestmentThesis,
                        Column::SentimentScore,
                        Column::SentimentLabel,
                        Column::Confidence,
                        Column::Model,
                        Column::ProcessingMs,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to upsert analysis: {}", e)))?;

        Ok(())
    }

    /// Upsert with a bounded retry for transient persistence conflicts.
    ///
    /// Exhausting the retry budget is a `Database` failure, distinct from a
    /// generation failure.
    pub async fn upsert_analysis_with_retry(
        &self,
        report_id: Uuid,
        generated: &GeneratedAnalysis,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> AppResult<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.upsert_analysis(report_id, generated).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < max_attempts => {
                    warn!(
                        "Analysis upsert attempt {}/{} failed for report {}: {}",
                        attempt, max_attempts, report_id, e
                    );
                    tokio::time::sleep(retry_delay).await;
                }
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Analysis upsert exhausted {} attempts: {}",
                        max_attempts, e
                    )));
                }
            }
        }
    }

    /// Get the analysis for a report, if one exists.
    pub async fn analysis_for_report(&self, report_id: Uuid) -> AppResult<Option<analysis::Model>> {
        let row = Analysis::find()
            .filter(analysis::Column::ReportId.eq(report_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get analysis: {}", e)))?;

        Ok(row)
    }
}
