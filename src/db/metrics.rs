//! Database queries for extracted metrics.

use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::metric::{self, ActiveModel, Entity as Metric};
use crate::error::{AppError, AppResult};
use crate::models::ExtractedMetric;

use super::DbPool;

impl DbPool {
    /// Insert a batch of extracted metrics for a report.
    ///
    /// Metrics are append-only; the reporting period is stamped on from the
    /// owning report's fiscal fields.
    pub async fn insert_metrics(
        &self,
        report_id: Uuid,
        metrics: &[ExtractedMetric],
        period: Option<&str>,
    ) -> AppResult<usize> {
        if metrics.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();

        let rows: Vec<ActiveModel> = metrics
            .iter()
            .map(|m| ActiveModel {
                report_id: Set(report_id),
                metric_type: Set(m.metric_type.clone()),
                value: Set(m.value),
                unit: Set(m.unit.clone()),
                period: Set(period.map(|p| p.to_string())),
                confidence: Set(m.confidence),
                extraction_method: Set(m.method.as_str().to_string()),
                source_snippet: Set(Some(m.source_snippet.clone())),
                extracted_at: Set(now),
                ..Default::default()
            })
            .collect();

        Metric::insert_many(rows)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert metrics: {}", e)))?;

        Ok(metrics.len())
    }

    /// List metrics for a report, oldest first.
    pub async fn metrics_for_report(&self, report_id: Uuid) -> AppResult<Vec<metric::Model>> {
        let rows = Metric::find()
            .filter(metric::Column::ReportId.eq(report_id))
            .order_by_asc(metric::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list metrics: {}", e)))?;

        Ok(rows)
    }
}
