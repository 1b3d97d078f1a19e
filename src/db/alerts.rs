//! Database queries for alerts.

use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::alert::{self, ActiveModel, Entity as Alert};
use crate::error::{AppError, AppResult};
use crate::models::TriggeredAlert;

use super::DbPool;

impl DbPool {
    /// Insert a batch of triggered alerts for a report. Alerts are write-once.
    pub async fn insert_alerts(
        &self,
        report_id: Uuid,
        alerts: &[TriggeredAlert],
    ) -> AppResult<usize> {
        if alerts.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();

        let rows: Vec<ActiveModel> = alerts
            .iter()
            .map(|a| {
                let keywords_json = if a.matched_keywords.is_empty() {
                    None
                } else {
                    serde_json::to_value(&a.matched_keywords).ok()
                };

                ActiveModel {
                    report_id: Set(report_id),
                    alert_type: Set(a.kind.as_str().to_string()),
                    severity: Set(a.severity.as_str().to_string()),
                    title: Set(a.title.clone()),
                    message: Set(a.message.clone()),
                    trigger_metric: Set(a.trigger_metric.clone()),
                    matched_keywords: Set(keywords_json),
                    threshold: Set(a.threshold),
                    actual_value: Set(a.actual_value),
                    created_at: Set(now),
                    ..Default::default()
                }
            })
            .collect();

        Alert::insert_many(rows)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert alerts: {}", e)))?;

        Ok(alerts.len())
    }

    /// List alerts for a report, oldest first.
    pub async fn alerts_for_report(&self, report_id: Uuid) -> AppResult<Vec<alert::Model>> {
        let rows = Alert::find()
            .filter(alert::Column::ReportId.eq(report_id))
            .order_by_asc(alert::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list alerts: {}", e)))?;

        Ok(rows)
    }
}
