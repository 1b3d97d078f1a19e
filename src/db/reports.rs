//! Database queries for reports.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::report::{self, ActiveModel, Entity as Report};
use crate::error::{AppError, AppResult};
use crate::models::{IngestRequest, ProcessingStatus, StoredDocument};

use super::DbPool;

impl DbPool {
    /// Insert a new report with status `ingested`.
    pub async fn insert_report(
        &self,
        id: Uuid,
        request: &IngestRequest,
        stored: &StoredDocument,
    ) -> AppResult<report::Model> {
        let now = Utc::now();

        let tags_json = if request.tags.is_empty() {
            None
        } else {
            serde_json::to_value(&request.tags).ok()
        };

        let model = ActiveModel {
            id: Set(id),
            company_name: Set(request.company_name.clone()),
            report_type: Set(request.report_type.clone()),
            title: Set(request.title.clone()),
            source_url: Set(request.source_url.clone()),
            download_url: Set(request.download_url.clone()),
            file_path: Set(Some(stored.path.clone())),
            file_size: Set(Some(stored.size)),
            fiscal_quarter: Set(request.fiscal_quarter.clone()),
            fiscal_year: Set(request.fiscal_year),
            published_date: Set(request.published_date),
            region: Set(request.region.clone()),
            sector: Set(request.sector.clone()),
            extracted_text: Set(request.extracted_text.clone()),
            page_count: Set(request.page_count),
            language: Set(request.language.clone()),
            required_ocr: Set(request.required_ocr),
            tags: Set(tags_json),
            metadata: Set(request.metadata.clone()),
            status: Set(ProcessingStatus::Ingested.as_str().to_string()),
            error_message: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            processed_at: Set(None),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert report: {}", e)))?;

        Ok(result)
    }

    /// Get a report by ID.
    pub async fn get_report(&self, id: Uuid) -> AppResult<Option<report::Model>> {
        let result = Report::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get report: {}", e)))?;

        Ok(result)
    }

    /// Get a report by its source URL (exact, case-sensitive match).
    pub async fn get_report_by_source_url(&self, url: &str) -> AppResult<Option<report::Model>> {
        let result = Report::find()
            .filter(report::Column::SourceUrl.eq(url))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to query source URL: {}", e)))?;

        Ok(result)
    }

    /// Replace the mutable fields of an existing report (re-ingestion path).
    ///
    /// Status, stored file info and source URL are left untouched.
    pub async fn update_report_fields(
        &self,
        id: Uuid,
        request: &IngestRequest,
    ) -> AppResult<report::Model> {
        let existing = self
            .get_report(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

        let tags_json = if request.tags.is_empty() {
            None
        } else {
            serde_json::to_value(&request.tags).ok()
        };

        let mut active: ActiveModel = existing.into();
        active.company_name = Set(request.company_name.clone());
        active.report_type = Set(request.report_type.clone());
        active.title = Set(request.title.clone());
        active.download_url = Set(request.download_url.clone());
        active.fiscal_quarter = Set(request.fiscal_quarter.clone());
        active.fiscal_year = Set(request.fiscal_year);
        active.published_date = Set(request.published_date);
        active.region = Set(request.region.clone());
        active.sector = Set(request.sector.clone());
        active.extracted_text = Set(request.extracted_text.clone());
        active.page_count = Set(request.page_count);
        active.language = Set(request.language.clone());
        active.required_ocr = Set(request.required_ocr);
        active.tags = Set(tags_json);
        active.metadata = Set(request.metadata.clone());
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update report: {}", e)))?;

        Ok(result)
    }

    /// Update report status.
    pub async fn update_report_status(
        &self,
        id: Uuid,
        status: ProcessingStatus,
    ) -> AppResult<report::Model> {
        let report = self
            .get_report(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

        let mut active: ActiveModel = report.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update report status: {}", e)))?;

        Ok(result)
    }

    /// Mark a report as processing, clearing any previous error.
    pub async fn mark_report_processing(&self, id: Uuid) -> AppResult<report::Model> {
        let report = self
            .get_report(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

        let mut active: ActiveModel = report.into();
        active.status = Set(ProcessingStatus::Processing.as_str().to_string());
        active.error_message = Set(None);
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to mark report processing: {}", e)))?;

        Ok(result)
    }

    /// Mark a report complete and stamp its processed timestamp.
    pub async fn mark_report_complete(&self, id: Uuid) -> AppResult<report::Model> {
        let report = self
            .get_report(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

        let now = Utc::now();
        let mut active: ActiveModel = report.into();
        active.status = Set(ProcessingStatus::Complete.as_str().to_string());
        active.error_message = Set(None);
        active.processed_at = Set(Some(now));
        active.updated_at = Set(now);

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to mark report complete: {}", e)))?;

        Ok(result)
    }

    /// Mark a report failed, recording the error message.
    pub async fn mark_report_failed(&self, id: Uuid, message: &str) -> AppResult<report::Model> {
        let report = self
            .get_report(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

        let mut active: ActiveModel = report.into();
        active.status = Set(ProcessingStatus::Failed.as_str().to_string());
        active.error_message = Set(Some(message.to_string()));
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to mark report failed: {}", e)))?;

        Ok(result)
    }

    /// Delete a report row; metrics, alerts and the analysis cascade with it.
    pub async fn delete_report(&self, id: Uuid) -> AppResult<()> {
        let result = Report::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete report: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Report {}", id)));
        }

        Ok(())
    }
}
