//! Ingestion coordinator.
//!
//! Owns the report lifecycle: duplicate rejection, document resolution and
//! storage, record creation, the bypass path for producer-supplied analyses,
//! and handing freshly ingested reports to the background queue. The
//! ingestion call itself never waits on processing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use base64::Engine;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entity::report;
use crate::error::{AppError, AppResult};
use crate::models::IngestRequest;
use crate::services::storage::DocumentStore;
use crate::services::worker::ProcessingQueue;

/// Maximum characters of the title kept in a derived file name.
const FILE_NAME_TITLE_CHARS: usize = 50;

/// Ingestion coordinator service.
pub struct IngestService {
    db: DbPool,
    store: Arc<dyn DocumentStore>,
    queue: Arc<ProcessingQueue>,
    http: reqwest::Client,
}

impl IngestService {
    pub fn new(
        db: DbPool,
        store: Arc<dyn DocumentStore>,
        queue: Arc<ProcessingQueue>,
        download_timeout: std::time::Duration,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(download_timeout)
            .build()
            .map_err(|e| AppError::Storage(format!("Failed to build download client: {}", e)))?;

        Ok(Self {
            db,
            store,
            queue,
            http,
        })
    }

    /// Ingest a document: store it, persist the report row and trigger
    /// background processing. Returns once the record is persisted.
    pub async fn ingest(&self, request: IngestRequest) -> AppResult<report::Model> {
        validate_request(&request)?;

        // Re-ingestion of a known id replaces mutable fields only
        if let Some(id) = request.id {
            if self.db.get_report(id).await?.is_some() {
                info!("Re-ingesting report {}: updating fields", id);
                return self.db.update_report_fields(id, &request).await;
            }
            return Err(AppError::NotFound(format!("Report {}", id)));
        }

        if let Some(existing) = self.db.get_report_by_source_url(&request.source_url).await? {
            return Err(AppError::Duplicate(format!(
                "{} (report {})",
                request.source_url, existing.id
            )));
        }

        let bytes = self.resolve_document(&request).await?;

        let file_name = safe_file_name(
            &request.company_name,
            &request.title,
            &extension_from_url(request.download_url.as_deref()),
            Utc::now(),
        );
        let subfolder = company_slug(&request.company_name);

        let stored = self
            .store
            .save(bytes, &file_name, Some(&subfolder))
            .await?;

        let report_id = Uuid::now_v7();
        let report = self.db.insert_report(report_id, &request, &stored).await?;

        info!(
            "Report {} ingested for {} ({} bytes at {})",
            report_id, request.company_name, stored.size, stored.path
        );

        // Bypass path: persist the supplied analysis without invoking the
        // generator; the upsert keeps this idempotent against regeneration.
        if let Some(payload) = request.analysis.clone() {
            self.db
                .upsert_analysis(report_id, &payload.into_generated())
                .await?;
            info!("Stored producer-supplied analysis for report {}", report_id);
        }

        let has_text = request
            .extracted_text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());

        if has_text {
            // Fire-and-forget: a full queue leaves the report ingested and
            // is an operator signal, not an ingestion failure.
            if let Err(e) = self.queue.submit(report_id) {
                warn!("Could not queue report {} for processing: {}", report_id, e);
            }
        } else {
            info!("Report {} has no extracted text, skipping processing", report_id);
        }

        Ok(report)
    }

    /// Explicitly re-run analysis generation for a report.
    ///
    /// The report re-enters `processing` when a worker picks it up; the
    /// existing analysis row is replaced through the idempotent upsert.
    pub async fn regenerate_analysis(&self, report_id: Uuid) -> AppResult<()> {
        let report = self
            .db
            .get_report(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {}", report_id)))?;

        let has_text = report
            .extracted_text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if !has_text {
            return Err(AppError::InvalidInput(format!(
                "Report {} has no extracted text to analyze",
                report_id
            )));
        }

        self.queue.submit_regeneration(report_id)?;
        info!("Report {} queued for analysis regeneration", report_id);

        Ok(())
    }

    /// Delete a report, its stored document and (via cascade) its children.
    pub async fn delete_report(&self, report_id: Uuid) -> AppResult<()> {
        let report = self
            .db
            .get_report(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {}", report_id)))?;

        if let Some(path) = &report.file_path {
            if let Err(e) = self.store.delete(path).await {
                warn!("Failed to delete document {} for report {}: {}", path, report_id, e);
            }
        }

        self.db.delete_report(report_id).await?;
        info!("Report {} deleted", report_id);

        Ok(())
    }

    /// Resolve document bytes from the inline payload or the download URL.
    async fn resolve_document(&self, request: &IngestRequest) -> AppResult<Vec<u8>> {
        if let Some(encoded) = &request.content_base64 {
            return base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| AppError::InvalidInput(format!("Malformed base64 content: {}", e)));
        }

        let Some(url) = &request.download_url else {
            return Err(AppError::Storage(
                "No document content: provide inline content or a download URL".to_string(),
            ));
        };

        info!("Downloading document from {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Download failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Storage(format!(
                "Download returned HTTP {} for {}",
                status, url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("Download read failed: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

fn validate_request(request: &IngestRequest) -> AppResult<()> {
    if request.company_name.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Missing required field: companyName".to_string(),
        ));
    }
    if request.title.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Missing required field: title".to_string(),
        ));
    }
    if request.source_url.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Missing required field: sourceUrl".to_string(),
        ));
    }
    Ok(())
}

/// Derive a safe file name: sanitized title segment, capped length, and a
/// timestamp suffix that disambiguates collisions.
fn safe_file_name(
    company: &str,
    title: &str,
    extension: &str,
    now: DateTime<Utc>,
) -> String {
    let timestamp = now.format("%Y%m%d_%H%M%S");
    format!(
        "{}_{}_{}.{}",
        sanitize_segment(company, 40),
        sanitize_segment(title, FILE_NAME_TITLE_CHARS),
        timestamp,
        extension
    )
}

fn sanitize_segment(s: &str, max_chars: usize) -> String {
    let kept: String = s
        .chars()
        .take(max_chars)
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let cleaned = kept.trim().replace(' ', "_");
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

fn company_slug(company: &str) -> String {
    sanitize_segment(company, 40).to_lowercase()
}

/// File extension from the download URL path, defaulting to pdf.
fn extension_from_url(url: Option<&str>) -> String {
    let candidate = url
        .and_then(|u| u.split(['?', '#']).next())
        .and_then(|path| path.rsplit('/').next())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase());

    match candidate {
        Some(ext)
            if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext
        }
        _ => "pdf".to_string(),
    }
}
