//! Integration tests for the ingestion coordinator.
//!
//! Run the full service against in-memory collaborators and a SQLite-backed
//! schema: duplicate rejection, document resolution, the bypass path and the
//! re-ingestion update path.

mod common;

use common::*;

use market_intel_pipeline::error::AppError;
use market_intel_pipeline::models::{AnalysisPayload, ProcessingStatus};
use sea_orm::EntityTrait;
use std::time::Duration;

use market_intel_pipeline::entity::report;

#[tokio::test]
async fn duplicate_source_url_is_rejected() {
    let h = harness(ScriptedAnalyzer::always_ok()).await;

    let first = h
        .ingest
        .ingest(ingest_request("https://example.com/q3.pdf", ""))
        .await
        .expect("first ingest succeeds");

    let result = h
        .ingest
        .ingest(ingest_request("https://example.com/q3.pdf", ""))
        .await;

    assert!(matches!(result, Err(AppError::Duplicate(_))));

    // Exactly one report row exists
    let all = report::Entity::find()
        .all(h.db.connection())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, first.id);
}

#[tokio::test]
async fn ingest_stores_document_and_persists_report() {
    let h = harness(ScriptedAnalyzer::always_ok()).await;

    let report = h
        .ingest
        .ingest(ingest_request("https://example.com/a.pdf", ""))
        .await
        .unwrap();

    assert_eq!(report.status, ProcessingStatus::Ingested.as_str());
    assert_eq!(report.company_name, "Schneider Electric");

    let path = report.file_path.expect("file path recorded");
    assert!(h.store.contains(&path));
    assert_eq!(report.file_size, Some(22));
}

#[tokio::test]
async fn missing_content_and_url_is_a_storage_error() {
    let h = harness(ScriptedAnalyzer::always_ok()).await;

    let mut request = ingest_request("https://example.com/b.pdf", "");
    request.content_base64 = None;
    request.download_url = None;

    let result = h.ingest.ingest(request).await;
    assert!(matches!(result, Err(AppError::Storage(_))));

    // No report row was created
    let all = report::Entity::find()
        .all(h.db.connection())
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn malformed_base64_is_invalid_input() {
    let h = harness(ScriptedAnalyzer::always_ok()).await;

    let mut request = ingest_request("https://example.com/c.pdf", "");
    request.content_base64 = Some("not-valid-base64!!!".to_string());

    let result = h.ingest.ingest(request).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn empty_text_skips_processing_entirely() {
    let h = harness(ScriptedAnalyzer::always_ok()).await;

    let report = h
        .ingest
        .ingest(ingest_request("https://example.com/d.pdf", "   \n  "))
        .await
        .unwrap();

    // Give any (incorrectly) queued work a chance to run
    tokio::time::sleep(Duration::from_millis(150)).await;

    let reloaded = h.db.get_report(report.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, ProcessingStatus::Ingested.as_str());
    assert!(h.db.metrics_for_report(report.id).await.unwrap().is_empty());
    assert!(h.db.alerts_for_report(report.id).await.unwrap().is_empty());
    assert_eq!(h.analyzer.call_count(), 0);
}

#[tokio::test]
async fn bypass_analysis_is_persisted_without_generation() {
    let h = harness(ScriptedAnalyzer::always_ok()).await;

    let payload: AnalysisPayload = serde_json::from_str(
        r#"{
            "executive_summary": "Produced upstream.",
            "key_highlights": ["External highlight"],
            "sentiment_score": 0.65,
            "sentiment_label": "positive",
            "model": "upstream-model"
        }"#,
    )
    .unwrap();

    let mut request = ingest_request("https://example.com/e.pdf", RICH_REPORT_TEXT);
    request.analysis = Some(payload);

    let report = h.ingest.ingest(request).await.unwrap();
    let finished = wait_for_terminal(&h.db, report.id).await;

    assert_eq!(finished.status, ProcessingStatus::Complete.as_str());

    // The generator was never invoked; the stored analysis is the payload
    assert_eq!(h.analyzer.call_count(), 0);
    let analysis = h
        .db
        .analysis_for_report(report.id)
        .await
        .unwrap()
        .expect("analysis row exists");
    assert_eq!(analysis.executive_summary, "Produced upstream.");
    assert_eq!(analysis.model, "upstream-model");
    assert_eq!(analysis.sentiment_label, "Positive");

    // Metrics and alerts were still computed from the text
    assert!(!h.db.metrics_for_report(report.id).await.unwrap().is_empty());
    assert!(!h.db.alerts_for_report(report.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn reingest_with_id_updates_fields_without_reprocessing() {
    let h = harness(ScriptedAnalyzer::always_ok()).await;

    let report = h
        .ingest
        .ingest(ingest_request("https://example.com/f.pdf", RICH_REPORT_TEXT))
        .await
        .unwrap();
    wait_for_terminal(&h.db, report.id).await;
    let calls_after_first = h.analyzer.call_count();

    let mut update = ingest_request("https://example.com/f.pdf", RICH_REPORT_TEXT);
    update.id = Some(report.id);
    update.title = "Q3 2025 Results (restated)".to_string();
    update.region = Some("EMEA".to_string());

    let updated = h.ingest.ingest(update).await.unwrap();

    assert_eq!(updated.id, report.id);
    assert_eq!(updated.title, "Q3 2025 Results (restated)");
    assert_eq!(updated.region, Some("EMEA".to_string()));

    // No second processing run was triggered
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.analyzer.call_count(), calls_after_first);

    let all = report::Entity::find()
        .all(h.db.connection())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn reingest_with_unknown_id_is_not_found() {
    let h = harness(ScriptedAnalyzer::always_ok()).await;

    let mut request = ingest_request("https://example.com/g.pdf", "");
    request.id = Some(uuid::Uuid::now_v7());

    let result = h.ingest.ingest(request).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn delete_report_removes_document_and_children() {
    let h = harness(ScriptedAnalyzer::always_ok()).await;

    let report = h
        .ingest
        .ingest(ingest_request("https://example.com/h.pdf", RICH_REPORT_TEXT))
        .await
        .unwrap();
    wait_for_terminal(&h.db, report.id).await;

    assert_eq!(h.store.file_count(), 1);

    h.ingest.delete_report(report.id).await.unwrap();

    assert_eq!(h.store.delete_count(), 1);
    assert_eq!(h.store.file_count(), 0);
    assert!(h.db.get_report(report.id).await.unwrap().is_none());
}
