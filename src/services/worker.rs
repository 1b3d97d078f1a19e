//! Bounded background processing queue.
//!
//! Each ingested report is submitted as a unit of work keyed by its id; a
//! fixed pool of workers drains the channel and runs the extraction ->
//! alerting -> analysis sequence. The bounded channel makes backpressure
//! explicit, and shutdown drains in-flight work instead of dropping it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entity::report;
use crate::error::{AppError, AppResult};
use crate::services::alerts::evaluate_alerts;
use crate::services::extraction::extract_metrics;
use crate::services::generation::AnalysisGenerator;

/// Shared dependencies for the processing sequence.
#[derive(Clone)]
pub struct ProcessorContext {
    pub db: DbPool,
    pub generator: Arc<AnalysisGenerator>,
    /// Total attempts for the analysis upsert.
    pub persistence_attempts: u32,
    /// Delay between persistence attempts.
    pub persistence_retry_delay: Duration,
}

/// One unit of background work.
#[derive(Debug, Clone, Copy)]
struct WorkItem {
    report_id: Uuid,
    /// Explicit re-run: generate even when an analysis row already exists.
    force_generation: bool,
}

/// Handle to the worker pool.
pub struct ProcessingQueue {
    sender: Mutex<Option<mpsc::Sender<WorkItem>>>,
    // Held so an empty worker pool still accepts work up to capacity
    _receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<WorkItem>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ProcessingQueue {
    /// Start `worker_count` workers draining a channel of `capacity` slots.
    pub fn start(ctx: ProcessorContext, worker_count: usize, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<WorkItem>(capacity.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let ctx = ctx.clone();
            let receiver = Arc::clone(&receiver);

            workers.push(tokio::spawn(async move {
                loop {
                    let next = { receiver.lock().await.recv().await };
                    match next {
                        Some(item) => process_report(&ctx, item).await,
                        None => break,
                    }
                }
                info!("Processing worker {} stopped", worker_id);
            }));
        }

        info!(
            "Processing queue started ({} workers, capacity {})",
            worker_count, capacity
        );

        Self {
            sender: Mutex::new(Some(sender)),
            _receiver: receiver,
            workers: Mutex::new(workers),
        }
    }

    /// Submit a report for background processing without blocking.
    pub fn submit(&self, report_id: Uuid) -> AppResult<()> {
        self.enqueue(WorkItem {
            report_id,
            force_generation: false,
        })
    }

    /// Submit an explicit analysis re-run for a report.
    pub fn submit_regeneration(&self, report_id: Uuid) -> AppResult<()> {
        self.enqueue(WorkItem {
            report_id,
            force_generation: true,
        })
    }

    fn enqueue(&self, item: WorkItem) -> AppResult<()> {
        let guard = self.sender.lock().expect("queue mutex poisoned");
        let sender = guard
            .as_ref()
            .ok_or_else(|| AppError::Unavailable("processing queue is shut down".to_string()))?;

        sender.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                warn!("Processing queue full, rejecting report {}", item.report_id);
                AppError::Unavailable("processing queue is full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                AppError::Unavailable("processing queue is shut down".to_string())
            }
        })
    }

    /// Close the queue and wait for workers to drain outstanding work.
    pub async fn shutdown(&self) {
        // Dropping the sender closes the channel; workers exit once drained
        drop(self.sender.lock().expect("queue mutex poisoned").take());

        let handles: Vec<_> = {
            let mut workers = self.workers.lock().expect("queue mutex poisoned");
            workers.drain(..).collect()
        };

        join_all(handles).await;
        info!("Processing queue drained and stopped");
    }
}

/// Run one report's processing sequence, recording any terminal failure on
/// the report row. Never propagates: no caller is waiting.
async fn process_report(ctx: &ProcessorContext, item: WorkItem) {
    let report_id = item.report_id;
    if let Err(e) = run_sequence(ctx, report_id, item.force_generation).await {
        error!("Processing failed for report {}: {}", report_id, e);
        if let Err(mark_err) = ctx.db.mark_report_failed(report_id, &e.to_string()).await {
            error!(
                "Failed to record failure for report {}: {}",
                report_id, mark_err
            );
        }
    }
}

/// The ordered sequence: extraction, alerting, then analysis generation.
async fn run_sequence(
    ctx: &ProcessorContext,
    report_id: Uuid,
    force_generation: bool,
) -> AppResult<()> {
    ctx.db.mark_report_processing(report_id).await?;

    let report = ctx
        .db
        .get_report(report_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {}", report_id)))?;

    let text = report.extracted_text.clone().unwrap_or_default();

    // Extraction is silent: no matches simply means no metrics
    let metrics = extract_metrics(&text);
    let period = fiscal_period(&report);
    ctx.db
        .insert_metrics(report_id, &metrics, period.as_deref())
        .await?;

    let alerts = evaluate_alerts(&text, &metrics);
    ctx.db.insert_alerts(report_id, &alerts).await?;

    // A bypass analysis persisted at ingest time suppresses generation,
    // unless this is an explicit re-run
    if force_generation || ctx.db.analysis_for_report(report_id).await?.is_none() {
        let generated = ctx
            .generator
            .generate(&text, &report.company_name, &report.report_type)
            .await?;

        ctx.db
            .upsert_analysis_with_retry(
                report_id,
                &generated,
                ctx.persistence_attempts,
                ctx.persistence_retry_delay,
            )
            .await?;
    } else {
        info!(
            "Analysis already present for report {}, skipping generation",
            report_id
        );
    }

    ctx.db.mark_report_complete(report_id).await?;

    info!(
        "Report {} processing complete: {} metrics, {} alerts",
        report_id,
        metrics.len(),
        alerts.len()
    );

    Ok(())
}

/// Reporting period string from the report's fiscal fields.
fn fiscal_period(report: &report::Model) -> Option<String> {
    match (&report.fiscal_quarter, report.fiscal_year) {
        (Some(quarter), Some(year)) => Some(format!("{} {}", quarter, year)),
        (Some(quarter), None) => Some(quarter.clone()),
        (None, Some(year)) => Some(year.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationSettings;
    use crate::services::analyzer::{AnalyzerError, DocumentAnalyzer};
    use async_trait::async_trait;

    struct StubAnalyzer;

    #[async_trait]
    impl DocumentAnalyzer for StubAnalyzer {
        fn model_name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, _system: &str, _user: &str) -> Result<String, AnalyzerError> {
            Err(AnalyzerError::Terminal("stub".to_string()))
        }

        async fn is_available(&self) -> bool {
            false
        }
    }

    async fn idle_context() -> ProcessorContext {
        let conn = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        ProcessorContext {
            db: DbPool::from_connection(conn),
            generator: Arc::new(AnalysisGenerator::new(
                Arc::new(StubAnalyzer),
                GenerationSettings::default(),
                None,
            )),
            persistence_attempts: 1,
            persistence_retry_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_rejected() {
        let queue = ProcessingQueue::start(idle_context().await, 1, 4);
        queue.shutdown().await;

        let result = queue.submit(Uuid::now_v7());
        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_full_queue_is_explicit_backpressure() {
        // No workers: nothing drains the single slot
        let queue = ProcessingQueue::start(idle_context().await, 0, 1);

        queue.submit(Uuid::now_v7()).unwrap();
        let result = queue.submit(Uuid::now_v7());
        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }

    #[test]
    fn test_fiscal_period_formatting() {
        fn model(quarter: Option<&str>, year: Option<i32>) -> report::Model {
            report::Model {
                id: Uuid::now_v7(),
                company_name: "Acme".to_string(),
                report_type: "Financial Report".to_string(),
                title: "Q3".to_string(),
                source_url: "https://example.com/q3".to_string(),
                download_url: None,
                file_path: None,
                file_size: None,
                fiscal_quarter: quarter.map(|q| q.to_string()),
                fiscal_year: year,
                published_date: None,
                region: None,
                sector: None,
                extracted_text: None,
                page_count: None,
                language: None,
                required_ocr: false,
                tags: None,
                metadata: None,
                status: "ingested".to_string(),
                error_message: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
                processed_at: None,
            }
        }

        assert_eq!(
            fiscal_period(&model(Some("Q3"), Some(2025))),
            Some("Q3 2025".to_string())
        );
        assert_eq!(fiscal_period(&model(Some("Q3"), None)), Some("Q3".to_string()));
        assert_eq!(fiscal_period(&model(None, Some(2025))), Some("2025".to_string()));
        assert_eq!(fiscal_period(&model(None, None)), None);
    }
}
