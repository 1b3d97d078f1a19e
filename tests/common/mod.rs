//! Shared test harness: in-memory collaborators and a SQLite-backed schema.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, Schema};
use uuid::Uuid;

use market_intel_pipeline::config::GenerationSettings;
use market_intel_pipeline::db::DbPool;
use market_intel_pipeline::entity::{alert, analysis, metric, report};
use market_intel_pipeline::error::{AppError, AppResult};
use market_intel_pipeline::models::{IngestRequest, ProcessingStatus, StoredDocument};
use market_intel_pipeline::services::{
    AnalysisGenerator, AnalyzerError, DocumentAnalyzer, DocumentStore, IngestService,
    ProcessingQueue, ProcessorContext,
};

/// A well-formed analyzer response used across tests.
pub const VALID_ANALYZER_RESPONSE: &str = r#"{
    "executive_summary": "Solid quarter with broad-based growth.",
    "key_highlights": ["Revenue up 15%", "Margin expansion", "Record backlog"],
    "strategic_initiatives": ["Capacity expansion in EMEA"],
    "market_outlook": "Demand remains firm",
    "risk_factors": ["FX exposure", "Input cost inflation"],
    "competitive_position": "Category leader",
    "investment_thesis": "Attractive on fundamentals",
    "sentiment_score": 0.82,
    "sentiment_label": "Positive",
    "confidence": 0.9
}"#;

// ============================================================================
// In-memory document store
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    deletes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn save(
        &self,
        data: Vec<u8>,
        file_name: &str,
        subfolder: Option<&str>,
    ) -> AppResult<StoredDocument> {
        let path = match subfolder {
            Some(folder) => format!("documents/{}/{}", folder, file_name),
            None => format!("documents/{}", file_name),
        };
        let size = data.len() as i64;
        self.files.lock().unwrap().insert(path.clone(), data);
        Ok(StoredDocument { path, size })
    }

    async fn get(&self, path: &str) -> AppResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Document {}", path)))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.files.lock().unwrap().remove(path);
        Ok(())
    }
}

// ============================================================================
// Scripted analyzer
// ============================================================================

/// Analyzer double replaying scripted outcomes, then a default response.
pub struct ScriptedAnalyzer {
    script: Mutex<VecDeque<Result<String, String>>>,
    default_ok: bool,
    calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    /// Always returns the valid response.
    pub fn always_ok() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_ok: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails with a transient error.
    pub fn always_transient_failure() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_ok: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails transiently `failures` times, then succeeds.
    pub fn fail_then_succeed(failures: usize) -> Self {
        let mut script = VecDeque::new();
        for _ in 0..failures {
            script.push_back(Err("analyzer overloaded".to_string()));
        }
        script.push_back(Ok(VALID_ANALYZER_RESPONSE.to_string()));
        Self {
            script: Mutex::new(script),
            default_ok: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentAnalyzer for ScriptedAnalyzer {
    fn model_name(&self) -> &str {
        "scripted-test-model"
    }

    async fn complete(&self, _system: &str, _user: &str) -> Result<String, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(outcome) = self.script.lock().unwrap().pop_front() {
            return outcome.map_err(AnalyzerError::Transient);
        }

        if self.default_ok {
            Ok(VALID_ANALYZER_RESPONSE.to_string())
        } else {
            Err(AnalyzerError::Transient("analyzer overloaded".to_string()))
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Connect to an isolated in-memory SQLite database with the schema created
/// from the entity definitions.
pub async fn test_db() -> DbPool {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    // A single connection keeps the in-memory database alive and shared
    options.max_connections(1).min_connections(1);

    let conn = Database::connect(options).await.expect("connect sqlite");

    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);
    for statement in [
        schema.create_table_from_entity(report::Entity),
        schema.create_table_from_entity(metric::Entity),
        schema.create_table_from_entity(alert::Entity),
        schema.create_table_from_entity(analysis::Entity),
    ] {
        conn.execute(&statement)
            .await
            .expect("create table");
    }

    DbPool::from_connection(conn)
}

/// Generation settings with zero retry delays so tests run instantly.
pub fn fast_generation_settings() -> GenerationSettings {
    GenerationSettings {
        retry_delay: Duration::ZERO,
        persistence_retry_delay: Duration::ZERO,
        ..Default::default()
    }
}

pub struct Harness {
    pub db: DbPool,
    pub store: Arc<MemoryStore>,
    pub analyzer: Arc<ScriptedAnalyzer>,
    pub queue: Arc<ProcessingQueue>,
    pub ingest: IngestService,
}

/// Install a tracing subscriber once so RUST_LOG surfaces pipeline logs.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Build the full pipeline against in-memory collaborators.
pub async fn harness(analyzer: ScriptedAnalyzer) -> Harness {
    init_tracing();

    let db = test_db().await;
    let store = Arc::new(MemoryStore::new());
    let analyzer = Arc::new(analyzer);

    let settings = fast_generation_settings();
    let generator = Arc::new(AnalysisGenerator::new(
        analyzer.clone(),
        settings.clone(),
        None,
    ));

    let ctx = ProcessorContext {
        db: db.clone(),
        generator,
        persistence_attempts: settings.persistence_attempts,
        persistence_retry_delay: settings.persistence_retry_delay,
    };

    let queue = Arc::new(ProcessingQueue::start(ctx, 2, 16));

    let ingest = IngestService::new(
        db.clone(),
        store.clone(),
        queue.clone(),
        Duration::from_secs(5),
    )
    .expect("build ingest service");

    Harness {
        db,
        store,
        analyzer,
        queue,
        ingest,
    }
}

/// Minimal valid request carrying inline content and extracted text.
pub fn ingest_request(source_url: &str, extracted_text: &str) -> IngestRequest {
    use base64::Engine;

    IngestRequest {
        company_name: "Schneider Electric".to_string(),
        report_type: "Financial Report".to_string(),
        title: "Q3 2025 Results".to_string(),
        source_url: source_url.to_string(),
        content_base64: Some(
            base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4 test document"),
        ),
        extracted_text: if extracted_text.is_empty() {
            None
        } else {
            Some(extracted_text.to_string())
        },
        fiscal_quarter: Some("Q3".to_string()),
        fiscal_year: Some(2025),
        ..Default::default()
    }
}

/// Poll until the report reaches a terminal status or the timeout elapses.
pub async fn wait_for_terminal(db: &DbPool, report_id: Uuid) -> report::Model {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);

    loop {
        let report = db
            .get_report(report_id)
            .await
            .expect("get report")
            .expect("report exists");

        if let Some(status) = ProcessingStatus::parse(&report.status) {
            if status.is_terminal() {
                return report;
            }
        }

        if tokio::time::Instant::now() >= deadline {
            panic!("report {} never reached a terminal status", report_id);
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Sample report text that exercises extraction and several alert rules.
pub const RICH_REPORT_TEXT: &str = "Q3 2025 Results. Revenue reached $5.2 billion, \
    and revenue grew 23.4% year-over-year. Operating margin declined from 18.5% to 16.2% \
    under pricing pressure. EBITDA totaled $800 million. Supply chain disruption and \
    inflation remain headwinds. The acquisition of GridCo closed in July.";
