//! Business logic services.

pub mod alerts;
pub mod analyzer;
pub mod cache;
pub mod extraction;
pub mod generation;
pub mod ingestion;
pub mod storage;
pub mod worker;

pub use alerts::evaluate_alerts;
pub use analyzer::{AnalyzerError, ChatProvider, DocumentAnalyzer};
pub use cache::AnalysisCache;
pub use extraction::extract_metrics;
pub use generation::{AnalysisGenerator, PromptProfile};
pub use ingestion::IngestService;
pub use storage::{DocumentStore, S3Store};
pub use worker::{ProcessingQueue, ProcessorContext};
