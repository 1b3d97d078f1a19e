//! Domain models shared across services and the persistence layer.

pub mod alert;
pub mod analysis;
pub mod metric;
pub mod report;

pub use alert::{AlertKind, Severity, TriggeredAlert};
pub use analysis::{AnalysisContent, AnalysisPayload, GeneratedAnalysis};
pub use metric::{metric_types, ExtractedMetric, ExtractionMethod};
pub use report::{IngestRequest, ProcessingStatus, StoredDocument};
