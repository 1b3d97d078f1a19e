//! Report domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::analysis::AnalysisPayload;

/// Processing status of a report.
///
/// Transitions are monotonic (`ingested -> processing -> complete | failed`)
/// except an explicit analysis re-run, which re-enters `processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Ingested,
    Processing,
    Complete,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingested => "ingested",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ingested" => Some(Self::Ingested),
            "processing" => Some(Self::Processing),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Terminal states are only left by an explicit re-run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to ingest a new document.
///
/// Either `content_base64` or `download_url` must carry the document bytes.
/// A pre-computed analysis travels in the typed `analysis` field rather than
/// being smuggled through the free-form `metadata` map.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    /// Existing report id for the re-ingestion (update) path.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub company_name: String,
    pub report_type: String,
    pub title: String,
    /// Globally unique key for duplicate detection (exact match).
    pub source_url: String,
    #[serde(default)]
    pub download_url: Option<String>,
    /// Inline document bytes, base64-encoded.
    #[serde(default)]
    pub content_base64: Option<String>,
    #[serde(default)]
    pub fiscal_quarter: Option<String>,
    #[serde(default)]
    pub fiscal_year: Option<i32>,
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub extracted_text: Option<String>,
    #[serde(default)]
    pub page_count: Option<i32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub required_ocr: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-form producer metadata, stored verbatim.
    #[serde(default)]
    pub metadata: Option<JsonValue>,
    /// Pre-computed analysis from an external producer (bypass path).
    #[serde(default)]
    pub analysis: Option<AnalysisPayload>,
}

/// A document saved through the storage contract.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Storage path (key) of the saved document.
    pub path: String,
    /// Size in bytes.
    pub size: i64,
}
