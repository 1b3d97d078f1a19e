//! Extracted metric domain models.

use serde::{Deserialize, Serialize};

/// Canonical metric type names used by the extraction engine.
pub mod metric_types {
    pub const REVENUE: &str = "Revenue";
    pub const OPERATING_MARGIN: &str = "Operating Margin";
    pub const REVENUE_GROWTH_YOY: &str = "Revenue Growth (YoY)";
    pub const EBITDA: &str = "EBITDA";
}

/// How a metric was extracted.
///
/// `Pattern` is the only method implemented today; `Model` is reserved for a
/// future ML-based extractor so stored rows stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Pattern,
    Model,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Model => "model",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pattern" => Some(Self::Pattern),
            "model" => Some(Self::Model),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A quantitative fact extracted from report text.
///
/// Immutable once created; the reporting period is stamped on at persistence
/// time from the owning report's fiscal fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMetric {
    pub metric_type: String,
    pub value: f64,
    pub unit: String,
    pub confidence: f64,
    pub method: ExtractionMethod,
    /// The text fragment the value was pulled from.
    pub source_snippet: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_method_round_trip() {
        assert_eq!(
            ExtractionMethod::parse(ExtractionMethod::Pattern.as_str()),
            Some(ExtractionMethod::Pattern)
        );
        assert_eq!(
            ExtractionMethod::parse(ExtractionMethod::Model.as_str()),
            Some(ExtractionMethod::Model)
        );
        assert_eq!(ExtractionMethod::parse("ocr"), None);
    }
}
