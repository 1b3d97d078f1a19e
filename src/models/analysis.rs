//! Analysis domain models.

use serde::{Deserialize, Serialize};

/// Structured narrative analysis of a report.
///
/// This is the shape the analyzer is asked to produce and the shape persisted
/// to the `analyses` table. All list fields default to empty so a partial
/// response still parses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisContent {
    #[serde(default)]
    pub executive_summary: String,
    #[serde(default)]
    pub key_highlights: Vec<String>,
    #[serde(default)]
    pub strategic_initiatives: Vec<String>,
    #[serde(default)]
    pub market_outlook: Option<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub competitive_position: Option<String>,
    #[serde(default)]
    pub investment_thesis: Option<String>,
    #[serde(default = "default_sentiment_score")]
    pub sentiment_score: f64,
    #[serde(default = "default_sentiment_label")]
    pub sentiment_label: String,
}

fn default_sentiment_score() -> f64 {
    0.5
}

fn default_sentiment_label() -> String {
    "Neutral".to_string()
}

impl AnalysisContent {
    /// Clamp the sentiment score into [0, 1] and normalize the label casing.
    pub fn normalize(mut self) -> Self {
        self.sentiment_score = self.sentiment_score.clamp(0.0, 1.0);
        self.sentiment_label = normalize_sentiment_label(&self.sentiment_label);
        self
    }
}

/// Map free-form sentiment labels onto the three canonical ones.
pub fn normalize_sentiment_label(label: &str) -> String {
    match label.trim().to_lowercase().as_str() {
        "positive" | "very_positive" | "very positive" => "Positive".to_string(),
        "negative" | "very_negative" | "very negative" => "Negative".to_string(),
        _ => "Neutral".to_string(),
    }
}

/// A generated analysis together with its provenance.
#[derive(Debug, Clone)]
pub struct GeneratedAnalysis {
    pub content: AnalysisContent,
    /// Analyzer confidence in the structured output, 0-1.
    pub confidence: f64,
    /// Identifier of the model that produced the analysis.
    pub model: String,
    /// Wall-clock generation time in milliseconds.
    pub processing_ms: i64,
}

/// Pre-computed analysis supplied by an external producer (bypass path).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    #[serde(flatten)]
    pub content: AnalysisContent,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub model: Option<String>,
}

impl AnalysisPayload {
    /// Convert to a [`GeneratedAnalysis`], filling provenance defaults.
    pub fn into_generated(self) -> GeneratedAnalysis {
        GeneratedAnalysis {
            content: self.content.normalize(),
            confidence: self.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
            model: self.model.unwrap_or_else(|| "external".to_string()),
            processing_ms: 0,
        }
    }
}
