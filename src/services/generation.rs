//! Narrative analysis generation with bounded retry and result caching.
//!
//! Wraps the external analyzer: builds a profile-specific prompt, tolerates
//! loosely formatted JSON in the response, retries transient failures on a
//! fixed budget and optionally short-circuits repeated identical input
//! through an injected TTL cache.

use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::GenerationSettings;
use crate::error::{AppError, AppResult};
use crate::models::{AnalysisContent, GeneratedAnalysis};
use crate::services::analyzer::DocumentAnalyzer;
use crate::services::cache::AnalysisCache;

/// Default confidence when the analyzer does not report one.
const DEFAULT_CONFIDENCE: f64 = 0.7;

/// Prompt profile selected from the report type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptProfile {
    Default,
    Financial,
    Technical,
}

impl PromptProfile {
    /// Pick a profile by report-type substring.
    pub fn select(report_type: &str) -> Self {
        let lower = report_type.to_lowercase();
        if lower.contains("financial")
            || lower.contains("earnings")
            || lower.contains("annual")
            || lower.contains("quarterly")
        {
            Self::Financial
        } else if lower.contains("tech") || lower.contains("product") || lower.contains("research")
        {
            Self::Technical
        } else {
            Self::Default
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            Self::Default => {
                "You are a business analyst. Analyze business documents and \
                 respond with precise, structured JSON."
            }
            Self::Financial => {
                "You are a financial analyst expert. Analyze financial reports \
                 and provide concise, structured assessments grounded in the \
                 reported figures."
            }
            Self::Technical => {
                "You are a technology industry analyst. Analyze technology \
                 reports with attention to product strategy, competitive \
                 dynamics and adoption signals."
            }
        }
    }

    fn user_prompt(&self, text: &str, company: &str, report_type: &str) -> String {
        format!(
            "Analyze this {report_type} from {company} and respond with a single JSON object \
             using exactly these keys:\n\
             \"executive_summary\" (2-3 sentences),\n\
             \"key_highlights\" (3-5 strings),\n\
             \"strategic_initiatives\" (strings),\n\
             \"market_outlook\" (string),\n\
             \"risk_factors\" (2-3 strings),\n\
             \"competitive_position\" (string),\n\
             \"investment_thesis\" (string),\n\
             \"sentiment_score\" (0.0 to 1.0),\n\
             \"sentiment_label\" (Positive/Neutral/Negative),\n\
             \"confidence\" (0.0 to 1.0).\n\n\
             Report text:\n{text}\n\n\
             Provide only the JSON response, no additional text."
        )
    }
}

/// Response shape requested from the analyzer: the persisted content plus an
/// optional self-reported confidence.
#[derive(Debug, Deserialize)]
struct AnalyzerResponse {
    #[serde(flatten)]
    content: AnalysisContent,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Analysis generator bound to an analyzer, tuning and an optional cache.
pub struct AnalysisGenerator {
    analyzer: Arc<dyn DocumentAnalyzer>,
    settings: GenerationSettings,
    cache: Option<Arc<AnalysisCache>>,
}

impl AnalysisGenerator {
    pub fn new(
        analyzer: Arc<dyn DocumentAnalyzer>,
        settings: GenerationSettings,
        cache: Option<Arc<AnalysisCache>>,
    ) -> Self {
        Self {
            analyzer,
            settings,
            cache,
        }
    }

    /// Generate a structured analysis for a report's text.
    pub async fn generate(
        &self,
        text: &str,
        company: &str,
        report_type: &str,
    ) -> AppResult<GeneratedAnalysis> {
        let started = Instant::now();

        let truncated = truncate_chars(text, self.settings.max_input_chars);
        if truncated.len() < text.len() {
            debug!(
                "Analysis input truncated from {} to {} bytes",
                text.len(),
                truncated.len()
            );
        }

        let key = cache_key(company, report_type, &truncated);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                info!("Analysis cache hit for {}", company);
                return Ok(hit);
            }
        }

        let profile = PromptProfile::select(report_type);

        let raw = if self.settings.chunk_streaming
            && truncated.chars().count() > self.settings.chunk_size
        {
            self.generate_chunked(profile, &truncated, company, report_type)
                .await?
        } else {
            let prompt = profile.user_prompt(&truncated, company, report_type);
            self.complete_with_retry(profile.system_prompt(), &prompt)
                .await?
        };

        let (content, confidence) = parse_analysis_response(&raw)?;

        let generated = GeneratedAnalysis {
            content: content.normalize(),
            confidence: confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0),
            model: self.analyzer.model_name().to_string(),
            processing_ms: started.elapsed().as_millis() as i64,
        };

        if let Some(cache) = &self.cache {
            cache.insert(key, generated.clone());
        }

        Ok(generated)
    }

    /// Submit long input as sequential chunks, keeping the last chunk's
    /// result as the representative analysis.
    ///
    /// Keeping only the last result is a policy choice, not a verified
    /// property of the synthesis.
    async fn generate_chunked(
        &self,
        profile: PromptProfile,
        text: &str,
        company: &str,
        report_type: &str,
    ) -> AppResult<String> {
        let chunks = chunk_chars(text, self.settings.chunk_size);
        let total = chunks.len();

        info!("Submitting analysis input as {} chunks", total);

        let mut last = String::new();
        for (index, chunk) in chunks.iter().enumerate() {
            debug!("Submitting chunk {}/{}", index + 1, total);
            let prompt = profile.user_prompt(chunk, company, report_type);
            last = self
                .complete_with_retry(profile.system_prompt(), &prompt)
                .await?;
        }

        Ok(last)
    }

    /// Call the analyzer with the configured attempt budget, retrying only
    /// transient failures.
    async fn complete_with_retry(&self, system: &str, user: &str) -> AppResult<String> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.analyzer.complete(system, user).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!(
                        "Analyzer attempt {}/{} failed: {}",
                        attempt, max_attempts, e
                    );
                    tokio::time::sleep(self.settings.retry_delay).await;
                }
                Err(e) => {
                    return Err(AppError::Generation(format!(
                        "analyzer failed after {} attempt(s): {}",
                        attempt, e
                    )));
                }
            }
        }
    }
}

/// Content-derived cache key: hash of company, report type and input text.
pub fn cache_key(company: &str, report_type: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(company.as_bytes());
    hasher.update([0]);
    hasher.update(report_type.as_bytes());
    hasher.update([0]);
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Truncate on a character boundary.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

/// Split into fixed-size character chunks.
fn chunk_chars(s: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    chars
        .chunks(chunk_size.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

/// Parse the analyzer's response, tolerating markdown fences and prose.
///
/// A response with no recoverable JSON object is a hard error for the call.
fn parse_analysis_response(raw: &str) -> AppResult<(AnalysisContent, Option<f64>)> {
    let candidate = extract_json_candidate(raw).ok_or_else(|| {
        AppError::Generation("analyzer response contained no JSON object".to_string())
    })?;

    let parsed: AnalyzerResponse = serde_json::from_str(candidate).map_err(|e| {
        AppError::Generation(format!("failed to parse analyzer response: {}", e))
    })?;

    Ok((parsed.content, parsed.confidence))
}

/// Locate the JSON object within a possibly fenced or prose-wrapped response.
fn extract_json_candidate(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();

    // Markdown-fenced block first: ```json ... ``` or ``` ... ```
    if let Some(fence_start) = trimmed.find("```") {
        let after_fence = &trimmed[fence_start + 3..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(fence_end) = body.find("```") {
            let inner = body[..fence_end].trim();
            if !inner.is_empty() {
                return Some(inner);
            }
        }
    }

    // Fall back to the outermost braces
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end < start {
        return None;
    }
    Some(trimmed[start..=end].trim())
}
