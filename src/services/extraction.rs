//! Pattern-based metric extraction from report text.
//!
//! Each metric family carries an ordered list of patterns; the first pattern
//! that matches anywhere in the text wins for that family, so one document
//! never yields duplicate metrics of the same type. Extraction is pure and
//! silent: no text or no match simply produces no metrics.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::{metric_types, ExtractedMetric, ExtractionMethod};

/// Maximum stored length of the matched text fragment.
const SNIPPET_MAX_CHARS: usize = 160;

/// How a family's captured number is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    /// Captures (amount, magnitude); normalized to millions
    Currency,
    /// Captures a percentage
    Percent,
}

struct PatternFamily {
    metric_type: &'static str,
    kind: ValueKind,
    confidence: f64,
    patterns: &'static [&'static str],
}

/// Families in extraction order. Patterns within a family are in priority
/// order; the first match wins.
const FAMILIES: &[PatternFamily] = &[
    PatternFamily {
        metric_type: metric_types::REVENUE,
        kind: ValueKind::Currency,
        confidence: 0.80,
        patterns: &[
            r"(?i)(?:total\s+)?revenues?\s+(?:of|was|were|reached|totaled|rose\s+to|increased\s+to|grew\s+to|came\s+in\s+at)\s+\$?([0-9][\d,]*\.?\d*)\s*(billion|million)",
            r"(?i)\$([0-9][\d,]*\.?\d*)\s*(billion|million)\s+(?:in\s+|of\s+)?revenues?",
        ],
    },
    PatternFamily {
        metric_type: metric_types::OPERATING_MARGIN,
        kind: ValueKind::Percent,
        confidence: 0.75,
        patterns: &[
            r"(?i)operating\s+margin\s+(?:declined|decreased|fell|dropped|improved|expanded)\s+from\s+[\d.]+\s*%\s+to\s+([\d.]+)\s*%",
            r"(?i)operating\s+margin\s+(?:of|was|at|reached|came\s+in\s+at|improved\s+to|declined\s+to|decreased\s+to)\s+([\d.]+)\s*%",
            r"(?i)operating\s+margin\s+([\d.]+)\s*%",
        ],
    },
    PatternFamily {
        metric_type: metric_types::REVENUE_GROWTH_YOY,
        kind: ValueKind::Percent,
        confidence: 0.70,
        patterns: &[
            r"(?i)revenues?\s+(?:grew|increased|rose)\s+(?:by\s+)?([\d.]+)\s*%",
            r"(?i)revenue\s+growth\s+of\s+([\d.]+)\s*%",
            r"(?i)([\d.]+)\s*%\s+(?:year[\s-]over[\s-]year|yoy)\s+(?:revenue\s+)?growth",
        ],
    },
    PatternFamily {
        metric_type: metric_types::EBITDA,
        kind: ValueKind::Currency,
        confidence: 0.75,
        patterns: &[
            r"(?i)ebitda\s+(?:of|was|reached|totaled|rose\s+to|grew\s+to|came\s+in\s+at)\s+\$?([0-9][\d,]*\.?\d*)\s*(billion|million)",
            r"(?i)\$([0-9][\d,]*\.?\d*)\s*(billion|million)\s+(?:in\s+|of\s+)?(?:adjusted\s+)?ebitda",
        ],
    },
];

static COMPILED: Lazy<Vec<Vec<Regex>>> = Lazy::new(|| {
    FAMILIES
        .iter()
        .map(|family| {
            family
                .patterns
                .iter()
                .map(|p| Regex::new(p).expect("invalid extraction pattern"))
                .collect()
        })
        .collect()
});

/// Extract financial metrics from report text.
///
/// Returns an empty list when the text is blank or nothing matches;
/// extraction never fails.
pub fn extract_metrics(text: &str) -> Vec<ExtractedMetric> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut metrics = Vec::new();

    for (family, regexes) in FAMILIES.iter().zip(COMPILED.iter()) {
        for regex in regexes {
            let Some(captures) = regex.captures(text) else {
                continue;
            };

            let raw_value = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let magnitude = captures.get(2).map(|m| m.as_str());

            let Some((value, unit)) = parse_value(family.kind, raw_value, magnitude) else {
                continue;
            };

            let full_match = captures.get(0).map(|m| m.as_str()).unwrap_or_default();

            metrics.push(ExtractedMetric {
                metric_type: family.metric_type.to_string(),
                value,
                unit,
                confidence: family.confidence,
                method: ExtractionMethod::Pattern,
                source_snippet: truncate_chars(full_match, SNIPPET_MAX_CHARS),
            });

            // First matching pattern wins for this family
            break;
        }
    }

    debug!("Extracted {} metrics", metrics.len());

    metrics
}

/// Parse a captured number, normalizing currency values into millions.
fn parse_value(kind: ValueKind, raw: &str, magnitude: Option<&str>) -> Option<(f64, String)> {
    let cleaned = raw.replace(',', "");
    let parsed: f64 = cleaned.parse().ok()?;

    match kind {
        ValueKind::Currency => {
            let in_millions = match magnitude.map(|m| m.to_lowercase()) {
                Some(m) if m == "billion" => parsed * 1000.0,
                _ => parsed,
            };
            Some((in_millions, "Million".to_string()))
        }
        ValueKind::Percent => Some((parsed, "Percent".to_string())),
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
