//! Rule-based alerting over extracted metrics and raw report text.
//!
//! Rules are independent and order-insensitive; a report can trigger zero to
//! many alerts, and blank input triggers none. Evaluation is pure.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::{metric_types, AlertKind, ExtractedMetric, Severity, TriggeredAlert};

/// Margin decline in percentage points that triggers an alert.
const MARGIN_DROP_THRESHOLD: f64 = 1.0;
/// Margin decline that escalates the alert to critical.
const MARGIN_DROP_CRITICAL: f64 = 3.0;
/// Revenue decline percentage that escalates to critical.
const REVENUE_DROP_CRITICAL: f64 = 10.0;
/// Distinct opportunity keywords required for an opportunity alert.
const OPPORTUNITY_MIN_HITS: usize = 3;
/// Growth percentage above which a strong-growth alert fires (strict).
const STRONG_GROWTH_THRESHOLD: f64 = 20.0;

const CRITICAL_RISK_KEYWORDS: &[&str] = &["lawsuit", "bankruptcy", "default", "breach", "hack"];
const OPERATIONAL_RISK_KEYWORDS: &[&str] = &["supply chain", "disruption", "shortage", "delay"];
const MACRO_RISK_KEYWORDS: &[&str] = &["inflation", "recession", "downturn", "headwind"];

const OPPORTUNITY_KEYWORDS: &[&str] = &[
    "expansion",
    "new market",
    "product launch",
    "innovation",
    "investment",
    "record demand",
    "backlog",
    "pipeline",
    "growth opportunity",
    "new contract",
];

/// M&A-specific subset, disjoint from the general opportunity list.
const MA_KEYWORDS: &[&str] = &["acquisition", "merger", "deal", "partnership"];

/// Patterns locating a previously reported margin value, in priority order.
static PREVIOUS_MARGIN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)from\s+([\d.]+)\s*%\s+to\s+[\d.]+\s*%",
        r"(?i)compared\s+to\s+([\d.]+)\s*%",
        r"(?i)versus\s+([\d.]+)\s*%",
        r"(?i)prior\s+period\s+of\s+([\d.]+)\s*%",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid margin pattern"))
    .collect()
});

/// Patterns for explicit revenue decline phrasing, in priority order.
static REVENUE_DECLINE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)revenues?\s+(?:declined|decreased|fell|dropped)\s+(?:by\s+)?([\d.]+)\s*%",
        r"(?i)([\d.]+)\s*%\s+(?:decline|decrease|drop)\s+in\s+revenues?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid revenue decline pattern"))
    .collect()
});

/// Evaluate all alert rules for a report.
pub fn evaluate_alerts(text: &str, metrics: &[ExtractedMetric]) -> Vec<TriggeredAlert> {
    let mut alerts = Vec::new();

    if text.trim().is_empty() && metrics.is_empty() {
        return alerts;
    }

    let lower = text.to_lowercase();

    alerts.extend(margin_drop_rule(text, metrics));
    alerts.extend(revenue_drop_rule(text, metrics));
    alerts.extend(risk_keyword_rules(&lower));
    alerts.extend(opportunity_rules(&lower));
    alerts.extend(growth_rule(metrics));

    debug!("Rules triggered {} alerts", alerts.len());

    alerts
}

/// Margin drop: compare each margin metric against a prior-value mention.
fn margin_drop_rule(text: &str, metrics: &[ExtractedMetric]) -> Vec<TriggeredAlert> {
    let mut alerts = Vec::new();

    for metric in metrics {
        if !metric.metric_type.contains("Margin") {
            continue;
        }

        let Some(previous) = find_previous_margin(text) else {
            continue;
        };

        let drop = previous - metric.value;
        if drop <= MARGIN_DROP_THRESHOLD {
            continue;
        }

        let severity = if drop > MARGIN_DROP_CRITICAL {
            Severity::Critical
        } else {
            Severity::High
        };

        let mut alert = TriggeredAlert::new(
            AlertKind::MarginDrop,
            severity,
            format!("{} declined", metric.metric_type),
            format!(
                "{} fell {:.1} percentage points, from {:.1}% to {:.1}%.",
                metric.metric_type, drop, previous, metric.value
            ),
        );
        alert.trigger_metric = Some(metric.metric_type.clone());
        alert.threshold = Some(MARGIN_DROP_THRESHOLD);
        alert.actual_value = Some(drop);
        alerts.push(alert);
    }

    alerts
}

fn find_previous_margin(text: &str) -> Option<f64> {
    for pattern in PREVIOUS_MARGIN_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Ok(value) = captures[1].parse::<f64>() {
                return Some(value);
            }
        }
    }
    None
}

/// Revenue drop: explicit decline phrasing next to a revenue metric.
fn revenue_drop_rule(text: &str, metrics: &[ExtractedMetric]) -> Vec<TriggeredAlert> {
    let has_revenue = metrics
        .iter()
        .any(|m| m.metric_type == metric_types::REVENUE);
    if !has_revenue {
        return Vec::new();
    }

    let Some(decline) = find_revenue_decline(text) else {
        return Vec::new();
    };

    let severity = if decline > REVENUE_DROP_CRITICAL {
        Severity::Critical
    } else {
        Severity::High
    };

    let mut alert = TriggeredAlert::new(
        AlertKind::RevenueDrop,
        severity,
        "Revenue declined",
        format!("Reported revenue declined {:.1}% versus the prior period.", decline),
    );
    alert.trigger_metric = Some(metric_types::REVENUE.to_string());
    alert.threshold = Some(REVENUE_DROP_CRITICAL);
    alert.actual_value = Some(decline);

    vec![alert]
}

fn find_revenue_decline(text: &str) -> Option<f64> {
    for pattern in REVENUE_DECLINE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Ok(value) = captures[1].parse::<f64>() {
                return Some(value);
            }
        }
    }
    None
}

/// Risk keywords: one alert per bucket that has any hit.
fn risk_keyword_rules(lower_text: &str) -> Vec<TriggeredAlert> {
    let buckets: [(&[&str], AlertKind, Severity, &str); 3] = [
        (
            CRITICAL_RISK_KEYWORDS,
            AlertKind::CriticalRisk,
            Severity::Critical,
            "Critical risk language detected",
        ),
        (
            OPERATIONAL_RISK_KEYWORDS,
            AlertKind::OperationalRisk,
            Severity::High,
            "Operational risk language detected",
        ),
        (
            MACRO_RISK_KEYWORDS,
            AlertKind::MacroRisk,
            Severity::Medium,
            "Macroeconomic risk language detected",
        ),
    ];

    let mut alerts = Vec::new();

    for (keywords, kind, severity, title) in buckets {
        let matched = matched_keywords(lower_text, keywords);
        if matched.is_empty() {
            continue;
        }

        let mut alert = TriggeredAlert::new(
            kind,
            severity,
            title,
            format!("Report mentions: {}.", matched.join(", ")),
        );
        alert.matched_keywords = matched;
        alerts.push(alert);
    }

    alerts
}

/// Opportunity signals: a general-keyword alert and a separate M&A alert.
fn opportunity_rules(lower_text: &str) -> Vec<TriggeredAlert> {
    let mut alerts = Vec::new();

    let opportunities = matched_keywords(lower_text, OPPORTUNITY_KEYWORDS);
    if opportunities.len() >= OPPORTUNITY_MIN_HITS {
        let mut alert = TriggeredAlert::new(
            AlertKind::OpportunityDetected,
            Severity::Info,
            "Growth opportunities identified",
            format!("Report signals opportunities: {}.", opportunities.join(", ")),
        );
        alert.matched_keywords = opportunities;
        alerts.push(alert);
    }

    let ma_hits = matched_keywords(lower_text, MA_KEYWORDS);
    if !ma_hits.is_empty() {
        let mut alert = TriggeredAlert::new(
            AlertKind::MergerAcquisition,
            Severity::High,
            "M&A activity mentioned",
            format!("Report mentions M&A activity: {}.", ma_hits.join(", ")),
        );
        alert.matched_keywords = ma_hits;
        alerts.push(alert);
    }

    alerts
}

/// Strong growth: any growth metric strictly above the threshold.
fn growth_rule(metrics: &[ExtractedMetric]) -> Vec<TriggeredAlert> {
    let mut alerts = Vec::new();

    for metric in metrics {
        if !metric.metric_type.contains("Growth") {
            continue;
        }
        if metric.value <= STRONG_GROWTH_THRESHOLD {
            continue;
        }

        let mut alert = TriggeredAlert::new(
            AlertKind::StrongGrowth,
            Severity::Info,
            "Strong growth reported",
            format!("{} of {:.1}% exceeds {:.0}%.", metric.metric_type, metric.value, STRONG_GROWTH_THRESHOLD),
        );
        alert.trigger_metric = Some(metric.metric_type.clone());
        alert.threshold = Some(STRONG_GROWTH_THRESHOLD);
        alert.actual_value = Some(metric.value);
        alerts.push(alert);
    }

    alerts
}

fn matched_keywords(lower_text: &str, keywords: &[&str]) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| lower_text.contains(*k))
        .map(|k| k.to_string())
        .collect()
}
