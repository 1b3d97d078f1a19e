//! Alert domain models.

use serde::{Deserialize, Serialize};

/// Category of a rule-triggered alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    MarginDrop,
    RevenueDrop,
    CriticalRisk,
    OperationalRisk,
    MacroRisk,
    OpportunityDetected,
    MergerAcquisition,
    StrongGrowth,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarginDrop => "margin_drop",
            Self::RevenueDrop => "revenue_drop",
            Self::CriticalRisk => "critical_risk",
            Self::OperationalRisk => "operational_risk",
            Self::MacroRisk => "macro_risk",
            Self::OpportunityDetected => "opportunity_detected",
            Self::MergerAcquisition => "merger_acquisition",
            Self::StrongGrowth => "strong_growth",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "margin_drop" => Some(Self::MarginDrop),
            "revenue_drop" => Some(Self::RevenueDrop),
            "critical_risk" => Some(Self::CriticalRisk),
            "operational_risk" => Some(Self::OperationalRisk),
            "macro_risk" => Some(Self::MacroRisk),
            "opportunity_detected" => Some(Self::OpportunityDetected),
            "merger_acquisition" => Some(Self::MergerAcquisition),
            "strong_growth" => Some(Self::StrongGrowth),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert severity, ordered from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Info => "info",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single alert produced by the rules engine, not yet persisted.
#[derive(Debug, Clone)]
pub struct TriggeredAlert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    /// Metric type that triggered the rule, if metric-driven.
    pub trigger_metric: Option<String>,
    /// Keywords that matched, if keyword-driven.
    pub matched_keywords: Vec<String>,
    /// Rule threshold that was crossed.
    pub threshold: Option<f64>,
    /// Observed value compared against the threshold.
    pub actual_value: Option<f64>,
}

impl TriggeredAlert {
    pub fn new(kind: AlertKind, severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            title: title.into(),
            message: message.into(),
            trigger_metric: None,
            matched_keywords: Vec::new(),
            threshold: None,
            actual_value: None,
        }
    }
}
