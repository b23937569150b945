use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metrics::MetricId;

/// Organisms or pairs named in one rationale
pub const MAX_NAMED: usize = 5;

/// Severity class of an explanation, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Informational,
    Warning,
    Critical,
}

impl Severity {
    /// Class of a normalized risk metric; `None` when it contributes nothing
    pub fn for_risk(normalized: f64) -> Option<Self> {
        match normalized {
            v if v >= 0.8 => Some(Severity::Critical),
            v if v >= 0.5 => Some(Severity::Warning),
            v if v > 0.0 => Some(Severity::Informational),
            _ => None,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Severity::Informational => "ℹ️",
            Severity::Warning => "⚠️",
            Severity::Critical => "🚨",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Informational => "informational",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        })
    }
}

/// One piece of human-readable guild feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Contributing metric; `None` for guild-wide notes (veto, drift)
    pub metric: Option<MetricId>,
    pub severity: Severity,
    pub title: String,
    pub rationale: String,
    /// Organisms, species or pairs the rationale names
    pub organisms: Vec<String>,
    pub low_confidence: bool,
}

impl Explanation {
    pub fn new(
        metric: Option<MetricId>,
        severity: Severity,
        title: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            metric,
            severity,
            title: title.into(),
            rationale: rationale.into(),
            organisms: Vec::new(),
            low_confidence: false,
        }
    }

    pub fn with_organisms(mut self, organisms: Vec<String>) -> Self {
        self.organisms = organisms;
        self
    }

    pub fn low_confidence(mut self, low_confidence: bool) -> Self {
        self.low_confidence = low_confidence;
        self
    }
}

/// First `MAX_NAMED` items joined for a sentence, noting how many were left out
pub fn name_list(items: &[String]) -> String {
    let shown = items.iter().take(MAX_NAMED).cloned().collect::<Vec<_>>().join(", ");
    if items.len() > MAX_NAMED {
        format!("{} and {} more", shown, items.len() - MAX_NAMED)
    } else {
        shown
    }
}
