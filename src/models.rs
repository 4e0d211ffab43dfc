//! Core data models for solidscan
//!
//! These models flow one way through the system: rules create
//! [`Violation`]s, agents fold them into an [`AgentReport`], and the
//! orchestrator merges every agent report into a [`ComprehensiveReport`].
//! Nothing here is mutated after creation, only filtered or grouped.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Severity levels for violations
///
/// Ordering is meaningful: `Critical > High > Medium > Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities, most severe first
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!(
                "Unknown severity '{}'. Valid severities: critical, high, medium, low",
                other
            )),
        }
    }
}

/// Illustrative before/after snippet attached to a violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleCode {
    pub before: String,
    pub after: String,
}

/// One detected issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub severity: Severity,
    /// Free-text classifier (rule id, principle or pattern name)
    pub principle: String,
    /// `path[:qualifier]`; the qualifier is opaque
    pub location: String,
    pub description: String,
    pub recommendation: String,
    #[serde(default)]
    pub documentation_reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_code: Option<ExampleCode>,
}

impl Violation {
    /// File portion of the location (everything before the first `:`)
    pub fn file(&self) -> &str {
        self.location
            .split_once(':')
            .map(|(file, _)| file)
            .unwrap_or(&self.location)
    }
}

/// Counts of violations per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn from_violations(violations: &[Violation]) -> Self {
        let mut counts = Self::default();
        for v in violations {
            match v.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// One agent's findings across a file set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReport {
    pub agent: String,
    pub files_analyzed: usize,
    /// File-input order, then rule declaration order
    pub violations: Vec<Violation>,
    /// 0-100, sum of weights of rules with zero violations
    pub compliance_score: u8,
    pub recommendations: Vec<String>,
    /// Deduplicated, first-seen order
    pub references: Vec<String>,
}

/// Rough effort estimate attached to a prioritized recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Effort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effort::Low => write!(f, "low"),
            Effort::Medium => write!(f, "medium"),
            Effort::High => write!(f, "high"),
        }
    }
}

/// Remediation entry produced by the recommendation cascade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedRecommendation {
    pub priority: u8,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub estimated_effort: Effort,
    pub affected_files: Vec<String>,
}

/// Cross-agent summary numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_files: usize,
    pub total_violations: usize,
    pub overall_compliance: u8,
    pub critical_issues: usize,
    pub high_issues: usize,
    pub medium_issues: usize,
    pub low_issues: usize,
}

/// Cross-agent aggregate report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveReport {
    pub summary: ReportSummary,
    /// Fixed enumeration order of agents
    pub agent_reports: Vec<AgentReport>,
    pub violations: Vec<Violation>,
    pub recommendations: Vec<PrioritizedRecommendation>,
    pub references: Vec<String>,
}

impl ComprehensiveReport {
    /// A display view keeping only violations whose severity is listed.
    ///
    /// Summary counts, scores and recommendations are left untouched: the
    /// filter narrows what a sink shows, never what was measured.
    pub fn filtered(&self, severities: &[Severity]) -> ComprehensiveReport {
        if severities.is_empty() {
            return self.clone();
        }
        let keep = |v: &Violation| severities.contains(&v.severity);
        let mut view = self.clone();
        view.violations.retain(|v| keep(v));
        for report in &mut view.agent_reports {
            report.violations.retain(|v| keep(v));
        }
        view
    }
}
