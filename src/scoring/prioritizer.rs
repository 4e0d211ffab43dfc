//! Recommendation cascade and agent-level advice lines

use crate::models::{Effort, PrioritizedRecommendation, Severity, SeverityCounts, Violation};
use std::cmp::Reverse;

const CRITICAL_EFFORT_THRESHOLD: usize = 5;
const HIGH_EFFORT_THRESHOLD: usize = 10;

/// Distinct file portions of `location`, first-seen order
fn affected_files<'a>(violations: impl Iterator<Item = &'a Violation>) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    for v in violations {
        let file = v.file();
        if !files.iter().any(|f| f == file) {
            files.push(file.to_string());
        }
    }
    files
}

fn effort_for(count: usize, threshold: usize) -> Effort {
    if count > threshold {
        Effort::High
    } else {
        Effort::Medium
    }
}

/// Build the prioritized recommendation list for a pooled violation set.
pub fn prioritize(violations: &[Violation], agents_run: usize) -> Vec<PrioritizedRecommendation> {
    let mut recommendations = Vec::new();

    let critical: Vec<&Violation> = violations
        .iter()
        .filter(|v| v.severity == Severity::Critical)
        .collect();
    if !critical.is_empty() {
        recommendations.push(PrioritizedRecommendation {
            priority: 1,
            severity: Severity::Critical,
            title: format!("Fix {} critical issue(s) immediately", critical.len()),
            description: "Critical violations can hide failures. Resolve them before other work."
                .to_string(),
            estimated_effort: effort_for(critical.len(), CRITICAL_EFFORT_THRESHOLD),
            affected_files: affected_files(critical.iter().copied()),
        });
    }

    let high: Vec<&Violation> = violations
        .iter()
        .filter(|v| v.severity == Severity::High)
        .collect();
    if !high.is_empty() {
        recommendations.push(PrioritizedRecommendation {
            priority: 2,
            severity: Severity::High,
            title: format!("Address {} high-severity issue(s)", high.len()),
            description: "High-severity violations erode the design. Schedule them soon."
                .to_string(),
            estimated_effort: effort_for(high.len(), HIGH_EFFORT_THRESHOLD),
            affected_files: affected_files(high.iter().copied()),
        });
    }

    if agents_run == 1 {
        recommendations.push(PrioritizedRecommendation {
            priority: 3,
            severity: Severity::Low,
            title: "Run a comprehensive analysis".to_string(),
            description: "Only one agent ran. Run every agent for the full picture.".to_string(),
            estimated_effort: Effort::Low,
            affected_files: Vec::new(),
        });
    }

    recommendations
}

/// Re-sort by priority, then most severe first. Stable.
pub fn sort_by_severity(recommendations: &mut [PrioritizedRecommendation]) {
    recommendations.sort_by_key(|r| (r.priority, Reverse(r.severity)));
}

/// Human-readable advice lines for one agent, most severe first.
pub fn agent_recommendations(agent: &str, violations: &[Violation]) -> Vec<String> {
    let counts = SeverityCounts::from_violations(violations);
    let mut lines = Vec::new();
    if counts.critical > 0 {
        lines.push(format!(
            "🚨 CRITICAL: Fix {} critical violation(s) immediately",
            counts.critical
        ));
    }
    if counts.high > 0 {
        lines.push(format!(
            "⚠️  HIGH: Address {} high-severity violation(s) soon",
            counts.high
        ));
    }
    if counts.medium > 0 {
        lines.push(format!(
            "📋 MEDIUM: Plan fixes for {} medium-severity violation(s)",
            counts.medium
        ));
    }
    if counts.low > 0 {
        lines.push(format!(
            "💡 LOW: Consider {} low-severity improvement(s)",
            counts.low
        ));
    }
    if lines.is_empty() {
        lines.push(format!("✅ Code is fully compliant with {} principles", agent));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(severity: Severity, location: &str) -> Violation {
        Violation {
            severity,
            principle: "X".into(),
            location: location.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_medium_and_low_only_yield_no_top_priorities() {
        let violations = vec![v(Severity::Medium, "a.ts:1"), v(Severity::Low, "b.ts:2")];
        let recs = prioritize(&violations, 7);
        assert!(recs.iter().all(|r| r.priority != 1 && r.priority != 2));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_critical_entry_and_effort_threshold() {
        let five: Vec<Violation> = (0..5)
            .map(|i| v(Severity::Critical, &format!("a.ts:{}", i)))
            .collect();
        let recs = prioritize(&five, 7);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, 1);
        assert_eq!(recs[0].estimated_effort, Effort::Medium);
        assert_eq!(recs[0].affected_files, vec!["a.ts"]);

        let mut six = five.clone();
        six.push(v(Severity::Critical, "b.ts:Order"));
        let recs = prioritize(&six, 7);
        assert_eq!(recs[0].estimated_effort, Effort::High);
        assert_eq!(recs[0].affected_files, vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn test_cascade_order_and_high_threshold() {
        let mut violations: Vec<Violation> = (0..11)
            .map(|i| v(Severity::High, &format!("h{}.py", i % 2)))
            .collect();
        violations.push(v(Severity::Critical, "c.py:3"));
        let recs = prioritize(&violations, 1);
        let priorities: Vec<u8> = recs.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![1, 2, 3]);
        assert_eq!(recs[1].estimated_effort, Effort::High);
        assert_eq!(recs[1].affected_files, vec!["h0.py", "h1.py"]);
        assert!(recs[2].affected_files.is_empty());
    }

    #[test]
    fn test_single_agent_entry_only_for_one_agent() {
        assert_eq!(prioritize(&[], 1).len(), 1);
        assert!(prioritize(&[], 0).is_empty());
        assert!(prioritize(&[], 2).is_empty());
    }

    #[test]
    fn test_sort_by_severity() {
        let mut recs = prioritize(&[v(Severity::High, "a"), v(Severity::Critical, "b")], 1);
        recs.reverse();
        sort_by_severity(&mut recs);
        let order: Vec<Severity> = recs.iter().map(|r| r.severity).collect();
        assert_eq!(order, vec![Severity::Critical, Severity::High, Severity::Low]);
    }

    #[test]
    fn test_agent_recommendations() {
        let lines = agent_recommendations(
            "SOLID",
            &[v(Severity::Low, "a"), v(Severity::Critical, "b")],
        );
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("🚨 CRITICAL"));
        assert!(lines[1].contains("1 low-severity"));

        let clean = agent_recommendations("SOLID", &[]);
        assert_eq!(clean, vec!["✅ Code is fully compliant with SOLID principles"]);
    }
}
