//! Threshold compliance scores

use crate::detectors::Rule;
use crate::models::AgentReport;

/// Sum of the weights of rules that reported nothing.
///
/// `violation_counts[i]` is the number of violations `rules[i]` reported
/// over every file. Missing counts are treated as zero.
pub fn compliance_score(rules: &[Rule], violation_counts: &[usize]) -> u8 {
    let total: u32 = rules
        .iter()
        .enumerate()
        .filter(|(i, _)| violation_counts.get(*i).copied().unwrap_or(0) == 0)
        .map(|(_, rule)| rule.weight as u32)
        .sum();
    total.min(100) as u8
}

/// Mean of the agent scores, rounded. Vacuously 100 when no agent ran.
pub fn overall_compliance(reports: &[AgentReport]) -> u8 {
    if reports.is_empty() {
        return 100;
    }
    let sum: u32 = reports.iter().map(|r| r.compliance_score as u32).sum();
    let mean = sum as f64 / reports.len() as f64;
    mean.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::solid;

    fn report(score: u8) -> AgentReport {
        AgentReport {
            agent: "SOLID".into(),
            files_analyzed: 1,
            violations: Vec::new(),
            compliance_score: score,
            recommendations: Vec::new(),
            references: Vec::new(),
        }
    }

    #[test]
    fn test_all_rules_silent_scores_100() {
        assert_eq!(compliance_score(solid::RULES, &[0, 0, 0, 0, 0]), 100);
    }

    #[test]
    fn test_threshold_law() {
        // SRP 25, OCP 20, LSP 20, ISP 15, DIP 20
        assert_eq!(compliance_score(solid::RULES, &[1, 0, 0, 0, 0]), 75);
        assert_eq!(
            compliance_score(solid::RULES, &[50, 0, 0, 0, 0]),
            75,
            "violation count does not matter"
        );
        assert_eq!(compliance_score(solid::RULES, &[0, 3, 0, 2, 0]), 65);
        assert_eq!(compliance_score(solid::RULES, &[1, 1, 1, 1, 1]), 0);
    }

    #[test]
    fn test_overall_is_rounded_mean() {
        assert_eq!(overall_compliance(&[report(100), report(75)]), 88);
        assert_eq!(overall_compliance(&[report(65), report(80), report(80)]), 75);
        assert_eq!(overall_compliance(&[report(0)]), 0);
    }

    #[test]
    fn test_no_agents_is_vacuously_compliant() {
        assert_eq!(overall_compliance(&[]), 100);
    }
}
