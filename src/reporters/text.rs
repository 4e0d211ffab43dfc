//! Console reporter with colors and formatting

use crate::models::{
    AgentReport, ComprehensiveReport, PrioritizedRecommendation, Severity, Violation,
};
use anyhow::Result;
use chrono::Local;
use console::{style, StyledObject};

const RULE: &str = "──────────────────────────────────────";

/// Severity tag
fn severity_tag(severity: Severity) -> StyledObject<&'static str> {
    match severity {
        Severity::Critical => style("[C]").red().bold(),
        Severity::High => style("[H]").red(),
        Severity::Medium => style("[M]").yellow(),
        Severity::Low => style("[L]").blue(),
    }
}

fn score_style(score: u8) -> StyledObject<String> {
    let text = format!("{:>3}%", score);
    if score >= 80 {
        style(text).green()
    } else if score >= 60 {
        style(text).yellow()
    } else {
        style(text).red()
    }
}

/// Render report as formatted terminal output
pub fn render(report: &ComprehensiveReport) -> Result<String> {
    let mut out = String::new();
    let summary = &report.summary;

    // Header
    out.push_str(&format!("\n{}\n", style("Solidscan Analysis").bold()));
    out.push_str(&format!(
        "{}\n",
        style(Local::now().format("%Y-%m-%d %H:%M:%S")).dim()
    ));
    out.push_str(&format!("{}\n", style(RULE).dim()));
    out.push_str(&format!(
        "Compliance: {}  Files: {}  Violations: {}\n\n",
        score_style(summary.overall_compliance).bold(),
        summary.total_files,
        summary.total_violations
    ));

    // Per-agent scores
    if !report.agent_reports.is_empty() {
        out.push_str(&format!("{}\n", style("AGENTS").bold()));
        for agent in &report.agent_reports {
            out.push_str(&format!(
                "  {:<20} {}  {} violation(s)\n",
                agent.agent,
                score_style(agent.compliance_score),
                agent.violations.len()
            ));
        }
        out.push('\n');
    }

    // Severity counts
    let mut parts = Vec::new();
    if summary.critical_issues > 0 {
        parts.push(style(format!("{} critical", summary.critical_issues)).red().bold().to_string());
    }
    if summary.high_issues > 0 {
        parts.push(style(format!("{} high", summary.high_issues)).red().to_string());
    }
    if summary.medium_issues > 0 {
        parts.push(style(format!("{} medium", summary.medium_issues)).yellow().to_string());
    }
    if summary.low_issues > 0 {
        parts.push(style(format!("{} low", summary.low_issues)).blue().to_string());
    }
    out.push_str(&format!(
        "{} ({} total)\n",
        style("VIOLATIONS").bold(),
        summary.total_violations
    ));
    if !parts.is_empty() {
        out.push_str(&format!("  {}\n", parts.join(" | ")));
    }
    out.push('\n');

    for agent in &report.agent_reports {
        render_agent(&mut out, agent);
    }

    if !report.recommendations.is_empty() {
        out.push_str(&format!("{}\n", style("RECOMMENDATIONS").bold()));
        for rec in &report.recommendations {
            render_recommendation(&mut out, rec);
        }
        out.push('\n');
    }

    if !report.references.is_empty() {
        out.push_str(&format!("{}\n", style("REFERENCES").bold()));
        for reference in &report.references {
            out.push_str(&format!("  {}\n", style(reference).dim()));
        }
    }

    Ok(out)
}

fn render_agent(out: &mut String, agent: &AgentReport) {
    if agent.violations.is_empty() {
        return;
    }
    out.push_str(&format!("{}\n", style(&agent.agent).cyan().bold()));
    for v in &agent.violations {
        render_violation(out, v);
    }
    for line in &agent.recommendations {
        out.push_str(&format!("  {}\n", line));
    }
    out.push('\n');
}

fn render_violation(out: &mut String, v: &Violation) {
    out.push_str(&format!(
        "  {} {:<8} {}\n",
        severity_tag(v.severity),
        v.principle,
        style(&v.location).dim()
    ));
    out.push_str(&format!("      {}\n", v.description));
    out.push_str(&format!("      {} {}\n", style("→").dim(), v.recommendation));
}

fn render_recommendation(out: &mut String, rec: &PrioritizedRecommendation) {
    out.push_str(&format!(
        "  P{} {} {} {}\n",
        rec.priority,
        severity_tag(rec.severity),
        rec.title,
        style(format!("(effort: {})", rec.estimated_effort)).dim()
    ));
    out.push_str(&format!("      {}\n", rec.description));
    if !rec.affected_files.is_empty() {
        out.push_str(&format!(
            "      {}\n",
            style(rec.affected_files.join(", ")).dim()
        ));
    }
}
