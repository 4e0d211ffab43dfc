//! Markdown reporter
//!
//! A deliberately small summary, sized for a pull-request comment.

use crate::models::ComprehensiveReport;
use anyhow::Result;

/// Render the three-line summary
pub fn render(report: &ComprehensiveReport) -> Result<String> {
    let summary = &report.summary;
    Ok(format!(
        "**Files Analyzed:** {}\n**Compliance:** {}%\n**Violations:** {}\n",
        summary.total_files, summary.overall_compliance, summary.total_violations
    ))
}
