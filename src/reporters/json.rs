//! JSON reporter
//!
//! Outputs the full ComprehensiveReport as pretty-printed JSON.

use crate::models::ComprehensiveReport;
use anyhow::Result;

/// Render report as JSON
pub fn render(report: &ComprehensiveReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
