//! Compliance scoring and remediation priorities
//!
//! # Scoring Formula
//!
//! ```text
//! Agent score   = Σ weight(rule)  for every rule with zero violations
//!                 across the whole file set (weights sum to 100)
//!
//! Overall score = round(Σ agent scores / agents run)
//!                 100 when no agent ran
//! ```
//!
//! Scoring is all-or-nothing per rule: one violation or fifty, of any
//! severity, removes the same weight. Severity only drives prioritization.
//!
//! # Recommendation Cascade
//!
//! Evaluated in order, each step adds at most one entry:
//!
//! 1. any critical violation  -> priority 1 (effort high when > 5)
//! 2. any high violation      -> priority 2 (effort high when > 10)
//! 3. exactly one agent ran   -> priority 3, suggest the full analysis
//!
//! The cascade order is the output order. [`sort_by_severity`] re-sorts for
//! callers that want it.

mod compliance;
mod prioritizer;

pub use compliance::{compliance_score, overall_compliance};
pub use prioritizer::{agent_recommendations, prioritize, sort_by_severity};
