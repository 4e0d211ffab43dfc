//! Error types for the analysis core
//!
//! Knowledge-base misses are not errors; they degrade to an empty
//! documentation reference.

use thiserror::Error;

/// Errors that can occur while analyzing a file set
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A rule could not read one of its input files. Aborts the whole run.
    #[error("{detector} validation failed: {cause}")]
    DetectorFailed { detector: String, cause: String },

    #[error("No files specified")]
    NoFiles,

    #[error(
        "Unknown agent '{0}'. Valid agents: solid, architecture, cleanCode, patterns, testing, \
         packageDesign, refactoring"
    )]
    UnknownAgent(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_failure_message() {
        let err = AnalysisError::DetectorFailed {
            detector: "SRP".into(),
            cause: "failed to read missing.ts: No such file".into(),
        };
        assert_eq!(
            err.to_string(),
            "SRP validation failed: failed to read missing.ts: No such file"
        );
    }
}
