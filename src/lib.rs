//! Solidscan - heuristic design-principle analysis
//!
//! Seven agents (SOLID, Clean Architecture, Clean Code, design patterns,
//! test quality, package design, refactoring) scan source files with
//! lightweight text heuristics. The [`orchestrator::Orchestrator`] runs the
//! enabled agents over one file set and merges their reports into a
//! scored, prioritized [`models::ComprehensiveReport`].
//!
//! ```no_run
//! use solidscan::orchestrator::{AnalysisOptions, Orchestrator};
//! use std::path::PathBuf;
//!
//! let report = Orchestrator::new(&AnalysisOptions::default())
//!     .analyze(&[PathBuf::from("src/order_service.py")])?;
//! println!("{}% compliant", report.summary.overall_compliance);
//! # Ok::<(), solidscan::error::AnalysisError>(())
//! ```

pub mod agents;
pub mod cli;
pub mod config;
pub mod detectors;
pub mod error;
pub mod files;
pub mod knowledge;
mod mcp;
pub mod models;
pub mod orchestrator;
pub mod reporters;
pub mod scoring;
