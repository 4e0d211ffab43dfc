//! MCP (Model Context Protocol) Server
//!
//! Exposes the analysis agents to AI assistants via JSON-RPC over stdio.
//!
//! # Usage
//!
//! ```bash
//! solidscan serve --kb docs/specs
//! ```
//!
//! # Client Configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "solidscan": {
//!       "command": "solidscan",
//!       "args": ["serve"]
//!     }
//!   }
//! }
//! ```
//!
//! # Tools
//!
//! - `analyze_solid`, `analyze_architecture`, `analyze_clean_code`,
//!   `suggest_patterns`, `analyze_tests`, `analyze_package_design`,
//!   `suggest_refactorings` - one agent each
//! - `analyze_all` - every agent
//!
//! Every tool takes `files` (paths or globs) and an optional
//! `knowledge_base`, and answers `{agent, complianceScore, violations, summary}`.

mod handlers;
mod server;
mod tools;

pub use server::run_server;
