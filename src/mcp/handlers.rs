//! MCP Tool handlers
//!
//! Every tool wraps one orchestrator run and reshapes the report into
//! `{agent, complianceScore, violations, summary}`.

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::agents::AgentKind;
use crate::cli::expand_patterns;
use crate::error::AnalysisError;
use crate::files::{FsReader, SourceReader};
use crate::knowledge::KnowledgeBase;
use crate::orchestrator::{AgentSelection, AnalysisOptions, Orchestrator};

/// State shared across tool calls
pub struct HandlerState {
    /// Knowledge-base root used when a call does not name one
    pub kb_root: PathBuf,
    reader: Arc<dyn SourceReader>,
    /// Cache for `kb_root`, kept for the life of the server
    default_kb: Arc<KnowledgeBase>,
}

impl HandlerState {
    pub fn new(kb_root: PathBuf) -> Self {
        Self::with_reader(kb_root, Arc::new(FsReader))
    }

    pub fn with_reader(kb_root: PathBuf, reader: Arc<dyn SourceReader>) -> Self {
        let default_kb = Arc::new(KnowledgeBase::new(kb_root.clone(), Arc::clone(&reader)));
        Self {
            kb_root,
            reader,
            default_kb,
        }
    }

    /// Knowledge base for `root`. Only the default root is cached across
    /// calls; any other root gets a fresh base for this call.
    fn knowledge_base(&self, root: &Path) -> Arc<KnowledgeBase> {
        if root == self.kb_root {
            return Arc::clone(&self.default_kb);
        }
        Arc::new(KnowledgeBase::new(root, Arc::clone(&self.reader)))
    }
}

fn file_arguments(args: &Value) -> Result<Vec<String>> {
    let files = args
        .get("files")
        .and_then(|v| v.as_array())
        .context("Missing 'files' argument (array of strings)")?;
    files
        .iter()
        .map(|f| {
            f.as_str()
                .map(String::from)
                .context("'files' entries must be strings")
        })
        .collect()
}

/// Run the agent(s) behind a tool
pub fn handle_analysis(
    state: &mut HandlerState,
    agent: Option<AgentKind>,
    args: &Value,
) -> Result<Value> {
    let paths = expand_patterns(&file_arguments(args)?)?;
    if paths.is_empty() {
        bail!(AnalysisError::NoFiles);
    }

    let kb_root = args
        .get("knowledge_base")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .unwrap_or_else(|| state.kb_root.clone());
    let kb = state.knowledge_base(&kb_root);

    let options = AnalysisOptions {
        agents: match agent {
            Some(kind) => AgentSelection::opt_in([kind]),
            None => AgentSelection::all(),
        },
        knowledge_base_path: Some(kb_root),
        severity: Vec::new(),
    };
    let orchestrator =
        Orchestrator::with_reader(&options, Arc::clone(&state.reader)).with_knowledge_base(kb);
    let report = orchestrator.analyze(&paths)?;

    let (name, score) = match (agent, report.agent_reports.first()) {
        (Some(_), Some(agent_report)) => {
            (agent_report.agent.clone(), agent_report.compliance_score)
        }
        _ => ("All".to_string(), report.summary.overall_compliance),
    };
    info!("MCP analysis '{}' finished: {}% compliant", name, score);

    Ok(json!({
        "agent": name,
        "complianceScore": score,
        "violations": report.violations,
        "summary": report.summary,
    }))
}
