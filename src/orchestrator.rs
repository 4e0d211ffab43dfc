//! Orchestrator: runs the enabled agents over one file set and merges
//! their reports.
//!
//! Agents share nothing mutable, so they run in parallel on rayon. Results
//! are collected back in the fixed agent order; when several agents fail,
//! the error of the earliest agent in that order is the one returned.

use crate::agents::{Agent, AgentKind};
use crate::error::{AnalysisError, AnalysisResult};
use crate::files::{FsReader, SourceReader};
use crate::knowledge::{KnowledgeBase, DEFAULT_KB_PATH};
use crate::models::{
    AgentReport, ComprehensiveReport, ReportSummary, Severity, SeverityCounts, Violation,
};
use crate::scoring::{overall_compliance, prioritize};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Progress callback: (agent name, agents finished, agents total)
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Per-agent switch. `Unspecified` resolves to enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentToggle {
    Enabled,
    Disabled,
    #[default]
    Unspecified,
}

impl From<bool> for AgentToggle {
    fn from(enabled: bool) -> Self {
        if enabled {
            AgentToggle::Enabled
        } else {
            AgentToggle::Disabled
        }
    }
}

impl AgentToggle {
    pub fn is_enabled(self) -> bool {
        !matches!(self, AgentToggle::Disabled)
    }
}

/// Which agents to run, one toggle per agent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentSelection {
    toggles: BTreeMap<AgentKind, AgentToggle>,
}

impl AgentSelection {
    /// Every agent runs
    pub fn all() -> Self {
        Self::default()
    }

    /// Programmatic form: agents not mentioned stay enabled, only an
    /// explicit `false` disables one.
    pub fn opt_out(flags: impl IntoIterator<Item = (AgentKind, bool)>) -> Self {
        let mut selection = Self::default();
        for (kind, enabled) in flags {
            selection.set(kind, enabled.into());
        }
        selection
    }

    /// Command-line form: exactly the listed agents run.
    pub fn opt_in(kinds: impl IntoIterator<Item = AgentKind>) -> Self {
        let mut selection = Self::opt_out(AgentKind::ALL.into_iter().map(|k| (k, false)));
        for kind in kinds {
            selection.set(kind, AgentToggle::Enabled);
        }
        selection
    }

    /// Parse a comma-separated `--agents` list into an opt-in selection.
    pub fn parse_list(list: &str) -> AnalysisResult<Self> {
        let kinds = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<AgentKind>)
            .collect::<AnalysisResult<Vec<_>>>()?;
        if kinds.is_empty() {
            return Err(AnalysisError::UnknownAgent(list.trim().to_string()));
        }
        Ok(Self::opt_in(kinds))
    }

    pub fn set(&mut self, kind: AgentKind, toggle: AgentToggle) {
        self.toggles.insert(kind, toggle);
    }

    pub fn toggle(&self, kind: AgentKind) -> AgentToggle {
        self.toggles.get(&kind).copied().unwrap_or_default()
    }

    /// Enabled agents, in the fixed agent order
    pub fn resolve(&self) -> Vec<AgentKind> {
        AgentKind::ALL
            .into_iter()
            .filter(|kind| self.toggle(*kind).is_enabled())
            .collect()
    }
}

/// Options for one analysis run
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub agents: AgentSelection,
    /// Knowledge-base root; `../docs/specs` when unset
    pub knowledge_base_path: Option<PathBuf>,
    /// Severities a sink should display. Never consulted by scoring.
    pub severity: Vec<Severity>,
}

pub struct Orchestrator {
    enabled: Vec<AgentKind>,
    reader: Arc<dyn SourceReader>,
    kb: Arc<KnowledgeBase>,
    severity: Vec<Severity>,
    progress_callback: Option<ProgressCallback>,
}

impl Orchestrator {
    /// Orchestrator reading from disk
    pub fn new(options: &AnalysisOptions) -> Self {
        Self::with_reader(options, Arc::new(FsReader))
    }

    pub fn with_reader(options: &AnalysisOptions, reader: Arc<dyn SourceReader>) -> Self {
        let root = options
            .knowledge_base_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KB_PATH));
        let kb = Arc::new(KnowledgeBase::new(root, Arc::clone(&reader)));
        Self {
            enabled: options.agents.resolve(),
            reader,
            kb,
            severity: options.severity.clone(),
            progress_callback: None,
        }
    }

    /// Share an existing knowledge base (and its cache) with this orchestrator
    pub fn with_knowledge_base(mut self, kb: Arc<KnowledgeBase>) -> Self {
        self.kb = kb;
        self
    }

    /// Set progress callback
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn enabled_agents(&self) -> &[AgentKind] {
        &self.enabled
    }

    pub fn knowledge_base(&self) -> &Arc<KnowledgeBase> {
        &self.kb
    }

    /// Display filter requested by the caller
    pub fn severity_filter(&self) -> &[Severity] {
        &self.severity
    }

    /// Run every enabled agent over `paths` and merge the results.
    pub fn analyze(&self, paths: &[PathBuf]) -> AnalysisResult<ComprehensiveReport> {
        let start = Instant::now();
        let total = self.enabled.len();
        info!(
            "Starting analysis with {} agents on {} files...",
            total,
            paths.len()
        );

        let completed = AtomicUsize::new(0);
        let results: Vec<AnalysisResult<AgentReport>> = self
            .enabled
            .par_iter()
            .map(|kind| {
                let agent = Agent::new(*kind, Arc::clone(&self.kb));
                let result = agent.analyze(self.reader.as_ref(), paths);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(ref callback) = self.progress_callback {
                    callback(kind.display_name(), done, total);
                }
                result
            })
            .collect();

        let agent_reports = results
            .into_iter()
            .collect::<AnalysisResult<Vec<AgentReport>>>()?;
        let report = merge(agent_reports, paths.len());

        info!(
            "Analysis complete: {} violations, {}% overall compliance in {:?}",
            report.summary.total_violations,
            report.summary.overall_compliance,
            start.elapsed()
        );
        Ok(report)
    }
}

/// Pool agent reports into the comprehensive report
fn merge(agent_reports: Vec<AgentReport>, total_files: usize) -> ComprehensiveReport {
    let violations: Vec<Violation> = agent_reports
        .iter()
        .flat_map(|r| r.violations.iter().cloned())
        .collect();
    let counts = SeverityCounts::from_violations(&violations);

    let mut references: Vec<String> = Vec::new();
    for reference in agent_reports.iter().flat_map(|r| &r.references) {
        if !references.contains(reference) {
            references.push(reference.clone());
        }
    }

    ComprehensiveReport {
        summary: ReportSummary {
            total_files,
            total_violations: violations.len(),
            overall_compliance: overall_compliance(&agent_reports),
            critical_issues: counts.critical,
            high_issues: counts.high,
            medium_issues: counts.medium,
            low_issues: counts.low,
        },
        recommendations: prioritize(&violations, agent_reports.len()),
        agent_reports,
        violations,
        references,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::MemorySources;

    const LEGACY: &str = r#"class ReportJob {
  run(kind) {
    try { this.load(); } catch (e) {}
    try { this.save(); } catch (err) {}
    if (kind === 'pdf') { return 1; }
    else if (kind === 'csv') { return 2; }
    else if (kind === 'xml') { return 3; }
  }
}
"#;

    fn orchestrator(options: &AnalysisOptions, sources: &Arc<MemorySources>) -> Orchestrator {
        let reader: Arc<dyn SourceReader> = sources.clone();
        Orchestrator::with_reader(options, reader)
    }

    fn sources() -> Arc<MemorySources> {
        Arc::new(MemorySources::new([
            ("src/jobs/report.js", LEGACY),
            ("src/util/add.js", "export function add(left, right) {\n  return left + right;\n}\n"),
        ]))
    }

    fn paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from("src/jobs/report.js"),
            PathBuf::from("src/util/add.js"),
        ]
    }

    #[test]
    fn test_default_options_run_every_agent() {
        let sources = sources();
        let report = orchestrator(&AnalysisOptions::default(), &sources)
            .analyze(&paths())
            .unwrap();
        let agents: Vec<&str> = report.agent_reports.iter().map(|r| r.agent.as_str()).collect();
        let expected: Vec<&str> = AgentKind::ALL.iter().map(|k| k.display_name()).collect();
        assert_eq!(agents, expected);
        assert_eq!(report.summary.total_files, 2);
    }

    #[test]
    fn test_explicit_false_disables_only_that_agent() {
        let options = AnalysisOptions {
            agents: AgentSelection::opt_out([(AgentKind::Solid, false)]),
            ..Default::default()
        };
        let sources = sources();
        let orch = orchestrator(&options, &sources);
        assert_eq!(orch.enabled_agents().len(), 6);
        assert!(!orch.enabled_agents().contains(&AgentKind::Solid));

        let explicit_true = AgentSelection::opt_out([(AgentKind::Testing, true)]);
        assert_eq!(explicit_true.resolve().len(), 7);
    }

    #[test]
    fn test_opt_in_list_runs_only_listed_agents() {
        let selection = AgentSelection::parse_list("clean_code, packageDesign").unwrap();
        assert_eq!(
            selection.resolve(),
            vec![AgentKind::CleanCode, AgentKind::PackageDesign]
        );
        assert_eq!(selection.toggle(AgentKind::Solid), AgentToggle::Disabled);
        assert!(matches!(
            AgentSelection::parse_list("solid,nope"),
            Err(AnalysisError::UnknownAgent(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_empty_agent_list_is_rejected() {
        for list in ["", ",", " , "] {
            assert!(
                matches!(AgentSelection::parse_list(list), Err(AnalysisError::UnknownAgent(_))),
                "accepted {:?}",
                list
            );
        }
    }

    #[test]
    fn test_no_agents_is_vacuously_compliant() {
        let options = AnalysisOptions {
            agents: AgentSelection::opt_in([]),
            ..Default::default()
        };
        let sources = sources();
        let report = orchestrator(&options, &sources).analyze(&[]).unwrap();
        assert_eq!(report.summary.overall_compliance, 100);
        assert_eq!(report.summary.total_violations, 0);
        assert!(report.agent_reports.is_empty());
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_severity_counts_pool_every_agent() {
        let sources = sources();
        let report = orchestrator(&AnalysisOptions::default(), &sources)
            .analyze(&paths())
            .unwrap();
        let pooled: usize = report
            .agent_reports
            .iter()
            .flat_map(|r| &r.violations)
            .filter(|v| v.severity == Severity::Critical)
            .count();
        assert_eq!(report.summary.critical_issues, pooled);
        assert_eq!(report.summary.critical_issues, 2);
        assert_eq!(
            report.summary.total_violations,
            report.agent_reports.iter().map(|r| r.violations.len()).sum::<usize>()
        );

        let scores: u32 = report
            .agent_reports
            .iter()
            .map(|r| r.compliance_score as u32)
            .sum();
        let expected = (scores as f64 / 7.0).round() as u8;
        assert_eq!(report.summary.overall_compliance, expected);
    }

    #[test]
    fn test_recommendation_cascade_in_comprehensive_run() {
        let sources = sources();
        let report = orchestrator(&AnalysisOptions::default(), &sources)
            .analyze(&paths())
            .unwrap();
        let first = &report.recommendations[0];
        assert_eq!(first.priority, 1);
        assert_eq!(first.affected_files, vec!["src/jobs/report.js"]);
        assert!(report.recommendations.iter().all(|r| r.priority != 3));
    }

    #[test]
    fn test_single_agent_run_suggests_full_analysis() {
        let options = AnalysisOptions {
            agents: AgentSelection::opt_in([AgentKind::Patterns]),
            ..Default::default()
        };
        let sources = sources();
        let report = orchestrator(&options, &sources).analyze(&paths()).unwrap();
        let last = report.recommendations.last().unwrap();
        assert_eq!(last.priority, 3);
    }

    #[test]
    fn test_identical_inputs_give_identical_reports() {
        let sources = sources();
        let orch = orchestrator(&AnalysisOptions::default(), &sources);
        let first = serde_json::to_string(&orch.analyze(&paths()).unwrap()).unwrap();
        let second = serde_json::to_string(&orch.analyze(&paths()).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_each_agent_reads_each_file_once() {
        let sources = sources();
        orchestrator(&AnalysisOptions::default(), &sources)
            .analyze(&paths())
            .unwrap();
        assert_eq!(sources.reads(), 7 * 2);
    }

    #[test]
    fn test_missing_file_aborts_the_run() {
        let sources = sources();
        let mut files = paths();
        files.push(PathBuf::from("src/gone.js"));
        let err = orchestrator(&AnalysisOptions::default(), &sources)
            .analyze(&files)
            .unwrap_err();
        assert!(
            err.to_string()
                .starts_with("SRP validation failed: failed to read src/gone.js"),
            "first agent in order reports: {}",
            err
        );
    }

    #[test]
    fn test_progress_callback_sees_every_agent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let sources = sources();
        let orch = orchestrator(&AnalysisOptions::default(), &sources).with_progress_callback(
            Box::new(move |_, done, total| {
                assert!(done <= total);
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );
        orch.analyze(&paths()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_references_are_deduplicated_across_agents() {
        let reports = vec![
            AgentReport {
                agent: "A".into(),
                files_analyzed: 1,
                violations: Vec::new(),
                compliance_score: 100,
                recommendations: Vec::new(),
                references: vec!["kb/srp.md".into(), "kb/ocp.md".into()],
            },
            AgentReport {
                agent: "B".into(),
                files_analyzed: 1,
                violations: Vec::new(),
                compliance_score: 50,
                recommendations: Vec::new(),
                references: vec!["kb/ocp.md".into(), "kb/naming.md".into()],
            },
        ];
        let report = merge(reports, 1);
        assert_eq!(
            report.references,
            vec!["kb/srp.md", "kb/ocp.md", "kb/naming.md"]
        );
        assert_eq!(report.summary.overall_compliance, 75);
    }
}
