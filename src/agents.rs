//! Analysis agents
//!
//! An agent is a fixed, ordered table of rules addressing one quality
//! dimension. It reads every input file once, runs each rule on each file,
//! and folds the results into one [`AgentReport`].

use crate::detectors::{
    architecture, clean_code, package_design, patterns, refactoring, solid, testing,
    ProjectIndex, Rule, RuleInput,
};
use crate::error::{AnalysisError, AnalysisResult};
use crate::files::SourceReader;
use crate::knowledge::KnowledgeBase;
use crate::models::{AgentReport, Violation};
use crate::scoring::{agent_recommendations, compliance_score};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// The seven agents, in their fixed enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AgentKind {
    Solid,
    Architecture,
    CleanCode,
    Patterns,
    Testing,
    PackageDesign,
    Refactoring,
}

impl AgentKind {
    pub const ALL: [AgentKind; 7] = [
        AgentKind::Solid,
        AgentKind::Architecture,
        AgentKind::CleanCode,
        AgentKind::Patterns,
        AgentKind::Testing,
        AgentKind::PackageDesign,
        AgentKind::Refactoring,
    ];

    /// Option key (`cleanCode`, `packageDesign`, ...)
    pub fn key(&self) -> &'static str {
        match self {
            AgentKind::Solid => "solid",
            AgentKind::Architecture => "architecture",
            AgentKind::CleanCode => "cleanCode",
            AgentKind::Patterns => "patterns",
            AgentKind::Testing => "testing",
            AgentKind::PackageDesign => "packageDesign",
            AgentKind::Refactoring => "refactoring",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentKind::Solid => "SOLID",
            AgentKind::Architecture => "Clean Architecture",
            AgentKind::CleanCode => "Clean Code",
            AgentKind::Patterns => "Design Patterns",
            AgentKind::Testing => "Test Quality",
            AgentKind::PackageDesign => "Package Design",
            AgentKind::Refactoring => "Refactoring",
        }
    }

    /// Accepts camelCase, snake_case and kebab-case keys, case-insensitively.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized: String = key
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.key().to_lowercase() == normalized)
    }

    /// Rule table, in declaration order
    pub fn rules(&self) -> &'static [Rule] {
        match self {
            AgentKind::Solid => solid::RULES,
            AgentKind::Architecture => architecture::RULES,
            AgentKind::CleanCode => clean_code::RULES,
            AgentKind::Patterns => patterns::RULES,
            AgentKind::Testing => testing::RULES,
            AgentKind::PackageDesign => package_design::RULES,
            AgentKind::Refactoring => refactoring::RULES,
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AgentKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentKind::from_key(s).ok_or_else(|| AnalysisError::UnknownAgent(s.trim().to_string()))
    }
}

/// One agent bound to its rules and the shared knowledge base
pub struct Agent {
    kind: AgentKind,
    rules: &'static [Rule],
    kb: Arc<KnowledgeBase>,
}

impl Agent {
    pub fn new(kind: AgentKind, kb: Arc<KnowledgeBase>) -> Self {
        Self {
            kind,
            rules: kind.rules(),
            kb,
        }
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Analyze `paths` and build this agent's report.
    ///
    /// Any unreadable file aborts the whole run for this agent; no partial
    /// report is produced.
    pub fn analyze(
        &self,
        reader: &dyn SourceReader,
        paths: &[PathBuf],
    ) -> AnalysisResult<AgentReport> {
        let start = Instant::now();
        info!(
            "Running {} agent ({} rules) on {} files",
            self.kind.display_name(),
            self.rules.len(),
            paths.len()
        );

        let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        let contents = self.read_all(reader, paths, &names)?;

        let project = self.rules.iter().any(|r| r.cross_file).then(|| {
            ProjectIndex::build(
                names
                    .iter()
                    .map(String::as_str)
                    .zip(contents.iter().map(String::as_str)),
            )
        });

        let references: Vec<String> = self
            .rules
            .iter()
            .map(|rule| self.kb.reference_for(rule.id))
            .collect();

        let mut counts = vec![0usize; self.rules.len()];
        let mut violations: Vec<Violation> = Vec::new();
        for (name, content) in names.iter().zip(&contents) {
            let mut input = RuleInput::new(name, content, &names);
            if let Some(project) = &project {
                input = input.with_project(project);
            }
            for (i, rule) in self.rules.iter().enumerate() {
                let found = rule.run(&input);
                if !found.is_empty() {
                    debug!("{} found {} violation(s) in {}", rule.id, found.len(), name);
                }
                counts[i] += found.len();
                violations.extend(found.into_iter().map(|mut v| {
                    v.documentation_reference = references[i].clone();
                    v
                }));
            }
        }

        let mut seen_references: Vec<String> = Vec::new();
        for v in &violations {
            if !v.documentation_reference.is_empty()
                && !seen_references.contains(&v.documentation_reference)
            {
                seen_references.push(v.documentation_reference.clone());
            }
        }

        let report = AgentReport {
            agent: self.kind.display_name().to_string(),
            files_analyzed: paths.len(),
            compliance_score: compliance_score(self.rules, &counts),
            recommendations: agent_recommendations(self.kind.display_name(), &violations),
            references: seen_references,
            violations,
        };
        info!(
            "{} agent: {} violation(s), {}% compliant in {:?}",
            self.kind.display_name(),
            report.violations.len(),
            report.compliance_score,
            start.elapsed()
        );
        Ok(report)
    }

    /// Read every file up front. The failure names the first rule, since
    /// no rule of this agent can run without the file.
    fn read_all(
        &self,
        reader: &dyn SourceReader,
        paths: &[PathBuf],
        names: &[String],
    ) -> AnalysisResult<Vec<String>> {
        let detector = self
            .rules
            .first()
            .map(|r| r.id)
            .unwrap_or(self.kind.display_name());
        paths
            .iter()
            .zip(names)
            .map(|(path, name)| {
                reader.read(path).map_err(|e| AnalysisError::DetectorFailed {
                    detector: detector.to_string(),
                    cause: format!("failed to read {}: {}", name, e),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::MemorySources;
    use crate::models::Severity;

    const ORDER_SERVICE: &str = r#"import sqlite3

class OrderService:
    def __init__(self):
        self.db = sqlite3.connect('orders.db')

    def process(self, order_type, total):
        if order_type == 'premium':
            total = total * 0.9
        elif order_type == 'regular':
            total = total * 0.95
        elif order_type == 'wholesale':
            total = total * 0.8
        self.db.execute('INSERT INTO orders VALUES (?)', (total,))
        send_email(total)
        return json.dumps({'total': total})
"#;

    fn agent(kind: AgentKind, sources: Arc<MemorySources>) -> Agent {
        Agent::new(kind, Arc::new(KnowledgeBase::new("kb", sources)))
    }

    #[test]
    fn test_from_key_variants() {
        assert_eq!(AgentKind::from_key("cleanCode"), Some(AgentKind::CleanCode));
        assert_eq!(AgentKind::from_key("clean_code"), Some(AgentKind::CleanCode));
        assert_eq!(AgentKind::from_key("package-design"), Some(AgentKind::PackageDesign));
        assert_eq!(AgentKind::from_key("SOLID"), Some(AgentKind::Solid));
        assert_eq!(AgentKind::from_key("lint"), None);
        assert!(matches!(
            "lint".parse::<AgentKind>(),
            Err(AnalysisError::UnknownAgent(name)) if name == "lint"
        ));
    }

    #[test]
    fn test_rule_weights_sum_to_100() {
        for kind in AgentKind::ALL {
            let total: u32 = kind.rules().iter().map(|r| r.weight as u32).sum();
            assert_eq!(total, 100, "{} weights", kind.key());
        }
    }

    #[test]
    fn test_solid_report_scores_silent_rules_only() {
        let sources = Arc::new(MemorySources::new([("svc/order.py", ORDER_SERVICE)]));
        let report = agent(AgentKind::Solid, Arc::clone(&sources))
            .analyze(sources.as_ref(), &[PathBuf::from("svc/order.py")])
            .unwrap();

        let principles: Vec<&str> = report
            .violations
            .iter()
            .map(|v| v.principle.as_str())
            .collect();
        assert_eq!(principles, vec!["SRP", "OCP", "DIP"]);
        // LSP 20 + ISP 15
        assert_eq!(report.compliance_score, 35);
        assert_eq!(report.agent, "SOLID");
        assert_eq!(report.files_analyzed, 1);
        assert!(report.recommendations[0].starts_with("⚠️"));
    }

    #[test]
    fn test_violations_follow_file_then_rule_order() {
        let sources = Arc::new(MemorySources::new([
            ("b.js", "try { a(); } catch (e) {}\nlet q = 1;\n"),
            ("a.js", "let q = 1;\n"),
        ]));
        let paths = [PathBuf::from("b.js"), PathBuf::from("a.js")];
        let report = agent(AgentKind::CleanCode, Arc::clone(&sources))
            .analyze(sources.as_ref(), &paths)
            .unwrap();
        let locations: Vec<&str> = report.violations.iter().map(|v| v.location.as_str()).collect();
        assert_eq!(locations, vec!["b.js:2", "b.js:1", "a.js:1"]);
        assert_eq!(report.violations[1].severity, Severity::Critical);
    }

    #[test]
    fn test_documentation_reference_from_knowledge_base() {
        let sources = Arc::new(
            MemorySources::new([("svc/order.py", ORDER_SERVICE)]).with_file("kb/srp.md", "# SRP"),
        );
        let report = agent(AgentKind::Solid, Arc::clone(&sources))
            .analyze(sources.as_ref(), &[PathBuf::from("svc/order.py")])
            .unwrap();
        let srp = report.violations.iter().find(|v| v.principle == "SRP").unwrap();
        assert!(srp.documentation_reference.ends_with("srp.md"));
        let dip = report.violations.iter().find(|v| v.principle == "DIP").unwrap();
        assert_eq!(dip.documentation_reference, "");
        assert_eq!(report.references, vec![srp.documentation_reference.clone()]);
    }

    #[test]
    fn test_unreadable_file_fails_the_whole_agent() {
        let sources = Arc::new(MemorySources::new([("ok.py", "x = 1\n")]));
        let err = agent(AgentKind::Solid, Arc::clone(&sources))
            .analyze(
                sources.as_ref(),
                &[PathBuf::from("ok.py"), PathBuf::from("missing.py")],
            )
            .unwrap_err();
        let message = err.to_string();
        assert!(
            message.starts_with("SRP validation failed: failed to read missing.py"),
            "{}",
            message
        );
    }

    #[test]
    fn test_clean_input_is_fully_compliant() {
        let sources = Arc::new(MemorySources::new([(
            "money.py",
            "def add(left, right):\n    return left + right\n",
        )]));
        let report = agent(AgentKind::Solid, Arc::clone(&sources))
            .analyze(sources.as_ref(), &[PathBuf::from("money.py")])
            .unwrap();
        assert_eq!(report.compliance_score, 100);
        assert!(report.violations.is_empty());
        assert_eq!(
            report.recommendations,
            vec!["✅ Code is fully compliant with SOLID principles"]
        );
    }

    #[test]
    fn test_package_design_uses_every_file() {
        let sources = Arc::new(MemorySources::new([
            ("src/a/x.ts", "import { y } from '../b/y';\n"),
            ("src/b/y.ts", "import { x } from '../a/x';\n"),
        ]));
        let paths = [PathBuf::from("src/a/x.ts"), PathBuf::from("src/b/y.ts")];
        let report = agent(AgentKind::PackageDesign, Arc::clone(&sources))
            .analyze(sources.as_ref(), &paths)
            .unwrap();
        let adp = report.violations.iter().filter(|v| v.principle == "ADP").count();
        assert_eq!(adp, 2);
        assert!(report.compliance_score <= 70);
    }
}
