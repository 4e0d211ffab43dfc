//! CLI command definitions and handlers

mod files;

pub use files::expand_patterns;

use crate::config::{load_config, ProjectConfig};
use crate::error::AnalysisError;
use crate::files::FsReader;
use crate::knowledge::{KnowledgeBase, DEFAULT_KB_PATH};
use crate::models::Severity;
use crate::orchestrator::{AgentSelection, AnalysisOptions, Orchestrator};
use crate::reporters::{self, OutputFormat};
use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Solidscan - design-principle analysis for source files
#[derive(Parser, Debug)]
#[command(name = "solidscan")]
#[command(
    version,
    about = "Scan source files for SOLID, Clean Architecture, Clean Code and design violations",
    after_help = "\
Examples:
  solidscan 'src/**/*.ts'                         Run every agent
  solidscan --agents=solid,cleanCode src/app.py   Run only the listed agents
  solidscan --format=json 'src/**/*.py'           JSON output for scripting
  solidscan --severity=critical,high 'src/**'     Show only critical and high violations
  solidscan explain SRP                           Print the knowledge-base entry for SRP
  solidscan serve                                 Start the MCP server on stdio

Exit status is 1 when any critical violation is found or the analysis fails."
)]
pub struct Cli {
    /// Files or glob patterns to analyze
    pub files: Vec<String>,

    /// Knowledge-base directory (default: ../docs/specs)
    #[arg(long, global = true)]
    pub kb: Option<PathBuf>,

    /// Comma-separated agents to run (default: all)
    #[arg(long)]
    pub agents: Option<String>,

    /// Output format: console, json, markdown (or md)
    #[arg(long, short = 'f', value_parser = ["console", "text", "json", "markdown", "md"])]
    pub format: Option<String>,

    /// Only show these severities (display filter, does not affect scores)
    #[arg(long, value_delimiter = ',', value_parser = ["critical", "high", "medium", "low"])]
    pub severity: Vec<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        default_value = "warn",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the MCP server (JSON-RPC over stdio)
    Serve,

    /// Print the knowledge-base entry for a principle
    Explain {
        /// Principle or rule id, e.g. SRP or DependencyRule
        principle: String,
    },
}

/// Run the CLI and return the process exit code
pub fn run(cli: Cli) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    let config = load_config(&cwd);
    let kb_root = cli
        .kb
        .clone()
        .or_else(|| config.knowledge_base.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_KB_PATH));

    match cli.command {
        Some(Commands::Serve) => {
            crate::mcp::run_server(kb_root)?;
            Ok(0)
        }
        Some(Commands::Explain { ref principle }) => Ok(explain(&kb_root, principle)),
        None => analyze(&cli, &config, kb_root),
    }
}

fn explain(kb_root: &Path, principle: &str) -> i32 {
    let kb = KnowledgeBase::new(kb_root, Arc::new(FsReader));
    match kb.lookup(principle) {
        Some(doc) => {
            println!("{}", doc);
            0
        }
        None => {
            eprintln!(
                "No documentation for '{}' (looked for {})",
                principle,
                kb.document_path(principle).display()
            );
            1
        }
    }
}

fn analyze(cli: &Cli, config: &ProjectConfig, kb_root: PathBuf) -> Result<i32> {
    let paths = expand_patterns(&cli.files)?;
    if paths.is_empty() {
        return Err(AnalysisError::NoFiles.into());
    }

    let agents = match &cli.agents {
        Some(list) => AgentSelection::parse_list(list)?,
        None => config.agent_selection(),
    };
    let format = match cli.format.as_deref().or(config.format.as_deref()) {
        Some(name) => OutputFormat::from_str(name)?,
        None => OutputFormat::Console,
    };
    let severity = if cli.severity.is_empty() {
        config.severities()
    } else {
        cli.severity
            .iter()
            .map(|s| s.parse::<Severity>().map_err(anyhow::Error::msg))
            .collect::<Result<Vec<_>>>()?
    };

    let options = AnalysisOptions {
        agents,
        knowledge_base_path: Some(kb_root),
        severity,
    };
    let mut orchestrator = Orchestrator::new(&options);

    let spinner = (format == OutputFormat::Console).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(format!("Analyzing {} files...", paths.len()));
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    });
    if let Some(bar) = &spinner {
        let bar = bar.clone();
        orchestrator = orchestrator.with_progress_callback(Box::new(move |name, done, total| {
            bar.set_message(format!("[{}/{}] {}...", done, total, name));
        }));
    }

    let result = orchestrator.analyze(&paths);
    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }
    let report = result?;

    if spinner.is_some() {
        eprintln!(
            "{}Analyzed {} files with {} agents",
            style("✓ ").green(),
            style(report.summary.total_files).cyan(),
            style(orchestrator.enabled_agents().len()).cyan()
        );
    }

    let view = report.filtered(orchestrator.severity_filter());
    let output = reporters::render(&view, format)?;
    print!("{}", output);

    Ok(if report.summary.critical_issues > 0 { 1 } else { 0 })
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .expect("valid template")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analysis_flags() {
        let cli = Cli::try_parse_from([
            "solidscan",
            "--agents=solid,cleanCode",
            "--format=json",
            "--severity=critical,high",
            "src/a.ts",
            "src/b.ts",
        ])
        .unwrap();
        assert_eq!(cli.files, vec!["src/a.ts", "src/b.ts"]);
        assert_eq!(cli.agents.as_deref(), Some("solid,cleanCode"));
        assert_eq!(cli.format.as_deref(), Some("json"));
        assert_eq!(cli.severity, vec!["critical", "high"]);
        assert_eq!(cli.log_level, "warn");
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["solidscan", "explain", "SRP"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Explain { ref principle }) if principle == "SRP"
        ));

        let cli = Cli::try_parse_from(["solidscan", "--kb", "docs", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
        assert_eq!(cli.kb, Some(PathBuf::from("docs")));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["solidscan", "--format=sarif", "a.ts"]).is_err());
    }

    #[test]
    fn test_explain_reads_knowledge_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dependency-rule.md"), "# Dependency Rule\n").unwrap();
        assert_eq!(explain(dir.path(), "DependencyRule"), 0);
        assert_eq!(explain(dir.path(), "OCP"), 1);
    }
}
