//! `solidscan.toml` schema and loading

use crate::agents::AgentKind;
use crate::orchestrator::AgentSelection;
use crate::models::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Project config file name, looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "solidscan.toml";

/// Settings shared by the project and user config files
///
/// ```toml
/// knowledge_base = "docs/principles"
/// format = "json"
/// severity = ["critical", "high"]
///
/// [agents]
/// patterns = false
/// clean_code = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub knowledge_base: Option<PathBuf>,
    pub format: Option<String>,
    pub severity: Option<Vec<String>>,
    /// Opt-out: agents not listed stay enabled
    pub agents: BTreeMap<String, bool>,
}

impl ProjectConfig {
    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: ProjectConfig) {
        if other.knowledge_base.is_some() {
            self.knowledge_base = other.knowledge_base;
        }
        if other.format.is_some() {
            self.format = other.format;
        }
        if other.severity.is_some() {
            self.severity = other.severity;
        }
        self.agents.extend(other.agents);
    }

    /// Agent selection from the `[agents]` table. Unknown names are skipped.
    pub fn agent_selection(&self) -> AgentSelection {
        let flags = self.agents.iter().filter_map(|(name, enabled)| {
            match AgentKind::from_key(name) {
                Some(kind) => Some((kind, *enabled)),
                None => {
                    warn!("Ignoring unknown agent '{}' in config", name);
                    None
                }
            }
        });
        AgentSelection::opt_out(flags)
    }

    /// Parsed severity filter. Unknown names are skipped.
    pub fn severities(&self) -> Vec<Severity> {
        self.severity
            .iter()
            .flatten()
            .filter_map(|name| match name.parse::<Severity>() {
                Ok(severity) => Some(severity),
                Err(e) => {
                    warn!("Ignoring severity in config: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Load `solidscan.toml` from `dir`, or defaults when absent or invalid.
pub fn load_project_config(dir: &Path) -> ProjectConfig {
    load_optional(&dir.join(PROJECT_CONFIG_FILE)).unwrap_or_default()
}

/// Load a config file if it exists. Parse failures are reported and the
/// file is ignored.
pub(crate) fn load_optional(path: &Path) -> Option<ProjectConfig> {
    if !path.exists() {
        return None;
    }
    match load_toml_config(path) {
        Ok(config) => {
            debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            warn!("Failed to load {}: {}", path.display(), e);
            None
        }
    }
}

/// Load configuration from a TOML file
fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let config: ProjectConfig = toml::from_str(
            r#"
knowledge_base = "docs/principles"
format = "markdown"
severity = ["critical", "High"]

[agents]
patterns = false
clean_code = true
"#,
        )
        .unwrap();
        assert_eq!(config.knowledge_base, Some(PathBuf::from("docs/principles")));
        assert_eq!(config.format.as_deref(), Some("markdown"));
        assert_eq!(config.severities(), vec![Severity::Critical, Severity::High]);

        let enabled = config.agent_selection().resolve();
        assert_eq!(enabled.len(), 6);
        assert!(!enabled.contains(&AgentKind::Patterns));
    }

    #[test]
    fn test_unknown_entries_are_skipped() {
        let config: ProjectConfig =
            toml::from_str("severity = [\"info\", \"low\"]\n[agents]\nlint = false\n").unwrap();
        assert_eq!(config.severities(), vec![Severity::Low]);
        assert_eq!(config.agent_selection().resolve().len(), 7);
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base: ProjectConfig = toml::from_str(
            "format = \"json\"\n[agents]\nsolid = false\ntesting = false\n",
        )
        .unwrap();
        let overlay: ProjectConfig =
            toml::from_str("knowledge_base = \"kb\"\n[agents]\ntesting = true\n").unwrap();
        base.merge(overlay);
        assert_eq!(base.format.as_deref(), Some("json"));
        assert_eq!(base.knowledge_base, Some(PathBuf::from("kb")));
        assert_eq!(base.agents.get("solid"), Some(&false));
        assert_eq!(base.agents.get("testing"), Some(&true));
    }

    #[test]
    fn test_missing_and_broken_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_project_config(dir.path()), ProjectConfig::default());

        std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), "format = [").unwrap();
        assert_eq!(load_project_config(dir.path()), ProjectConfig::default());

        std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), "format = \"json\"\n").unwrap();
        assert_eq!(load_project_config(dir.path()).format.as_deref(), Some("json"));
    }
}
