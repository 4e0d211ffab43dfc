//! MCP Tool definitions
//!
//! Defines the available tools and their JSON schemas for the MCP protocol.

use crate::agents::AgentKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Tool definition for MCP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: ToolSchema,
}

/// JSON Schema for tool input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ToolSchema {
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: Some(BTreeMap::new()),
            required: None,
        }
    }

    pub fn with_property(mut self, name: &str, schema: Value) -> Self {
        if let Some(ref mut props) = self.properties {
            props.insert(name.to_string(), schema);
        }
        self
    }

    pub fn with_required(mut self, fields: Vec<&str>) -> Self {
        self.required = Some(fields.into_iter().map(String::from).collect());
        self
    }
}

/// Tool name, the agent it runs (`None` = every agent), description
const TOOL_TABLE: &[(&str, Option<AgentKind>, &str)] = &[
    (
        "analyze_solid",
        Some(AgentKind::Solid),
        "Check files against the SOLID principles (SRP, OCP, LSP, ISP, DIP).",
    ),
    (
        "analyze_architecture",
        Some(AgentKind::Architecture),
        "Check Clean Architecture layering, framework independence, boundaries and entity purity.",
    ),
    (
        "analyze_clean_code",
        Some(AgentKind::CleanCode),
        "Check naming, function size, error handling, comments and formatting.",
    ),
    (
        "suggest_patterns",
        Some(AgentKind::Patterns),
        "Find places where Strategy, Factory or Observer would help, and Singleton misuse.",
    ),
    (
        "analyze_tests",
        Some(AgentKind::Testing),
        "Check test quality against F.I.R.S.T and find source files without tests.",
    ),
    (
        "analyze_package_design",
        Some(AgentKind::PackageDesign),
        "Check package cycles, stability and abstractness across the given files.",
    ),
    (
        "suggest_refactorings",
        Some(AgentKind::Refactoring),
        "Suggest Extract Method/Class, Replace Conditional, Parameter Object, deduplication.",
    ),
    (
        "analyze_all",
        None,
        "Run every agent and return the combined compliance score and violations.",
    ),
];

/// Agent selection for a tool name: `Some(None)` means every agent
pub fn tool_agent(name: &str) -> Option<Option<AgentKind>> {
    TOOL_TABLE
        .iter()
        .find(|(tool, _, _)| *tool == name)
        .map(|(_, agent, _)| *agent)
}

/// All tools, in a stable order
pub fn get_available_tools() -> Vec<Tool> {
    TOOL_TABLE
        .iter()
        .map(|(name, _, description)| Tool {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: ToolSchema::object()
                .with_property(
                    "files",
                    json!({
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Files or glob patterns to analyze"
                    }),
                )
                .with_property(
                    "knowledge_base",
                    json!({
                        "type": "string",
                        "description": "Knowledge-base directory (default: server setting)"
                    }),
                )
                .with_required(vec!["files"]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_tools_with_files_required() {
        let tools = get_available_tools();
        assert_eq!(tools.len(), 8);
        for tool in &tools {
            assert_eq!(tool.input_schema.required, Some(vec!["files".to_string()]));
        }
    }

    #[test]
    fn test_tool_agent_mapping() {
        assert_eq!(tool_agent("analyze_clean_code"), Some(Some(AgentKind::CleanCode)));
        assert_eq!(tool_agent("analyze_all"), Some(None));
        assert_eq!(tool_agent("analyze"), None);
    }

    #[test]
    fn test_schema_serializes_camel_case() {
        let value = serde_json::to_value(&get_available_tools()[0]).unwrap();
        assert_eq!(value["inputSchema"]["type"], "object");
        assert!(value["inputSchema"]["properties"]["files"].is_object());
    }
}
