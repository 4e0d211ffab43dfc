//! MCP JSON-RPC Server over stdio
//!
//! Implements the Model Context Protocol using JSON-RPC 2.0 over stdin/stdout.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{debug, error, info};

use super::handlers::{handle_analysis, HandlerState};
use super::tools::{get_available_tools, tool_agent};

/// MCP Server implementation
pub struct McpServer {
    state: HandlerState,
}

impl McpServer {
    pub fn new(kb_root: PathBuf) -> Self {
        Self {
            state: HandlerState::new(kb_root),
        }
    }

    #[cfg(test)]
    fn with_state(state: HandlerState) -> Self {
        Self { state }
    }

    /// Run the server, reading JSON-RPC messages from stdin
    pub fn run(&mut self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let reader = BufReader::new(stdin.lock());

        info!(
            "Solidscan MCP server started (knowledge base: {})",
            self.state.kb_root.display()
        );

        for line in reader.lines() {
            let line = line.context("Failed to read from stdin")?;
            if line.trim().is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            let response = match self.handle_message(&line) {
                Ok(Some(response)) => response,
                Ok(None) => continue,
                Err(e) => {
                    error!("Error handling message: {}", e);
                    json!({
                        "jsonrpc": "2.0",
                        "id": null,
                        "error": {
                            "code": -32700,
                            "message": e.to_string()
                        }
                    })
                }
            };
            let response_str = serde_json::to_string(&response)?;
            debug!("Sending: {}", response_str);
            writeln!(stdout, "{}", response_str)?;
            stdout.flush()?;
        }

        Ok(())
    }

    fn handle_message(&mut self, message: &str) -> Result<Option<Value>> {
        let request: JsonRpcRequest =
            serde_json::from_str(message).context("Invalid JSON-RPC request")?;

        let result = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "initialized" | "notifications/initialized" => return Ok(None),
            "tools/list" => Ok(json!({ "tools": get_available_tools() })),
            "tools/call" => self.handle_call_tool(&request.params),
            "shutdown" => {
                info!("Shutdown requested");
                Ok(json!(null))
            }
            _ => {
                return Ok(Some(json!({
                    "jsonrpc": "2.0",
                    "id": request.id,
                    "error": {
                        "code": -32601,
                        "message": format!("Unknown method: {}", request.method)
                    }
                })))
            }
        };

        match result {
            Ok(value) => Ok(Some(json!({
                "jsonrpc": "2.0",
                "id": request.id,
                "result": value
            }))),
            Err(e) => Ok(Some(json!({
                "jsonrpc": "2.0",
                "id": request.id,
                "error": {
                    "code": -32603,
                    "message": e.to_string()
                }
            }))),
        }
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "solidscan",
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    fn handle_call_tool(&mut self, params: &Option<Value>) -> Result<Value> {
        let params = params.as_ref().context("Missing params for tools/call")?;

        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .context("Missing tool name")?;
        let agent = tool_agent(name).with_context(|| format!("Unknown tool: {}", name))?;

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
        debug!("Calling tool: {} with args: {}", name, arguments);

        match handle_analysis(&mut self.state, agent, &arguments) {
            Ok(value) => Ok(json!({
                "content": [{
                    "type": "text",
                    "text": serde_json::to_string_pretty(&value)?
                }]
            })),
            Err(e) => Ok(json!({
                "content": [{
                    "type": "text",
                    "text": json!({"error": format!("{:#}", e)}).to_string()
                }],
                "isError": true
            })),
        }
    }
}

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(default)]
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// Run the MCP server
pub fn run_server(kb_root: PathBuf) -> Result<()> {
    let mut server = McpServer::new(kb_root);
    server.run()
}
