//! MCP server over stdio.
//!
//! Reads newline-delimited JSON-RPC messages, routes them, and writes one
//! response line per request. Requests are handled strictly in order, which
//! is what serializes access to the engine.

use crate::config::ServerConfig;
use crate::mcp::protocol::{
    CallToolParams, JsonRpcError, JsonRpcMessage, JsonRpcResponse, ListToolsResult,
    MCPInitializeResult, MCPServerCapabilities, MCPServerInfo, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::mcp::tools::{get_tool_definitions, ToolExecutor};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// A tools-only MCP server.
pub struct McpServer {
    executor: ToolExecutor,
    server_info: MCPServerInfo,
}

impl McpServer {
    pub fn new(executor: ToolExecutor, config: &ServerConfig) -> Self {
        Self {
            executor,
            server_info: MCPServerInfo {
                name: config.name.clone(),
                version: config.version.clone(),
            },
        }
    }

    /// Serve on the process's stdin/stdout until stdin closes.
    pub async fn run_stdio(&mut self) -> Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();

        info!(
            "{} v{} running on stdio",
            self.server_info.name, self.server_info.version
        );

        self.serve(stdin, stdout).await
    }

    /// Serve messages from `reader`, writing responses to `writer`.
    pub async fn serve<R, W>(&mut self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read from input")?
        {
            if line.trim().is_empty() {
                continue;
            }

            let Some(response) = self.handle_line(&line) else {
                continue;
            };

            let mut payload =
                serde_json::to_string(&response).context("Failed to serialize response")?;
            payload.push('\n');
            writer
                .write_all(payload.as_bytes())
                .await
                .context("Failed to write response")?;
            writer.flush().await.context("Failed to flush output")?;
        }

        info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle one raw input line. Returns `None` for notifications.
    pub fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let message: JsonRpcMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                warn!("Malformed message: {}", e);
                return Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };

        if message.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                message.id,
                JsonRpcError::new(INVALID_REQUEST, "Unsupported jsonrpc version"),
            ));
        }

        if message.is_notification() {
            debug!("Notification: {}", message.method);
            return None;
        }

        debug!("Request {:?}: {}", message.id, message.method);

        let id = message.id.clone();
        Some(match self.handle_request(&message) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn handle_request(&mut self, message: &JsonRpcMessage) -> Result<Value, JsonRpcError> {
        match message.method.as_str() {
            "initialize" => to_value(&MCPInitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: MCPServerCapabilities {
                    tools: Some(json!({})),
                },
                server_info: self.server_info.clone(),
            }),
            "ping" => Ok(json!({})),
            "tools/list" => to_value(&ListToolsResult {
                tools: get_tool_definitions(),
            }),
            "tools/call" => {
                let params: CallToolParams = message
                    .params
                    .clone()
                    .ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "Missing params"))
                    .and_then(|params| {
                        serde_json::from_value(params).map_err(|e| {
                            JsonRpcError::new(INVALID_PARAMS, format!("Invalid params: {}", e))
                        })
                    })?;
                to_value(&self.executor.execute(&params))
            }
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AnalysisEngine;
    use crate::mcp::protocol::RequestId;

    fn server() -> McpServer {
        McpServer::new(
            ToolExecutor::new(AnalysisEngine::new()),
            &ServerConfig::default(),
        )
    }

    fn request(id: i64, method: &str, params: Value) -> String {
        json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string()
    }

    fn tool_call(id: i64, name: &str, arguments: Value) -> String {
        request(id, "tools/call", json!({"name": name, "arguments": arguments}))
    }

    fn result_text(response: &JsonRpcResponse) -> String {
        response.result.as_ref().unwrap()["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_initialize() {
        let mut server = server();
        let response = server
            .handle_line(&request(1, "initialize", json!({})))
            .unwrap();

        assert_eq!(response.id, Some(RequestId::Number(1)));
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "five-whys-mcp-server");
        assert_eq!(result["capabilities"]["tools"], json!({}));
    }

    #[test]
    fn test_notifications_get_no_response() {
        let mut server = server();
        let line = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        assert!(server.handle_line(line).is_none());
    }

    #[test]
    fn test_tools_list() {
        let mut server = server();
        let response = server
            .handle_line(&request(2, "tools/list", json!({})))
            .unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 5);
    }

    #[test]
    fn test_protocol_errors() {
        let mut server = server();

        let response = server.handle_line("{not json").unwrap();
        assert!(response.id.is_none());
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);

        let response = server
            .handle_line(&request(3, "resources/list", json!({})))
            .unwrap();
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);

        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call"}"#)
            .unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

        let response = server
            .handle_line(r#"{"jsonrpc":"1.0","id":5,"method":"ping"}"#)
            .unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn test_full_session_over_json_rpc() {
        let mut server = server();

        let response = server
            .handle_line(&tool_call(1, "start_five_whys", json!({"problem": "Server crashed"})))
            .unwrap();
        assert!(result_text(&response).contains("Why did this problem occur?"));

        let answers = [
            "Out of memory",
            "Memory leak in cache",
            "Cache never evicts",
            "Eviction policy missing",
            "Feature never implemented",
        ];
        let mut last = String::new();
        for (i, answer) in answers.iter().enumerate() {
            let response = server
                .handle_line(&tool_call(i as i64 + 2, "answer_why", json!({ "answer": answer })))
                .unwrap();
            last = result_text(&response);
        }
        assert!(last.contains("Root Cause Identified"));

        let response = server
            .handle_line(&tool_call(10, "export_analysis", json!({"format": "text"})))
            .unwrap();
        let text = result_text(&response);
        assert!(text.contains("ROOT CAUSE\n----------\nFeature never implemented"));
    }

    #[test]
    fn test_serve_over_streams() {
        let mut server = server();
        let input = format!(
            "{}\n\n{}\n{}\n",
            request(1, "initialize", json!({})),
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            tool_call(2, "get_current_state", json!({})),
        );
        let mut output = Vec::new();

        tokio_test::block_on(server.serve(input.as_bytes(), &mut output)).unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["id"], 2);
        assert_eq!(
            second["result"]["content"][0]["text"],
            "❌ No analysis in progress. Please start an analysis first."
        );
    }
}
