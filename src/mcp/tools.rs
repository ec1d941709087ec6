//! Tool definitions for the 5 whys MCP server.
//!
//! This module declares the tools exposed to MCP clients, decodes their
//! arguments and dispatches each call to exactly one engine operation.

use crate::engine::AnalysisEngine;
use crate::error::AnalysisError;
use crate::mcp::protocol::{CallToolParams, CallToolResult, MCPTool};
use crate::models::{AnalysisResult, ExportFormat, MAX_DEPTH};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Failures raised before or around an engine call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Parameter '{0}' must be a string")]
    InvalidParameter(&'static str),

    #[error("{0}")]
    InvalidFormat(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Internal(#[from] AnalysisError),
}

/// Dispatches tool calls into the engine it owns.
pub struct ToolExecutor {
    engine: AnalysisEngine,
}

impl ToolExecutor {
    pub fn new(engine: AnalysisEngine) -> Self {
        Self { engine }
    }

    /// Execute a tool call and return the caller-facing result.
    pub fn execute(&mut self, params: &CallToolParams) -> CallToolResult {
        let empty = Map::new();
        let args = params.arguments.as_ref().unwrap_or(&empty);

        debug!("Executing tool: {} with args: {:?}", params.name, args);

        match self.dispatch(&params.name, args) {
            Ok(result) => {
                debug!(
                    "Tool {} returned {} bytes",
                    params.name,
                    result.joined_text().len()
                );
                result
            }
            Err(e) => {
                warn!("Tool {} failed: {}", params.name, e);
                CallToolResult::error(format!("Error: {}", e))
            }
        }
    }

    fn dispatch(
        &mut self,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<CallToolResult, ToolError> {
        match name {
            "start_five_whys" => {
                let problem = required_str(args, "problem")?;
                reply(self.engine.start(problem))
            }
            "answer_why" => {
                let answer = required_str(args, "answer")?;
                reply(self.engine.answer_why(answer))
            }
            "get_current_state" => reply(self.engine.get_current_state()),
            "export_analysis" => {
                let format = match args.get("format") {
                    None | Some(Value::Null) => ExportFormat::default(),
                    Some(Value::String(s)) => s.parse().map_err(ToolError::InvalidFormat)?,
                    Some(_) => return Err(ToolError::InvalidParameter("format")),
                };
                match self.engine.export_analysis(format) {
                    Ok(AnalysisResult {
                        export_data: Some(data),
                        ..
                    }) => Ok(CallToolResult::text(data)),
                    outcome => reply(outcome),
                }
            }
            "reset_analysis" => Ok(CallToolResult::text(format_result(
                &self.engine.reset_analysis(),
            ))),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

fn required_str<'a>(args: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(ToolError::MissingParameter(key)),
        Some(value) => value.as_str().ok_or(ToolError::InvalidParameter(key)),
    }
}

/// Convert an engine outcome into tool output.
///
/// Caller mistakes become ordinary results; internal engine faults are
/// surfaced as tool errors so clients can tell them apart.
fn reply(outcome: Result<AnalysisResult, AnalysisError>) -> Result<CallToolResult, ToolError> {
    match outcome {
        Err(e) if e.is_internal() => Err(ToolError::Internal(e)),
        outcome => Ok(CallToolResult::text(format_result(
            &AnalysisResult::from_outcome(outcome),
        ))),
    }
}

/// Render an engine result as the text shown to the client.
pub fn format_result(result: &AnalysisResult) -> String {
    if !result.success {
        return format!("❌ {}", result.message);
    }

    let mut output = format!("✅ {}", result.message);

    if let Some(ref analysis) = result.analysis {
        output.push_str("\n\n**Current Analysis:**");
        output.push_str(&format!("\n- Problem: {}", analysis.problem));
        output.push_str(&format!("\n- Status: {}", analysis.status_label()));
        output.push_str(&format!(
            "\n- Progress: {}/{} questions",
            analysis.questions.len(),
            MAX_DEPTH
        ));

        if !analysis.questions.is_empty() {
            output.push_str("\n\n**Questions & Answers:**");
            for (i, q) in analysis.questions.iter().enumerate() {
                output.push_str(&format!("\n{}. {}", i + 1, q.question));
                match q.answer {
                    Some(ref answer) => output.push_str(&format!("\n   → {}", answer)),
                    None => output.push_str("\n   → *Awaiting answer...*"),
                }
            }
        }

        if let Some(ref root_cause) = analysis.root_cause {
            output.push_str(&format!("\n\n**🎯 Root Cause Identified:**\n{}", root_cause));
        }
    }

    if let Some(ref next_question) = result.next_question {
        output.push_str(&format!("\n\n**Next Question:**\n{}", next_question));
    }

    output
}

/// Get the tool definitions advertised by `tools/list`.
pub fn get_tool_definitions() -> Vec<MCPTool> {
    vec![
        MCPTool {
            name: "start_five_whys".to_string(),
            description: "Start a new 5 whys analysis with an initial problem statement".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "problem": {
                        "type": "string",
                        "description": "The initial problem statement to analyze"
                    }
                },
                "required": ["problem"]
            }),
        },
        MCPTool {
            name: "answer_why".to_string(),
            description: "Answer the current \"why\" question in the analysis".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "answer": {
                        "type": "string",
                        "description": "The answer to the current why question"
                    }
                },
                "required": ["answer"]
            }),
        },
        MCPTool {
            name: "get_current_state".to_string(),
            description: "Get the current state of the analysis".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        MCPTool {
            name: "export_analysis".to_string(),
            description: "Export the current analysis in the specified format".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "format": {
                        "type": "string",
                        "enum": ["markdown", "json", "text"],
                        "description": "The format to export the analysis in",
                        "default": "markdown"
                    }
                }
            }),
        },
        MCPTool {
            name: "reset_analysis".to_string(),
            description: "Reset the current analysis and start fresh".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(executor: &mut ToolExecutor, name: &str, arguments: Value) -> CallToolResult {
        let params = CallToolParams {
            name: name.to_string(),
            arguments: arguments.as_object().cloned(),
        };
        executor.execute(&params)
    }

    fn executor() -> ToolExecutor {
        ToolExecutor::new(AnalysisEngine::new())
    }

    #[test]
    fn test_tool_definitions() {
        let tools = get_tool_definitions();
        assert_eq!(tools.len(), 5);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "start_five_whys",
                "answer_why",
                "get_current_state",
                "export_analysis",
                "reset_analysis"
            ]
        );
        assert_eq!(tools[0].input_schema["required"], json!(["problem"]));
    }

    #[test]
    fn test_start_and_answer() {
        let mut executor = executor();

        let result = call(&mut executor, "start_five_whys", json!({"problem": "Server crashed"}));
        assert!(result.is_error.is_none());
        let text = result.joined_text();
        assert!(text.starts_with("✅ Analysis started successfully."));
        assert!(text.contains("- Problem: Server crashed"));
        assert!(text.contains("- Progress: 1/5 questions"));
        assert!(text.contains("→ *Awaiting answer...*"));
        assert!(text.ends_with("**Next Question:**\nWhy did this problem occur?"));

        let text = call(&mut executor, "answer_why", json!({"answer": "Out of memory"})).joined_text();
        assert!(text.contains("(2/5)"));
        assert!(text.contains("→ Out of memory"));
    }

    #[test]
    fn test_engine_failures_are_not_tool_errors() {
        let mut executor = executor();
        let result = call(&mut executor, "answer_why", json!({"answer": "Out of memory"}));
        assert!(result.is_error.is_none());
        assert_eq!(
            result.joined_text(),
            "❌ No analysis in progress. Please start an analysis first."
        );
    }

    #[test]
    fn test_missing_and_invalid_arguments() {
        let mut executor = executor();

        let result = call(&mut executor, "start_five_whys", json!({}));
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.joined_text(), "Error: Missing required parameter: problem");

        let result = call(&mut executor, "answer_why", json!({"answer": 42}));
        assert_eq!(result.is_error, Some(true));

        let result = call(&mut executor, "start_five_whys", json!({"problem": "Disk full"}));
        assert!(result.is_error.is_none());
        let result = call(&mut executor, "export_analysis", json!({"format": "yaml"}));
        assert_eq!(result.is_error, Some(true));
        assert!(result.joined_text().contains("Invalid format"));
    }

    #[test]
    fn test_unknown_tool() {
        let mut executor = executor();
        let result = call(&mut executor, "delete_everything", json!({}));
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.joined_text(), "Error: Unknown tool: delete_everything");
    }

    #[test]
    fn test_export_returns_data_verbatim() {
        let mut executor = executor();

        let result = call(&mut executor, "export_analysis", json!({}));
        assert_eq!(result.joined_text(), "❌ No analysis to export.");

        call(&mut executor, "start_five_whys", json!({"problem": "Server crashed"}));
        let markdown = call(&mut executor, "export_analysis", json!({})).joined_text();
        assert!(markdown.starts_with("# 5 Whys Analysis"));

        let json_text =
            call(&mut executor, "export_analysis", json!({"format": "json"})).joined_text();
        let parsed: Value = serde_json::from_str(&json_text).unwrap();
        assert_eq!(parsed["problem"], "Server crashed");
    }

    #[test]
    fn test_full_session_reports_root_cause() {
        let mut executor = executor();
        call(&mut executor, "start_five_whys", json!({"problem": "Server crashed"}));
        for answer in [
            "Out of memory",
            "Memory leak in cache",
            "Cache never evicts",
            "Eviction policy missing",
        ] {
            call(&mut executor, "answer_why", json!({ "answer": answer }));
        }
        let text = call(
            &mut executor,
            "answer_why",
            json!({"answer": "Feature never implemented"}),
        )
        .joined_text();

        assert!(text.contains("- Status: Complete"));
        assert!(text.contains("**🎯 Root Cause Identified:**\nFeature never implemented"));
        assert!(!text.contains("**Next Question:**"));

        let text = call(&mut executor, "reset_analysis", json!({})).joined_text();
        assert_eq!(
            text,
            "✅ Analysis reset successfully. You can start a new analysis."
        );
        let text = call(&mut executor, "get_current_state", json!({})).joined_text();
        assert!(text.starts_with("❌"));
    }
}
