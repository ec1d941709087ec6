//! MCP (Model Context Protocol) server.
//!
//! Exposes the analysis engine as five tools over newline-delimited
//! JSON-RPC on stdio.

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
pub use tools::{get_tool_definitions, ToolExecutor};
