//! The tool-calling capability consumed by the orchestrator

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A connection to a remote tool-calling service.
///
/// Implementations return *normalized* payloads from [`call_tool`]: the
/// structured content of the tool result, with text-block bodies already
/// parsed (see [`crate::normalize::normalize_tool_result`]). The caller
/// must not invoke a tool absent from [`list_tools`]; absence means the
/// feature is skipped, not failed.
///
/// [`call_tool`]: ToolInvoker::call_tool
/// [`list_tools`]: ToolInvoker::list_tools
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Tool names the service advertises, in the order it listed them.
    async fn list_tools(&self) -> Result<Vec<String>>;

    /// Invoke a named tool with a structured argument map.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value>;
}
