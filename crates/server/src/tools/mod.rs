//! MCP tool implementations.
//!
//! Each tool is a free function over an [`OfflineShell`] so it can be
//! exercised against any [`Network`].
//!
//! [`OfflineShell`]: offshell_client::OfflineShell
//! [`Network`]: offshell_client::Network

pub mod cache;
pub mod shell_fetch;
pub mod shell_message;
pub mod shell_status;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

pub use cache::{CacheMatchParams, match_impl};
pub use shell_fetch::{ShellFetchParams, fetch_impl};
pub use shell_message::{ShellMessageParams, message_impl};
pub use shell_status::{ShellStatusParams, status_impl};

/// Wrap a tool output as pretty-printed JSON text.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| offshell_core::Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Parse the JSON text of a tool result.
#[cfg(test)]
pub(crate) fn parse_output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
