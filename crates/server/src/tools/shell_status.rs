//! shell_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use offshell_client::{Network, OfflineShell};

use super::json_result;

/// Parameters for the shell_status tool (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ShellStatusParams {}

/// Implementation of the shell_status tool.
pub async fn status_impl<N: Network>(
    shell: &OfflineShell<N>, _params: ShellStatusParams,
) -> Result<CallToolResult, McpError> {
    let status = shell.status().await?;
    json_result(&status)
}
