//! shell_message tool implementation.
//!
//! Delivers a control message (`SKIP_WAITING`, `CLEAR_CACHE`) to the shell.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use offshell_client::{Network, OfflineShell};

use super::json_result;

/// Parameters for the shell_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellMessageParams {
    /// Message object, e.g. `{"type": "SKIP_WAITING"}`. Unrecognized messages are ignored.
    pub message: serde_json::Value,
}

/// Implementation of the shell_message tool.
pub async fn message_impl<N: Network>(
    shell: &OfflineShell<N>, params: ShellMessageParams,
) -> Result<CallToolResult, McpError> {
    let outcome = shell.handle_message(&params.message).await?;
    json_result(&outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::parse_output;
    use offshell_client::ControlOutcome;
    use offshell_client::testing::{active_shell, manifest_network};
    use offshell_core::Phase;
    use serde_json::json;

    #[tokio::test]
    async fn test_message_clear_cache() {
        let shell = active_shell(manifest_network()).await;

        let params = ShellMessageParams { message: json!({"type": "CLEAR_CACHE"}) };
        let result = message_impl(&shell, params).await.unwrap();
        let outcome: ControlOutcome = parse_output(&result);
        assert_eq!(outcome, ControlOutcome::Cleared { namespaces: 1 });
        assert!(shell.cached("/offline.html").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_message_unknown_is_ignored() {
        let shell = active_shell(manifest_network()).await;

        let params = ShellMessageParams { message: json!({"kind": "SKIP_WAITING"}) };
        let result = message_impl(&shell, params).await.unwrap();
        let outcome: ControlOutcome = parse_output(&result);
        assert_eq!(outcome, ControlOutcome::Ignored);
        assert_eq!(shell.phase().await, Phase::Active);
    }
}
