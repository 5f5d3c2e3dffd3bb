//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the shell.
use std::sync::Arc;

use crate::tools::{
    CacheMatchParams, ShellFetchParams, ShellMessageParams, ShellStatusParams, fetch_impl, match_impl, message_impl,
    status_impl,
};
use offshell_client::{FetchClient, OfflineShell};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for the offline shell.
#[derive(Clone)]
pub struct McpShellServer {
    tool_router: ToolRouter<Self>,
    shell: Arc<OfflineShell<FetchClient>>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl McpShellServer {
    /// Create a new server handler around a started shell.
    pub fn new(shell: Arc<OfflineShell<FetchClient>>) -> Self {
        Self { tool_router: Self::tool_router(), shell }
    }

    #[tool(
        description = "Send a request through the offline shell. Returns the response with its route and source (network, cache, offline_fallback, synthesized, bypass)."
    )]
    async fn shell_fetch(&self, params: Parameters<ShellFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(self.shell.as_ref(), params.0).await
    }

    #[tool(description = "Deliver a control message to the shell: {\"type\": \"SKIP_WAITING\"} or {\"type\": \"CLEAR_CACHE\"}.")]
    async fn shell_message(&self, params: Parameters<ShellMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(self.shell.as_ref(), params.0).await
    }

    #[tool(description = "Report lifecycle phase, pending update, cache namespaces, and counters.")]
    async fn shell_status(&self, params: Parameters<ShellStatusParams>) -> Result<CallToolResult, McpError> {
        status_impl(self.shell.as_ref(), params.0).await
    }

    #[tool(description = "Look a URL up in the cache without touching the network.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(self.shell.as_ref(), params.0).await
    }
}

impl ServerHandler for McpShellServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "offline-shell".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
