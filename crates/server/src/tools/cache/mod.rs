//! cache_match tool implementation.
//!
//! Looks a URL up across every namespace without touching the network.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use offshell_client::{Network, OfflineShell};
use offshell_core::Error;

use super::json_result;

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// Absolute URL, or a path resolved against the shell origin.
    pub url: String,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
}

/// Implementation of the cache_match tool.
pub async fn match_impl<N: Network>(
    shell: &OfflineShell<N>, params: CacheMatchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let url = shell.config().resolve(&params.url)?;
    let stored = shell
        .cached(url.as_str())
        .await?
        .ok_or_else(|| Error::CacheMiss(url.to_string()))?;

    let output = CacheMatchOutput {
        url: url.to_string(),
        status: stored.status,
        status_text: stored.status_text.clone(),
        content_type: stored.content_type().map(str::to_string),
        body: String::from_utf8_lossy(&stored.body).into_owned(),
        body_bytes: stored.body.len(),
        headers: stored.headers,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::parse_output;
    use offshell_client::testing::{OFFLINE_BODY, active_shell, manifest_network, url};

    #[tokio::test]
    async fn test_match_missing() {
        let shell = active_shell(manifest_network()).await;
        let params = CacheMatchParams { url: "/never-seen.html".to_string() };

        let err = match_impl(&shell, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_match_found() {
        let shell = active_shell(manifest_network()).await;
        let calls = shell.network().calls();
        let params = CacheMatchParams { url: url("/offline.html") };

        let result = match_impl(&shell, params).await.unwrap();
        let output: CacheMatchOutput = parse_output(&result);
        assert_eq!(output.status, 200);
        assert_eq!(output.content_type.as_deref(), Some("text/html"));
        assert_eq!(output.body, OFFLINE_BODY);
        assert_eq!(shell.network().calls(), calls);
    }
}
