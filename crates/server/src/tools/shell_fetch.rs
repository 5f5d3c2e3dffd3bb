//! shell_fetch tool implementation.
//!
//! Sends one request through the shell and reports where the response came from.

use chrono::Utc;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use offshell_client::{Network, OfflineShell, Route, ShellRequest, Source};
use offshell_core::Error;

use super::json_result;

/// Input parameters for the shell_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellFetchParams {
    /// Absolute URL, or a path resolved against the shell origin.
    pub url: String,

    /// HTTP method (default: GET). Anything other than GET bypasses the shell.
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the shell_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellFetchOutput {
    /// The resolved URL.
    pub url: String,
    pub method: String,
    pub route: Route,
    pub source: Source,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    /// Body as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
    /// ISO8601 timestamp of when the response was served.
    pub served_at: String,
}

/// Implementation of the shell_fetch tool.
pub async fn fetch_impl<N: Network>(
    shell: &OfflineShell<N>, params: ShellFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }

    let url = shell.config().resolve(&params.url)?;
    let served = shell
        .handle(&ShellRequest::new(&params.method, url.clone()))
        .await?;

    let response = served.response;
    let output = ShellFetchOutput {
        url: url.to_string(),
        method: params.method.to_uppercase(),
        route: served.route,
        source: served.source,
        status: response.status,
        status_text: response.status_text.clone(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_bytes: response.body.len(),
        headers: response.headers,
        served_at: Utc::now().to_rfc3339(),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::parse_output;
    use offshell_client::testing::{active_shell, manifest_network, url};

    fn params(url: &str) -> ShellFetchParams {
        ShellFetchParams { url: url.to_string(), method: default_method() }
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let shell = active_shell(manifest_network()).await;
        let result = fetch_impl(&shell, params("  ")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_serves_precached_asset() {
        let shell = active_shell(manifest_network()).await;

        let result = fetch_impl(&shell, params("/css/style.css")).await.unwrap();
        let output: ShellFetchOutput = parse_output(&result);
        assert_eq!(output.url, url("/css/style.css"));
        assert_eq!(output.route, Route::StaticAsset);
        assert_eq!(output.source, Source::Cache);
        assert_eq!(output.status, 200);
        assert_eq!(output.body, "body { margin: 0 }");
        assert_eq!(output.body_bytes, 18);
    }

    #[tokio::test]
    async fn test_fetch_offline_page_reports_fallback() {
        let shell = active_shell(manifest_network()).await;
        shell.network().set_offline(true);

        let result = fetch_impl(&shell, params("/wallet.html")).await.unwrap();
        let output: ShellFetchOutput = parse_output(&result);
        assert_eq!(output.source, Source::OfflineFallback);
        assert!(output.body.contains("offline"));
    }

    #[tokio::test]
    async fn test_fetch_bypass_surfaces_network_error() {
        let shell = active_shell(manifest_network()).await;
        shell.network().set_offline(true);

        let params = ShellFetchParams { url: "/api/transfer".into(), method: "post".into() };
        let err = fetch_impl(&shell, params).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
    }

    #[test]
    fn test_method_defaults_to_get() {
        let params: ShellFetchParams = serde_json::from_str(r#"{"url": "/"}"#).unwrap();
        assert_eq!(params.method, "GET");
    }
}
