//! Requests seen by the shell.

use offshell_core::RequestKey;
use reqwest::Url;

/// An intercepted request: method and URL.
///
/// Bodies and headers never influence routing or cache keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellRequest {
    pub method: String,
    pub url: Url,
}

impl ShellRequest {
    pub fn new(method: &str, mut url: Url) -> Self {
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Cache key for this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, self.url.as_str())
    }
}
