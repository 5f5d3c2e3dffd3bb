//! Test doubles and fixtures for the offline shell.
//!
//! Enabled for this crate's tests and for dependents via the `testing`
//! feature.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, Url, header};

use offshell_core::{CacheDb, Error};

use crate::fetch::{FetchResponse, Network, ShellRequest};
use crate::shell::{OfflineShell, ShellConfig};

/// Origin used by the fixtures.
pub const ORIGIN: &str = "https://app.example.com";

/// Body served for `/offline.html` by [`manifest_network`].
pub const OFFLINE_BODY: &str = "<h1>You are offline</h1>";

#[derive(Debug, Clone)]
struct MockResponse {
    status: u16,
    content_type: String,
    body: Vec<u8>,
}

/// In-memory network with canned responses.
///
/// Unknown URLs answer 404. Offline mode and per-URL failures reject the
/// fetch the way a dropped connection would. Every call is counted,
/// including rejected ones.
#[derive(Debug, Default)]
pub struct MockNetwork {
    responses: Mutex<HashMap<String, MockResponse>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` as `200 text/html` for `url`.
    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.respond(url, 200, "text/html", body);
        self
    }

    pub fn with_response(self, url: &str, status: u16, content_type: &str, body: &str) -> Self {
        self.respond(url, status, content_type, body);
        self
    }

    /// Set or replace the canned response for `url`.
    pub fn respond(&self, url: &str, status: u16, content_type: &str, body: &str) {
        self.responses.lock().expect("mock responses poisoned").insert(
            url.to_string(),
            MockResponse { status, content_type: content_type.to_string(), body: body.as_bytes().to_vec() },
        );
    }

    /// Reject every fetch while `offline` is true.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Reject fetches of `url` only.
    pub fn fail(&self, url: &str) {
        self.failing.lock().expect("mock failures poisoned").insert(url.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("mock log poisoned").clone()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &ShellRequest) -> Result<FetchResponse, Error> {
        let url = request.url.as_str().to_string();
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().expect("mock log poisoned").push(url.clone());

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().expect("mock failures poisoned").contains(&url) {
            return Err(Error::Network(format!("connection refused: {url}")));
        }

        let canned = self.responses.lock().expect("mock responses poisoned").get(&url).cloned();
        let canned = canned.unwrap_or(MockResponse {
            status: 404,
            content_type: "text/plain".to_string(),
            body: b"Not Found".to_vec(),
        });

        let status = StatusCode::from_u16(canned.status).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let mut headers = header::HeaderMap::new();
        if let Ok(value) = header::HeaderValue::from_str(&canned.content_type) {
            headers.insert(header::CONTENT_TYPE, value);
        }

        Ok(FetchResponse {
            url: request.url.clone(),
            status,
            bytes: Bytes::from(canned.body),
            headers,
            fetch_ms: 0,
        })
    }
}

/// Absolute fixture URL for `path`.
pub fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

/// Manifest used by the fixtures.
pub fn manifest() -> Vec<String> {
    vec!["/offline.html".into(), "/css/style.css".into(), "/js/app.js".into()]
}

pub fn shell_config(version: &str) -> ShellConfig {
    ShellConfig::new(version, ORIGIN, "/offline.html", manifest()).expect("fixture config is valid")
}

/// Network serving every manifest entry.
pub fn manifest_network() -> MockNetwork {
    MockNetwork::new()
        .with_page(&url("/offline.html"), OFFLINE_BODY)
        .with_response(&url("/css/style.css"), 200, "text/css", "body { margin: 0 }")
        .with_response(&url("/js/app.js"), 200, "application/javascript", "console.log('app')")
}

/// Installed and activated shell over `db`.
pub async fn active_shell_on(db: CacheDb, version: &str, network: MockNetwork) -> OfflineShell<MockNetwork> {
    let shell = OfflineShell::new(shell_config(version), db, network);
    shell.start().await.expect("fixture shell starts");
    shell
}

/// Installed and activated shell over a fresh in-memory database.
pub async fn active_shell(network: MockNetwork) -> OfflineShell<MockNetwork> {
    let db = CacheDb::open_in_memory().await.expect("in-memory cache opens");
    active_shell_on(db, "v1", network).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(path: &str) -> ShellRequest {
        ShellRequest::get(Url::parse(&url(path)).unwrap())
    }

    #[tokio::test]
    async fn test_mock_serves_canned_and_404() {
        let network = manifest_network();

        let hit = network.fetch(&get("/offline.html")).await.unwrap();
        assert_eq!(hit.status, StatusCode::OK);
        assert_eq!(hit.bytes.as_ref(), OFFLINE_BODY.as_bytes());

        let miss = network.fetch(&get("/nope.html")).await.unwrap();
        assert_eq!(miss.status, StatusCode::NOT_FOUND);
        assert_eq!(network.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_offline_and_fail() {
        let network = manifest_network();
        network.fail(&url("/js/app.js"));
        assert!(network.fetch(&get("/js/app.js")).await.is_err());
        assert!(network.fetch(&get("/offline.html")).await.is_ok());

        network.set_offline(true);
        assert!(network.fetch(&get("/offline.html")).await.is_err());
        assert_eq!(network.calls(), 3);
        assert_eq!(network.requested().len(), 3);
    }
}
