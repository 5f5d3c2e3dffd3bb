//! Fetch strategies.
//!
//! Both strategies persist every successful network response to the
//! dynamic namespace as a side write: the caller gets the response without
//! waiting, and a failed write never changes what is returned.

use offshell_core::{NamespaceKey, RequestKey, StoredResponse};
use serde::{Deserialize, Serialize};

use super::router::Route;
use super::{OfflineShell, lookup_order};
use crate::fetch::{Network, ShellRequest};

/// Body of the 503 returned when a cache-first asset is unavailable.
pub const ASSET_UNAVAILABLE: &str = "Offline - Resource not available";

/// Body of the 503 returned when a network-first request has no cached copy.
pub const NO_CACHED_VERSION: &str = "Offline - No cached version available";

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Network,
    Cache,
    OfflineFallback,
    Synthesized,
    Bypass,
}

/// Result of handling one request.
#[derive(Debug, Clone)]
pub struct Served {
    pub route: Route,
    pub source: Source,
    pub response: StoredResponse,
}

impl<N: Network> OfflineShell<N> {
    /// Serve from `version`'s tiers; on a miss fetch and remember.
    pub(crate) async fn cache_first(&self, version: &str, request: &ShellRequest) -> (Source, StoredResponse) {
        let key = request.key();

        if let Some(hit) = self.lookup(version, &key).await {
            self.metrics.cache_hit();
            tracing::debug!("cache hit for {}", request.url);
            return (Source::Cache, hit);
        }

        tracing::debug!("cache miss, fetching {}", request.url);
        self.metrics.network_fetch();
        match self.network.fetch(request).await {
            Ok(response) => {
                tracing::debug!("fetched {} in {}ms", response.url, response.fetch_ms);
                let stored = response.to_stored();
                self.remember(version, key, &stored).await;
                (Source::Network, stored)
            }
            Err(e) => {
                self.metrics.network_failure();
                self.metrics.synthesized();
                tracing::debug!("cache-first fetch failed for {}: {}", request.url, e);
                (Source::Synthesized, StoredResponse::service_unavailable(ASSET_UNAVAILABLE))
            }
        }
    }

    /// Fetch and remember; on network failure fall back to the cache, then
    /// to the offline page (pages only), then to a 503.
    pub(crate) async fn network_first(
        &self, version: &str, request: &ShellRequest, offline_fallback: bool,
    ) -> (Source, StoredResponse) {
        let key = request.key();

        self.metrics.network_fetch();
        let error = match self.network.fetch(request).await {
            Ok(response) => {
                tracing::debug!("fetched {} in {}ms", response.url, response.fetch_ms);
                let stored = response.to_stored();
                self.remember(version, key, &stored).await;
                return (Source::Network, stored);
            }
            Err(e) => e,
        };

        self.metrics.network_failure();
        tracing::debug!("network failed for {}, trying cache: {}", request.url, error);

        if let Some(hit) = self.lookup(version, &key).await {
            self.metrics.cache_hit();
            return (Source::Cache, hit);
        }

        if offline_fallback {
            let offline_key = RequestKey::get(self.config.offline_url.as_str());
            if let Some(page) = self.lookup(version, &offline_key).await {
                self.metrics.offline_fallback();
                tracing::debug!("serving offline page for {}", request.url);
                return (Source::OfflineFallback, page);
            }
            tracing::warn!("offline page {} is not cached", self.config.offline_url);
        }

        self.metrics.synthesized();
        (Source::Synthesized, StoredResponse::service_unavailable(NO_CACHED_VERSION))
    }

    /// Look up `key` in `version`'s tiers, dynamic first. Storage errors count as a miss.
    async fn lookup(&self, version: &str, key: &RequestKey) -> Option<StoredResponse> {
        match self.db.match_first(&lookup_order(version), key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!("cache lookup failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Persist a successful response to `version`'s dynamic tier in the background.
    async fn remember(&self, version: &str, key: RequestKey, response: &StoredResponse) {
        if !response.is_success() {
            return;
        }

        let db = self.db.clone();
        let namespace = NamespaceKey::dynamic_tier(version);
        let metrics = self.metrics.clone();
        let response = response.clone();

        let mut writes = self.writes.lock().await;
        while let Some(finished) = writes.try_join_next() {
            if let Err(e) = finished {
                tracing::warn!("cache write task failed: {}", e);
            }
        }
        writes.spawn(async move {
            if let Err(e) = db.put_in(&namespace, &key, &response).await {
                metrics.side_write_failure();
                tracing::warn!("cache write to {} failed for {}: {}", namespace, key, e);
            }
        });
    }
}
