//! Offline cache shell.
//!
//! Intercepts GET requests, classifies them with the [`Router`], and serves
//! them cache-first or network-first out of two versioned namespaces:
//!
//! - `<version>-static`: the precache manifest, written once at install
//! - `<version>-dynamic`: every successful network response seen since
//!
//! Lifecycle (install, activation) lives in [`lifecycle`], fetch strategies
//! in [`strategy`], and out-of-band page commands in [`control`].

pub mod control;
pub mod lifecycle;
pub mod metrics;
pub mod router;
pub mod strategy;

use std::sync::Arc;

use offshell_core::cache::NamespaceSummary;
use offshell_core::{AppConfig, CacheDb, Error, LifecycleEvent, NamespaceKey, Phase, RequestKey};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;

use crate::fetch::{Network, ShellRequest, resolve};

pub use control::{ControlMessage, ControlOutcome};
pub use metrics::{MetricsSnapshot, ShellMetrics};
pub use router::{Route, Router, Strategy};
pub use strategy::{Served, Source};

/// Settings for one shell version.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub version: String,
    pub origin: Url,
    pub offline_url: Url,
    pub precache: Vec<String>,
}

impl ShellConfig {
    /// Build a shell config, resolving the offline page against `origin`.
    pub fn new(version: &str, origin: &str, offline_page: &str, precache: Vec<String>) -> Result<Self, Error> {
        let origin = Url::parse(origin).map_err(|e| Error::InvalidUrl(format!("{origin}: {e}")))?;
        let offline_url = resolve(&origin, offline_page).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self { version: version.to_string(), origin, offline_url, precache })
    }

    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        Self::new(&config.version, &config.origin, &config.offline_page, config.precache.clone())
    }

    pub fn static_key(&self) -> NamespaceKey {
        NamespaceKey::static_tier(&self.version)
    }

    pub fn dynamic_key(&self) -> NamespaceKey {
        NamespaceKey::dynamic_tier(&self.version)
    }

    /// Namespaces that survive activation of this version.
    pub fn current_keys(&self) -> [NamespaceKey; 2] {
        [self.static_key(), self.dynamic_key()]
    }

    /// Resolve a path or URL against the origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        resolve(&self.origin, input).map_err(|e| Error::InvalidUrl(format!("{input}: {e}")))
    }
}

/// Namespaces searched for a version, freshest tier first.
pub(crate) fn lookup_order(version: &str) -> [NamespaceKey; 2] {
    [NamespaceKey::dynamic_tier(version), NamespaceKey::static_tier(version)]
}

/// Snapshot of the shell's state.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ShellStatus {
    pub version: String,
    pub phase: Phase,
    /// A newer version is installed and waits for `SKIP_WAITING`.
    pub update_available: bool,
    pub active_version: Option<String>,
    pub namespaces: Vec<NamespaceSummary>,
    pub metrics: MetricsSnapshot,
}

/// The offline cache shell for one version.
pub struct OfflineShell<N> {
    config: ShellConfig,
    router: Router,
    db: CacheDb,
    network: N,
    phase: RwLock<Phase>,
    metrics: Arc<ShellMetrics>,
    writes: Mutex<JoinSet<()>>,
}

impl<N: Network> OfflineShell<N> {
    /// Create a shell in the `Installing` phase.
    pub fn new(config: ShellConfig, db: CacheDb, network: N) -> Self {
        let router = Router::new(&config.origin);
        Self {
            config,
            router,
            db,
            network,
            phase: RwLock::new(Phase::Installing),
            metrics: Arc::new(ShellMetrics::default()),
            writes: Mutex::new(JoinSet::new()),
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub async fn phase(&self) -> Phase {
        *self.phase.read().await
    }

    /// Apply a lifecycle event to the current phase.
    pub(crate) async fn transition(&self, event: LifecycleEvent) -> Result<Phase, Error> {
        let mut phase = self.phase.write().await;
        let from = *phase;
        let next = from.apply(event)?;
        tracing::info!(version = %self.config.version, %from, to = %next, "lifecycle transition");
        *phase = next;
        Ok(next)
    }

    /// Resolve `url` against the origin and handle it as an intercepted request.
    pub async fn fetch(&self, method: &str, url: &str) -> Result<Served, Error> {
        let url = self.config.resolve(url)?;
        self.handle(&ShellRequest::new(method, url)).await
    }

    /// Version whose namespaces serve requests right now.
    ///
    /// An active shell serves its own version. Otherwise the version recorded
    /// as active keeps serving, so a waiting or failed install never takes
    /// the cache away from pages. `None` means nothing is installed yet.
    pub async fn serving_version(&self) -> Option<String> {
        if self.phase().await.intercepts() {
            return Some(self.config.version.clone());
        }
        match self.db.active_version().await {
            Ok(Some(version)) if version != self.config.version => Some(version),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("reading active version failed: {}", e);
                None
            }
        }
    }

    /// Handle an intercepted request.
    ///
    /// Requests classified as bypass, and every request while no version is
    /// serving, go straight to the network and surface its errors. Routed
    /// requests never fail: network errors degrade to the cache, the offline
    /// page, or a synthesized 503.
    pub async fn handle(&self, request: &ShellRequest) -> Result<Served, Error> {
        let route = self.router.classify(&request.method, &request.url);

        let serving = match route.strategy() {
            Some(strategy) => self.serving_version().await.map(|version| (strategy, version)),
            None => None,
        };
        let Some((strategy, version)) = serving else {
            tracing::debug!("bypassing shell for {} {}", request.method, request.url);
            let response = self.network.fetch(request).await?;
            return Ok(Served { route, source: Source::Bypass, response: response.to_stored() });
        };

        let (source, response) = match strategy {
            Strategy::CacheFirst => self.cache_first(&version, request).await,
            Strategy::NetworkFirst => self.network_first(&version, request, route.offline_fallback()).await,
        };
        Ok(Served { route, source, response })
    }

    /// Look up a URL without touching the network.
    ///
    /// Searches the serving version's tiers, dynamic first, or every
    /// namespace when nothing is serving.
    pub async fn cached(&self, url: &str) -> Result<Option<offshell_core::StoredResponse>, Error> {
        let key = RequestKey::get(self.config.resolve(url)?.as_str());
        match self.serving_version().await {
            Some(version) => self.db.match_first(&lookup_order(&version), &key).await,
            None => self.db.match_any(&key).await,
        }
    }

    /// Wait for every in-flight side write to finish.
    pub async fn flush_writes(&self) {
        let mut pending = std::mem::take(&mut *self.writes.lock().await);
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                tracing::warn!("cache write task failed: {}", e);
            }
        }
    }

    pub async fn status(&self) -> Result<ShellStatus, Error> {
        let phase = self.phase().await;
        Ok(ShellStatus {
            version: self.config.version.clone(),
            phase,
            update_available: phase == Phase::Waiting,
            active_version: self.db.active_version().await?,
            namespaces: self.db.namespace_summaries().await?,
            metrics: self.metrics.snapshot(),
        })
    }
}
