//! Shell counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated while handling requests.
#[derive(Debug, Default)]
pub struct ShellMetrics {
    cache_hits: AtomicU64,
    network_fetches: AtomicU64,
    network_failures: AtomicU64,
    offline_fallbacks: AtomicU64,
    synthesized: AtomicU64,
    side_write_failures: AtomicU64,
}

/// Point-in-time copy of [`ShellMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub network_fetches: u64,
    pub network_failures: u64,
    pub offline_fallbacks: u64,
    pub synthesized: u64,
    pub side_write_failures: u64,
}

impl ShellMetrics {
    pub(crate) fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn network_fetch(&self) {
        self.network_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn network_failure(&self) {
        self.network_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn offline_fallback(&self) {
        self.offline_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn synthesized(&self) {
        self.synthesized.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn side_write_failure(&self) {
        self.side_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            network_fetches: self.network_fetches.load(Ordering::Relaxed),
            network_failures: self.network_failures.load(Ordering::Relaxed),
            offline_fallbacks: self.offline_fallbacks.load(Ordering::Relaxed),
            synthesized: self.synthesized.load(Ordering::Relaxed),
            side_write_failures: self.side_write_failures.load(Ordering::Relaxed),
        }
    }
}
