//! Request classification.
//!
//! Maps `(method, url, origin)` to exactly one [`Route`]. Rules are
//! evaluated in order and the first match wins:
//!
//! 1. non-GET or non-http(s) → bypass the shell
//! 2. static asset extension → cache-first
//! 3. site root or `.html` → network-first with offline fallback
//! 4. other origin → network-first
//! 5. anything else → network-first

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Path suffixes served cache-first.
pub const STATIC_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".woff", ".woff2", ".ttf", ".eot",
];

/// Classification of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Bypass,
    StaticAsset,
    Page,
    CrossOrigin,
    SameOrigin,
}

/// Caching strategy executed for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
}

impl Route {
    /// Strategy for this route, `None` for [`Route::Bypass`].
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Route::Bypass => None,
            Route::StaticAsset => Some(Strategy::CacheFirst),
            Route::Page | Route::CrossOrigin | Route::SameOrigin => Some(Strategy::NetworkFirst),
        }
    }

    /// Whether a total miss is answered with the offline page.
    pub fn offline_fallback(&self) -> bool {
        matches!(self, Route::Page)
    }
}

pub fn is_static_asset(path: &str) -> bool {
    STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

pub fn is_page(path: &str) -> bool {
    path == "/" || path.ends_with(".html")
}

/// Classify a request.
pub fn classify(method: &str, url: &Url, origin: &url::Origin) -> Route {
    if !method.eq_ignore_ascii_case("GET") || !matches!(url.scheme(), "http" | "https") {
        return Route::Bypass;
    }

    let path = url.path();
    if is_static_asset(path) {
        Route::StaticAsset
    } else if is_page(path) {
        Route::Page
    } else if url.origin() != *origin {
        Route::CrossOrigin
    } else {
        Route::SameOrigin
    }
}

/// Classifier bound to the shell's origin.
#[derive(Debug, Clone)]
pub struct Router {
    origin: url::Origin,
}

impl Router {
    pub fn new(origin: &Url) -> Self {
        Self { origin: origin.origin() }
    }

    pub fn classify(&self, method: &str, url: &Url) -> Route {
        classify(method, url, &self.origin)
    }
}
