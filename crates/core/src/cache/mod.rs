//! SQLite-backed cache tiers for the offline shell.
//!
//! This module provides the two-tier namespace model on SQLite with async
//! access via tokio-rusqlite. It supports:
//!
//! - Structured `{version, tier}` namespace keys
//! - Method + URL request keys stored by SHA-256 digest
//! - Atomic batch population for the precache manifest
//! - Sweeping stale namespaces and clearing everything
//! - Automatic schema migrations

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;
pub mod namespace;
pub mod registration;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::StoredResponse;
pub use key::RequestKey;
pub use namespace::{Namespace, NamespaceKey, NamespaceSummary, Tier};
