//! Core types and shared functionality for offline-shell.
//!
//! This crate provides:
//! - Two-tier versioned cache namespaces with a SQLite backend
//! - The shell lifecycle state machine
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod lifecycle;

pub use cache::{CacheDb, NamespaceKey, RequestKey, StoredResponse, Tier};
pub use config::AppConfig;
pub use error::Error;
pub use lifecycle::{LifecycleEvent, Phase};
