//! Client code for the offline shell.
//!
//! This crate provides the HTTP fetch pipeline and the shell itself:
//! request routing, fetch strategies, lifecycle, and control messages.

pub mod fetch;
pub mod shell;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use fetch::{FetchClient, FetchConfig, FetchResponse, Network, ShellRequest};
pub use shell::{
    ControlMessage, ControlOutcome, MetricsSnapshot, OfflineShell, Route, Router, Served, ShellConfig, ShellStatus,
    Source, Strategy,
};
