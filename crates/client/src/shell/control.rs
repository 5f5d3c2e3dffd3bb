//! Out-of-band commands sent by the page.
//!
//! Messages are JSON objects tagged by `type`:
//!
//! ```json
//! {"type": "SKIP_WAITING"}
//! {"type": "CLEAR_CACHE"}
//! ```
//!
//! Anything else is ignored.

use offshell_core::{Error, Phase};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::OfflineShell;
use crate::fetch::Network;

/// A recognized control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate a waiting version now.
    SkipWaiting,
    /// Delete every namespace of every version.
    ClearCache,
}

impl ControlMessage {
    /// Parse a message, returning `None` for anything unrecognized.
    pub fn parse(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }
}

/// What a control message did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ControlOutcome {
    /// The message was not recognized.
    Ignored,
    /// The shell was activated.
    Activated { phase: Phase },
    /// Nothing to activate in the current phase.
    NoOp { phase: Phase },
    /// Every namespace was deleted.
    Cleared { namespaces: u64 },
}

impl<N: Network> OfflineShell<N> {
    /// Handle a control message from the page.
    ///
    /// # Errors
    ///
    /// Returns `CACHE_ERROR` if `CLEAR_CACHE` cannot delete the namespaces.
    pub async fn handle_message(&self, message: &Value) -> Result<ControlOutcome, Error> {
        let Some(message) = ControlMessage::parse(message) else {
            tracing::debug!("ignoring control message {}", message);
            return Ok(ControlOutcome::Ignored);
        };

        match message {
            ControlMessage::SkipWaiting => {
                let phase = self.phase().await;
                if !phase.can_activate() {
                    tracing::debug!(%phase, "SKIP_WAITING with nothing to activate");
                    return Ok(ControlOutcome::NoOp { phase });
                }
                match self.activate().await {
                    Ok(phase) => Ok(ControlOutcome::Activated { phase }),
                    Err(Error::InvalidTransition { .. }) => Ok(ControlOutcome::NoOp { phase: self.phase().await }),
                    Err(e) => Err(e),
                }
            }
            ControlMessage::ClearCache => {
                let namespaces = self.db.clear_all().await?;
                tracing::info!(namespaces, "cleared all caches");
                Ok(ControlOutcome::Cleared { namespaces })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::OfflineShell;
    use crate::shell::strategy::Source;
    use crate::testing::{active_shell, active_shell_on, manifest_network, shell_config, url};
    use offshell_core::CacheDb;
    use serde_json::json;

    #[test]
    fn test_parse_messages() {
        assert_eq!(ControlMessage::parse(&json!({"type": "SKIP_WAITING"})), Some(ControlMessage::SkipWaiting));
        assert_eq!(ControlMessage::parse(&json!({"type": "CLEAR_CACHE"})), Some(ControlMessage::ClearCache));
        assert_eq!(ControlMessage::parse(&json!({"type": "RELOAD"})), None);
        assert_eq!(ControlMessage::parse(&json!("SKIP_WAITING")), None);
        assert_eq!(ControlMessage::parse(&json!({})), None);
    }

    #[test]
    fn test_outcome_serialization() {
        let value = serde_json::to_value(ControlOutcome::Cleared { namespaces: 2 }).unwrap();
        assert_eq!(value, json!({"outcome": "cleared", "namespaces": 2}));

        let value = serde_json::to_value(ControlOutcome::Activated { phase: Phase::Active }).unwrap();
        assert_eq!(value, json!({"outcome": "activated", "phase": "active"}));
    }

    #[tokio::test]
    async fn test_skip_waiting_activates_waiting_version() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let _v1 = active_shell_on(db.clone(), "v1", manifest_network()).await;
        let v2 = OfflineShell::new(shell_config("v2"), db.clone(), manifest_network());
        assert_eq!(v2.start().await.unwrap(), Phase::Waiting);

        let outcome = v2.handle_message(&json!({"type": "SKIP_WAITING"})).await.unwrap();
        assert_eq!(outcome, ControlOutcome::Activated { phase: Phase::Active });
        assert_eq!(db.active_version().await.unwrap().as_deref(), Some("v2"));
        assert!(!v2.status().await.unwrap().update_available);
    }

    #[tokio::test]
    async fn test_skip_waiting_when_active_is_noop() {
        let shell = active_shell(manifest_network()).await;
        let outcome = shell.handle_message(&json!({"type": "SKIP_WAITING"})).await.unwrap();
        assert_eq!(outcome, ControlOutcome::NoOp { phase: Phase::Active });
    }

    #[tokio::test]
    async fn test_clear_cache_empties_every_namespace() {
        let network = manifest_network().with_page(&url("/wallet.html"), "<h1>wallet</h1>");
        let shell = active_shell(network).await;
        shell.fetch("GET", "/wallet.html").await.unwrap();
        shell.flush_writes().await;

        let outcome = shell.handle_message(&json!({"type": "CLEAR_CACHE"})).await.unwrap();
        assert_eq!(outcome, ControlOutcome::Cleared { namespaces: 2 });
        assert!(shell.cached("/wallet.html").await.unwrap().is_none());
        assert!(shell.cached("/css/style.css").await.unwrap().is_none());
        assert_eq!(shell.phase().await, Phase::Active);

        shell.network().set_offline(true);
        let served = shell.fetch("GET", "/css/style.css").await.unwrap();
        assert_eq!(served.source, Source::Synthesized);
    }

    #[tokio::test]
    async fn test_unknown_message_is_ignored() {
        let shell = active_shell(manifest_network()).await;
        let before = shell.db().namespace_keys().await.unwrap();

        let outcome = shell.handle_message(&json!({"type": "NUKE"})).await.unwrap();
        assert_eq!(outcome, ControlOutcome::Ignored);
        assert_eq!(shell.db().namespace_keys().await.unwrap(), before);
        assert_eq!(shell.phase().await, Phase::Active);
    }
}
