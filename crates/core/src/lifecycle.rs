//! Shell lifecycle state machine.
//!
//! Transitions are pure: [`Phase::apply`] maps a phase and an event to the
//! next phase without touching storage or the network. The controller that
//! drives install and activation lives in the client crate.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of one shell version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Precache manifest is being populated.
    Installing,
    /// Installed with no other version active; ready to activate.
    Installed,
    /// Installed while another version is active; waits for an explicit signal.
    Waiting,
    /// Sweeping stale namespaces and claiming pages.
    Activating,
    /// Intercepting requests.
    Active,
    /// Install aborted; any previous version keeps serving.
    Failed,
}

/// Events that drive [`Phase`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    InstallStarted,
    InstallSucceeded { another_active: bool },
    InstallFailed,
    ActivationTriggered,
    ActivationCompleted,
    /// This version is already recorded active with its precache intact.
    Resumed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Installing => "installing",
            Phase::Installed => "installed",
            Phase::Waiting => "waiting",
            Phase::Activating => "activating",
            Phase::Active => "active",
            Phase::Failed => "failed",
        }
    }

    /// Compute the phase following `event`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` if `event` is not accepted in this phase.
    pub fn apply(self, event: LifecycleEvent) -> Result<Phase, Error> {
        use LifecycleEvent::*;

        match (self, event) {
            (Phase::Failed, InstallStarted) => Ok(Phase::Installing),
            (Phase::Installing, InstallSucceeded { another_active: false }) => Ok(Phase::Installed),
            (Phase::Installing, InstallSucceeded { another_active: true }) => Ok(Phase::Waiting),
            (Phase::Installing, InstallFailed) => Ok(Phase::Failed),
            (Phase::Installed | Phase::Waiting, ActivationTriggered) => Ok(Phase::Activating),
            (Phase::Activating, ActivationCompleted) => Ok(Phase::Active),
            (Phase::Installing, Resumed) => Ok(Phase::Active),
            (from, event) => Err(Error::InvalidTransition { from: from.to_string(), event: event.to_string() }),
        }
    }

    /// Whether requests are routed through the shell in this phase.
    pub fn intercepts(&self) -> bool {
        matches!(self, Phase::Active)
    }

    /// Whether an activation signal would be accepted.
    pub fn can_activate(&self) -> bool {
        matches!(self, Phase::Installed | Phase::Waiting)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleEvent::InstallStarted => "install_started",
            LifecycleEvent::InstallSucceeded { .. } => "install_succeeded",
            LifecycleEvent::InstallFailed => "install_failed",
            LifecycleEvent::ActivationTriggered => "activation_triggered",
            LifecycleEvent::ActivationCompleted => "activation_completed",
            LifecycleEvent::Resumed => "resumed",
        };
        f.write_str(name)
    }
}
