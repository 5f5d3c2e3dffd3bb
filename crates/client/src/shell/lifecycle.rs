//! Install and activation.
//!
//! Install populates the static namespace from the precache manifest as one
//! all-or-nothing batch. Activation sweeps every namespace that does not
//! belong to this version and starts intercepting requests.

use futures_util::future::try_join_all;
use offshell_core::{Error, LifecycleEvent, Phase, RequestKey, StoredResponse};

use super::OfflineShell;
use crate::fetch::{Network, ShellRequest};

impl<N: Network> OfflineShell<N> {
    /// Install this version.
    ///
    /// Ends in `Installed`, or `Waiting` when another version is recorded
    /// as active. A failed install may be retried.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` (phase becomes `Failed`) if any manifest
    /// entry cannot be fetched with a 2xx status or the batch cannot be
    /// stored, and `Error::InvalidTransition` if the shell is already
    /// installed or active.
    pub async fn install(&self) -> Result<Phase, Error> {
        if self.phase().await != Phase::Installing {
            self.transition(LifecycleEvent::InstallStarted).await?;
        }

        tracing::info!(version = %self.config.version, entries = self.config.precache.len(), "installing");

        match self.precache().await {
            Ok(another_active) => self.transition(LifecycleEvent::InstallSucceeded { another_active }).await,
            Err(e) => {
                tracing::error!(version = %self.config.version, "precache failed: {}", e);
                self.transition(LifecycleEvent::InstallFailed).await?;
                Err(e)
            }
        }
    }

    /// Fetch and store the manifest. Returns whether another version is active.
    async fn precache(&self) -> Result<bool, Error> {
        let namespace = self.db.open_namespace(&self.config.static_key()).await?;

        let fetches = self.config.precache.iter().map(|path| async move {
            let request = ShellRequest::get(self.config.resolve(path)?);
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed(format!("{path}: {e}")))?;
            if !response.status.is_success() {
                return Err(Error::InstallFailed(format!("{path}: status {}", response.status.as_u16())));
            }
            Ok::<_, Error>((request.key(), response.to_stored()))
        });
        let entries = try_join_all(fetches).await?;

        let count = entries.len();
        self.db
            .put_all(&namespace, entries)
            .await
            .map_err(|e| Error::InstallFailed(format!("storing {}: {e}", namespace.name())))?;
        tracing::info!(namespace = %namespace.name(), entries = count, "precache stored");

        let active = self.db.active_version().await?;
        Ok(active.is_some_and(|version| version != self.config.version))
    }

    /// Activate this version.
    ///
    /// Storage failures while sweeping or recording the active version are
    /// logged and do not stop activation.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` unless the shell is `Installed` or `Waiting`.
    pub async fn activate(&self) -> Result<Phase, Error> {
        self.transition(LifecycleEvent::ActivationTriggered).await?;

        match self.db.sweep(&self.config.current_keys()).await {
            Ok(removed) => {
                for key in removed {
                    tracing::info!(namespace = %key, "deleted stale namespace");
                }
            }
            Err(e) => tracing::warn!("sweeping stale namespaces failed: {}", e),
        }

        if let Err(e) = self.db.set_active_version(&self.config.version).await {
            tracing::warn!("recording active version failed: {}", e);
        }

        self.transition(LifecycleEvent::ActivationCompleted).await
    }

    /// Bring the shell up.
    ///
    /// A version already recorded as active whose precache survived resumes
    /// without touching the network. Otherwise install, then activate unless
    /// another version is active.
    pub async fn start(&self) -> Result<Phase, Error> {
        if self.can_resume().await {
            tracing::info!(version = %self.config.version, "resuming active version");
            return self.transition(LifecycleEvent::Resumed).await;
        }

        match self.install().await? {
            Phase::Installed => self.activate().await,
            phase => {
                tracing::info!(version = %self.config.version, "waiting for activation signal");
                Ok(phase)
            }
        }
    }

    async fn can_resume(&self) -> bool {
        if self.phase().await != Phase::Installing {
            return false;
        }
        match self.db.active_version().await {
            Ok(Some(version)) if version == self.config.version => {}
            Ok(_) => return false,
            Err(e) => {
                tracing::warn!("reading active version failed: {}", e);
                return false;
            }
        }
        // Install writes the whole manifest in one batch, so the offline page
        // being present means the rest is too.
        matches!(self.offline_page().await, Ok(Some(_)))
    }

    /// The precached offline page, if present.
    pub async fn offline_page(&self) -> Result<Option<StoredResponse>, Error> {
        self.db
            .match_in(&self.config.static_key(), &RequestKey::get(self.config.offline_url.as_str()))
            .await
    }
}
