//! Asana connector facade.
//!
//! Owns the client and the set of workspaces discovered during validation,
//! and hands out one syncer per resource type.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::client::AsanaClient;
use crate::config::AsanaConfig;
use crate::resource::{ConnectorMetadata, ResourceSyncer};
use crate::syncers::{TeamSyncer, UserSyncer, WorkspaceSyncer};
use crate::{AsanaError, AsanaResult};

/// Read-only set of workspace gids the connector may operate on.
///
/// Cloning is cheap and every clone sees the same set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedWorkspaces(Arc<BTreeSet<String>>);

impl AllowedWorkspaces {
    /// Iterates gids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    #[must_use]
    pub fn contains(&self, workspace_id: &str) -> bool {
        self.0.contains(workspace_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowedWorkspaces {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(Arc::new(iter.into_iter().map(Into::into).collect()))
    }
}

/// Asana connector.
pub struct AsanaConnector {
    config: AsanaConfig,
    client: Arc<AsanaClient>,
    /// Written once by the first successful `validate`.
    allowed_workspaces: OnceLock<AllowedWorkspaces>,
}

impl std::fmt::Debug for AsanaConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsanaConnector")
            .field("config", &self.config)
            .field("allowed_workspaces", &self.allowed_workspaces.get())
            .finish_non_exhaustive()
    }
}

impl AsanaConnector {
    /// Creates a new connector.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: AsanaConfig) -> AsanaResult<Self> {
        config.validate()?;
        let client = AsanaClient::new(&config)?;

        Ok(Self {
            config,
            client: Arc::new(client),
            allowed_workspaces: OnceLock::new(),
        })
    }

    /// Returns the connector configuration.
    #[must_use]
    pub fn config(&self) -> &AsanaConfig {
        &self.config
    }

    /// Display metadata.
    #[must_use]
    pub fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            display_name: "Asana".to_string(),
            description: "Syncs Asana users, workspaces and teams with their memberships"
                .to_string(),
        }
    }

    /// Checks the credentials and discovers the workspaces the token may manage.
    ///
    /// Every workspace where the authenticated user is not a guest is allowed.
    /// The set is recorded on the first success; later calls re-check the
    /// credentials and return the recorded set.
    ///
    /// # Errors
    ///
    /// Returns `AsanaError::Auth` wrapping the upstream failure, or
    /// `AsanaError::Cancelled`.
    #[instrument(skip(self, cancel))]
    pub async fn validate(&self, cancel: &CancellationToken) -> AsanaResult<AllowedWorkspaces> {
        let memberships = self.client.auth_check(cancel).await.map_err(|e| match e {
            AsanaError::Cancelled => e,
            other => {
                warn!(error = %other, "Asana credential check failed");
                AsanaError::Auth(Box::new(other))
            }
        })?;

        let discovered: AllowedWorkspaces = memberships
            .iter()
            .filter(|m| !m.is_guest)
            .filter_map(|m| m.workspace.gid.clone())
            .collect();

        let allowed = self.allowed_workspaces.get_or_init(|| discovered).clone();
        info!(workspaces = allowed.len(), "Asana credentials validated");
        Ok(allowed)
    }

    /// Workspaces recorded by `validate`; empty before it succeeds.
    #[must_use]
    pub fn allowed_workspaces(&self) -> AllowedWorkspaces {
        self.allowed_workspaces.get().cloned().unwrap_or_default()
    }

    /// Syncers for users, workspaces and teams, in that order.
    #[must_use]
    pub fn resource_syncers(&self) -> Vec<Box<dyn ResourceSyncer>> {
        let page_size = self.config.page_size;
        vec![
            Box::new(UserSyncer::new(Arc::clone(&self.client), page_size)),
            Box::new(WorkspaceSyncer::new(
                Arc::clone(&self.client),
                page_size,
                self.allowed_workspaces(),
            )),
            Box::new(TeamSyncer::new(Arc::clone(&self.client), page_size)),
        ]
    }
}
