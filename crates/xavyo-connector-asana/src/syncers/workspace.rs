//! Workspace syncer.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::client::{AsanaClient, PageRequest};
use crate::connector::AllowedWorkspaces;
use crate::mapping::{user_resource, workspace_id, workspace_resource};
use crate::pagination::PageBag;
use crate::resource::{
    Entitlement, Grant, Resource, ResourceId, ResourceSyncer, ResourceType, SyncPage,
    RESOURCE_TYPE_USER, RESOURCE_TYPE_WORKSPACE,
};
use crate::roles::{entitlement_role, workspace_role, WorkspaceRole};
use crate::syncers::require_user_principal;
use crate::{AsanaError, AsanaResult};

pub struct WorkspaceSyncer {
    client: Arc<AsanaClient>,
    page_size: u32,
    allowed_workspaces: AllowedWorkspaces,
}

impl WorkspaceSyncer {
    /// Creates a syncer over the workspaces discovered by `validate`.
    pub fn new(
        client: Arc<AsanaClient>,
        page_size: u32,
        allowed_workspaces: AllowedWorkspaces,
    ) -> Self {
        Self {
            client,
            page_size,
            allowed_workspaces,
        }
    }

    fn workspace_entitlement(resource: &Resource, role: WorkspaceRole) -> Entitlement {
        Entitlement::permission(resource, role.as_str())
            .with_display_name(format!("{} Workspace {role}", resource.display_name))
            .with_description(format!("Role in {} Asana workspace", resource.display_name))
            .grantable_to(&RESOURCE_TYPE_USER)
    }
}

#[async_trait]
impl ResourceSyncer for WorkspaceSyncer {
    fn resource_type(&self) -> &'static ResourceType {
        &RESOURCE_TYPE_WORKSPACE
    }

    /// Lists the allowed workspaces in one page.
    #[instrument(skip(self, cancel))]
    async fn list(
        &self,
        cancel: &CancellationToken,
        _parent: Option<&ResourceId>,
        _token: &str,
    ) -> AsanaResult<SyncPage<Resource>> {
        let mut resources = Vec::with_capacity(self.allowed_workspaces.len());
        for gid in self.allowed_workspaces.iter() {
            let workspace = self.client.get_workspace(cancel, gid).await?;
            resources.push(workspace_resource(&workspace)?);
        }

        debug!(count = resources.len(), "Listed workspaces");
        Ok(SyncPage::last(resources))
    }

    async fn entitlements(
        &self,
        _cancel: &CancellationToken,
        resource: &Resource,
        _token: &str,
    ) -> AsanaResult<SyncPage<Entitlement>> {
        let entitlements = WorkspaceRole::all()
            .iter()
            .map(|role| Self::workspace_entitlement(resource, *role))
            .collect();
        Ok(SyncPage::last(entitlements))
    }

    #[instrument(skip(self, cancel, resource), fields(resource_id = %resource.id))]
    async fn grants(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        token: &str,
    ) -> AsanaResult<SyncPage<Grant>> {
        let mut bag = PageBag::parse(token, &resource.id)?;
        let workspace_id = workspace_id(resource)?;

        let page = self
            .client
            .list_workspace_memberships(
                cancel,
                PageRequest::new(workspace_id, self.page_size, bag.current()),
            )
            .await?;
        let next_token = bag.advance(&page.next_offset)?;

        let mut grants = Vec::with_capacity(page.data.len());
        for membership in &page.data {
            let Some(role) = workspace_role(membership) else {
                debug!(
                    membership_id = membership.gid.as_deref().unwrap_or_default(),
                    "Skipping workspace membership without a role"
                );
                continue;
            };

            let user = user_resource(&membership.user, Some(&resource.id))?;
            grants.push(Grant::new(resource, role.as_str(), user.id));
        }

        Ok(SyncPage::new(grants, next_token))
    }

    #[instrument(skip(self, cancel, principal, entitlement), fields(principal = %principal.id, entitlement = %entitlement.id))]
    async fn grant(
        &self,
        cancel: &CancellationToken,
        principal: &Resource,
        entitlement: &Entitlement,
    ) -> AsanaResult<Vec<Grant>> {
        require_user_principal("grant", &principal.id)?;

        let role = entitlement_role(entitlement)?;
        let role: WorkspaceRole = role.parse().map_err(|_| AsanaError::UnsupportedRole {
            resource_type: RESOURCE_TYPE_WORKSPACE.id.to_string(),
            role: role.to_string(),
        })?;

        let workspace_id = &entitlement.resource.id.resource;
        let user_id = &principal.id.resource;

        self.client
            .add_user_to_workspace(cancel, workspace_id, user_id)
            .await
            .map_err(|e| {
                if e.is_permission_denied() {
                    AsanaError::WorkspaceGrantDenied {
                        source: Box::new(e),
                    }
                } else {
                    e
                }
            })?;

        info!(workspace_id = %workspace_id, user_id = %user_id, "Added user to workspace");
        Ok(vec![Grant::new(
            &entitlement.resource,
            role.as_str(),
            principal.id.clone(),
        )])
    }

    #[instrument(skip(self, cancel, grant), fields(grant_id = %grant.id))]
    async fn revoke(&self, cancel: &CancellationToken, grant: &Grant) -> AsanaResult<()> {
        require_user_principal("revoke", &grant.principal)?;

        let workspace_id = &grant.entitlement.resource.id.resource;
        let user_id = &grant.principal.resource;

        self.client
            .remove_user_from_workspace(cancel, workspace_id, user_id)
            .await?;

        info!(workspace_id = %workspace_id, user_id = %user_id, "Removed user from workspace");
        Ok(())
    }
}
