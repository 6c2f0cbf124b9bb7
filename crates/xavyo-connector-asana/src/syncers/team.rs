//! Team syncer.
//!
//! Teams are listed per workspace. Only the `Team Member` role can be granted
//! or revoked through the API; grants of any other role are reported as
//! immutable.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::client::{AsanaClient, PageRequest};
use crate::mapping::{team_id, team_resource, user_resource};
use crate::pagination::PageBag;
use crate::resource::{
    Entitlement, Grant, GrantAnnotation, Resource, ResourceId, ResourceSyncer, ResourceType,
    SyncPage, RESOURCE_TYPE_TEAM, RESOURCE_TYPE_USER, RESOURCE_TYPE_WORKSPACE,
};
use crate::roles::{entitlement_role, team_role, TeamRole};
use crate::syncers::require_user_principal;
use crate::{AsanaError, AsanaResult};

pub struct TeamSyncer {
    client: Arc<AsanaClient>,
    page_size: u32,
}

impl TeamSyncer {
    pub fn new(client: Arc<AsanaClient>, page_size: u32) -> Self {
        Self { client, page_size }
    }
}

fn team_entitlement(resource: &Resource, role: TeamRole) -> Entitlement {
    Entitlement::permission(resource, role.as_str())
        .with_display_name(format!("{} Team {role}", resource.display_name))
        .with_description(format!("Role in {} Asana team", resource.display_name))
        .grantable_to(&RESOURCE_TYPE_USER)
}

#[async_trait]
impl ResourceSyncer for TeamSyncer {
    fn resource_type(&self) -> &'static ResourceType {
        &RESOURCE_TYPE_TEAM
    }

    #[instrument(skip(self, cancel))]
    async fn list(
        &self,
        cancel: &CancellationToken,
        parent: Option<&ResourceId>,
        token: &str,
    ) -> AsanaResult<SyncPage<Resource>> {
        let Some(workspace) = parent.filter(|p| p.is(&RESOURCE_TYPE_WORKSPACE)) else {
            return Ok(SyncPage::empty());
        };

        let seed = ResourceId::new(RESOURCE_TYPE_TEAM.id, &workspace.resource);
        let mut bag = PageBag::parse(token, &seed)?;
        let page = self
            .client
            .list_teams(
                cancel,
                PageRequest::new(&workspace.resource, self.page_size, bag.current()),
            )
            .await?;
        let next_token = bag.advance(&page.next_offset)?;

        let teams = page
            .data
            .iter()
            .map(|team| team_resource(team, workspace))
            .collect::<AsanaResult<Vec<_>>>()?;

        debug!(workspace_id = %workspace.resource, count = teams.len(), "Listed teams");
        Ok(SyncPage::new(teams, next_token))
    }

    async fn entitlements(
        &self,
        _cancel: &CancellationToken,
        resource: &Resource,
        _token: &str,
    ) -> AsanaResult<SyncPage<Entitlement>> {
        let entitlements = TeamRole::all()
            .iter()
            .map(|role| team_entitlement(resource, *role))
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
        let team_id = team_id(resource)?;

        let page = self
            .client
            .list_team_memberships(
                cancel,
                PageRequest::new(team_id, self.page_size, bag.current()),
            )
            .await?;
        let next_token = bag.advance(&page.next_offset)?;

        let mut grants = Vec::with_capacity(page.data.len());
        for membership in &page.data {
            let role = team_role(membership);
            let user = user_resource(&membership.user, Some(&resource.id))?;

            let mut grant = Grant::new(resource, role.as_str(), user.id);
            if !role.is_api_managed() {
                grant = grant.with_annotation(GrantAnnotation::Immutable);
            }
            grants.push(grant);
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
        if !matches!(role.parse::<TeamRole>(), Ok(r) if r.is_api_managed()) {
            return Err(AsanaError::UnsupportedRole {
                resource_type: RESOURCE_TYPE_TEAM.id.to_string(),
                role: role.to_string(),
            });
        }

        let team_id = &entitlement.resource.id.resource;
        let user_id = &principal.id.resource;

        self.client
            .add_user_to_team(cancel, team_id, user_id)
            .await?;

        info!(team_id = %team_id, user_id = %user_id, "Added user to team");
        Ok(vec![Grant::new(
            &entitlement.resource,
            TeamRole::TeamMember.as_str(),
            principal.id.clone(),
        )])
    }

    /// Removes the principal from the team regardless of the role granted.
    #[instrument(skip(self, cancel, grant), fields(grant_id = %grant.id))]
    async fn revoke(&self, cancel: &CancellationToken, grant: &Grant) -> AsanaResult<()> {
        require_user_principal("revoke", &grant.principal)?;

        let team_id = &grant.entitlement.resource.id.resource;
        let user_id = &grant.principal.resource;

        self.client
            .remove_user_from_team(cancel, team_id, user_id)
            .await?;

        info!(team_id = %team_id, user_id = %user_id, "Removed user from team");
        Ok(())
    }
}
