//! User syncer.
//!
//! Users own no entitlements; they appear as principals of workspace and
//! team grants and are listed beneath each workspace.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::client::{AsanaClient, PageRequest};
use crate::mapping::user_resource;
use crate::pagination::PageBag;
use crate::resource::{
    Entitlement, Grant, Resource, ResourceId, ResourceSyncer, ResourceType, SyncPage,
    RESOURCE_TYPE_USER, RESOURCE_TYPE_WORKSPACE,
};
use crate::AsanaResult;

pub struct UserSyncer {
    client: Arc<AsanaClient>,
    page_size: u32,
}

impl UserSyncer {
    pub fn new(client: Arc<AsanaClient>, page_size: u32) -> Self {
        Self { client, page_size }
    }
}

#[async_trait]
impl ResourceSyncer for UserSyncer {
    fn resource_type(&self) -> &'static ResourceType {
        &RESOURCE_TYPE_USER
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

        let seed = ResourceId::new(RESOURCE_TYPE_USER.id, &workspace.resource);
        let mut bag = PageBag::parse(token, &seed)?;
        let page = self
            .client
            .list_users(
                cancel,
                PageRequest::new(&workspace.resource, self.page_size, bag.current()),
            )
            .await?;
        let next_token = bag.advance(&page.next_offset)?;

        let users = page
            .data
            .iter()
            .map(|user| user_resource(user, Some(workspace)))
            .collect::<AsanaResult<Vec<_>>>()?;

        debug!(workspace_id = %workspace.resource, count = users.len(), "Listed users");
        Ok(SyncPage::new(users, next_token))
    }

    async fn entitlements(
        &self,
        _cancel: &CancellationToken,
        _resource: &Resource,
        _token: &str,
    ) -> AsanaResult<SyncPage<Entitlement>> {
        Ok(SyncPage::empty())
    }

    async fn grants(
        &self,
        _cancel: &CancellationToken,
        _resource: &Resource,
        _token: &str,
    ) -> AsanaResult<SyncPage<Grant>> {
        Ok(SyncPage::empty())
    }
}
