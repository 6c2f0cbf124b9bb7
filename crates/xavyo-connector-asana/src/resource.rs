//! Generic resource graph consumed by the sync runtime.
//!
//! Resources, entitlements and grants are connector-agnostic; the Asana
//! specifics live in [`crate::mapping`] and the syncers.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{AsanaError, AsanaResult};

/// Capability advertised by a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTrait {
    /// Principal that can receive grants.
    User,
    /// Container that users are members of.
    Group,
}

/// Static description of a kind of resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceType {
    pub id: &'static str,
    pub display_name: &'static str,
    pub traits: &'static [ResourceTrait],
}

/// Asana users.
pub const RESOURCE_TYPE_USER: ResourceType = ResourceType {
    id: "user",
    display_name: "User",
    traits: &[ResourceTrait::User],
};

/// Asana workspaces and organizations.
pub const RESOURCE_TYPE_WORKSPACE: ResourceType = ResourceType {
    id: "workspace",
    display_name: "Workspace",
    traits: &[ResourceTrait::Group],
};

/// Asana teams.
pub const RESOURCE_TYPE_TEAM: ResourceType = ResourceType {
    id: "team",
    display_name: "Team",
    traits: &[ResourceTrait::Group],
};

/// Typed identifier of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    pub resource_type: String,
    pub resource: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource: resource.into(),
        }
    }

    /// Returns true if this id names a resource of `resource_type`.
    #[must_use]
    pub fn is(&self, resource_type: &ResourceType) -> bool {
        self.resource_type == resource_type.id
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.resource)
    }
}

/// String-keyed attributes attached to a resource.
pub type Profile = BTreeMap<String, serde_json::Value>;

/// A synced object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ResourceId>,
    #[serde(default)]
    pub profile: Profile,
    /// Resource types the runtime should list beneath this resource.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_resource_types: Vec<String>,
}

impl Resource {
    /// Reads a string attribute from the profile.
    #[must_use]
    pub fn profile_str(&self, key: &str) -> Option<&str> {
        self.profile.get(key).and_then(serde_json::Value::as_str)
    }

    /// Reads a boolean attribute from the profile.
    #[must_use]
    pub fn profile_bool(&self, key: &str) -> Option<bool> {
        self.profile.get(key).and_then(serde_json::Value::as_bool)
    }
}

/// What an entitlement represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementPurpose {
    /// A role or permission on the resource.
    Permission,
    /// Plain membership of the resource.
    Assignment,
}

/// A grantable permission on a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    /// `resource_type:resource_id:slug`.
    pub id: String,
    pub resource: Resource,
    pub slug: String,
    pub display_name: String,
    pub description: String,
    pub purpose: EntitlementPurpose,
    /// Resource type ids this entitlement can be granted to.
    pub grantable_to: Vec<String>,
}

impl Entitlement {
    /// Creates a permission entitlement named `slug` on `resource`.
    pub fn permission(resource: &Resource, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id: entitlement_id(&resource.id, &slug),
            resource: resource.clone(),
            display_name: slug.clone(),
            description: String::new(),
            purpose: EntitlementPurpose::Permission,
            grantable_to: Vec::new(),
            slug,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn grantable_to(mut self, resource_type: &ResourceType) -> Self {
        self.grantable_to.push(resource_type.id.to_string());
        self
    }
}

/// Builds the `type:id:slug` identifier of an entitlement.
#[must_use]
pub fn entitlement_id(resource_id: &ResourceId, slug: &str) -> String {
    format!(
        "{}:{}:{slug}",
        resource_id.resource_type, resource_id.resource
    )
}

/// Extra facts about a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantAnnotation {
    /// The grant cannot be changed through the connector.
    Immutable,
}

/// An entitlement held by a principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    /// `entitlement_id:principal_type:principal_id`.
    pub id: String,
    pub entitlement: Entitlement,
    pub principal: ResourceId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<GrantAnnotation>,
}

impl Grant {
    /// Grants the `slug` entitlement on `resource` to `principal`.
    pub fn new(resource: &Resource, slug: &str, principal: ResourceId) -> Self {
        let entitlement = Entitlement::permission(resource, slug);
        Self {
            id: format!("{}:{principal}", entitlement.id),
            entitlement,
            principal,
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: GrantAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    #[must_use]
    pub fn is_immutable(&self) -> bool {
        self.annotations.contains(&GrantAnnotation::Immutable)
    }
}

/// One page of results plus the token for the next call.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncPage<T> {
    pub items: Vec<T>,
    /// Empty when there is nothing more to fetch.
    pub next_token: String,
}

impl<T> SyncPage<T> {
    /// A complete, single-page result.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: String::new(),
        }
    }

    /// An empty, complete result.
    pub fn empty() -> Self {
        Self::last(Vec::new())
    }

    pub fn new(items: Vec<T>, next_token: String) -> Self {
        Self { items, next_token }
    }
}

/// Display metadata for the connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorMetadata {
    pub display_name: String,
    pub description: String,
}

/// Per resource type operations driven by the sync runtime.
///
/// Every call takes a cancellation token; cancelling it aborts the pending
/// request and the call returns `AsanaError::Cancelled`.
#[async_trait]
pub trait ResourceSyncer: Send + Sync {
    /// The resource type this syncer handles.
    fn resource_type(&self) -> &'static ResourceType;

    /// Lists resources, optionally beneath a parent.
    async fn list(
        &self,
        cancel: &CancellationToken,
        parent: Option<&ResourceId>,
        token: &str,
    ) -> AsanaResult<SyncPage<Resource>>;

    /// Lists the entitlements offered by a resource.
    async fn entitlements(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        token: &str,
    ) -> AsanaResult<SyncPage<Entitlement>>;

    /// Lists the grants held on a resource.
    async fn grants(
        &self,
        cancel: &CancellationToken,
        resource: &Resource,
        token: &str,
    ) -> AsanaResult<SyncPage<Grant>>;

    /// Grants `entitlement` to `principal`.
    async fn grant(
        &self,
        _cancel: &CancellationToken,
        principal: &Resource,
        _entitlement: &Entitlement,
    ) -> AsanaResult<Vec<Grant>> {
        Err(AsanaError::not_implemented(
            "grant",
            &principal.id.resource_type,
        ))
    }

    /// Revokes an existing grant.
    async fn revoke(&self, _cancel: &CancellationToken, grant: &Grant) -> AsanaResult<()> {
        Err(AsanaError::not_implemented(
            "revoke",
            &grant.principal.resource_type,
        ))
    }
}
