//! Asana Connector for xavyo
//!
//! This crate syncs Asana identities and access into the xavyo resource graph
//! through the Asana REST API.
//!
//! # Features
//!
//! - Credential validation that discovers the manageable workspaces
//! - User, workspace and team sync with role-based grants
//! - Granting and revoking workspace membership and team membership
//! - Opaque continuation tokens for resumable pagination
//!
//! # Example
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use xavyo_connector_asana::{AsanaConfig, AsanaConnector};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AsanaConfig::builder().token("your-access-token").build()?;
//! let connector = AsanaConnector::new(config)?;
//!
//! let cancel = CancellationToken::new();
//! connector.validate(&cancel).await?;
//!
//! for syncer in connector.resource_syncers() {
//!     let page = syncer.list(&cancel, None, "").await?;
//!     println!("{}: {} resources", syncer.resource_type().id, page.items.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod mapping;
pub mod models;
pub mod pagination;
pub mod resource;
pub mod roles;
pub mod syncers;

// Re-exports
pub use client::{AsanaClient, ListPage, PageRequest};
pub use config::{AsanaConfig, AsanaConfigBuilder};
pub use connector::{AllowedWorkspaces, AsanaConnector};
pub use error::{AsanaError, AsanaResult, WORKSPACE_GRANT_DENIED_HINT};
pub use pagination::{PageBag, PageState};
pub use resource::{
    ConnectorMetadata, Entitlement, Grant, GrantAnnotation, Resource, ResourceId, ResourceSyncer,
    ResourceType, SyncPage,
};
pub use roles::{TeamRole, WorkspaceRole};
