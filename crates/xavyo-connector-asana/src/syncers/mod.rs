//! Resource syncers, one per Asana resource type.

mod team;
mod user;
mod workspace;

pub use team::TeamSyncer;
pub use user::UserSyncer;
pub use workspace::WorkspaceSyncer;

use crate::resource::{ResourceId, RESOURCE_TYPE_USER};
use crate::{AsanaError, AsanaResult};

/// Fails with `NotImplemented` unless `principal` is a user.
fn require_user_principal(operation: &'static str, principal: &ResourceId) -> AsanaResult<()> {
    if principal.is(&RESOURCE_TYPE_USER) {
        Ok(())
    } else {
        Err(AsanaError::not_implemented(operation, &principal.resource_type))
    }
}
