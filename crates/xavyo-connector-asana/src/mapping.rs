//! Conversion of Asana records into generic resources.

use serde_json::Value;

use crate::models::{Team, User, Workspace};
use crate::resource::{
    Profile, Resource, ResourceId, RESOURCE_TYPE_TEAM, RESOURCE_TYPE_USER, RESOURCE_TYPE_WORKSPACE,
};
use crate::{AsanaError, AsanaResult};

pub const PROFILE_WORKSPACE_ID: &str = "workspace_id";
pub const PROFILE_WORKSPACE_NAME: &str = "workspace_name";
pub const PROFILE_IS_ORGANIZATION: &str = "is_organization";
pub const PROFILE_EMAIL_DOMAINS: &str = "email_domains";
pub const PROFILE_TEAM_ID: &str = "team_id";
pub const PROFILE_TEAM_NAME: &str = "team_name";
pub const PROFILE_USER_ID: &str = "user_id";
pub const PROFILE_NAME: &str = "name";
pub const PROFILE_EMAIL: &str = "email";
pub const PROFILE_LOGIN: &str = "login";
pub const PROFILE_FIRST_NAME: &str = "first_name";
pub const PROFILE_LAST_NAME: &str = "last_name";

fn required<'a>(value: Option<&'a String>, record: &str, field: &str) -> AsanaResult<&'a str> {
    value
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AsanaError::Validation(format!("{record} is missing {field}")))
}

/// Maps a workspace to a group resource that parents users and teams.
///
/// # Errors
///
/// Returns `AsanaError::Validation` if the gid or name is missing.
pub fn workspace_resource(workspace: &Workspace) -> AsanaResult<Resource> {
    let gid = required(workspace.gid.as_ref(), "workspace", "gid")?;
    let name = required(workspace.name.as_ref(), "workspace", "name")?;

    let mut profile = Profile::new();
    profile.insert(PROFILE_WORKSPACE_ID.into(), Value::from(gid));
    profile.insert(PROFILE_WORKSPACE_NAME.into(), Value::from(name));
    profile.insert(
        PROFILE_IS_ORGANIZATION.into(),
        Value::from(workspace.is_organization),
    );
    if !workspace.email_domains.is_empty() {
        profile.insert(
            PROFILE_EMAIL_DOMAINS.into(),
            Value::from(workspace.email_domains.clone()),
        );
    }

    Ok(Resource {
        id: ResourceId::new(RESOURCE_TYPE_WORKSPACE.id, gid),
        display_name: name.to_string(),
        parent_id: None,
        profile,
        child_resource_types: vec![
            RESOURCE_TYPE_USER.id.to_string(),
            RESOURCE_TYPE_TEAM.id.to_string(),
        ],
    })
}

/// Maps a team to a group resource owned by its workspace.
///
/// # Errors
///
/// Returns `AsanaError::Validation` if the gid or name is missing.
pub fn team_resource(team: &Team, workspace_id: &ResourceId) -> AsanaResult<Resource> {
    let gid = required(team.gid.as_ref(), "team", "gid")?;
    let name = required(team.name.as_ref(), "team", "name")?;

    let mut profile = Profile::new();
    profile.insert(PROFILE_TEAM_ID.into(), Value::from(gid));
    profile.insert(PROFILE_TEAM_NAME.into(), Value::from(name));

    Ok(Resource {
        id: ResourceId::new(RESOURCE_TYPE_TEAM.id, gid),
        display_name: name.to_string(),
        parent_id: Some(workspace_id.clone()),
        profile,
        child_resource_types: Vec::new(),
    })
}

/// Maps a user to a user resource.
///
/// `parent` is the workspace or team the user was discovered under.
///
/// # Errors
///
/// Returns `AsanaError::Validation` if the gid or name is missing.
pub fn user_resource(user: &User, parent: Option<&ResourceId>) -> AsanaResult<Resource> {
    let gid = required(user.gid.as_ref(), "user", "gid")?;
    let name = required(user.name.as_ref(), "user", "name")?;
    let (first_name, last_name) = split_name(name);

    let mut profile = Profile::new();
    profile.insert(PROFILE_USER_ID.into(), Value::from(gid));
    profile.insert(PROFILE_NAME.into(), Value::from(name));
    profile.insert(PROFILE_FIRST_NAME.into(), Value::from(first_name));
    profile.insert(PROFILE_LAST_NAME.into(), Value::from(last_name));
    if let Some(email) = user.email.as_deref().filter(|e| !e.is_empty()) {
        profile.insert(PROFILE_EMAIL.into(), Value::from(email));
        profile.insert(PROFILE_LOGIN.into(), Value::from(email));
    }

    Ok(Resource {
        id: ResourceId::new(RESOURCE_TYPE_USER.id, gid),
        display_name: name.to_string(),
        parent_id: parent.cloned(),
        profile,
        child_resource_types: Vec::new(),
    })
}

/// Splits a display name at the first space.
fn split_name(name: &str) -> (&str, &str) {
    match name.trim().split_once(' ') {
        Some((first, last)) => (first, last.trim()),
        None => (name.trim(), ""),
    }
}

fn profile_value<'a>(resource: &'a Resource, key: &str) -> AsanaResult<&'a str> {
    resource.profile_str(key).ok_or_else(|| {
        AsanaError::Validation(format!(
            "error fetching {key} from {} profile",
            resource.id.resource_type
        ))
    })
}

/// Native workspace gid stored in a workspace resource.
///
/// # Errors
///
/// Returns `AsanaError::Validation` if the profile lacks `workspace_id`.
pub fn workspace_id(resource: &Resource) -> AsanaResult<&str> {
    profile_value(resource, PROFILE_WORKSPACE_ID)
}

/// Native team gid stored in a team resource.
///
/// # Errors
///
/// Returns `AsanaError::Validation` if the profile lacks `team_id`.
pub fn team_id(resource: &Resource) -> AsanaResult<&str> {
    profile_value(resource, PROFILE_TEAM_ID)
}

/// Rebuilds the team record a team resource was minted from.
///
/// # Errors
///
/// Returns `AsanaError::Validation` if the profile lacks `team_id` or `team_name`.
pub fn team_from_resource(resource: &Resource) -> AsanaResult<Team> {
    Ok(Team {
        gid: Some(team_id(resource)?.to_string()),
        name: Some(profile_value(resource, PROFILE_TEAM_NAME)?.to_string()),
        resource_type: Some(RESOURCE_TYPE_TEAM.id.to_string()),
    })
}
