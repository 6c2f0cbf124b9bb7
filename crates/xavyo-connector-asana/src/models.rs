//! Asana API records and response envelopes.
//!
//! Identifiers and names are optional on the wire; the mappers decide which
//! of them are required.

use serde::{Deserialize, Serialize};

/// A user as returned by `/users` or embedded in a membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub gid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
}

/// A workspace or organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub gid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_organization: bool,
    #[serde(default)]
    pub email_domains: Vec<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
}

/// A team inside a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub gid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
}

/// Membership of a user in a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceMembership {
    #[serde(default)]
    pub gid: Option<String>,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub workspace: Workspace,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_guest: bool,
}

/// Membership of a user in a team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembership {
    #[serde(default)]
    pub gid: Option<String>,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub team: Team,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_guest: bool,
    #[serde(default)]
    pub is_limited_access: bool,
}

/// `next_page` object of a paginated envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NextPage {
    #[serde(default)]
    pub offset: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// Envelope wrapping every Asana response.
#[derive(Debug, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
    #[serde(default)]
    pub next_page: Option<NextPage>,
}

impl<T> DataResponse<T> {
    /// Offset of the following page, empty when this is the last one.
    pub fn next_offset(&self) -> String {
        self.next_page
            .as_ref()
            .and_then(|page| page.offset.clone())
            .unwrap_or_default()
    }
}

/// Error envelope: `{"errors": [{"message": "..."}]}`.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

/// One entry of an error envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default)]
    pub help: Option<String>,
}

impl ErrorResponse {
    /// Joins all upstream messages into one line.
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Body of the add/remove user mutations: `{"data": {"user": "<gid>"}}`.
#[derive(Debug, Serialize)]
pub struct MembershipMutation<'a> {
    pub data: MutationUser<'a>,
}

/// Inner object of [`MembershipMutation`].
#[derive(Debug, Serialize)]
pub struct MutationUser<'a> {
    pub user: &'a str,
}

impl<'a> MembershipMutation<'a> {
    pub fn new(user_id: &'a str) -> Self {
        Self {
            data: MutationUser { user: user_id },
        }
    }
}
