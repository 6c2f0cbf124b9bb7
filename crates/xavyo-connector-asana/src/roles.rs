//! Workspace and team roles.
//!
//! Asana reports membership as a set of boolean flags. A role is derived by
//! walking an ordered policy and taking the first rule whose predicate holds.

use std::fmt;
use std::str::FromStr;

use crate::models::{TeamMembership, WorkspaceMembership};
use crate::resource::Entitlement;
use crate::{AsanaError, AsanaResult};

/// One step of a role policy.
pub struct RoleRule<M, R> {
    pub role: R,
    pub applies: fn(&M) -> bool,
}

/// Returns the role of the first rule that applies, if any.
pub fn resolve_role<M, R: Copy>(rules: &[RoleRule<M, R>], membership: &M) -> Option<R> {
    rules
        .iter()
        .find(|rule| (rule.applies)(membership))
        .map(|rule| rule.role)
}

/// Role held in a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkspaceRole {
    Admin,
    Member,
    Guest,
}

impl WorkspaceRole {
    /// Roles in the order entitlements are published.
    #[must_use]
    pub fn all() -> &'static [WorkspaceRole] {
        &[
            WorkspaceRole::Admin,
            WorkspaceRole::Member,
            WorkspaceRole::Guest,
        ]
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceRole::Admin => "Admin",
            WorkspaceRole::Member => "Member",
            WorkspaceRole::Guest => "Guest",
        }
    }
}

/// Workspace role precedence: active, then admin, then guest.
///
/// An active admin therefore reports as `Member`. Do not reorder without
/// product sign-off.
pub const WORKSPACE_ROLE_POLICY: &[RoleRule<WorkspaceMembership, WorkspaceRole>] = &[
    RoleRule {
        role: WorkspaceRole::Member,
        applies: |m| m.is_active,
    },
    RoleRule {
        role: WorkspaceRole::Admin,
        applies: |m| m.is_admin,
    },
    RoleRule {
        role: WorkspaceRole::Guest,
        applies: |m| m.is_guest,
    },
];

/// Derives the workspace role; `None` when no flag is set.
#[must_use]
pub fn workspace_role(membership: &WorkspaceMembership) -> Option<WorkspaceRole> {
    resolve_role(WORKSPACE_ROLE_POLICY, membership)
}

/// Role held in a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamRole {
    Guest,
    Admin,
    LimitedAccess,
    TeamMember,
}

impl TeamRole {
    /// Roles in the order entitlements are published.
    #[must_use]
    pub fn all() -> &'static [TeamRole] {
        &[
            TeamRole::Guest,
            TeamRole::Admin,
            TeamRole::LimitedAccess,
            TeamRole::TeamMember,
        ]
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Guest => "Guest",
            TeamRole::Admin => "Admin",
            TeamRole::LimitedAccess => "Limited Access",
            TeamRole::TeamMember => "Team Member",
        }
    }

    /// Only plain membership can be changed through the API; the other roles
    /// are set from the Asana UI.
    #[must_use]
    pub fn is_api_managed(&self) -> bool {
        matches!(self, TeamRole::TeamMember)
    }
}

/// Team role precedence: admin, limited access, guest, else team member.
pub const TEAM_ROLE_POLICY: &[RoleRule<TeamMembership, TeamRole>] = &[
    RoleRule {
        role: TeamRole::Admin,
        applies: |m| m.is_admin,
    },
    RoleRule {
        role: TeamRole::LimitedAccess,
        applies: |m| m.is_limited_access,
    },
    RoleRule {
        role: TeamRole::Guest,
        applies: |m| m.is_guest,
    },
    RoleRule {
        role: TeamRole::TeamMember,
        applies: |_| true,
    },
];

/// Derives the team role. Always yields a role.
#[must_use]
pub fn team_role(membership: &TeamMembership) -> TeamRole {
    resolve_role(TEAM_ROLE_POLICY, membership).unwrap_or(TeamRole::TeamMember)
}

impl fmt::Display for WorkspaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a role name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(String);

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for WorkspaceRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkspaceRole::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}

impl FromStr for TeamRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TeamRole::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}

/// Extracts the role segment of a `resource_type:resource_id:role` id.
///
/// # Errors
///
/// Returns `AsanaError::InvalidEntitlementId` unless the id has exactly three
/// colon-separated segments.
pub fn parse_entitlement_role(entitlement_id: &str) -> AsanaResult<&str> {
    let segments: Vec<&str> = entitlement_id.split(':').collect();
    match segments.as_slice() {
        [_, _, role] => Ok(*role),
        _ => Err(AsanaError::InvalidEntitlementId(entitlement_id.to_string())),
    }
}

/// Role segment of an entitlement.
///
/// # Errors
///
/// See [`parse_entitlement_role`].
pub fn entitlement_role(entitlement: &Entitlement) -> AsanaResult<&str> {
    parse_entitlement_role(&entitlement.id)
}
