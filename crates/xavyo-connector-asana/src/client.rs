//! Asana REST API client.
//!
//! One authenticated request per logical fetch. The client never retries;
//! pagination state is owned by the caller and threaded through
//! [`PageRequest`].

use std::time::{Duration, Instant};

use reqwest::{header, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::AsanaConfig;
use crate::models::{
    DataResponse, ErrorResponse, MembershipMutation, Team, TeamMembership, User, Workspace,
    WorkspaceMembership,
};
use crate::{AsanaError, AsanaResult};

const USER_FIELDS: &str = "email,name";
const WORKSPACE_FIELDS: &str = "is_organization,name,email_domains";
const WORKSPACE_MEMBERSHIP_FIELDS: &str =
    "name,is_active,is_admin,is_guest,workspace.name,user.name,user.email";
const TEAM_FIELDS: &str = "name,organization.name,organization.id,user.name,user.email";
const TEAM_MEMBERSHIP_FIELDS: &str =
    "team.name,is_limited_access,is_admin,is_guest,user.name,user.email";
const AUTH_CHECK_FIELDS: &str = "workspace.name,workspace.gid,is_active,is_admin,is_guest";

/// Parameters shared by every paginated collection.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    /// Workspace or team gid owning the collection.
    pub parent_id: &'a str,
    /// Page size.
    pub limit: u32,
    /// Cursor from the previous page; empty on the first request.
    pub offset: &'a str,
}

impl<'a> PageRequest<'a> {
    pub fn new(parent_id: &'a str, limit: u32, offset: &'a str) -> Self {
        Self {
            parent_id,
            limit,
            offset,
        }
    }

    /// Query pairs for `limit` and, past the first page, `offset`.
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", self.limit.to_string())];
        if !self.offset.is_empty() {
            query.push(("offset", self.offset.to_string()));
        }
        query
    }
}

/// One decoded page of a collection.
#[derive(Debug, Clone)]
pub struct ListPage<T> {
    /// Records on this page.
    pub data: Vec<T>,
    /// Cursor for the next page, empty when exhausted.
    pub next_offset: String,
    /// HTTP status of the response, kept for diagnostics.
    pub status: StatusCode,
}

/// Asana API client.
pub struct AsanaClient {
    http_client: reqwest::Client,
    base_url: url::Url,
    token: SecretString,
}

impl std::fmt::Debug for AsanaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsanaClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl AsanaClient {
    /// Creates a new client from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be created.
    pub fn new(config: &AsanaConfig) -> AsanaResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| AsanaError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = url::Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AsanaError::Config(format!(
                "base_url cannot be a base: {}",
                config.base_url
            )));
        }

        Ok(Self {
            http_client,
            base_url,
            token: config.token.clone(),
        })
    }

    /// Returns the base URL requests are issued against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Lists users of a workspace.
    #[instrument(skip(self, cancel))]
    pub async fn list_users(
        &self,
        cancel: &CancellationToken,
        page: PageRequest<'_>,
    ) -> AsanaResult<ListPage<User>> {
        let mut query = vec![
            ("workspace", page.parent_id.to_string()),
            ("opt_fields", USER_FIELDS.to_string()),
        ];
        query.extend(page.query());

        self.get_page(cancel, &["users"], &query).await
    }

    /// Fetches details of a single workspace.
    #[instrument(skip(self, cancel))]
    pub async fn get_workspace(
        &self,
        cancel: &CancellationToken,
        workspace_id: &str,
    ) -> AsanaResult<Workspace> {
        let query = [("opt_fields", WORKSPACE_FIELDS.to_string())];
        let (response, _) = self
            .get::<Workspace>(cancel, &["workspaces", workspace_id], &query)
            .await?;
        Ok(response.data)
    }

    /// Lists memberships of a workspace.
    #[instrument(skip(self, cancel))]
    pub async fn list_workspace_memberships(
        &self,
        cancel: &CancellationToken,
        page: PageRequest<'_>,
    ) -> AsanaResult<ListPage<WorkspaceMembership>> {
        let mut query = vec![("opt_fields", WORKSPACE_MEMBERSHIP_FIELDS.to_string())];
        query.extend(page.query());

        self.get_page(
            cancel,
            &["workspaces", page.parent_id, "workspace_memberships"],
            &query,
        )
        .await
    }

    /// Lists teams of a workspace.
    #[instrument(skip(self, cancel))]
    pub async fn list_teams(
        &self,
        cancel: &CancellationToken,
        page: PageRequest<'_>,
    ) -> AsanaResult<ListPage<Team>> {
        let mut query = vec![("opt_fields", TEAM_FIELDS.to_string())];
        query.extend(page.query());

        self.get_page(cancel, &["workspaces", page.parent_id, "teams"], &query)
            .await
    }

    /// Lists memberships of a team.
    #[instrument(skip(self, cancel))]
    pub async fn list_team_memberships(
        &self,
        cancel: &CancellationToken,
        page: PageRequest<'_>,
    ) -> AsanaResult<ListPage<TeamMembership>> {
        let mut query = vec![("opt_fields", TEAM_MEMBERSHIP_FIELDS.to_string())];
        query.extend(page.query());

        self.get_page(
            cancel,
            &["teams", page.parent_id, "team_memberships"],
            &query,
        )
        .await
    }

    /// Returns the workspace memberships of the authenticated principal.
    ///
    /// Not paginated: a token rarely belongs to more than a handful of workspaces.
    #[instrument(skip(self, cancel))]
    pub async fn auth_check(
        &self,
        cancel: &CancellationToken,
    ) -> AsanaResult<Vec<WorkspaceMembership>> {
        let query = [("opt_fields", AUTH_CHECK_FIELDS.to_string())];
        let (response, _) = self
            .get::<Vec<WorkspaceMembership>>(
                cancel,
                &["users", "me", "workspace_memberships"],
                &query,
            )
            .await?;
        Ok(response.data)
    }

    /// Adds a user to a workspace.
    #[instrument(skip(self, cancel))]
    pub async fn add_user_to_workspace(
        &self,
        cancel: &CancellationToken,
        workspace_id: &str,
        user_id: &str,
    ) -> AsanaResult<()> {
        self.post(
            cancel,
            &["workspaces", workspace_id, "addUser"],
            &MembershipMutation::new(user_id),
        )
        .await
    }

    /// Removes a user from a workspace.
    #[instrument(skip(self, cancel))]
    pub async fn remove_user_from_workspace(
        &self,
        cancel: &CancellationToken,
        workspace_id: &str,
        user_id: &str,
    ) -> AsanaResult<()> {
        self.post(
            cancel,
            &["workspaces", workspace_id, "removeUser"],
            &MembershipMutation::new(user_id),
        )
        .await
    }

    /// Adds a user to a team.
    #[instrument(skip(self, cancel))]
    pub async fn add_user_to_team(
        &self,
        cancel: &CancellationToken,
        team_id: &str,
        user_id: &str,
    ) -> AsanaResult<()> {
        self.post(
            cancel,
            &["teams", team_id, "addUser"],
            &MembershipMutation::new(user_id),
        )
        .await
    }

    /// Removes a user from a team.
    #[instrument(skip(self, cancel))]
    pub async fn remove_user_from_team(
        &self,
        cancel: &CancellationToken,
        team_id: &str,
        user_id: &str,
    ) -> AsanaResult<()> {
        self.post(
            cancel,
            &["teams", team_id, "removeUser"],
            &MembershipMutation::new(user_id),
        )
        .await
    }

    /// Builds an endpoint URL, percent-encoding each path segment.
    fn endpoint(&self, segments: &[&str]) -> url::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> AsanaResult<ListPage<T>> {
        let (response, status) = self.get::<Vec<T>>(cancel, segments, query).await?;
        let next_offset = response.next_offset();
        Ok(ListPage {
            data: response.data,
            next_offset,
            status,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> AsanaResult<(DataResponse<T>, StatusCode)> {
        let request = self
            .http_client
            .request(Method::GET, self.endpoint(segments))
            .query(query);

        let (status, body) = self.send(cancel, Method::GET, segments, request).await?;
        let response = serde_json::from_str::<DataResponse<T>>(&body)?;
        Ok((response, status))
    }

    async fn post<B: Serialize>(
        &self,
        cancel: &CancellationToken,
        segments: &[&str],
        body: &B,
    ) -> AsanaResult<()> {
        let request = self
            .http_client
            .request(Method::POST, self.endpoint(segments))
            .json(body);

        // Mutation responses carry nothing the caller needs.
        self.send(cancel, Method::POST, segments, request).await?;
        Ok(())
    }

    /// Sends one request and reads the whole body, racing the cancellation token.
    async fn send(
        &self,
        cancel: &CancellationToken,
        method: Method,
        segments: &[&str],
        request: reqwest::RequestBuilder,
    ) -> AsanaResult<(StatusCode, String)> {
        let request = request
            .bearer_auth(self.token.expose_secret())
            .header(header::ACCEPT, "application/json");

        let path = segments.join("/");
        let started = Instant::now();

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AsanaError::Cancelled),
            response = request.send() => response?,
        };

        let status = response.status();
        let retry_after = retry_after_secs(response.headers());

        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AsanaError::Cancelled),
            body = response.text() => body?,
        };

        debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = elapsed_millis(started.elapsed()),
            "Asana request completed"
        );

        if status.is_success() {
            return Ok((status, body));
        }

        warn!(method = %method, path = %path, status = status.as_u16(), "Asana request failed");
        Err(error_for_status(status, &body, retry_after))
    }
}

fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn retry_after_secs(headers: &header::HeaderMap) -> Option<u64> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Maps a non-success response onto the error taxonomy.
fn error_for_status(status: StatusCode, body: &str, retry_after: Option<u64>) -> AsanaError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|e| e.message())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED => AsanaError::Unauthorized(message),
        StatusCode::FORBIDDEN => AsanaError::PermissionDenied(message),
        StatusCode::NOT_FOUND => AsanaError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => AsanaError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(60),
        },
        _ => AsanaError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
