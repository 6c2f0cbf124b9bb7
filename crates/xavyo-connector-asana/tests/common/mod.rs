//! Common test utilities for xavyo-connector-asana integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Once};
use wiremock::{MockServer, Request, Respond, ResponseTemplate};
use xavyo_connector_asana::{AsanaClient, AsanaConfig, AsanaConnector};

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

/// Base path the mock server serves the API under.
pub const API_PREFIX: &str = "/api/1.0";

/// Builds a config pointing at the mock server.
pub fn test_config(server: &MockServer, page_size: u32) -> AsanaConfig {
    AsanaConfig::builder()
        .token("test-token")
        .base_url(format!("{}{API_PREFIX}", server.uri()))
        .page_size(page_size)
        .timeout_secs(5)
        .build()
        .expect("valid test config")
}

pub fn test_client(server: &MockServer) -> AsanaClient {
    AsanaClient::new(&test_config(server, 100)).expect("client")
}

pub fn test_connector(server: &MockServer) -> AsanaConnector {
    AsanaConnector::new(test_config(server, 100)).expect("connector")
}

/// Full API path for `suffix`.
pub fn api_path(suffix: &str) -> String {
    format!("{API_PREFIX}{suffix}")
}

/// Test data factory for creating Asana users.
pub fn create_test_user(gid: &str, name: &str) -> Value {
    json!({
        "gid": gid,
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        "resource_type": "user"
    })
}

/// Test data factory for creating Asana workspaces.
pub fn create_test_workspace(gid: &str, name: &str) -> Value {
    json!({
        "gid": gid,
        "name": name,
        "is_organization": true,
        "email_domains": ["example.com"],
        "resource_type": "workspace"
    })
}

/// Test data factory for creating Asana teams.
pub fn create_test_team(gid: &str, name: &str) -> Value {
    json!({
        "gid": gid,
        "name": name,
        "resource_type": "team"
    })
}

/// Test data factory for creating workspace memberships.
pub fn create_workspace_membership(
    gid: &str,
    user: Value,
    workspace_gid: &str,
    is_active: bool,
    is_admin: bool,
    is_guest: bool,
) -> Value {
    json!({
        "gid": gid,
        "user": user,
        "workspace": { "gid": workspace_gid, "name": format!("Workspace {workspace_gid}") },
        "is_active": is_active,
        "is_admin": is_admin,
        "is_guest": is_guest,
        "resource_type": "workspace_membership"
    })
}

/// Test data factory for creating team memberships.
pub fn create_team_membership(
    gid: &str,
    user: Value,
    team_gid: &str,
    is_admin: bool,
    is_limited_access: bool,
    is_guest: bool,
) -> Value {
    json!({
        "gid": gid,
        "user": user,
        "team": { "gid": team_gid, "name": format!("Team {team_gid}") },
        "is_admin": is_admin,
        "is_limited_access": is_limited_access,
        "is_guest": is_guest,
        "resource_type": "team_membership"
    })
}

/// Wraps items in the Asana `data` envelope.
pub fn create_data_response(items: Vec<Value>, next_offset: Option<&str>) -> Value {
    let mut response = json!({ "data": items });
    if let Some(offset) = next_offset {
        response["next_page"] = json!({
            "offset": offset,
            "path": format!("/next?offset={offset}"),
            "uri": format!("https://app.asana.com/api/1.0/next?offset={offset}")
        });
    } else {
        response["next_page"] = Value::Null;
    }
    response
}

/// Responds 200 with `body` as JSON.
pub fn ok_json(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Creates an Asana error body.
pub fn create_error_response(message: &str) -> Value {
    json!({
        "errors": [{ "message": message, "help": "See the API documentation" }]
    })
}

/// Serves `pages` in order, then empty pages, counting requests.
pub struct PaginatedResponder {
    pages: Vec<Value>,
    current_page: Arc<AtomicU32>,
}

impl PaginatedResponder {
    pub fn new(pages: Vec<Value>) -> (Self, Arc<AtomicU32>) {
        let counter = Arc::new(AtomicU32::new(0));
        (
            Self {
                pages,
                current_page: Arc::clone(&counter),
            },
            counter,
        )
    }
}

impl Respond for PaginatedResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let page_idx = self.current_page.fetch_add(1, Ordering::SeqCst) as usize;
        match self.pages.get(page_idx) {
            Some(page) => ResponseTemplate::new(200).set_body_json(page.clone()),
            None => ResponseTemplate::new(200).set_body_json(create_data_response(vec![], None)),
        }
    }
}
