//! Integration tests for the Asana API client against a mock server.

mod common;

use common::*;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xavyo_connector_asana::{AsanaError, PageRequest};

#[tokio::test]
async fn test_list_users_first_page_sends_no_offset() {
    init_test_logging();
    let server = MockServer::start().await;
    let body = create_data_response(vec![create_test_user("u1", "Ada Lovelace")], Some("abc"));

    Mock::given(method("GET"))
        .and(path(api_path("/users")))
        .and(query_param("workspace", "ws1"))
        .and(query_param("limit", "100"))
        .and(query_param("opt_fields", "email,name"))
        .and(query_param_is_missing("offset"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", "application/json"))
        .respond_with(ok_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let cancel = CancellationToken::new();
    let page = client
        .list_users(&cancel, PageRequest::new("ws1", 100, ""))
        .await
        .unwrap();

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].gid.as_deref(), Some("u1"));
    assert_eq!(
        page.data[0].email.as_deref(),
        Some("ada.lovelace@example.com")
    );
    assert_eq!(page.next_offset, "abc");
    assert_eq!(page.status.as_u16(), 200);
}

#[tokio::test]
async fn test_list_users_later_page_sends_offset() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("/users")))
        .and(query_param("offset", "abc"))
        .and(query_param("limit", "25"))
        .respond_with(ok_json(create_data_response(vec![], None)))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let cancel = CancellationToken::new();
    let page = client
        .list_users(&cancel, PageRequest::new("ws1", 25, "abc"))
        .await
        .unwrap();

    assert!(page.data.is_empty());
    assert_eq!(page.next_offset, "");
}

#[tokio::test]
async fn test_collection_paths() {
    let server = MockServer::start().await;
    let empty = create_data_response(vec![], None);

    for suffix in [
        "/workspaces/ws1/workspace_memberships",
        "/workspaces/ws1/teams",
        "/teams/t1/team_memberships",
    ] {
        Mock::given(method("GET"))
            .and(path(api_path(suffix)))
            .and(query_param("limit", "10"))
            .respond_with(ok_json(empty.clone()))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = test_client(&server);
    let cancel = CancellationToken::new();

    client
        .list_workspace_memberships(&cancel, PageRequest::new("ws1", 10, ""))
        .await
        .unwrap();
    client
        .list_teams(&cancel, PageRequest::new("ws1", 10, ""))
        .await
        .unwrap();
    client
        .list_team_memberships(&cancel, PageRequest::new("t1", 10, ""))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_workspace() {
    let server = MockServer::start().await;
    let body = json!({ "data": create_test_workspace("ws1", "Acme") });

    Mock::given(method("GET"))
        .and(path(api_path("/workspaces/ws1")))
        .and(query_param("opt_fields", "is_organization,name,email_domains"))
        .respond_with(ok_json(body))
        .mount(&server)
        .await;

    let workspace = test_client(&server)
        .get_workspace(&CancellationToken::new(), "ws1")
        .await
        .unwrap();

    assert_eq!(workspace.gid.as_deref(), Some("ws1"));
    assert_eq!(workspace.name.as_deref(), Some("Acme"));
    assert!(workspace.is_organization);
    assert_eq!(workspace.email_domains, vec!["example.com".to_string()]);
}

#[tokio::test]
async fn test_auth_check_returns_memberships() {
    let server = MockServer::start().await;
    let memberships = vec![
        create_workspace_membership("m1", json!({}), "ws1", true, false, false),
        create_workspace_membership("m2", json!({}), "ws2", false, false, true),
    ];

    Mock::given(method("GET"))
        .and(path(api_path("/users/me/workspace_memberships")))
        .respond_with(ok_json(create_data_response(memberships, None)))
        .mount(&server)
        .await;

    let memberships = test_client(&server)
        .auth_check(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(memberships.len(), 2);
    assert_eq!(memberships[0].workspace.gid.as_deref(), Some("ws1"));
    assert!(memberships[1].is_guest);
}

#[tokio::test]
async fn test_mutations_post_user_body() {
    let server = MockServer::start().await;

    for suffix in [
        "/workspaces/ws1/addUser",
        "/workspaces/ws1/removeUser",
        "/teams/t1/addUser",
        "/teams/t1/removeUser",
    ] {
        Mock::given(method("POST"))
            .and(path(api_path(suffix)))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({ "data": { "user": "u1" } })))
            .respond_with(ok_json(json!({ "data": {} })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = test_client(&server);
    let cancel = CancellationToken::new();

    client
        .add_user_to_workspace(&cancel, "ws1", "u1")
        .await
        .unwrap();
    client
        .remove_user_from_workspace(&cancel, "ws1", "u1")
        .await
        .unwrap();
    client.add_user_to_team(&cancel, "t1", "u1").await.unwrap();
    client
        .remove_user_from_team(&cancel, "t1", "u1")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_status_mapping() {
    let server = MockServer::start().await;

    let cases = [
        ("ws401", 401),
        ("ws403", 403),
        ("ws404", 404),
        ("ws500", 500),
    ];
    for (gid, status) in cases {
        let body = create_error_response(&format!("failed with {status}"));
        Mock::given(method("GET"))
            .and(path(api_path(&format!("/workspaces/{gid}"))))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
    }

    let client = test_client(&server);
    let cancel = CancellationToken::new();

    let err = client.get_workspace(&cancel, "ws401").await.unwrap_err();
    assert!(matches!(err, AsanaError::Unauthorized(ref m) if m == "failed with 401"));

    let err = client.get_workspace(&cancel, "ws403").await.unwrap_err();
    assert!(err.is_permission_denied());

    let err = client.get_workspace(&cancel, "ws404").await.unwrap_err();
    assert!(matches!(err, AsanaError::NotFound(_)));

    let err = client.get_workspace(&cancel, "ws500").await.unwrap_err();
    assert!(matches!(err, AsanaError::Api { status: 500, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("/workspaces/ws1/teams")))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "17")
                .set_body_json(create_error_response("Too many requests")),
        )
        .mount(&server)
        .await;

    let err = test_client(&server)
        .list_teams(&CancellationToken::new(), PageRequest::new("ws1", 100, ""))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AsanaError::RateLimited {
            retry_after_secs: 17
        }
    ));
}

#[tokio::test]
async fn test_undecodable_body_is_json_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("/workspaces/ws1/teams")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .list_teams(&CancellationToken::new(), PageRequest::new("ws1", 100, ""))
        .await
        .unwrap_err();

    assert!(matches!(err, AsanaError::Json(_)));
}

#[tokio::test]
async fn test_cancellation_aborts_pending_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("/workspaces/ws1")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({ "data": create_test_workspace("ws1", "Acme") })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = client.get_workspace(&cancel, "ws1").await.unwrap_err();
    assert!(matches!(err, AsanaError::Cancelled));
}
