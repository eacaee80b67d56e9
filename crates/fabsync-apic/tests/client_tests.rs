//! Wire-level tests for the controller client against a mock HTTP server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fabsync_apic::{
    ApicClient, ApicConfig, FabricController, FabricError, LifecycleStatus, SharedController,
};

fn config(base_url: String) -> ApicConfig {
    ApicConfig {
        base_url,
        username: "admin".to_string(),
        password: "secret".to_string(),
        tenant: "prod".to_string(),
        application_profile: "web-app".to_string(),
    }
}

fn login_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "imdata": [{
            "aaaLogin": {
                "attributes": { "token": "tok123" }
            }
        }]
    }))
}

async fn logged_in_client(server: &MockServer) -> ApicClient {
    Mock::given(method("POST"))
        .and(path("/api/aaaLogin.json"))
        .and(body_partial_json(json!({
            "aaaUser": { "attributes": { "name": "admin" } }
        })))
        .respond_with(login_response())
        .mount(server)
        .await;

    let client = ApicClient::new(config(server.uri())).unwrap();
    client.login().await.unwrap();
    client
}

#[tokio::test]
async fn test_push_epg_carries_session_cookie() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/node/mo/uni/tn-prod/ap-web-app/epg-web.json"))
        .and(header("cookie", "APIC-cookie=tok123"))
        .and(body_partial_json(json!({
            "fvAEPg": { "attributes": { "name": "web", "status": "created,modified" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"imdata": []})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .push_epg("web", LifecycleStatus::CreatedModified)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_non_success_response_fails_that_call_only() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/node/mo/uni/tn-prod/brc-allow-web.json"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client
        .push_contract("allow-web", None, LifecycleStatus::Deleted)
        .await
        .unwrap_err();
    match err {
        FabricError::CallFailed { path, status } => {
            assert_eq!(path, "/api/node/mo/uni/tn-prod/brc-allow-web.json");
            assert_eq!(status, 403);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_request_without_session_is_auth_error() {
    let server = MockServer::start().await;
    let client = ApicClient::new(config(server.uri())).unwrap();

    let err = client
        .push_epg("web", LifecycleStatus::CreatedModified)
        .await
        .unwrap_err();
    assert!(matches!(err, FabricError::Auth(_)));
}

#[tokio::test]
async fn test_refresh_replaces_token() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/aaaRefresh.json"))
        .and(header("cookie", "APIC-cookie=tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "imdata": [{
                "aaaLogin": { "attributes": { "token": "tok456" } }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.refresh().await.unwrap();

    // Subsequent requests must present the refreshed token.
    Mock::given(method("POST"))
        .and(path("/api/node/mo/uni/tn-prod/ap-web-app/epg-web.json"))
        .and(header("cookie", "APIC-cookie=tok456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"imdata": []})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .push_epg("web", LifecycleStatus::CreatedModified)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_login_failure_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/aaaLogin.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = ApicClient::new(config(server.uri())).unwrap();
    assert!(matches!(client.login().await, Err(FabricError::Auth(_))));
}

#[tokio::test]
async fn test_shared_controller_constructs_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/aaaLogin.json"))
        .respond_with(login_response())
        .expect(1)
        .mount(&server)
        .await;

    let shared = SharedController::new(config(server.uri()));
    let a = shared.get().await.unwrap();
    let b = shared.get().await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
}

#[tokio::test]
async fn test_logout_drops_session() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/aaaLogout.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"imdata": []})))
        .expect(1)
        .mount(&server)
        .await;

    client.logout().await.unwrap();

    let err = client
        .push_epg("web", LifecycleStatus::CreatedModified)
        .await
        .unwrap_err();
    assert!(matches!(err, FabricError::Auth(_)));
}
