//! Protocol-level tests for the remote host client against a mock API.

use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use remuxd::config::RemoteConfig;
use remuxd::error::Error;
use remuxd::proxy::ProxyPool;
use remuxd::remote::RemoteHostClient;

fn client_for(server: &MockServer) -> RemoteHostClient {
    let mut config = RemoteConfig::default();
    config.api_base = server.uri();
    config.api_timeout_secs = 5;
    config.download_timeout_secs = 5;
    RemoteHostClient::new(&config, Arc::new(ProxyPool::new(Vec::new())))
}

#[tokio::test]
async fn create_account_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "data": {"token": "tok-123", "id": "acct-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client_for(&server).create_account().await.unwrap();
    assert_eq!(token, "tok-123");
}

#[tokio::test]
async fn get_content_sends_bearer_and_site_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contents/Abc123"))
        .and(header("authorization", "Bearer tok-123"))
        .and(header("x-website-token", "4fd6sg89d7s6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "data": {
                "children": {
                    "c1": {
                        "type": "file",
                        "name": "ep01.mkv",
                        "size": 700_000_000u64,
                        "link": "https://store1.example/download/c1/ep01.mkv",
                        "mimetype": "video/x-matroska",
                        "id": "c1"
                    },
                    "c2": {"type": "folder", "name": "extras"}
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let content = client_for(&server)
        .get_content("Abc123", "tok-123")
        .await
        .unwrap();

    let video = content.principal_video().unwrap();
    assert_eq!(video.name, "ep01.mkv");
    assert!(!video.is_web_compatible());
    assert_eq!(video.link.as_deref(), Some("https://store1.example/download/c1/ep01.mkv"));
}

#[tokio::test]
async fn non_ok_status_is_a_remote_host_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contents/missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error-notFound",
            "data": null
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_content("missing", "tok")
        .await
        .unwrap_err();
    assert_matches!(err, Error::RemoteHost(_));
}

#[tokio::test]
async fn list_upload_servers_returns_names_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "data": {"servers": [
                {"name": "store1", "zone": "eu"},
                {"name": "store2", "zone": "na"}
            ]}
        })))
        .mount(&server)
        .await;

    let servers = client_for(&server).list_upload_servers().await.unwrap();
    assert_eq!(servers, vec!["store1", "store2"]);
}

#[tokio::test]
async fn download_streams_body_to_disk_with_session_cookie() {
    let server = MockServer::start().await;
    let body = vec![0xABu8; 64 * 1024];
    Mock::given(method("GET"))
        .and(path("/direct/ep01.mkv"))
        .and(header("cookie", "accountToken=tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("w1_7.mkv");

    client_for(&server)
        .download(&format!("{}/direct/ep01.mkv", server.uri()), "tok-123", &dest)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[tokio::test]
async fn download_http_error_does_not_create_ghost_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/direct/gone.mkv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("gone.mkv");

    let result = client_for(&server)
        .download(&format!("{}/direct/gone.mkv", server.uri()), "tok", &dest)
        .await;

    assert!(result.is_err());
}
