//! Tests for the HTTP auth server client against mock endpoints.

use mockito::Matcher;
use serde_json::json;
use taskhub_client::{AuthServerClient, ClientConfig, ClientError, HttpAuthServer};

async fn setup() -> (mockito::ServerGuard, HttpAuthServer) {
    let server = mockito::Server::new_async().await;
    let config = ClientConfig::new(server.url());
    let auth = HttpAuthServer::new(&config).expect("auth server");
    (server, auth)
}

#[tokio::test]
async fn test_refresh_rotates_the_pair() {
    let (mut server, auth) = setup().await;

    let mock = server
        .mock("POST", "/auth/refresh")
        .match_body(Matcher::Json(json!({ "refresh_token": "R1" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"A2","refresh_token":"R2"}"#)
        .expect(1)
        .create_async()
        .await;

    let tokens = auth.refresh("R1").await.unwrap();

    assert_eq!(tokens.access_token, "A2");
    assert_eq!(tokens.refresh_token, "R2");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_refresh_rejection_maps_to_refresh_failed() {
    let (mut server, auth) = setup().await;

    server
        .mock("POST", "/auth/refresh")
        .with_status(401)
        .with_body(r#"{"error":"invalid refresh token"}"#)
        .create_async()
        .await;

    let result = auth.refresh("R1").await;
    assert!(matches!(result, Err(ClientError::RefreshFailed { .. })));
}

#[tokio::test]
async fn test_login_returns_the_initial_pair() {
    let (mut server, auth) = setup().await;

    let mock = server
        .mock("POST", "/auth/login")
        .match_body(Matcher::Json(json!({
            "email": "dev@taskhub.dev",
            "password": "hunter2"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"A1","refresh_token":"R1"}"#)
        .expect(1)
        .create_async()
        .await;

    let tokens = auth.login("dev@taskhub.dev", "hunter2").await.unwrap();

    assert_eq!(tokens.access_token, "A1");
    assert_eq!(tokens.refresh_token, "R1");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_login_rejection_is_an_error() {
    let (mut server, auth) = setup().await;

    server
        .mock("POST", "/auth/login")
        .with_status(401)
        .with_body(r#"{"error":"bad credentials"}"#)
        .create_async()
        .await;

    let result = auth.login("dev@taskhub.dev", "wrong").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_logout_is_best_effort() {
    let (mut server, auth) = setup().await;

    let mock = server
        .mock("POST", "/auth/logout")
        .match_header("authorization", "Bearer A1")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    // A server-side failure must not keep the local session alive.
    auth.logout("A1").await.unwrap();
    mock.assert_async().await;
}
