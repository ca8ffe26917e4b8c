//! End-to-end tests for the transparent refresh flow over real HTTP.

use mockito::Matcher;
use serde_json::json;
use taskhub_client::{ClientError, TokenKey, TokenStore};

use crate::test_harness::TestEnvironment;

#[tokio::test]
async fn test_expired_token_is_refreshed_and_replayed() {
    let mut env = TestEnvironment::new("A1", "R1").await;

    let rejected = env
        .server
        .mock("GET", "/tasks")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let refresh = env
        .server
        .mock("POST", "/auth/refresh")
        .match_body(Matcher::Json(json!({ "refresh_token": "R1" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"A2","refresh_token":"R2"}"#)
        .expect(1)
        .create_async()
        .await;

    let replayed = env
        .server
        .mock("GET", "/tasks")
        .match_header("authorization", "Bearer A2")
        .with_status(200)
        .with_body(r#"[{"id":1,"title":"write report"}]"#)
        .expect(1)
        .create_async()
        .await;

    let response = env.client.get(env.url("/tasks")).await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.text(), r#"[{"id":1,"title":"write report"}]"#);
    assert_eq!(env.stored(TokenKey::AccessToken).as_deref(), Some("A2"));
    assert_eq!(env.stored(TokenKey::RefreshToken).as_deref(), Some("R2"));

    rejected.assert_async().await;
    refresh.assert_async().await;
    replayed.assert_async().await;
}

#[tokio::test]
async fn test_refresh_rejection_ends_the_session() {
    let mut env = TestEnvironment::new("A1", "R1").await;

    env.server
        .mock("GET", "/tasks")
        .with_status(401)
        .create_async()
        .await;

    let refresh = env
        .server
        .mock("POST", "/auth/refresh")
        .with_status(401)
        .with_body(r#"{"error":"refresh token revoked"}"#)
        .expect(1)
        .create_async()
        .await;

    let result = env.client.get(env.url("/tasks")).await;

    assert!(matches!(result, Err(ClientError::RefreshFailed { .. })));
    // The logout terminator cleared the stored pair.
    assert_eq!(env.stored(TokenKey::AccessToken), None);
    assert_eq!(env.stored(TokenKey::RefreshToken), None);

    refresh.assert_async().await;
}

#[tokio::test]
async fn test_incomplete_refresh_body_is_a_failure() {
    let mut env = TestEnvironment::new("A1", "R1").await;

    env.server
        .mock("GET", "/tasks")
        .with_status(401)
        .create_async()
        .await;

    // Access token only: the rotation contract requires both.
    env.server
        .mock("POST", "/auth/refresh")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"A2"}"#)
        .create_async()
        .await;

    let result = env.client.get(env.url("/tasks")).await;

    assert!(matches!(result, Err(ClientError::RefreshFailed { .. })));
    assert_eq!(env.stored(TokenKey::AccessToken), None);
    assert_eq!(env.stored(TokenKey::RefreshToken), None);
}

#[tokio::test]
async fn test_missing_refresh_token_never_calls_the_auth_server() {
    let mut env = TestEnvironment::new("A1", "R1").await;
    env.store.remove(TokenKey::RefreshToken);

    env.server
        .mock("GET", "/tasks")
        .with_status(401)
        .create_async()
        .await;

    let refresh = env
        .server
        .mock("POST", "/auth/refresh")
        .expect(0)
        .create_async()
        .await;

    let result = env.client.get(env.url("/tasks")).await;

    assert!(matches!(result, Err(ClientError::NoRefreshToken)));
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_other_error_statuses_pass_through_untouched() {
    let mut env = TestEnvironment::new("A1", "R1").await;

    env.server
        .mock("GET", "/tasks")
        .match_header("authorization", "Bearer A1")
        .with_status(503)
        .with_body("maintenance window")
        .create_async()
        .await;

    let refresh = env
        .server
        .mock("POST", "/auth/refresh")
        .expect(0)
        .create_async()
        .await;

    let response = env.client.get(env.url("/tasks")).await.unwrap();

    assert_eq!(response.status.as_u16(), 503);
    assert_eq!(response.text(), "maintenance window");
    // Tokens untouched, no refresh attempted.
    assert_eq!(env.stored(TokenKey::AccessToken).as_deref(), Some("A1"));
    refresh.assert_async().await;
}
