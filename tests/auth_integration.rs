//! Integration tests for the auth flows
//!
//! Drives login, registration, startup restore, and logout against a mock
//! backend and checks the credential store and the observable session status
//! after each flow.

use std::sync::Arc;

use serde_json::json;
use storefront_client::testing::MemoryCredentialStore;
use storefront_client::{
    AuthApiError, AuthServiceError, ClientConfig, CredentialStore, SessionStatus, StorefrontClient,
    TokenPair,
};
use tokio_test::assert_ok;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("storefront_client=debug").try_init();
}

fn client_for(server: &MockServer) -> (StorefrontClient, Arc<MemoryCredentialStore>) {
    init_tracing();
    let store = Arc::new(MemoryCredentialStore::new());
    let client = StorefrontClient::builder(ClientConfig::new(server.uri()))
        .store(Arc::clone(&store) as _)
        .build()
        .unwrap();
    (client, store)
}

/// A fresh login stores the pair, authenticates the session, and subsequent
/// requests go through without touching the refresh endpoint.
#[tokio::test]
async fn login_then_request_needs_no_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({ "email": "user@example.com", "password": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access": "tok1", "refresh": "ref1" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/store/products/"))
        .and(header("Authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);

    assert_ok!(client.auth().login("user@example.com", "hunter2").await);
    assert_eq!(client.session().status(), SessionStatus::Authenticated);
    assert_eq!(store.load().await.unwrap(), Some(TokenPair::new("tok1", "ref1")));

    let products: Vec<serde_json::Value> =
        assert_ok!(client.api().get("api/store/products/").await);
    assert!(products.is_empty());
}

/// A rejected login surfaces the server's message and leaves the store empty.
#[tokio::test]
async fn rejected_login_reports_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({ "detail": "No active account found with the given credentials" }),
        ))
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);

    let result = client.auth().login("user@example.com", "wrong").await;
    match result {
        Err(AuthServiceError::Api(AuthApiError::InvalidCredentials(msg))) => {
            assert!(msg.contains("No active account"));
        }
        other => panic!("expected InvalidCredentials, got {other:?}"),
    }
    assert_eq!(store.load().await.unwrap(), None);
    assert_ne!(client.session().status(), SessionStatus::Authenticated);
}

/// Registration followed by the e-mailed code logs the session in.
#[tokio::test]
async fn registration_code_activates_the_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .and(body_json(json!({ "email": "new@example.com", "password": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "message": "verification code sent" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/verify-code/"))
        .and(body_json(json!({ "email": "new@example.com", "code": "123456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "account activated",
            "tokens": { "access": "tokA", "refresh": "refA" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);

    assert_ok!(client.auth().register("new@example.com", "hunter2").await);
    assert_ne!(client.session().status(), SessionStatus::Authenticated);

    assert_ok!(client.auth().verify_registration("new@example.com", "123456").await);
    assert_eq!(client.session().status(), SessionStatus::Authenticated);
    assert_eq!(store.load().await.unwrap(), Some(TokenPair::new("tokA", "refA")));
}

/// A wrong verification code is rejected and nothing is stored.
#[tokio::test]
async fn wrong_verification_code_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/verify-code/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid code" })),
        )
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);

    let result = client.auth().verify_registration("new@example.com", "000000").await;
    assert!(matches!(
        result,
        Err(AuthServiceError::Api(AuthApiError::Rejected { status: 400, .. }))
    ));
    assert_eq!(store.load().await.unwrap(), None);
}

/// Logout revokes the refresh token server-side and clears local state.
#[tokio::test]
async fn logout_revokes_and_clears() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .and(body_json(json!({ "refresh": "ref1" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);
    store.seed(TokenPair::new("tok1", "ref1"));

    client.auth().logout().await;
    assert_eq!(store.load().await.unwrap(), None);
    assert_eq!(client.session().status(), SessionStatus::Unauthenticated);
}

/// Server-side revocation failure does not stop the local logout.
#[tokio::test]
async fn logout_is_best_effort() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);
    store.seed(TokenPair::new("tok1", "ref1"));

    client.auth().logout().await;
    assert_eq!(store.load().await.unwrap(), None);
    assert_eq!(client.session().status(), SessionStatus::Unauthenticated);
}

/// Startup restore: a stored pair that still verifies authenticates the
/// session without any login.
#[tokio::test]
async fn initialize_restores_a_valid_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/verify/"))
        .and(body_json(json!({ "token": "tok1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);
    store.seed(TokenPair::new("tok1", "ref1"));

    assert!(client.auth().initialize().await.unwrap());
    assert_eq!(client.session().status(), SessionStatus::Authenticated);
}

/// Startup restore with no stored pair reports unauthenticated without
/// calling the server.
#[tokio::test]
async fn initialize_without_credentials_is_unauthenticated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/verify/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);

    assert!(!client.auth().initialize().await.unwrap());
    assert_eq!(client.session().status(), SessionStatus::Unauthenticated);
}

/// A stored pair that fails verification reports unauthenticated but is kept
/// in the store, so the first request can still try a refresh.
#[tokio::test]
async fn initialize_keeps_an_unverified_pair() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/verify/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" }),
        ))
        .mount(&server)
        .await;

    let (client, store) = client_for(&server);
    store.seed(TokenPair::new("stale", "ref1"));

    assert!(!client.auth().initialize().await.unwrap());
    assert_eq!(client.session().status(), SessionStatus::Unauthenticated);
    assert_eq!(store.load().await.unwrap(), Some(TokenPair::new("stale", "ref1")));
}

/// Session status changes are observable through the watch channel.
#[tokio::test]
async fn session_changes_reach_subscribers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access": "tok1", "refresh": "ref1" })),
        )
        .mount(&server)
        .await;

    let (client, _store) = client_for(&server);

    let mut rx = client.auth().subscribe();
    assert_eq!(*rx.borrow(), SessionStatus::Unknown);

    client.auth().login("user@example.com", "hunter2").await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), SessionStatus::Authenticated);
}
