//! Integration tests for [`HttpSessionProvider`] against a mock session endpoint.

use std::sync::Arc;

use actions::guard::{UNAUTHENTICATED, UNAUTHORIZED};
use actions::{
    ActionBuilder, ActionError, ActionName, ActionResult, CallOptions, Role, SessionCookie,
    SessionError, SessionProvider,
};
use serde_json::json;
use session::{ConfigSource, HttpSessionProvider, SessionEndpointConfig};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROUTE: &str = "/api/auth/session";

fn provider_for(server: &MockServer) -> HttpSessionProvider {
    HttpSessionProvider::new(
        reqwest::Client::new(),
        ConfigSource::Fixed(SessionEndpointConfig::new(server.uri(), ROUTE)),
    )
}

fn cookie(value: &str) -> SessionCookie {
    SessionCookie::new(value).unwrap()
}

#[tokio::test]
async fn test_forwards_cookie_and_decodes_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROUTE))
        .and(header("cookie", "sid=abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "authenticated": true, "role": "admin" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = provider_for(&server)
        .current_session(Some(&cookie("sid=abc123")))
        .await
        .unwrap();

    assert!(session.authenticated);
    assert_eq!(session.role, Some(Role::new("admin").unwrap()));
}

#[tokio::test]
async fn test_unauthorized_status_body_is_still_authoritative() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROUTE))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "authenticated": false })))
        .mount(&server)
        .await;

    let session = provider_for(&server).current_session(None).await.unwrap();

    assert!(!session.authenticated);
    assert_eq!(session.role, None);
}

#[tokio::test]
async fn test_empty_role_is_treated_as_absent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROUTE))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "authenticated": true, "role": "" })),
        )
        .mount(&server)
        .await;

    let session = provider_for(&server).current_session(None).await.unwrap();

    assert!(session.authenticated);
    assert_eq!(session.role, None);
}

#[tokio::test]
async fn test_non_json_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROUTE))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = provider_for(&server).current_session(None).await.unwrap_err();

    match err {
        SessionError::Decode { message } => assert!(message.contains("502"), "{message}"),
        other => panic!("expected Decode, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_transport_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let provider = HttpSessionProvider::new(
        reqwest::Client::new(),
        ConfigSource::Fixed(SessionEndpointConfig::new(
            format!("http://127.0.0.1:{port}"),
            ROUTE,
        )),
    );

    let err = provider.current_session(None).await.unwrap_err();

    assert!(matches!(err, SessionError::Transport { .. }), "{err:?}");
}

#[tokio::test]
async fn test_guard_looks_up_session_once_per_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROUTE))
        .and(header("cookie", "sid=user"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "authenticated": true, "role": "user" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let action = ActionBuilder::new(
        ActionName::new("delete-post").unwrap(),
        Arc::new(provider_for(&server)),
    )
    .allowed_roles([Role::new("admin").unwrap()])
    .without_input(|_token| async { Ok::<_, ActionError>(ActionResult::Success(())) });

    for _ in 0..2 {
        let result = action
            .call(CallOptions::new().session_cookie(cookie("sid=user")))
            .await
            .unwrap();
        assert_eq!(result.error_message(), Some(UNAUTHORIZED));
    }
}

#[tokio::test]
async fn test_guard_rejects_anonymous_caller_from_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROUTE))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "authenticated": false })))
        .expect(1)
        .mount(&server)
        .await;

    let action = ActionBuilder::new(
        ActionName::new("list-posts").unwrap(),
        Arc::new(provider_for(&server)),
    )
    .without_input(|_token| async { Ok::<_, ActionError>(ActionResult::Success(1_u32)) });

    let result = action.call(CallOptions::new()).await.unwrap();

    assert_eq!(result.error_message(), Some(UNAUTHENTICATED));
}
