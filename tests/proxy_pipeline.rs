//! Request pipeline tests: gatekeeper, path parsing, retries and mirroring,
//! driven through the fully layered router without a socket.

mod common;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use tower::ServiceExt;

use common::{test_config, PanickingUpstream, ScriptedUpstream};
use subdomain_proxy::config::ProxyConfig;
use subdomain_proxy::HttpServer;

fn server(config: ProxyConfig, upstream: std::sync::Arc<ScriptedUpstream>) -> HttpServer {
    HttpServer::with_upstream(config, upstream).unwrap()
}

fn keyed_config(key: &str) -> ProxyConfig {
    let mut config = test_config();
    config.auth.key = key.into();
    config
}

async fn send(server: &HttpServer, request: Request<Body>) -> Response {
    server.router().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_of(response: Response) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

#[tokio::test]
async fn test_path_without_remainder_is_rejected() {
    let upstream = ScriptedUpstream::new(vec![Some(200)]);
    let server = server(test_config(), upstream.clone());

    for uri in ["/badpath", "/", "/users/"] {
        let response = send(&server, get(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            body_of(response).await,
            Bytes::from_static(b"URL format invalid. Expected /subdomain/path")
        );
    }
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_invalid_subdomain_is_rejected() {
    let upstream = ScriptedUpstream::new(vec![Some(200)]);
    let server = server(test_config(), upstream.clone());

    let response = send(&server, get("/evil.com%2F@x/v1")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_missing_key_is_rejected() {
    let upstream = ScriptedUpstream::new(vec![Some(200)]);
    let server = server(keyed_config("s3cret"), upstream.clone());

    let response = send(&server, get("/users/v1/users/1")).await;
    assert_eq!(response.status(), StatusCode::PROXY_AUTHENTICATION_REQUIRED);
    assert_eq!(
        body_of(response).await,
        Bytes::from_static(b"Missing or invalid PROXYKEY header.")
    );
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_wrong_key_is_rejected_before_parsing() {
    let upstream = ScriptedUpstream::new(vec![Some(200)]);
    let server = server(keyed_config("s3cret"), upstream.clone());

    // Gatekeeper runs first, so even a malformed path gets 407.
    for uri in ["/users/v1/users/1", "/badpath"] {
        let request = Request::builder()
            .uri(uri)
            .header("PROXYKEY", "wrong")
            .body(Body::empty())
            .unwrap();
        let response = send(&server, request).await;
        assert_eq!(response.status(), StatusCode::PROXY_AUTHENTICATION_REQUIRED, "{uri}");
    }
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_correct_key_is_forwarded_but_not_leaked() {
    let upstream = ScriptedUpstream::new(vec![Some(200)]);
    let server = server(keyed_config("s3cret"), upstream.clone());

    let request = Request::builder()
        .uri("/users/v1/users/1")
        .header("PROXYKEY", "s3cret")
        .body(Body::empty())
        .unwrap();
    let response = send(&server, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let seen = upstream.requests();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].headers.contains_key("proxykey"));
}

#[tokio::test]
async fn test_key_header_ignored_when_disabled() {
    let upstream = ScriptedUpstream::new(vec![Some(200), Some(200)]);
    let server = server(test_config(), upstream.clone());

    let without = send(&server, get("/users/v1/users/1")).await;
    assert_eq!(without.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/users/v1/users/1")
        .header("PROXYKEY", "anything")
        .body(Body::empty())
        .unwrap();
    let with = send(&server, request).await;
    assert_eq!(with.status(), StatusCode::OK);

    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_exhausted_retries_return_500_after_r_plus_one_attempts() {
    let upstream = ScriptedUpstream::new(vec![]);
    let mut config = test_config();
    config.retries.max_retries = 3;
    let server = server(config, upstream.clone());

    let response = send(&server, get("/users/v1/users/1")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_of(response).await,
        Bytes::from_static(b"Proxy failed to connect. Please try again.")
    );
    assert_eq!(upstream.calls(), 4);
}

#[tokio::test]
async fn test_success_after_transient_failures() {
    let upstream = ScriptedUpstream::new(vec![None, None, Some(200)]);
    let server = server(test_config(), upstream.clone());

    let response = send(&server, get("/users/v1/users/1")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(upstream.calls(), 3);
}

#[tokio::test]
async fn test_upstream_error_status_mirrored_without_retry() {
    let upstream = ScriptedUpstream::new(vec![Some(503), Some(200)]);
    let server = server(test_config(), upstream.clone());

    let response = send(&server, get("/users/v1/users/1")).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
    assert_eq!(cookies, vec!["a=1", "b=2"]);
    assert_eq!(body_of(response).await, Bytes::from_static(b"{\"id\":1}"));
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_request_is_rebuilt_for_upstream() {
    let upstream = ScriptedUpstream::new(vec![Some(201)]);
    let server = server(test_config(), upstream.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/groups/v1/groups/7/join?src=web&x=1")
        .header("Roblox-Id", "42")
        .header(header::USER_AGENT, "curl/8.0")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"join\":true}"))
        .unwrap();
    let response = send(&server, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let seen = upstream.requests();
    let outbound = &seen[0];
    assert_eq!(outbound.method, "POST");
    assert_eq!(
        outbound.url.as_str(),
        "https://groups.roblox.com/v1/groups/7/join?src=web&x=1"
    );
    assert_eq!(outbound.body, Bytes::from_static(b"{\"join\":true}"));
    assert!(!outbound.headers.contains_key("roblox-id"));
    assert_eq!(
        outbound.headers.get(header::USER_AGENT).unwrap(),
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64)"
    );
    assert_eq!(outbound.headers.get(header::ACCEPT).unwrap(), "application/json");
    assert_eq!(
        outbound.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let upstream = ScriptedUpstream::new(vec![Some(200)]);
    let mut config = test_config();
    config.security.max_body_size = 16;
    let server = server(config, upstream.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/users/v1/users")
        .body(Body::from(vec![b'x'; 64]))
        .unwrap();
    let response = send(&server, request).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let upstream = ScriptedUpstream::new(vec![Some(200)]);
    let server = server(test_config(), upstream);

    let generated = send(&server, get("/users/v1/users/1")).await;
    let id = generated.headers().get("x-request-id").unwrap();
    assert!(!id.is_empty());

    let request = Request::builder()
        .uri("/badpath")
        .header("x-request-id", "caller-chosen")
        .body(Body::empty())
        .unwrap();
    let propagated = send(&server, request).await;
    assert_eq!(propagated.headers().get("x-request-id").unwrap(), "caller-chosen");
}

#[tokio::test]
async fn test_panicking_transport_is_contained() {
    let server = HttpServer::with_upstream(test_config(), std::sync::Arc::new(PanickingUpstream))
        .unwrap();

    let response = send(&server, get("/users/v1/users/1")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_of(response).await, Bytes::from_static(b"Internal proxy error."));

    // The router keeps serving after the panic.
    let response = send(&server, get("/badpath")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
