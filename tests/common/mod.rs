//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{AppendHeaders, IntoResponse},
    routing::{any, get},
    Json, Router,
};
use futures_util::future::BoxFuture;
use serde_json::{json, Map, Value};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use subdomain_proxy::config::ProxyConfig;
use subdomain_proxy::upstream::{OutboundRequest, TransportError, Upstream, UpstreamResponse};
use subdomain_proxy::{HttpServer, Shutdown};

/// Scripted transport: pops one outcome per call, records every request.
/// `Some(status)` answers with that status; `None` is a transport failure.
/// Once the script runs out every call fails.
#[derive(Default)]
pub struct ScriptedUpstream {
    outcomes: Mutex<VecDeque<Option<u16>>>,
    seen: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedUpstream {
    pub fn new(outcomes: Vec<Option<u16>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Upstream for ScriptedUpstream {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>> {
        self.seen.lock().unwrap().push(request);
        let outcome = self.outcomes.lock().unwrap().pop_front().flatten();
        Box::pin(async move {
            match outcome {
                Some(status) => {
                    let mut headers = HeaderMap::new();
                    headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
                    headers.append(header::SET_COOKIE, "a=1".parse().unwrap());
                    headers.append(header::SET_COOKIE, "b=2".parse().unwrap());
                    Ok(UpstreamResponse {
                        status: StatusCode::from_u16(status).unwrap(),
                        headers,
                        body: Bytes::from_static(b"{\"id\":1}"),
                    })
                }
                None => Err(refused()),
            }
        })
    }
}

/// Transport where every attempt takes `delay` and then fails to connect.
/// Attempts dropped before finishing are counted as abandoned.
pub struct SlowUpstream {
    delay: Duration,
    calls: AtomicUsize,
    abandoned: AtomicUsize,
    called: Notify,
}

impl SlowUpstream {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: AtomicUsize::new(0),
            abandoned: AtomicUsize::new(0),
            called: Notify::new(),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    /// Wait until at least one attempt has started.
    pub async fn first_call(&self) {
        self.called.notified().await;
    }
}

struct AttemptGuard<'a> {
    abandoned: &'a AtomicUsize,
    finished: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Upstream for SlowUpstream {
    fn send(&self, _request: OutboundRequest) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.called.notify_one();
        Box::pin(async move {
            let mut guard = AttemptGuard {
                abandoned: &self.abandoned,
                finished: false,
            };
            tokio::time::sleep(self.delay).await;
            guard.finished = true;
            Err(refused())
        })
    }
}

/// Transport with a bug: panics on every send.
pub struct PanickingUpstream;

impl Upstream for PanickingUpstream {
    fn send(&self, _request: OutboundRequest) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>> {
        panic!("transport invariant broken");
    }
}

/// A connect failure, as a refused TCP connection produces.
pub fn refused() -> TransportError {
    TransportError::Connect(io::Error::from(io::ErrorKind::ConnectionRefused).into())
}

/// Config suited to tests: no metrics, short timeouts.
pub fn test_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.timeouts.read_secs = 5;
    config
}

/// Start a mock upstream that answers like a small JSON API.
///
/// - `GET /v1/users/{id}` → `200 {"id":<id>}`
/// - `/status/{code}` → that status, an `x-upstream` header and two cookies
/// - anything else → JSON echo of method, path, query, headers and body
pub async fn start_mock_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/v1/users/{id}", get(user))
        .route("/status/{code}", any(status))
        .fallback(echo);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn user(Path(id): Path<u64>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        format!("{{\"id\":{id}}}"),
    )
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::IM_A_TEAPOT);
    (
        status,
        AppendHeaders([
            ("x-upstream", "yes"),
            ("set-cookie", "a=1"),
            ("set-cookie", "b=2"),
        ]),
        format!("upstream says {code}"),
    )
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let mut map = Map::new();
    for (name, value) in &headers {
        let values = map
            .entry(name.as_str())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = values {
            values.push(Value::String(value.to_str().unwrap_or_default().to_string()));
        }
    }

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": map,
        "body": String::from_utf8_lossy(&body),
    }))
}

/// Start a listener that reads each request and hangs up without answering.
/// Every accepted connection bumps `accepted`.
pub async fn start_dropping_upstream(accepted: Arc<AtomicU32>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
            });
        }
    });
    addr
}

/// Bind the proxy on an ephemeral port and serve it in the background.
pub async fn spawn_proxy(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}
