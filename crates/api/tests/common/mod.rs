#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use relay_api::config::ServerConfig;
use relay_api::router::{build_app_router, build_ws_router};
use relay_api::state::AppState;
use relay_api::ws::ChatHub;
use relay_store::{InMemoryStore, Store};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// ephemeral ports, and short scheduler timings.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        http_port: 0,
        ws_port: 0,
        cors_origins: vec!["http://localhost:5173".parse().unwrap()],
        request_timeout_secs: 30,
        scheduler_tick: Duration::from_millis(20),
        processing_delay: Duration::from_millis(20),
        heartbeat_interval: Duration::from_secs(30),
    }
}

/// Build an `AppState` around a fresh in-memory store.
pub fn build_test_state() -> AppState {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    AppState {
        hub: Arc::new(ChatHub::new(Arc::clone(&store))),
        store,
    }
}

/// Build the HTTP router with the production middleware stack.
pub fn build_test_app(state: AppState) -> Router {
    build_app_router(state, &test_config())
}

/// Send a GET request through the router.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body through the router.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

/// Send a POST request with an arbitrary body labelled as JSON.
pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Serve the WebSocket router on an ephemeral port.
///
/// Returns the bound address; the server stops when `cancel` fires.
pub async fn spawn_ws_server(state: AppState, cancel: CancellationToken) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_ws_router(state);

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(cancel.cancelled_owned())
            .await
            .unwrap();
    });

    addr
}

/// Poll `hub` until it reports `expected` connections.
pub async fn wait_for_connections(hub: &ChatHub, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while hub.connection_count().await != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("hub never reached the expected connection count");
}
