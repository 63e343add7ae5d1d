//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Body, response::Response, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use service_skeleton::config::ServiceConfig;
use service_skeleton::health::{CheckError, Dependencies, DependencyCheck};
use service_skeleton::http::{AppState, HttpServer, ServerError};
use service_skeleton::lifecycle::Shutdown;
use service_skeleton::observability::metrics::{sample_value, ACTIVE_CONNECTIONS};
use service_skeleton::observability::MetricsRegistry;

/// Dependency check that always passes.
#[derive(Debug)]
pub struct Passing(pub &'static str);

#[async_trait]
impl DependencyCheck for Passing {
    fn name(&self) -> &str {
        self.0
    }

    async fn check(&self) -> Result<(), CheckError> {
        Ok(())
    }
}

/// Dependency check that always fails.
#[derive(Debug)]
pub struct Failing(pub &'static str);

#[async_trait]
impl DependencyCheck for Failing {
    fn name(&self) -> &str {
        self.0
    }

    async fn check(&self) -> Result<(), CheckError> {
        Err(CheckError::Failed {
            name: self.0.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

pub fn no_dependencies() -> Dependencies {
    Dependencies::none(Duration::from_millis(200))
}

pub fn state_with(dependencies: Dependencies) -> AppState {
    AppState::new(MetricsRegistry::new().unwrap(), dependencies)
}

pub fn database(check: impl DependencyCheck + 'static) -> Dependencies {
    no_dependencies().with_database(Arc::new(check))
}

/// Build an in-process server over `routes`.
pub fn server(config: ServiceConfig, dependencies: Dependencies, routes: Router<AppState>) -> HttpServer {
    HttpServer::with_routes(config, state_with(dependencies), routes)
}

/// Current value of the in-flight gauge.
pub fn in_flight(metrics: &MetricsRegistry) -> f64 {
    sample_value(&metrics.render(), ACTIVE_CONNECTIONS, &[]).expect("gauge is always present")
}

pub fn get(path: &str) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .uri(path)
        .header("user-agent", "integration-test")
        .body(Body::empty())
        .unwrap()
}

pub fn post(path: &str, body: impl Into<Body>) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri(path)
        .body(body.into())
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// A server listening on an ephemeral localhost port.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub metrics: MetricsRegistry,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn spawn_server(config: ServiceConfig, routes: Router<AppState>) -> RunningServer {
    let server = server(config, no_dependencies(), routes);
    let metrics = server.state().metrics.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { server.run(listener, shutdown).await })
    };

    RunningServer {
        addr,
        shutdown,
        metrics,
        handle,
    }
}

/// Client that opens a fresh connection per request.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
