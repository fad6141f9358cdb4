#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use dentdir_api::backend::{AuthUser, MemoryBackend};
use dentdir_api::config::{AppConfig, BackendKind, Environment};
use dentdir_api::{app, AppState};

pub const SITE_URL: &str = "http://localhost:3000";

/// Development preset pointed at the in-memory backend, with telemetry off.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::preset(Environment::Development);
    config.backend.kind = BackendKind::Memory;
    config.backend.url = "http://storage.test".to_string();
    config.telemetry.endpoint = None;
    config.site.base_url = SITE_URL.to_string();
    config.storage.bucket = "media".to_string();
    config
}

/// Router plus a handle on the backend behind it, driven in-process with `oneshot`.
pub struct TestApp {
    pub backend: Arc<MemoryBackend>,
    pub state: AppState,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let backend = Arc::new(MemoryBackend::new(config.backend.url.clone()));
        let state = AppState::new(config, backend.clone());
        let router = app(state.clone());
        Self { backend, state, router }
    }

    /// Drive an app built on some other backend; `self.backend` is then an unused stand-in.
    pub fn from_state(state: AppState) -> Self {
        let router = app(state.clone());
        Self {
            backend: Arc::new(MemoryBackend::new("http://unused.test")),
            state,
            router,
        }
    }

    /// Register a user and return them with a ready-to-send Cookie header value.
    pub async fn sign_in(&self, id: &str) -> (AuthUser, String) {
        let user = self
            .backend
            .register_user(id, Some(&format!("{}@example.com", id)))
            .await;
        let session = self.backend.issue_session(&user);
        let cookie = format!(
            "sb-access-token={}; sb-refresh-token={}",
            session.access_token,
            session.refresh_token.unwrap_or_default()
        );
        (user, cookie)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body")
            .to_vec();
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::get(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, path: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::post(path).header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn post_form(&self, path: &str, body: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder =
            Request::post(path).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }
}

/// Serve `router` on an unused local port; returns its base URL.
pub async fn serve(router: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}
