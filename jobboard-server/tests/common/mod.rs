//! Shared harness for API-level tests
//!
//! Builds the full router over an in-process store driven by a manual clock,
//! so tests can step time forward without sleeping.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use clap::Parser;
use jobboard::{KvStore, LocalStore, ManualClock, MemoryStore, SharedClock, StoreError, WindowBatch};
use jobboard_server::config::{Args, Config};
use jobboard_server::repository::MemoryRepository;
use jobboard_server::state::{AppState, SharedState};
use jobboard_server::store::SharedStore;
use jobboard_server::transport::http::router;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse";

/// Limits high enough that tests not about admission never trip them
const RELAXED_LIMITS: [&str; 14] = [
    "--limit-sign-in",
    "1000/60",
    "--limit-edit-password",
    "1000/60",
    "--limit-delete-user",
    "1000/60",
    "--limit-search-resumes",
    "1000/60",
    "--limit-search-vacancies",
    "1000/60",
    "--limit-apply-to-vacancy",
    "1000/60",
    "--limit-set-status",
    "1000/60",
];

pub fn config(extra: &[&str]) -> Config {
    let mut argv = vec![
        "jobboard",
        "--store",
        "memory",
        "--jwt-secret",
        "integration-test-secret",
        "--password-cost",
        "4",
    ];
    for pair in RELAXED_LIMITS.chunks(2) {
        if !extra.contains(&pair[0]) {
            argv.extend_from_slice(pair);
        }
    }
    argv.extend_from_slice(extra);

    Config::from_args(Args::try_parse_from(argv).unwrap()).unwrap()
}

pub struct TestApp {
    pub app: Router,
    pub state: SharedState,
    pub clock: Arc<ManualClock>,
    pub store: Arc<ToggleStore>,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_args(&[])
    }

    pub fn with_args(extra: &[&str]) -> Self {
        let config = config(extra);
        let clock = Arc::new(ManualClock::new(SystemTime::now()));
        let shared_clock: SharedClock = clock.clone();
        let store = Arc::new(ToggleStore::new(LocalStore::new(
            MemoryStore::new(),
            shared_clock.clone(),
        )));
        let shared_store: SharedStore = store.clone();

        let state = AppState::new(
            &config,
            Arc::new(MemoryRepository::new()),
            shared_store,
            shared_clock,
        )
        .into_shared();

        Self {
            app: router(state.clone()),
            state,
            clock,
            store,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        self.dispatch(method, uri, token, body, None, None).await
    }

    /// Send a request over a connection from `peer`, optionally carrying
    /// an `X-Forwarded-For` header
    pub async fn send_from(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        peer: &str,
        forwarded_for: Option<&str>,
    ) -> Reply {
        let peer: SocketAddr = peer.parse().unwrap();
        self.dispatch(method, uri, token, body, Some(peer), forwarded_for)
            .await
    }

    async fn dispatch(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        peer: Option<SocketAddr>,
        forwarded_for: Option<&str>,
    ) -> Reply {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(forwarded_for) = forwarded_for {
            request = request.header("x-forwarded-for", forwarded_for);
        }
        let mut request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();
        if let Some(peer) = peer {
            request.extensions_mut().insert(ConnectInfo(peer));
        }

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        Reply {
            status,
            headers,
            body,
        }
    }

    pub async fn sign_up(&self, email: &str, name: &str, role: &str) {
        let reply = self
            .send(
                Method::POST,
                "/api/user/sign_up",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "repeat_password": PASSWORD,
                    "role": role,
                    "name": name,
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "sign up failed: {}", reply.body);
    }

    pub async fn sign_in(&self, email: &str) -> String {
        let reply = self
            .send(
                Method::POST,
                "/api/user/sign_in",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "sign in failed: {}", reply.body);
        reply.body["token"].as_str().unwrap().to_string()
    }

    /// Sign up and sign in, returning the token
    pub async fn account(&self, email: &str, name: &str, role: &str) -> String {
        self.sign_up(email, name, role).await;
        self.sign_in(email).await
    }

    pub async fn create_vacancy(&self, token: &str, title: &str, city: &str, compensation: i64) -> i64 {
        let reply = self
            .send(
                Method::POST,
                "/api/vacancy/create_vacancy",
                Some(token),
                Some(json!({ "title": title, "city": city, "compensation": compensation })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "create vacancy failed: {}", reply.body);
        reply.body["vacancy"]["id"].as_i64().unwrap()
    }

    pub async fn create_resume(&self, token: &str, title: &str, city: &str, stack: &str) -> i64 {
        let reply = self
            .send(
                Method::POST,
                "/api/resume/create_resume",
                Some(token),
                Some(json!({
                    "title": title,
                    "about": "Backend engineer",
                    "city": city,
                    "stack": stack,
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "create resume failed: {}", reply.body);
        reply.body["resume"]["id"].as_i64().unwrap()
    }
}

/// Store whose limiter batches can be made to fail on demand
///
/// Every other operation is delegated, so caching keeps working while the
/// limiter path is down.
pub struct ToggleStore {
    inner: LocalStore,
    batches_down: AtomicBool,
}

impl ToggleStore {
    pub fn new(inner: LocalStore) -> Self {
        Self {
            inner,
            batches_down: AtomicBool::new(false),
        }
    }

    pub fn fail_batches(&self, down: bool) {
        self.batches_down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl KvStore for ToggleStore {
    async fn window_batch(&self, batch: &WindowBatch) -> Result<u64, StoreError> {
        if self.batches_down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        self.inner.window_batch(batch).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.delete(key).await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.inner.incr(key).await
    }
}
