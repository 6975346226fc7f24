//! Stub of the remote Daily School API for integration tests.
//!
//! `/post` only accepts the bearer token in `valid_access`, and nothing at all
//! when `reject_all` is set. `/refresh` mints
//! `refresh_issues` and makes it the valid token, unless `refresh_status`
//! says otherwise.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use dailyschool_core::{AppContext, ApiClient, Config, MemoryTokenStore, SessionRestore, TokenStore};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub struct StubInner {
    pub sign_in_response: Value,
    pub sign_up_bodies: Vec<Value>,
    pub valid_access: String,
    pub reject_all: bool,
    pub refresh_status: StatusCode,
    pub refresh_issues: Value,
    pub refresh_bodies: Vec<Value>,
    pub post_auth_headers: Vec<Option<String>>,
    pub post_queries: Vec<HashMap<String, String>>,
    pub post_bodies: Vec<String>,
}

#[derive(Clone)]
pub struct Stub(pub Arc<Mutex<StubInner>>);

impl Stub {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(StubInner {
            sign_in_response: json!({ "data": { "accessToken": "T1", "refreshToken": "T2" } }),
            sign_up_bodies: Vec::new(),
            valid_access: "T1".to_string(),
            reject_all: false,
            refresh_status: StatusCode::OK,
            refresh_issues: json!("T3"),
            refresh_bodies: Vec::new(),
            post_auth_headers: Vec::new(),
            post_queries: Vec::new(),
            post_bodies: Vec::new(),
        })))
    }

    pub fn with<F: FnOnce(&mut StubInner)>(self, f: F) -> Self {
        f(&mut self.0.lock().unwrap());
        self
    }

    pub fn refresh_calls(&self) -> usize {
        self.0.lock().unwrap().refresh_bodies.len()
    }

    pub fn post_auth_headers(&self) -> Vec<Option<String>> {
        self.0.lock().unwrap().post_auth_headers.clone()
    }

    pub fn inner(&self) -> std::sync::MutexGuard<'_, StubInner> {
        self.0.lock().unwrap()
    }
}

async fn sign_up(State(stub): State<Stub>, Json(body): Json<Value>) -> Json<Value> {
    stub.0.lock().unwrap().sign_up_bodies.push(body);
    Json(json!({ "status": 201, "message": "created" }))
}

async fn sign_in(State(stub): State<Stub>, Json(_body): Json<Value>) -> Json<Value> {
    Json(stub.0.lock().unwrap().sign_in_response.clone())
}

async fn refresh(State(stub): State<Stub>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut inner = stub.0.lock().unwrap();
    inner.refresh_bodies.push(body);

    if !inner.refresh_status.is_success() {
        return (inner.refresh_status, Json(json!({ "message": "refresh token expired" })));
    }

    let issued = inner.refresh_issues.clone();
    if let Some(token) = issued.as_str() {
        inner.valid_access = token.to_string();
    }
    (StatusCode::OK, Json(json!({ "data": { "accessToken": issued } })))
}

async fn create_post(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let mut inner = stub.0.lock().unwrap();
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    inner.post_auth_headers.push(auth.clone());
    inner.post_queries.push(query);
    inner.post_bodies.push(body);

    let expected = format!("Bearer {}", inner.valid_access);
    if !inner.reject_all && auth.as_deref() == Some(expected.as_str()) {
        (StatusCode::OK, Json(json!({ "message": "posted", "data": { "id": 7 } })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "expired" })))
    }
}

/// Serve the stub on an ephemeral port and return its base URL.
pub async fn spawn(stub: Stub) -> String {
    let app = Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/refresh", post(refresh))
        .route("/post", post(create_post))
        .with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", address)
}

pub fn config(base_url: &str, restore: SessionRestore) -> Config {
    Config {
        api_base_url: base_url.to_string(),
        request_timeout_secs: 5,
        session_restore: restore,
        ..Config::default()
    }
}

pub async fn client(stub: Stub, tokens: Arc<MemoryTokenStore>) -> ApiClient {
    let base_url = spawn(stub).await;
    let tokens: Arc<dyn TokenStore> = tokens;
    ApiClient::new(&config(&base_url, SessionRestore::Optimistic), tokens).unwrap()
}

pub async fn context(stub: Stub, tokens: Arc<MemoryTokenStore>, restore: SessionRestore) -> AppContext {
    let base_url = spawn(stub).await;
    let tokens: Arc<dyn TokenStore> = tokens;
    AppContext::new(config(&base_url, restore), tokens).unwrap()
}
