#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, sync::Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use daftar::api::{router, AppState};
use daftar_core::{storage::MemoryBookStorage, time::FixedClock, BookManager};
use daftar_domain::DisplayRate;
use daftar_storage_json::{JsonBookStorage, StoragePaths};

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 14).expect("valid date")
}

/// Router over an in-memory book whose clock is pinned to [`today`].
pub fn memory_app() -> Router {
    let manager = BookManager::open(
        "test",
        Box::new(MemoryBookStorage::new()),
        Arc::new(FixedClock::on(today())),
        "USD",
    )
    .expect("open memory book");
    router(AppState::new(manager, DisplayRate::sar()))
}

/// Router over a JSON book in a fresh temp dir; returns the dir for reopening.
pub fn json_app() -> (Router, PathBuf) {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    (json_app_at(&base), base)
}

pub fn json_app_at(base: &std::path::Path) -> Router {
    let storage = JsonBookStorage::new(StoragePaths::under(base)).expect("create json storage");
    let manager = BookManager::open(
        "ledger_app_data",
        Box::new(storage),
        Arc::new(FixedClock::on(today())),
        "USD",
    )
    .expect("open json book");
    router(AppState::new(manager, DisplayRate::sar()))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).expect("build request"))
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// Sends `body` verbatim, for requests the JSON helpers cannot express.
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    content_type: Option<&str>,
    body: &'static str,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        request = request.header("content-type", content_type);
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::from(body)).expect("build request"))
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

/// Parses a JSON number (amounts serialise as floats) for comparison.
pub fn amount(value: &Value) -> f64 {
    value.as_f64().expect("numeric amount")
}

pub fn id(value: &Value, field: &str) -> String {
    value[field].as_str().expect("id string").to_string()
}
