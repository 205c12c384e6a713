//! Shared helpers for router-level tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use serde_json::Value;
use tower::ServiceExt;

use crate::config::Config;
use crate::db::Store;
use crate::routes::create_router;
use crate::state::AppState;

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        port: 3000,
        secret: None,
        token_ttl: Duration::from_secs(3600),
        static_dir: PathBuf::from("does-not-exist"),
        auth_routes: false,
        admin_password: None,
    }
}

async fn app_for(config: Config) -> (Router, Store) {
    let store = Store::in_memory().await.unwrap();
    let state = AppState::new(store.clone(), &config);
    (create_router(state, &config), store)
}

pub async fn test_app() -> (Router, Store) {
    app_for(test_config()).await
}

pub async fn test_app_with_auth() -> (Router, Store) {
    app_for(Config {
        secret: Some("test-secret".to_string()),
        auth_routes: true,
        ..test_config()
    })
    .await
}

pub async fn test_app_with_static(static_dir: &Path) -> (Router, Store) {
    app_for(Config {
        static_dir: static_dir.to_path_buf(),
        ..test_config()
    })
    .await
}

/// A throwaway static directory under the system temp dir holding an
/// `index.html`. Removed on drop.
pub struct StaticDir {
    path: PathBuf,
}

impl StaticDir {
    pub fn with_index(name: &str, index_html: &str) -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "agenda-{name}-{}-{nanos}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("index.html"), index_html).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StaticDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Sends a bodiless request and returns the raw response text.
pub async fn send_raw(app: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

async fn dispatch(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    json: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match json {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    dispatch(app, request).await
}

pub async fn send_with_header(
    app: &Router,
    method: &str,
    uri: &str,
    (name, value): (&str, &str),
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(name, value)
        .body(Body::empty())
        .unwrap();
    dispatch(app, request).await
}
