//! HTTP server wiring for Scholar: configuration and the top-level router.
//!
//! The JSON API from `scholar-api` is mounted under `/api`, wrapped in a
//! request-tracing layer.

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use scholar_core::store::StudentStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SCHOLAR_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("scholar.db"),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level router: `/api/...` plus a `/health` probe.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: StudentStore + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", scholar_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use scholar_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn app() -> Router {
    router(Arc::new(SqliteStore::open_in_memory().await.unwrap()))
  }

  #[test]
  fn config_defaults_fill_missing_keys() {
    let settings = config::Config::builder()
      .set_override("port", 9000)
      .unwrap()
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();

    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.store_path, PathBuf::from("scholar.db"));
    assert_eq!(cfg.address(), "127.0.0.1:9000");
  }

  #[tokio::test]
  async fn health_probe_answers() {
    let resp = app()
      .await
      .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let app = app().await;

    let create = Request::builder()
      .method("POST")
      .uri("/api/students")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(
        r#"{"first_name":"Ann","last_name":"Lee","email":"a@x.com"}"#,
      ))
      .unwrap();
    let resp = app.clone().oneshot(create).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let list = Request::builder().uri("/api/students").body(Body::empty()).unwrap();
    let resp = app.oneshot(list).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let students: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(students.as_array().unwrap().len(), 1);

    let unmounted = Request::builder().uri("/students").body(Body::empty()).unwrap();
    let resp = router(Arc::new(SqliteStore::open_in_memory().await.unwrap()))
      .oneshot(unmounted)
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
