//! Async HTTP client wrapping the Scholar JSON API.

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder, Response, header};
use scholar_core::{
  patch::StudentPatch,
  projection::StudentView,
  student::{Gender, NewStudent},
};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Connection settings for the Scholar API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Filters for `GET /api/students`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListFilter {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub text:   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gender: Option<Gender>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub limit:  Option<usize>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub offset: Option<usize>,
}

/// A student view together with the ETag the server sent for it.
#[derive(Debug)]
pub struct Tagged {
  pub view: StudentView,
  pub etag: Option<String>,
}

/// Async HTTP client for the Scholar JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  async fn send(&self, what: &str, req: RequestBuilder) -> Result<Response> {
    tracing::debug!("{what}");
    let resp = req.send().await.with_context(|| format!("{what} failed"))?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }

    // Error bodies are `{"error": "..."}`; fall back to the bare status.
    let message = resp
      .json::<serde_json::Value>()
      .await
      .ok()
      .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_owned));
    match message {
      Some(m) => Err(anyhow!("{what} → {status}: {m}")),
      None => Err(anyhow!("{what} → {status}")),
    }
  }

  async fn tagged(&self, what: &str, req: RequestBuilder) -> Result<Tagged> {
    let resp = self.send(what, req).await?;
    let etag = resp
      .headers()
      .get(header::ETAG)
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned);
    let view = resp.json().await.context("deserialising student")?;
    Ok(Tagged { view, etag })
  }

  fn with_if_match(req: RequestBuilder, if_match: Option<&str>) -> RequestBuilder {
    match if_match {
      Some(tag) => req.header(header::IF_MATCH, tag),
      None => req,
    }
  }

  /// `GET /api/students`
  pub async fn list(&self, filter: &ListFilter) -> Result<Vec<StudentView>> {
    let req = self.client.get(self.url("/students")).query(filter);
    let resp = self.send("GET /students", req).await?;
    resp.json().await.context("deserialising students")
  }

  /// `GET /api/students/:id`
  pub async fn get(&self, id: Uuid) -> Result<Tagged> {
    let req = self.client.get(self.url(&format!("/students/{id}")));
    self.tagged(&format!("GET /students/{id}"), req).await
  }

  /// `POST /api/students`
  pub async fn create(&self, input: &NewStudent) -> Result<Tagged> {
    let req = self.client.post(self.url("/students")).json(input);
    self.tagged("POST /students", req).await
  }

  /// `PATCH /api/students/:id`
  pub async fn patch(
    &self,
    id: Uuid,
    patch: &StudentPatch,
    if_match: Option<&str>,
  ) -> Result<Tagged> {
    let req = self.client.patch(self.url(&format!("/students/{id}"))).json(patch);
    let req = Self::with_if_match(req, if_match);
    self.tagged(&format!("PATCH /students/{id}"), req).await
  }

  /// `PUT /api/students/:id`
  pub async fn replace(
    &self,
    id: Uuid,
    input: &NewStudent,
    if_match: Option<&str>,
  ) -> Result<Tagged> {
    let req = self.client.put(self.url(&format!("/students/{id}"))).json(input);
    let req = Self::with_if_match(req, if_match);
    self.tagged(&format!("PUT /students/{id}"), req).await
  }

  /// `DELETE /api/students/:id`
  pub async fn delete(&self, id: Uuid) -> Result<()> {
    let req = self.client.delete(self.url(&format!("/students/{id}")));
    self.send(&format!("DELETE /students/{id}"), req).await?;
    Ok(())
  }
}
