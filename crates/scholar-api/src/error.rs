//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use scholar_core::{store::StoreError, student::StudentField};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("invalid {field}: {reason}")]
  Validation {
    field:  StudentField,
    reason: String,
  },

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("precondition failed: {0}")]
  PreconditionFailed(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error, surfacing the domain failure behind it when there
  /// is one.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.as_core().and_then(classify) {
      Some(api) => api,
      None => Self::Store(Box::new(e)),
    }
  }
}

impl From<scholar_core::Error> for ApiError {
  fn from(e: scholar_core::Error) -> Self {
    match classify(&e) {
      Some(api) => api,
      None => Self::Store(Box::new(e)),
    }
  }
}

/// The client-facing error for a domain failure, or `None` for failures that
/// are the server's fault.
fn classify(e: &scholar_core::Error) -> Option<ApiError> {
  use scholar_core::Error as Core;

  Some(match e {
    Core::Validation { field, reason } => ApiError::Validation {
      field:  *field,
      reason: reason.clone(),
    },
    Core::StudentNotFound(id) => ApiError::NotFound(format!("student {id} not found")),
    Core::DuplicateEmail(_) => ApiError::Conflict(e.to_string()),
    Core::StaleWrite(_) => ApiError::PreconditionFailed(e.to_string()),
    Core::UnknownGender(_) => ApiError::BadRequest(e.to_string()),
  })
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Validation { field, reason } => (
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "error": self.to_string(), "field": field, "reason": reason }),
      ),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::PreconditionFailed(m) => {
        (StatusCode::PRECONDITION_FAILED, json!({ "error": m }))
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
