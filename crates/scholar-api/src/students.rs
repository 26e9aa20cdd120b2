//! Handlers for `/students` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/students` | Optional `text`, `gender`, `limit`, `offset` |
//! | `POST`   | `/students` | Body: [`NewStudent`]; returns 201 + view |
//! | `GET`    | `/students/:id` | 404 if not found |
//! | `PUT`    | `/students/:id` | Body: [`NewStudent`]; replaces every field |
//! | `PATCH`  | `/students/:id` | Body: [`StudentPatch`]; absent keys are kept |
//! | `DELETE` | `/students/:id` | 204, or 404 if not found |
//!
//! Responses carrying a student include its `ETag`; `PUT` and `PATCH` honour
//! `If-Match`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use chrono::Utc;
use scholar_core::{
  patch::{StudentPatch, merge},
  projection::{StudentView, project},
  store::{StudentQuery, StudentStore},
  student::{Gender, NewStudent, Student},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  etag::{compute_etag, if_match_admits},
};

/// A response carrying `student`'s projection and ETag.
fn student_response(status: StatusCode, student: &Student) -> Response {
  (
    status,
    [(header::ETAG, compute_etag(student))],
    Json(project(student)),
  )
    .into_response()
}

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("student {id} not found")) }

fn bad_body(rejection: JsonRejection) -> ApiError {
  ApiError::BadRequest(rejection.body_text())
}

fn bad_path(rejection: PathRejection) -> ApiError {
  ApiError::BadRequest(rejection.body_text())
}

fn bad_query(rejection: QueryRejection) -> ApiError {
  ApiError::BadRequest(rejection.body_text())
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Case-insensitive substring over names and email.
  pub text:   Option<String>,
  pub gender: Option<Gender>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /students[?text=...][&gender=...][&limit=...][&offset=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<StudentView>>, ApiError>
where
  S: StudentStore,
{
  let Query(params) = params.map_err(bad_query)?;
  let query = StudentQuery {
    text:   params.text.filter(|t| !t.is_empty()),
    gender: params.gender,
    limit:  params.limit,
    offset: params.offset,
  };

  let students = store.list(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(students.iter().map(project).collect()))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /students`: returns 201 + the new [`StudentView`].
///
/// `Location` is relative to the collection, so it resolves correctly
/// wherever the router is mounted.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  body: Result<Json<NewStudent>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: StudentStore,
{
  let Json(input) = body.map_err(bad_body)?;
  input.validate(Utc::now().date_naive())?;

  let student = store.create(input).await.map_err(ApiError::from_store)?;
  tracing::info!(student_id = %student.id, "student created");

  let mut response = student_response(StatusCode::CREATED, &student);
  if let Ok(location) = format!("students/{}", student.id).parse() {
    response.headers_mut().insert(header::LOCATION, location);
  }
  Ok(response)
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /students/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError>
where
  S: StudentStore,
{
  let Path(id) = id.map_err(bad_path)?;
  let student = store
    .get(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  Ok(student_response(StatusCode::OK, &student))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /students/:id`: full replacement, expressed as a patch that provides
/// every field.
pub async fn replace<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<Uuid>, PathRejection>,
  headers: HeaderMap,
  body: Result<Json<NewStudent>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: StudentStore,
{
  let Path(id) = id.map_err(bad_path)?;
  let Json(input) = body.map_err(bad_body)?;
  apply_patch(store.as_ref(), id, &headers, StudentPatch::replace_all(input)).await
}

/// `PATCH /students/:id`: only the keys present in the body are changed.
pub async fn patch_one<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<Uuid>, PathRejection>,
  headers: HeaderMap,
  body: Result<Json<StudentPatch>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: StudentStore,
{
  let Path(id) = id.map_err(bad_path)?;
  let Json(patch) = body.map_err(bad_body)?;
  apply_patch(store.as_ref(), id, &headers, patch).await
}

/// Read, check `If-Match`, merge, and save conditionally on the version read.
async fn apply_patch<S>(
  store: &S,
  id: Uuid,
  headers: &HeaderMap,
  patch: StudentPatch,
) -> Result<Response, ApiError>
where
  S: StudentStore,
{
  patch.validate(Utc::now().date_naive())?;

  let current = store
    .get(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;

  if let Some(if_match) = headers.get(header::IF_MATCH) {
    let if_match = if_match
      .to_str()
      .map_err(|_| ApiError::BadRequest("unreadable If-Match header".into()))?;
    if !if_match_admits(if_match, &compute_etag(&current)) {
      tracing::warn!(student_id = %id, "If-Match does not match current version");
      return Err(ApiError::PreconditionFailed(format!(
        "student {id} has changed since it was read"
      )));
    }
  }

  tracing::debug!(student_id = %id, fields = ?patch.provided_fields(), "merging patch");
  let merged = merge(&current, patch)?;
  let saved = store
    .save(&merged, current.audit.updated_at())
    .await
    .map_err(ApiError::from_store)?;

  Ok(student_response(StatusCode::OK, &saved))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /students/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError>
where
  S: StudentStore,
{
  let Path(id) = id.map_err(bad_path)?;
  if store.delete(id).await.map_err(ApiError::from_store)? {
    tracing::info!(student_id = %id, "student deleted");
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(not_found(id))
  }
}
