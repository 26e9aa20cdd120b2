//! JSON REST API for Scholar.
//!
//! Exposes an axum [`Router`] backed by any [`scholar_core::store::StudentStore`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", scholar_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod etag;
pub mod students;

use std::sync::Arc;

use axum::{Router, routing::get};
use scholar_core::store::StudentStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: StudentStore + 'static,
{
  Router::new()
    .route("/students", get(students::list::<S>).post(students::create::<S>))
    .route(
      "/students/{id}",
      get(students::get_one::<S>)
        .put(students::replace::<S>)
        .patch(students::patch_one::<S>)
        .delete(students::delete_one::<S>),
    )
    .with_state(store)
}
