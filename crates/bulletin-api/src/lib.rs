//! JSON REST API for Bulletin.
//!
//! Exposes an axum [`Router`] backed by any [`bulletin_core::store::GradeStore`].
//! Every route authenticates with HTTP Basic against the store's users;
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", bulletin_api::api_router(store.clone()))
//! ```

pub mod auth;
pub mod error;
pub mod evaluation;
pub mod grades;
pub mod programs;
pub mod students;
pub mod subjects;
pub mod users;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use bulletin_core::store::GradeStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: GradeStore + 'static,
{
  Router::new()
    // Catalogue
    .route("/programs", get(programs::list::<S>).post(programs::create::<S>))
    .route("/students", get(students::list::<S>).post(students::create::<S>))
    .route("/students/{id}", get(students::get_one::<S>))
    .route("/subjects", get(subjects::list::<S>).post(subjects::create::<S>))
    .route("/exams", get(subjects::list_exams::<S>).post(subjects::create_exam::<S>))
    // Grades
    .route("/grades", get(grades::list::<S>).post(grades::create::<S>))
    .route(
      "/grades/{student_id}/{exam_id}",
      put(grades::update::<S>).delete(grades::delete::<S>),
    )
    // Evaluation
    .route(
      "/students/{id}/subjects/{subject_id}/average",
      get(evaluation::subject_average::<S>),
    )
    .route("/students/{id}/average", get(evaluation::overall_average::<S>))
    .route("/students/{id}/transcript", get(evaluation::transcript::<S>))
    .route("/status", get(evaluation::status))
    // Accounts
    .route("/users", post(users::create::<S>))
    .route("/me", get(users::me))
    .with_state(store)
}
