//! Handlers for `/subjects` and `/exams` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/subjects` | Optional `?program_id=` |
//! | `POST` | `/subjects` | Body: `{"name":"Anglais","coefficient":2.0,"program_id":1}` |
//! | `GET`  | `/exams` | Optional `?subject_id=` |
//! | `POST` | `/exams` | Body: [`NewExam`]; ADMIN or TEACHER |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use bulletin_core::{
  exam::{Exam, NewExam},
  store::GradeStore,
  subject::{NewSubject, Subject},
  user::Role,
};
use serde::Deserialize;

use crate::{auth::Principal, error::ApiError};

// ─── Subjects ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubjectParams {
  pub program_id: Option<i64>,
}

/// `GET /subjects[?program_id=<id>]`
pub async fn list<S: GradeStore>(
  _principal: Principal,
  State(store): State<Arc<S>>,
  Query(params): Query<SubjectParams>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  let subjects = store
    .list_subjects(params.program_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subjects))
}

/// `POST /subjects`
pub async fn create<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Json(body): Json<NewSubject>,
) -> Result<impl IntoResponse, ApiError> {
  principal.require(&[Role::Admin, Role::Responsable])?;
  let subject = store.add_subject(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Exams ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExamParams {
  pub subject_id: Option<i64>,
}

/// `GET /exams[?subject_id=<id>]`
pub async fn list_exams<S: GradeStore>(
  _principal: Principal,
  State(store): State<Arc<S>>,
  Query(params): Query<ExamParams>,
) -> Result<Json<Vec<Exam>>, ApiError> {
  let exams = store
    .list_exams(params.subject_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(exams))
}

/// `POST /exams`
pub async fn create_exam<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Json(body): Json<NewExam>,
) -> Result<impl IntoResponse, ApiError> {
  principal.require(&[Role::Admin, Role::Teacher])?;
  let exam = store.add_exam(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(exam)))
}
