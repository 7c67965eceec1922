//! Handlers for `/students` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/students` | Staff only; optional `?program_id=` |
//! | `POST` | `/students` | Body: [`NewStudent`]; ADMIN or RESPONSABLE |
//! | `GET`  | `/students/{id}` | Staff, or the student themself; 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use bulletin_core::{
  store::GradeStore,
  student::{NewStudent, Student},
  user::Role,
};
use serde::Deserialize;

use crate::{auth::Principal, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub program_id: Option<i64>,
}

/// `GET /students[?program_id=<id>]`
pub async fn list<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Student>>, ApiError> {
  principal.require_staff()?;
  let students = store
    .list_students(params.program_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(students))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /students`
pub async fn create<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Json(body): Json<NewStudent>,
) -> Result<impl IntoResponse, ApiError> {
  principal.require(&[Role::Admin, Role::Responsable])?;
  let student = store.add_student(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(student)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /students/{id}`
pub async fn get_one<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Student>, ApiError> {
  principal.can_read_student(id)?;
  let student = store
    .get_student(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;
  Ok(Json(student))
}
