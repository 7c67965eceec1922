//! Handlers for `/grades` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/grades?student_id=<id>` | Staff, or the student themself |
//! | `POST`   | `/grades` | Body: `{"student_id":1,"exam_id":2,"score":14.5}`; 409 if already graded |
//! | `PUT`    | `/grades/{student_id}/{exam_id}` | Body: `{"score":15.0}` |
//! | `DELETE` | `/grades/{student_id}/{exam_id}` | ADMIN only; 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use bulletin_core::{
  grade::{GradeEntry, NewGrade},
  store::GradeStore,
  user::Role,
};
use serde::Deserialize;

use crate::{auth::Principal, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub student_id: i64,
}

/// `GET /grades?student_id=<id>`
pub async fn list<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<GradeEntry>>, ApiError> {
  principal.can_read_student(params.student_id)?;
  let grades = store
    .list_grades(params.student_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(grades))
}

/// `POST /grades`
pub async fn create<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Json(body): Json<NewGrade>,
) -> Result<impl IntoResponse, ApiError> {
  principal.require(&[Role::Admin, Role::Teacher])?;
  let grade = store.record_grade(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(grade)))
}

#[derive(Debug, Deserialize)]
pub struct ScoreBody {
  pub score: f64,
}

/// `PUT /grades/{student_id}/{exam_id}`
pub async fn update<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Path((student_id, exam_id)): Path<(i64, i64)>,
  Json(body): Json<ScoreBody>,
) -> Result<Json<GradeEntry>, ApiError> {
  principal.require(&[Role::Admin, Role::Teacher])?;
  let grade = store
    .update_score(student_id, exam_id, body.score)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(grade))
}

/// `DELETE /grades/{student_id}/{exam_id}`
pub async fn delete<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Path((student_id, exam_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
  principal.require(&[Role::Admin])?;
  store
    .delete_grade(student_id, exam_id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(by = %principal.username, student_id, exam_id, "grade removed");
  Ok(StatusCode::NO_CONTENT)
}
