//! Averages, status and transcripts.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/students/{id}/subjects/{subject_id}/average` | 404 `not_evaluated` without grades |
//! | `GET` | `/students/{id}/average` | `IN_PROGRESS` + `null` average without grades |
//! | `GET` | `/students/{id}/transcript` | `?format=text`, `?detail=true`; sets `ETag` |
//! | `GET` | `/status?average=<f64>` | Classify an arbitrary average |
//!
//! Everything is recomputed from the store on each request.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use bulletin_core::{
  aggregate::{OverallAggregate, Status},
  report,
  store::GradeStore,
};
use serde::{Deserialize, Serialize};

use crate::{auth::Principal, error::ApiError};

async fn ensure_student<S: GradeStore>(store: &S, student_id: i64) -> Result<(), ApiError> {
  store
    .get_student(student_id)
    .await
    .map_err(ApiError::store)?
    .map(|_| ())
    .ok_or_else(|| ApiError::NotFound(format!("student {student_id} not found")))
}

// ─── Subject average ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubjectAverage {
  pub student_id:          i64,
  pub subject_id:          i64,
  pub subject_coefficient: f64,
  pub average:             f64,
  pub passed:              bool,
}

/// `GET /students/{id}/subjects/{subject_id}/average`
pub async fn subject_average<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Path((student_id, subject_id)): Path<(i64, i64)>,
) -> Result<Json<SubjectAverage>, ApiError> {
  principal.can_read_student(student_id)?;
  ensure_student(store.as_ref(), student_id).await?;

  let agg = report::evaluate_subject(store.as_ref(), student_id, subject_id)
    .await
    .map_err(ApiError::report)?;
  tracing::debug!(student_id, subject_id, average = agg.weighted_average, "subject evaluated");

  Ok(Json(SubjectAverage {
    student_id,
    subject_id,
    subject_coefficient: agg.subject_coefficient,
    average: agg.weighted_average,
    passed: agg.passed(),
  }))
}

// ─── Overall average ──────────────────────────────────────────────────────────

/// `GET /students/{id}/average`
pub async fn overall_average<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Path(student_id): Path<i64>,
) -> Result<Json<OverallAggregate>, ApiError> {
  principal.can_read_student(student_id)?;
  let overall = report::evaluate_student(store.as_ref(), student_id)
    .await
    .map_err(ApiError::report)?;
  tracing::debug!(student_id, status = overall.status.as_str(), "student evaluated");
  Ok(Json(overall))
}

// ─── Transcript ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct TranscriptParams {
  /// `text` for the rendered plain-text transcript; JSON otherwise.
  pub format: Option<String>,
  #[serde(default)]
  pub detail: bool,
}

/// `GET /students/{id}/transcript[?format=text][&detail=true]`
///
/// The `ETag` is derived from the detailed rendering, so it changes with any
/// score and is shared by both formats. A matching `If-None-Match` answers
/// 304.
pub async fn transcript<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Path(student_id): Path<i64>,
  Query(params): Query<TranscriptParams>,
  headers: HeaderMap,
) -> Result<Response, ApiError> {
  principal.can_read_student(student_id)?;
  let transcript = report::build_transcript(store.as_ref(), student_id)
    .await
    .map_err(ApiError::report)?;
  let etag = transcript.etag();

  let not_modified = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag));
  if not_modified {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  match params.format.as_deref() {
    Some("text") => {
      let body = transcript.render(params.detail);
      Ok(
        (
          [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_owned()),
            (header::ETAG, etag),
          ],
          body,
        )
          .into_response(),
      )
    }
    None | Some("json") => Ok(([(header::ETAG, etag)], Json(transcript)).into_response()),
    Some(other) => Err(ApiError::BadRequest(format!("unknown format {other:?}"))),
  }
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusParams {
  pub average: f64,
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
  pub average: f64,
  pub status:  Status,
}

/// `GET /status?average=<f64>`
pub async fn status(
  _principal: Principal,
  Query(params): Query<StatusParams>,
) -> Result<Json<StatusBody>, ApiError> {
  if !params.average.is_finite() {
    return Err(ApiError::BadRequest(format!(
      "average must be a finite number, got {}",
      params.average
    )));
  }
  Ok(Json(StatusBody {
    average: params.average,
    status:  report::classify_status(params.average),
  }))
}
