//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"error": "<message>", "code": "<code>"}`.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use bulletin_core::{Error as CoreError, report::ReportError, store::StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden")]
  Forbidden,

  #[error("conflict: {0}")]
  Conflict(String),

  /// The aggregation had nothing to work on yet.
  #[error("not yet evaluated: {0}")]
  NotEvaluated(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error, keeping domain failures distinguishable from
  /// database failures.
  pub fn store<E: StoreError>(err: E) -> Self {
    match err.domain() {
      Some(domain) => domain.clone().into(),
      None => {
        tracing::warn!(error = %err, "store failure");
        ApiError::Store(Box::new(err))
      }
    }
  }

  pub fn report<E: StoreError>(err: ReportError<E>) -> Self {
    match err {
      ReportError::StudentNotFound(id) => ApiError::NotFound(format!("student {id} not found")),
      ReportError::SubjectNotFound(id) => ApiError::NotFound(format!("subject {id} not found")),
      ReportError::Grades(e) => e.into(),
      ReportError::Store(e) => ApiError::store(e),
    }
  }

  fn code(&self) -> &'static str {
    match self {
      ApiError::NotFound(_) => "not_found",
      ApiError::BadRequest(_) => "bad_request",
      ApiError::Unauthorized => "unauthorized",
      ApiError::Forbidden => "forbidden",
      ApiError::Conflict(_) => "conflict",
      ApiError::NotEvaluated(_) => "not_evaluated",
      ApiError::Store(_) => "store_error",
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) | ApiError::NotEvaluated(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self {
    let message = err.to_string();
    match err {
      CoreError::NoGrades => ApiError::NotEvaluated(message),
      CoreError::InvalidCoefficient(_)
      | CoreError::InvalidScore(_)
      | CoreError::MissingStudentLink => ApiError::BadRequest(message),
      CoreError::StudentNotFound(_)
      | CoreError::SubjectNotFound(_)
      | CoreError::ExamNotFound(_)
      | CoreError::ProgramNotFound(_)
      | CoreError::GradeNotFound { .. } => ApiError::NotFound(message),
      CoreError::GradeExists { .. } | CoreError::UsernameTaken(_) => {
        ApiError::Conflict(message)
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = Json(json!({ "error": self.to_string(), "code": self.code() }));
    let mut res = (status, body).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"bulletin\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn domain_errors_map_to_statuses() {
    let cases = [
      (CoreError::NoGrades, StatusCode::NOT_FOUND, "not_evaluated"),
      (CoreError::InvalidScore(25.0), StatusCode::BAD_REQUEST, "bad_request"),
      (CoreError::ExamNotFound(3), StatusCode::NOT_FOUND, "not_found"),
      (
        CoreError::GradeExists { student_id: 1, exam_id: 2 },
        StatusCode::CONFLICT,
        "conflict",
      ),
    ];
    for (err, status, code) in cases {
      let api: ApiError = err.into();
      assert_eq!(api.status(), status);
      assert_eq!(api.code(), code);
    }
  }

  #[test]
  fn unauthorized_carries_challenge() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
      res.headers().get(header::WWW_AUTHENTICATE).unwrap(),
      "Basic realm=\"bulletin\""
    );
  }
}
