//! Grade entries, the raw facts every average is computed from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, exam::ExamType};

/// Lowest score a grade can be recorded with.
pub const MIN_SCORE: f64 = 0.0;
/// Highest score a grade can be recorded with.
pub const MAX_SCORE: f64 = 20.0;

/// One student's score on one exam, joined with the exam's subject, type and
/// coefficient so it can be aggregated without further lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeEntry {
  pub student_id:       i64,
  pub subject_id:       i64,
  pub exam_id:          i64,
  pub exam_type:        ExamType,
  pub score:            f64,
  pub exam_coefficient: f64,
  /// Server-assigned; bumped when the score is replaced.
  pub recorded_at:      DateTime<Utc>,
}

/// Input to [`crate::store::GradeStore::record_grade`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrade {
  pub student_id: i64,
  pub exam_id:    i64,
  pub score:      f64,
}

/// Reject scores outside `MIN_SCORE..=MAX_SCORE` before they are written.
///
/// Reads never re-check: whatever is stored is aggregated as-is.
pub fn validate_score(score: f64) -> Result<f64> {
  if (MIN_SCORE..=MAX_SCORE).contains(&score) {
    Ok(score)
  } else {
    Err(Error::InvalidScore(score))
  }
}

/// Reject coefficients that are not strictly positive and finite.
pub fn validate_coefficient(coefficient: f64) -> Result<f64> {
  if coefficient.is_finite() && coefficient > 0.0 {
    Ok(coefficient)
  } else {
    Err(Error::InvalidCoefficient(coefficient))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn score_bounds_are_inclusive() {
    assert_eq!(validate_score(0.0), Ok(0.0));
    assert_eq!(validate_score(20.0), Ok(20.0));
    assert_eq!(validate_score(20.5), Err(Error::InvalidScore(20.5)));
    assert_eq!(validate_score(-0.25), Err(Error::InvalidScore(-0.25)));
    assert!(validate_score(f64::NAN).is_err());
  }

  #[test]
  fn coefficient_must_be_positive() {
    assert_eq!(validate_coefficient(0.5), Ok(0.5));
    assert_eq!(validate_coefficient(0.0), Err(Error::InvalidCoefficient(0.0)));
    assert!(validate_coefficient(-2.0).is_err());
    assert!(validate_coefficient(f64::INFINITY).is_err());
  }
}
