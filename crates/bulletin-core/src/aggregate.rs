//! Grade aggregation and academic status.
//!
//! Averages are computed at two levels with the same weighted mean
//! `Σ(value × weight) / Σ(weight)`:
//!
//! 1. within a subject, each exam score weighted by the exam coefficient;
//! 2. across subjects, each subject average weighted by the subject's
//!    declared coefficient.
//!
//! The number of exams in a subject never influences its weight in the
//! overall average. Nothing here rounds; rounding is a presentation concern
//! (see [`crate::transcript`]).

use serde::{Deserialize, Serialize};

use crate::{Error, Result, grade::GradeEntry};

/// Overall averages at or above this are [`Status::Admis`]. Also the
/// per-subject pass mark.
pub const PASS_THRESHOLD: f64 = 10.0;
/// Overall averages below this are [`Status::Exclu`].
pub const EXCLUSION_THRESHOLD: f64 = 8.0;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Academic outcome for the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
  /// Passed.
  Admis,
  /// Must repeat the year.
  Redoublant,
  Exclu,
  /// No average exists yet. Never produced by [`classify`].
  InProgress,
}

impl Status {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admis => "ADMIS",
      Self::Redoublant => "REDOUBLANT",
      Self::Exclu => "EXCLU",
      Self::InProgress => "IN_PROGRESS",
    }
  }
}

/// Map a computed overall average to a status.
pub fn classify(overall_average: f64) -> Status {
  if overall_average >= PASS_THRESHOLD {
    Status::Admis
  } else if overall_average >= EXCLUSION_THRESHOLD {
    Status::Redoublant
  } else {
    Status::Exclu
  }
}

// ─── Weighted mean ───────────────────────────────────────────────────────────

/// `Σ(value × weight) / Σ(weight)` over `(value, weight)` pairs.
///
/// Fails with [`Error::NoGrades`] on empty input and with
/// [`Error::InvalidCoefficient`] on the first weight that is not a positive
/// finite number. Values are taken as-is.
pub fn weighted_mean<I>(pairs: I) -> Result<f64>
where
  I: IntoIterator<Item = (f64, f64)>,
{
  let mut sum = 0.0_f64;
  let mut denom = 0.0_f64;
  let mut seen = false;

  for (value, weight) in pairs {
    if !(weight.is_finite() && weight > 0.0) {
      return Err(Error::InvalidCoefficient(weight));
    }
    sum += value * weight;
    denom += weight;
    seen = true;
  }

  if !seen {
    return Err(Error::NoGrades);
  }
  Ok(sum / denom)
}

// ─── Subject level ───────────────────────────────────────────────────────────

/// Weighted average of one student's grades within one subject.
///
/// The caller is responsible for passing grades of a single
/// (student, subject) pair; order does not matter.
pub fn subject_average(grades: &[GradeEntry]) -> Result<f64> {
  weighted_mean(grades.iter().map(|g| (g.score, g.exam_coefficient)))
}

/// A subject's weighted average together with the subject's declared
/// coefficient. Derived on demand; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubjectAggregate {
  pub subject_id:          i64,
  pub subject_coefficient: f64,
  pub weighted_average:    f64,
}

impl SubjectAggregate {
  /// Aggregate `grades` for the subject `subject_id` weighted by
  /// `subject_coefficient`.
  pub fn compute(
    subject_id: i64,
    subject_coefficient: f64,
    grades: &[GradeEntry],
  ) -> Result<Self> {
    Ok(Self {
      subject_id,
      subject_coefficient,
      weighted_average: subject_average(grades)?,
    })
  }

  pub fn passed(&self) -> bool { self.weighted_average >= PASS_THRESHOLD }
}

// ─── Overall level ───────────────────────────────────────────────────────────

/// Weighted average of subject averages, each weighted by its subject
/// coefficient.
///
/// Summed in ascending `subject_id` order whatever the input order, so every
/// caller classifies the same student identically.
pub fn overall_average(subjects: &[SubjectAggregate]) -> Result<f64> {
  let mut ordered: Vec<&SubjectAggregate> = subjects.iter().collect();
  ordered.sort_by_key(|s| s.subject_id);
  weighted_mean(
    ordered
      .into_iter()
      .map(|s| (s.weighted_average, s.subject_coefficient)),
  )
}

/// A student's overall result for the year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallAggregate {
  pub student_id:      i64,
  /// `None` exactly when `status` is [`Status::InProgress`].
  pub overall_average: Option<f64>,
  pub status:          Status,
}

impl OverallAggregate {
  /// Evaluate a student from their subject aggregates.
  ///
  /// A student with no aggregate is [`Status::InProgress`], not
  /// [`Status::Exclu`]. Invalid coefficients are still an error.
  pub fn evaluate(student_id: i64, subjects: &[SubjectAggregate]) -> Result<Self> {
    match overall_average(subjects) {
      Ok(avg) => Ok(Self {
        student_id,
        overall_average: Some(avg),
        status: classify(avg),
      }),
      Err(Error::NoGrades) => Ok(Self::not_evaluated(student_id)),
      Err(e) => Err(e),
    }
  }

  pub fn not_evaluated(student_id: i64) -> Self {
    Self {
      student_id,
      overall_average: None,
      status: Status::InProgress,
    }
  }

  pub fn is_evaluated(&self) -> bool { self.overall_average.is_some() }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::exam::ExamType;

  fn grade(score: f64, coefficient: f64) -> GradeEntry {
    GradeEntry {
      student_id:       1,
      subject_id:       1,
      exam_id:          0,
      exam_type:        ExamType::Controle,
      score,
      exam_coefficient: coefficient,
      recorded_at:      Utc::now(),
    }
  }

  fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

  // ── Subject level ───────────────────────────────────────────────────────

  #[test]
  fn subject_average_is_exact_weighted_mean() {
    let avg = subject_average(&[grade(12.0, 1.0), grade(16.0, 3.0)]).unwrap();
    assert!(close(avg, 15.0), "got {avg}");
  }

  #[test]
  fn subject_average_stays_within_score_range() {
    let cases: &[&[(f64, f64)]] = &[
      &[(0.0, 1.0), (20.0, 1.0)],
      &[(7.5, 0.25), (13.0, 4.0), (19.0, 2.0)],
      &[(11.0, 2.0)],
      &[(3.0, 100.0), (18.0, 0.01)],
    ];
    for case in cases {
      let grades: Vec<_> = case.iter().map(|&(s, c)| grade(s, c)).collect();
      let avg = subject_average(&grades).unwrap();
      let min = case.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
      let max = case.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
      assert!(avg >= min - 1e-9 && avg <= max + 1e-9, "{avg} outside [{min}, {max}]");

      let num: f64 = case.iter().map(|&(s, c)| s * c).sum();
      let den: f64 = case.iter().map(|&(_, c)| c).sum();
      assert!(close(avg, num / den));
    }
  }

  #[test]
  fn subject_average_is_idempotent_and_order_free() {
    let grades = vec![grade(9.0, 2.0), grade(14.5, 1.0), grade(11.0, 0.5)];
    let mut reversed = grades.clone();
    reversed.reverse();

    let first = subject_average(&grades).unwrap();
    assert_eq!(first, subject_average(&grades).unwrap());
    assert!(close(first, subject_average(&reversed).unwrap()));
  }

  #[test]
  fn empty_subject_is_no_grades_not_zero() {
    assert_eq!(subject_average(&[]), Err(Error::NoGrades));
  }

  #[test]
  fn non_positive_exam_coefficient_is_rejected() {
    let err = subject_average(&[grade(12.0, 1.0), grade(10.0, 0.0)]).unwrap_err();
    assert_eq!(err, Error::InvalidCoefficient(0.0));
    let err = subject_average(&[grade(12.0, -1.0)]).unwrap_err();
    assert_eq!(err, Error::InvalidCoefficient(-1.0));
  }

  #[test]
  fn out_of_range_scores_pass_through() {
    let avg = subject_average(&[grade(25.0, 1.0), grade(15.0, 1.0)]).unwrap();
    assert!(close(avg, 20.0));
  }

  // ── Overall level ───────────────────────────────────────────────────────

  fn agg(subject_id: i64, coefficient: f64, average: f64) -> SubjectAggregate {
    SubjectAggregate {
      subject_id,
      subject_coefficient: coefficient,
      weighted_average: average,
    }
  }

  #[test]
  fn subject_coefficient_dominates_overall() {
    let a = SubjectAggregate::compute(1, 1.0, &[grade(20.0, 1.0)]).unwrap();
    let b = SubjectAggregate::compute(2, 5.0, &[grade(8.0, 1.0)]).unwrap();
    let avg = overall_average(&[a, b]).unwrap();
    assert!(close(avg, 10.0), "got {avg}");
  }

  #[test]
  fn exam_count_does_not_dilute_a_subject() {
    // Subject 1: one heavy exam. Subject 2: many light exams.
    let heavy = SubjectAggregate::compute(1, 2.0, &[grade(18.0, 4.0)]).unwrap();
    let many: Vec<_> = (0..10).map(|_| grade(6.0, 0.1)).collect();
    let light = SubjectAggregate::compute(2, 2.0, &many).unwrap();

    let avg = overall_average(&[heavy, light]).unwrap();
    assert!(close(avg, 12.0), "got {avg}");
  }

  #[test]
  fn overall_is_independent_of_input_order() {
    // Summed by name ("C", "B", "A") this lands just below 10.
    let by_id = [agg(1, 1.0, 2.38), agg(2, 1.0, 13.2), agg(3, 1.0, 14.42)];
    let by_name = [by_id[2], by_id[1], by_id[0]];

    let a = OverallAggregate::evaluate(1, &by_id).unwrap();
    let b = OverallAggregate::evaluate(1, &by_name).unwrap();
    assert_eq!(a.overall_average, b.overall_average);
    assert_eq!(a.status, b.status);
    assert_eq!(a.status, Status::Admis);
  }

  #[test]
  fn empty_overall_is_no_grades() {
    assert_eq!(overall_average(&[]), Err(Error::NoGrades));
  }

  #[test]
  fn evaluate_without_subjects_is_in_progress() {
    let overall = OverallAggregate::evaluate(7, &[]).unwrap();
    assert_eq!(overall.status, Status::InProgress);
    assert_eq!(overall.overall_average, None);
    assert!(!overall.is_evaluated());
  }

  #[test]
  fn evaluate_scored_zero_is_exclu() {
    let overall = OverallAggregate::evaluate(7, &[agg(1, 3.0, 0.0)]).unwrap();
    assert_eq!(overall.status, Status::Exclu);
    assert_eq!(overall.overall_average, Some(0.0));
  }

  #[test]
  fn evaluate_propagates_invalid_coefficient() {
    let err = OverallAggregate::evaluate(7, &[agg(1, 0.0, 12.0)]).unwrap_err();
    assert_eq!(err, Error::InvalidCoefficient(0.0));
  }

  // ── Classifier ──────────────────────────────────────────────────────────

  #[test]
  fn classifier_boundaries() {
    assert_eq!(classify(20.0), Status::Admis);
    assert_eq!(classify(10.0), Status::Admis);
    assert_eq!(classify(9.999), Status::Redoublant);
    assert_eq!(classify(8.0), Status::Redoublant);
    assert_eq!(classify(7.999), Status::Exclu);
    assert_eq!(classify(0.0), Status::Exclu);
  }

  #[test]
  fn status_serialises_upper_case() {
    assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"IN_PROGRESS\"");
    assert_eq!(Status::Redoublant.as_str(), "REDOUBLANT");
  }
}
