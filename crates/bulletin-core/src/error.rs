//! Error types for `bulletin-core`.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
  /// An aggregation was asked for over an empty set: no graded exam for a
  /// subject, or no graded subject for a student. Distinct from a score of
  /// zero, which is a real (failing) result.
  #[error("no grades recorded")]
  NoGrades,

  #[error("invalid coefficient {0}: must be a positive number")]
  InvalidCoefficient(f64),

  #[error("invalid score {0}: must be within 0..=20")]
  InvalidScore(f64),

  #[error("student not found: {0}")]
  StudentNotFound(i64),

  #[error("subject not found: {0}")]
  SubjectNotFound(i64),

  #[error("exam not found: {0}")]
  ExamNotFound(i64),

  #[error("program not found: {0}")]
  ProgramNotFound(i64),

  #[error("student {student_id} already has a grade for exam {exam_id}")]
  GradeExists { student_id: i64, exam_id: i64 },

  #[error("no grade for student {student_id} on exam {exam_id}")]
  GradeNotFound { student_id: i64, exam_id: i64 },

  #[error("username already taken: {0:?}")]
  UsernameTaken(String),

  #[error("a student account must be linked to a student record")]
  MissingStudentLink,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
