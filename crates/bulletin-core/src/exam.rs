//! Exams: one graded assessment inside a subject.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// The kind of assessment. Stored and serialised as the upper-case name
/// (`"CONTROLE"`, `"EXAMEN"`, ...); anything else fails to decode.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamType {
  /// Continuous-assessment test.
  Controle,
  /// End-of-term examination.
  Examen,
  Projet,
  /// Practical work.
  Tp,
}

/// A scheduled assessment belonging to one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
  pub exam_id:     i64,
  pub subject_id:  i64,
  pub title:       String,
  pub exam_type:   ExamType,
  /// Weight of this exam within its subject. Always `> 0`.
  pub coefficient: f64,
  pub held_on:     Option<NaiveDate>,
}

/// Input to [`crate::store::GradeStore::add_exam`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExam {
  pub subject_id:  i64,
  pub title:       String,
  pub exam_type:   ExamType,
  pub coefficient: f64,
  #[serde(default)]
  pub held_on:     Option<NaiveDate>,
}
