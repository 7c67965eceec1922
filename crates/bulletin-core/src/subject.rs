//! Subjects: curriculum units carrying a declared coefficient.

use serde::{Deserialize, Serialize};

/// A subject of the curriculum. Its `coefficient` weighs the subject against
/// the other subjects in the overall average, independently of how many
/// exams it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:  i64,
  pub name:        String,
  pub coefficient: f64,
  pub program_id:  Option<i64>,
}

/// Input to [`crate::store::GradeStore::add_subject`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubject {
  pub name:        String,
  pub coefficient: f64,
  #[serde(default)]
  pub program_id:  Option<i64>,
}
