//! Students and the programs they are registered in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A curriculum a student follows for an academic year, e.g.
/// "Licence 2 Informatique".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
  pub program_id: i64,
  pub name:       String,
  pub level:      Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProgram {
  pub name:  String,
  #[serde(default)]
  pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub student_id:    i64,
  pub first_name:    String,
  pub last_name:     String,
  /// `None` for a student not yet assigned to a program.
  pub program_id:    Option<i64>,
  /// The current registration, e.g. `"2024-2025"`.
  pub academic_year: String,
  pub enrolled_at:   DateTime<Utc>,
}

impl Student {
  pub fn display_name(&self) -> String {
    format!("{} {}", self.last_name.to_uppercase(), self.first_name)
  }
}

/// Input to [`crate::store::GradeStore::add_student`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
  pub first_name:    String,
  pub last_name:     String,
  #[serde(default)]
  pub program_id:    Option<i64>,
  pub academic_year: String,
}
