//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`. Enums are stored as their upper-case names and parsed back
//! with `strum`; an unknown name is a decode error, never a default.

use std::str::FromStr;

use bulletin_core::{
  exam::{Exam, ExamType},
  grade::GradeEntry,
  student::{Program, Student},
  subject::Subject,
  user::{Role, User},
};
use chrono::{DateTime, NaiveDate, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

// Programs and subjects hold no encoded column, so they map straight from
// the row.

pub const PROGRAM_COLUMNS: &str = "program_id, name, level";

pub fn program_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Program> {
  Ok(Program {
    program_id: row.get(0)?,
    name:       row.get(1)?,
    level:      row.get(2)?,
  })
}

pub const SUBJECT_COLUMNS: &str = "subject_id, name, coefficient, program_id";

pub fn subject_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subject> {
  Ok(Subject {
    subject_id:  row.get(0)?,
    name:        row.get(1)?,
    coefficient: row.get(2)?,
    program_id:  row.get(3)?,
  })
}

/// Raw values read directly from a `students` row.
pub struct RawStudent {
  pub student_id:    i64,
  pub first_name:    String,
  pub last_name:     String,
  pub program_id:    Option<i64>,
  pub academic_year: String,
  pub enrolled_at:   String,
}

impl RawStudent {
  pub const COLUMNS: &'static str =
    "student_id, first_name, last_name, program_id, academic_year, enrolled_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:    row.get(0)?,
      first_name:    row.get(1)?,
      last_name:     row.get(2)?,
      program_id:    row.get(3)?,
      academic_year: row.get(4)?,
      enrolled_at:   row.get(5)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      student_id:    self.student_id,
      first_name:    self.first_name,
      last_name:     self.last_name,
      program_id:    self.program_id,
      academic_year: self.academic_year,
      enrolled_at:   decode_dt(&self.enrolled_at)?,
    })
  }
}

/// Raw values read directly from an `exams` row.
pub struct RawExam {
  pub exam_id:     i64,
  pub subject_id:  i64,
  pub title:       String,
  pub exam_type:   String,
  pub coefficient: f64,
  pub held_on:     Option<String>,
}

impl RawExam {
  pub const COLUMNS: &'static str =
    "exam_id, subject_id, title, exam_type, coefficient, held_on";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      exam_id:     row.get(0)?,
      subject_id:  row.get(1)?,
      title:       row.get(2)?,
      exam_type:   row.get(3)?,
      coefficient: row.get(4)?,
      held_on:     row.get(5)?,
    })
  }

  pub fn into_exam(self) -> Result<Exam> {
    Ok(Exam {
      exam_id:     self.exam_id,
      subject_id:  self.subject_id,
      title:       self.title,
      exam_type:   ExamType::from_str(&self.exam_type)?,
      coefficient: self.coefficient,
      held_on:     self.held_on.as_deref().map(decode_date).transpose()?,
    })
  }
}

/// Raw values from a `grades` row joined with its exam.
pub struct RawGrade {
  pub student_id:       i64,
  pub subject_id:       i64,
  pub exam_id:          i64,
  pub exam_type:        String,
  pub score:            f64,
  pub exam_coefficient: f64,
  pub recorded_at:      String,
}

impl RawGrade {
  /// Select list for `grades g JOIN exams e ON e.exam_id = g.exam_id`.
  pub const COLUMNS: &'static str =
    "g.student_id, e.subject_id, g.exam_id, e.exam_type, g.score, e.coefficient, g.recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:       row.get(0)?,
      subject_id:       row.get(1)?,
      exam_id:          row.get(2)?,
      exam_type:        row.get(3)?,
      score:            row.get(4)?,
      exam_coefficient: row.get(5)?,
      recorded_at:      row.get(6)?,
    })
  }

  pub fn into_grade(self) -> Result<GradeEntry> {
    Ok(GradeEntry {
      student_id:       self.student_id,
      subject_id:       self.subject_id,
      exam_id:          self.exam_id,
      exam_type:        ExamType::from_str(&self.exam_type)?,
      score:            self.score,
      exam_coefficient: self.exam_coefficient,
      recorded_at:      decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       i64,
  pub username:      String,
  pub password_hash: String,
  pub role:          String,
  pub student_id:    Option<i64>,
  pub created_at:    String,
}

impl RawUser {
  pub const COLUMNS: &'static str =
    "user_id, username, password_hash, role, student_id, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      password_hash: row.get(2)?,
      role:          row.get(3)?,
      student_id:    row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       self.user_id,
      username:      self.username,
      role:          Role::from_str(&self.role)?,
      student_id:    self.student_id,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
