//! [`SqliteStore`], the SQLite implementation of [`GradeStore`].
//!
//! Each write runs its existence checks and its statement inside a single
//! `call`, so no other request can interleave between the check and the
//! write. Closures report domain failures as `Ok(Err(..))`; the outer
//! `Result` is reserved for database errors.

use std::path::Path;

use bulletin_core::{
  Error as CoreError,
  exam::{Exam, NewExam},
  grade::{GradeEntry, NewGrade, validate_coefficient, validate_score},
  store::GradeStore,
  student::{NewProgram, NewStudent, Program, Student},
  subject::{NewSubject, Subject},
  user::{NewUser, Role, User},
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{
    PROGRAM_COLUMNS, RawExam, RawGrade, RawStudent, RawUser, SUBJECT_COLUMNS,
    decode_dt, encode_date, encode_dt, program_from_row, subject_from_row,
  },
  schema::SCHEMA,
};

type CallResult<T> = tokio_rusqlite::Result<Result<T>>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Bulletin grade store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Query helpers ───────────────────────────────────────────────────────────

fn row_exists(conn: &rusqlite::Connection, sql: &str, id: i64) -> rusqlite::Result<bool> {
  Ok(conn.query_row(sql, [id], |_| Ok(())).optional()?.is_some())
}

fn grade_select(filter: &str) -> String {
  format!(
    "SELECT {} FROM grades g JOIN exams e ON e.exam_id = g.exam_id WHERE {filter}",
    RawGrade::COLUMNS
  )
}

fn select_grade(
  conn: &rusqlite::Connection,
  student_id: i64,
  exam_id: i64,
) -> rusqlite::Result<RawGrade> {
  conn.query_row(
    &grade_select("g.student_id = ?1 AND g.exam_id = ?2"),
    rusqlite::params![student_id, exam_id],
    RawGrade::from_row,
  )
}

// ─── GradeStore impl ─────────────────────────────────────────────────────────

impl GradeStore for SqliteStore {
  type Error = crate::Error;

  // ── Programs ──────────────────────────────────────────────────────────────

  async fn add_program(&self, input: NewProgram) -> Result<Program> {
    let program = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO programs (name, level) VALUES (?1, ?2)",
          rusqlite::params![input.name, input.level],
        )?;
        Ok(Program {
          program_id: conn.last_insert_rowid(),
          name:       input.name,
          level:      input.level,
        })
      })
      .await?;

    tracing::debug!(program_id = program.program_id, "program added");
    Ok(program)
  }

  async fn list_programs(&self) -> Result<Vec<Program>> {
    let programs = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROGRAM_COLUMNS} FROM programs ORDER BY name, program_id"
        ))?;
        let rows = stmt
          .query_map([], program_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(programs)
  }

  // ── Students ──────────────────────────────────────────────────────────────

  async fn add_student(&self, input: NewStudent) -> Result<Student> {
    let enrolled_at = Utc::now();
    let enrolled_str = encode_dt(enrolled_at);
    let program_id = input.program_id;
    let first_name = input.first_name.clone();
    let last_name = input.last_name.clone();
    let academic_year = input.academic_year.clone();

    let student_id = self
      .conn
      .call(move |conn| -> CallResult<i64> {
        if let Some(pid) = program_id
          && !row_exists(conn, "SELECT 1 FROM programs WHERE program_id = ?1", pid)?
        {
          return Ok(Err(CoreError::ProgramNotFound(pid).into()));
        }
        conn.execute(
          "INSERT INTO students (first_name, last_name, program_id, academic_year, enrolled_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![first_name, last_name, program_id, academic_year, enrolled_str],
        )?;
        Ok(Ok(conn.last_insert_rowid()))
      })
      .await??;

    tracing::debug!(student_id, "student added");
    Ok(Student {
      student_id,
      first_name: input.first_name,
      last_name: input.last_name,
      program_id: input.program_id,
      academic_year: input.academic_year,
      // Round-trip through the stored form so reads compare equal.
      enrolled_at: decode_dt(&encode_dt(enrolled_at))?,
    })
  }

  async fn get_student(&self, student_id: i64) -> Result<Option<Student>> {
    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM students WHERE student_id = ?1", RawStudent::COLUMNS),
              [student_id],
              RawStudent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStudent::into_student).transpose()
  }

  async fn list_students(&self, program_id: Option<i64>) -> Result<Vec<Student>> {
    let raws: Vec<RawStudent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM students
           WHERE (?1 IS NULL OR program_id = ?1)
           ORDER BY last_name, first_name, student_id",
          RawStudent::COLUMNS
        ))?;
        let rows = stmt
          .query_map([program_id], RawStudent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStudent::into_student).collect()
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let coefficient = validate_coefficient(input.coefficient)?;

    let subject = self
      .conn
      .call(move |conn| -> CallResult<Subject> {
        if let Some(pid) = input.program_id
          && !row_exists(conn, "SELECT 1 FROM programs WHERE program_id = ?1", pid)?
        {
          return Ok(Err(CoreError::ProgramNotFound(pid).into()));
        }
        conn.execute(
          "INSERT INTO subjects (name, coefficient, program_id) VALUES (?1, ?2, ?3)",
          rusqlite::params![input.name, coefficient, input.program_id],
        )?;
        Ok(Ok(Subject {
          subject_id: conn.last_insert_rowid(),
          name: input.name,
          coefficient,
          program_id: input.program_id,
        }))
      })
      .await??;

    tracing::debug!(subject_id = subject.subject_id, coefficient, "subject added");
    Ok(subject)
  }

  async fn get_subject(&self, subject_id: i64) -> Result<Option<Subject>> {
    let subject = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
              [subject_id],
              subject_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(subject)
  }

  async fn list_subjects(&self, program_id: Option<i64>) -> Result<Vec<Subject>> {
    let subjects = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBJECT_COLUMNS} FROM subjects
           WHERE (?1 IS NULL OR program_id = ?1)
           ORDER BY name, subject_id"
        ))?;
        let rows = stmt
          .query_map([program_id], subject_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(subjects)
  }

  // ── Exams ─────────────────────────────────────────────────────────────────

  async fn add_exam(&self, input: NewExam) -> Result<Exam> {
    let coefficient = validate_coefficient(input.coefficient)?;
    let subject_id = input.subject_id;
    let title = input.title.clone();
    let type_str = input.exam_type.as_ref().to_owned();
    let held_on_str = input.held_on.map(encode_date);

    let exam_id = self
      .conn
      .call(move |conn| -> CallResult<i64> {
        if !row_exists(conn, "SELECT 1 FROM subjects WHERE subject_id = ?1", subject_id)? {
          return Ok(Err(CoreError::SubjectNotFound(subject_id).into()));
        }
        conn.execute(
          "INSERT INTO exams (subject_id, title, exam_type, coefficient, held_on)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![subject_id, title, type_str, coefficient, held_on_str],
        )?;
        Ok(Ok(conn.last_insert_rowid()))
      })
      .await??;

    tracing::debug!(exam_id, subject_id, "exam added");
    Ok(Exam {
      exam_id,
      subject_id,
      title: input.title,
      exam_type: input.exam_type,
      coefficient,
      held_on: input.held_on,
    })
  }

  async fn get_exam(&self, exam_id: i64) -> Result<Option<Exam>> {
    let raw: Option<RawExam> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM exams WHERE exam_id = ?1", RawExam::COLUMNS),
              [exam_id],
              RawExam::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawExam::into_exam).transpose()
  }

  async fn list_exams(&self, subject_id: Option<i64>) -> Result<Vec<Exam>> {
    let raws: Vec<RawExam> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM exams
           WHERE (?1 IS NULL OR subject_id = ?1)
           ORDER BY subject_id, held_on, exam_id",
          RawExam::COLUMNS
        ))?;
        let rows = stmt
          .query_map([subject_id], RawExam::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawExam::into_exam).collect()
  }

  // ── Grades: writes ────────────────────────────────────────────────────────

  async fn record_grade(&self, input: NewGrade) -> Result<GradeEntry> {
    let NewGrade { student_id, exam_id, score } = input;
    validate_score(score)?;
    let at_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| -> CallResult<RawGrade> {
        if !row_exists(conn, "SELECT 1 FROM students WHERE student_id = ?1", student_id)? {
          return Ok(Err(CoreError::StudentNotFound(student_id).into()));
        }
        if !row_exists(conn, "SELECT 1 FROM exams WHERE exam_id = ?1", exam_id)? {
          return Ok(Err(CoreError::ExamNotFound(exam_id).into()));
        }
        let inserted = conn.execute(
          "INSERT OR IGNORE INTO grades (student_id, exam_id, score, recorded_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![student_id, exam_id, score, at_str],
        )?;
        if inserted == 0 {
          return Ok(Err(CoreError::GradeExists { student_id, exam_id }.into()));
        }
        Ok(Ok(select_grade(conn, student_id, exam_id)?))
      })
      .await??;

    tracing::debug!(student_id, exam_id, score, "grade recorded");
    raw.into_grade()
  }

  async fn update_score(&self, student_id: i64, exam_id: i64, score: f64) -> Result<GradeEntry> {
    validate_score(score)?;
    let at_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| -> CallResult<RawGrade> {
        let updated = conn.execute(
          "UPDATE grades SET score = ?3, recorded_at = ?4
           WHERE student_id = ?1 AND exam_id = ?2",
          rusqlite::params![student_id, exam_id, score, at_str],
        )?;
        if updated == 0 {
          return Ok(Err(CoreError::GradeNotFound { student_id, exam_id }.into()));
        }
        Ok(Ok(select_grade(conn, student_id, exam_id)?))
      })
      .await??;

    tracing::debug!(student_id, exam_id, score, "score updated");
    raw.into_grade()
  }

  async fn delete_grade(&self, student_id: i64, exam_id: i64) -> Result<()> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM grades WHERE student_id = ?1 AND exam_id = ?2",
          rusqlite::params![student_id, exam_id],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(CoreError::GradeNotFound { student_id, exam_id }.into());
    }
    tracing::info!(student_id, exam_id, "grade deleted");
    Ok(())
  }

  // ── Grades: reads ─────────────────────────────────────────────────────────

  async fn list_grades(&self, student_id: i64) -> Result<Vec<GradeEntry>> {
    let raws: Vec<RawGrade> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{} ORDER BY e.subject_id, g.exam_id",
          grade_select("g.student_id = ?1")
        ))?;
        let rows = stmt
          .query_map([student_id], RawGrade::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGrade::into_grade).collect()
  }

  async fn fetch_grades_for_subject(
    &self,
    student_id: i64,
    subject_id: i64,
  ) -> Result<Vec<GradeEntry>> {
    let raws: Vec<RawGrade> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare(&grade_select("g.student_id = ?1 AND e.subject_id = ?2"))?;
        let rows = stmt
          .query_map(rusqlite::params![student_id, subject_id], RawGrade::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGrade::into_grade).collect()
  }

  async fn fetch_subjects_with_grades_for_student(
    &self,
    student_id: i64,
  ) -> Result<Vec<Subject>> {
    let subjects = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT s.subject_id, s.name, s.coefficient, s.program_id
           FROM subjects s
           JOIN exams  e ON e.subject_id = s.subject_id
           JOIN grades g ON g.exam_id    = e.exam_id
           WHERE g.student_id = ?1",
        )?;
        let rows = stmt
          .query_map([student_id], subject_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(subjects)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    // Only student accounts carry a student link.
    let student_id = match input.role {
      Role::Student => Some(input.student_id.ok_or(CoreError::MissingStudentLink)?),
      Role::Admin | Role::Responsable | Role::Teacher => None,
    };
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let username = input.username.clone();
    let hash = input.password_hash.clone();
    let role_str = input.role.as_ref().to_owned();

    let user_id = self
      .conn
      .call(move |conn| -> CallResult<i64> {
        if let Some(sid) = student_id
          && !row_exists(conn, "SELECT 1 FROM students WHERE student_id = ?1", sid)?
        {
          return Ok(Err(CoreError::StudentNotFound(sid).into()));
        }
        let taken = conn
          .query_row(
            "SELECT 1 FROM users WHERE username = ?1",
            [&username],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(Err(CoreError::UsernameTaken(username).into()));
        }
        conn.execute(
          "INSERT INTO users (username, password_hash, role, student_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![username, hash, role_str, student_id, at_str],
        )?;
        Ok(Ok(conn.last_insert_rowid()))
      })
      .await??;

    tracing::info!(user_id, username = %input.username, role = %input.role, "user created");
    Ok(User {
      user_id,
      username: input.username,
      role: input.role,
      student_id,
      password_hash: input.password_hash,
      created_at: decode_dt(&encode_dt(created_at))?,
    })
  }

  async fn get_user_by_username<'a>(&'a self, username: &'a str) -> Result<Option<User>> {
    let username = username.to_owned();
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM users WHERE username = ?1", RawUser::COLUMNS),
              [username],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn count_users(&self) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get::<_, i64>(0))?))
      .await?;
    Ok(count.max(0) as u64)
  }
}
