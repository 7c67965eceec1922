//! The `GradeStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `bulletin-store-sqlite`). The aggregation layer in [`crate::report`] and
//! the HTTP layer depend on this abstraction, never on a connection.

use std::future::Future;

use crate::{
  exam::{Exam, NewExam},
  grade::{GradeEntry, NewGrade},
  student::{NewProgram, NewStudent, Program, Student},
  subject::{NewSubject, Subject},
  user::{NewUser, User},
};

/// Error type of a [`GradeStore`] backend.
///
/// Backends report validation and lookup failures as a domain
/// [`crate::Error`]; `domain` exposes it so callers can tell a rejected
/// score from a broken database without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&crate::Error>;
}

/// Abstraction over a Bulletin storage backend.
///
/// Writes validate their input (score range, positive coefficients,
/// referenced rows) and report failures through `Self::Error`. Reads return
/// stored data without re-validation.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait GradeStore: Send + Sync {
  type Error: StoreError;

  // ── Programs ──────────────────────────────────────────────────────────

  fn add_program(
    &self,
    input: NewProgram,
  ) -> impl Future<Output = Result<Program, Self::Error>> + Send + '_;

  fn list_programs(
    &self,
  ) -> impl Future<Output = Result<Vec<Program>, Self::Error>> + Send + '_;

  // ── Students ──────────────────────────────────────────────────────────

  /// Register a student. Fails if `program_id` names an unknown program.
  fn add_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  /// Retrieve a student by id. Returns `None` if not found.
  fn get_student(
    &self,
    student_id: i64,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// List students ordered by last then first name, optionally restricted
  /// to one program.
  fn list_students(
    &self,
    program_id: Option<i64>,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Create a subject. The coefficient must be positive.
  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    subject_id: i64,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// List subjects ordered by name, optionally restricted to one program.
  fn list_subjects(
    &self,
    program_id: Option<i64>,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  // ── Exams ─────────────────────────────────────────────────────────────

  /// Schedule an exam in an existing subject. The coefficient must be
  /// positive.
  fn add_exam(
    &self,
    input: NewExam,
  ) -> impl Future<Output = Result<Exam, Self::Error>> + Send + '_;

  fn get_exam(
    &self,
    exam_id: i64,
  ) -> impl Future<Output = Result<Option<Exam>, Self::Error>> + Send + '_;

  fn list_exams(
    &self,
    subject_id: Option<i64>,
  ) -> impl Future<Output = Result<Vec<Exam>, Self::Error>> + Send + '_;

  // ── Grades: writes ────────────────────────────────────────────────────

  /// Record a student's score on an exam. At most one grade exists per
  /// (student, exam); a second call fails rather than overwriting.
  fn record_grade(
    &self,
    input: NewGrade,
  ) -> impl Future<Output = Result<GradeEntry, Self::Error>> + Send + '_;

  /// Replace the score of an existing grade.
  fn update_score(
    &self,
    student_id: i64,
    exam_id: i64,
    score: f64,
  ) -> impl Future<Output = Result<GradeEntry, Self::Error>> + Send + '_;

  /// Administrative removal of a grade.
  fn delete_grade(
    &self,
    student_id: i64,
    exam_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Grades: reads ─────────────────────────────────────────────────────

  /// All grades of a student, across subjects.
  fn list_grades(
    &self,
    student_id: i64,
  ) -> impl Future<Output = Result<Vec<GradeEntry>, Self::Error>> + Send + '_;

  /// Grades of one student in one subject. Order is unspecified.
  fn fetch_grades_for_subject(
    &self,
    student_id: i64,
    subject_id: i64,
  ) -> impl Future<Output = Result<Vec<GradeEntry>, Self::Error>> + Send + '_;

  /// Subjects in which the student has at least one grade, with their
  /// declared coefficients. Order is unspecified.
  fn fetch_subjects_with_grades_for_student(
    &self,
    student_id: i64,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create an account. Usernames are unique; student accounts must link
  /// to an existing student.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn count_users(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
