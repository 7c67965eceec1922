//! Store-backed evaluation: fetch a student's grades through a
//! [`GradeStore`] and run them through [`crate::aggregate`] and
//! [`crate::transcript`].
//!
//! Every call reads fresh data; nothing is cached between requests. The
//! functions hold no state of their own, so evaluations of different
//! students may run concurrently.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
  aggregate::{self, OverallAggregate, Status, SubjectAggregate},
  grade::GradeEntry,
  store::GradeStore,
  subject::Subject,
  transcript::Transcript,
};

/// Failure of a store-backed evaluation.
#[derive(Debug, Error)]
pub enum ReportError<E> {
  #[error("student not found: {0}")]
  StudentNotFound(i64),

  #[error("subject not found: {0}")]
  SubjectNotFound(i64),

  /// The grades were fetched but could not be aggregated
  /// (e.g. [`crate::Error::NoGrades`]).
  #[error(transparent)]
  Grades(#[from] crate::Error),

  #[error("store error: {0}")]
  Store(#[source] E),
}

impl<E> ReportError<E> {
  /// True when the failure only means "nothing to evaluate yet".
  pub fn is_no_grades(&self) -> bool {
    matches!(self, Self::Grades(crate::Error::NoGrades))
  }
}

pub type ReportResult<T, S> = Result<T, ReportError<<S as GradeStore>::Error>>;

// ─── Subject level ───────────────────────────────────────────────────────────

/// Weighted average of `student_id`'s grades in `subject_id`.
///
/// Fails with [`crate::Error::NoGrades`] when the student has no grade in
/// that subject.
pub async fn compute_subject_average<S: GradeStore>(
  store: &S,
  student_id: i64,
  subject_id: i64,
) -> ReportResult<f64, S> {
  let grades = store
    .fetch_grades_for_subject(student_id, subject_id)
    .await
    .map_err(ReportError::Store)?;
  Ok(aggregate::subject_average(&grades)?)
}

/// The subject's aggregate for one student, carrying the subject's declared
/// coefficient.
pub async fn evaluate_subject<S: GradeStore>(
  store: &S,
  student_id: i64,
  subject_id: i64,
) -> ReportResult<SubjectAggregate, S> {
  let subject = store
    .get_subject(subject_id)
    .await
    .map_err(ReportError::Store)?
    .ok_or(ReportError::SubjectNotFound(subject_id))?;
  let grades = store
    .fetch_grades_for_subject(student_id, subject_id)
    .await
    .map_err(ReportError::Store)?;
  Ok(SubjectAggregate::compute(subject_id, subject.coefficient, &grades)?)
}

// ─── Overall level ───────────────────────────────────────────────────────────

async fn graded_subject_aggregates<S: GradeStore>(
  store: &S,
  student_id: i64,
) -> ReportResult<Vec<SubjectAggregate>, S> {
  let mut subjects = store
    .fetch_subjects_with_grades_for_student(student_id)
    .await
    .map_err(ReportError::Store)?;
  subjects.sort_by_key(|s| s.subject_id);

  let mut aggregates = Vec::with_capacity(subjects.len());
  for subject in subjects {
    let grades = store
      .fetch_grades_for_subject(student_id, subject.subject_id)
      .await
      .map_err(ReportError::Store)?;
    match SubjectAggregate::compute(subject.subject_id, subject.coefficient, &grades) {
      Ok(agg) => aggregates.push(agg),
      // Grade removed between the two reads.
      Err(crate::Error::NoGrades) => continue,
      Err(e) => return Err(e.into()),
    }
  }
  Ok(aggregates)
}

/// Overall weighted average of every graded subject of `student_id`.
///
/// Fails with [`crate::Error::NoGrades`] when no subject has a grade.
pub async fn compute_overall_average<S: GradeStore>(
  store: &S,
  student_id: i64,
) -> ReportResult<f64, S> {
  let aggregates = graded_subject_aggregates(store, student_id).await?;
  Ok(aggregate::overall_average(&aggregates)?)
}

/// Overall average and status. A student without grades is
/// [`Status::InProgress`] rather than an error.
pub async fn evaluate_student<S: GradeStore>(
  store: &S,
  student_id: i64,
) -> ReportResult<OverallAggregate, S> {
  store
    .get_student(student_id)
    .await
    .map_err(ReportError::Store)?
    .ok_or(ReportError::StudentNotFound(student_id))?;
  let aggregates = graded_subject_aggregates(store, student_id).await?;
  Ok(OverallAggregate::evaluate(student_id, &aggregates)?)
}

/// Status for an already-computed overall average.
pub fn classify_status(overall_average: f64) -> Status {
  aggregate::classify(overall_average)
}

// ─── Transcript ──────────────────────────────────────────────────────────────

/// Build the transcript of `student_id`.
///
/// Lists every subject of the student's program plus any other subject the
/// student has been graded in. Subjects without grades appear as "not yet
/// evaluated".
pub async fn build_transcript<S: GradeStore>(
  store: &S,
  student_id: i64,
) -> ReportResult<Transcript, S> {
  let student = store
    .get_student(student_id)
    .await
    .map_err(ReportError::Store)?
    .ok_or(ReportError::StudentNotFound(student_id))?;

  let mut subjects: BTreeMap<i64, Subject> = BTreeMap::new();
  if let Some(program_id) = student.program_id {
    for s in store
      .list_subjects(Some(program_id))
      .await
      .map_err(ReportError::Store)?
    {
      subjects.insert(s.subject_id, s);
    }
  }
  for s in store
    .fetch_subjects_with_grades_for_student(student_id)
    .await
    .map_err(ReportError::Store)?
  {
    subjects.insert(s.subject_id, s);
  }

  let mut with_grades: Vec<(Subject, Vec<GradeEntry>)> =
    Vec::with_capacity(subjects.len());
  for (subject_id, subject) in subjects {
    let grades = store
      .fetch_grades_for_subject(student_id, subject_id)
      .await
      .map_err(ReportError::Store)?;
    with_grades.push((subject, grades));
  }

  Ok(Transcript::build(student, with_grades)?)
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::Utc;

  use super::*;
  use crate::{
    exam::{Exam, ExamType, NewExam},
    grade::NewGrade,
    student::{NewProgram, NewStudent, Program, Student},
    subject::NewSubject,
    transcript::SubjectOutcome,
    user::{NewUser, User},
  };

  /// Read-only in-memory store holding fixed grades; writes are unsupported.
  #[derive(Default)]
  struct FixtureStore {
    students: Vec<Student>,
    subjects: Vec<Subject>,
    grades:   Vec<GradeEntry>,
    fetches:  Mutex<u32>,
  }

  #[derive(Debug, thiserror::Error)]
  #[error("unsupported in fixture")]
  struct Unsupported;

  impl crate::store::StoreError for Unsupported {
    fn domain(&self) -> Option<&crate::Error> { None }
  }

  impl GradeStore for FixtureStore {
    type Error = Unsupported;

    async fn add_program(&self, _: NewProgram) -> Result<Program, Unsupported> { Err(Unsupported) }
    async fn list_programs(&self) -> Result<Vec<Program>, Unsupported> { Ok(vec![]) }
    async fn add_student(&self, _: NewStudent) -> Result<Student, Unsupported> { Err(Unsupported) }
    async fn get_student(&self, id: i64) -> Result<Option<Student>, Unsupported> {
      Ok(self.students.iter().find(|s| s.student_id == id).cloned())
    }
    async fn list_students(&self, _: Option<i64>) -> Result<Vec<Student>, Unsupported> {
      Ok(self.students.clone())
    }
    async fn add_subject(&self, _: NewSubject) -> Result<Subject, Unsupported> { Err(Unsupported) }
    async fn get_subject(&self, id: i64) -> Result<Option<Subject>, Unsupported> {
      Ok(self.subjects.iter().find(|s| s.subject_id == id).cloned())
    }
    async fn list_subjects(&self, program_id: Option<i64>) -> Result<Vec<Subject>, Unsupported> {
      Ok(
        self
          .subjects
          .iter()
          .filter(|s| program_id.is_none() || s.program_id == program_id)
          .cloned()
          .collect(),
      )
    }
    async fn add_exam(&self, _: NewExam) -> Result<Exam, Unsupported> { Err(Unsupported) }
    async fn get_exam(&self, _: i64) -> Result<Option<Exam>, Unsupported> { Ok(None) }
    async fn list_exams(&self, _: Option<i64>) -> Result<Vec<Exam>, Unsupported> { Ok(vec![]) }
    async fn record_grade(&self, _: NewGrade) -> Result<GradeEntry, Unsupported> { Err(Unsupported) }
    async fn update_score(&self, _: i64, _: i64, _: f64) -> Result<GradeEntry, Unsupported> {
      Err(Unsupported)
    }
    async fn delete_grade(&self, _: i64, _: i64) -> Result<(), Unsupported> { Err(Unsupported) }
    async fn list_grades(&self, student_id: i64) -> Result<Vec<GradeEntry>, Unsupported> {
      Ok(self.grades.iter().filter(|g| g.student_id == student_id).cloned().collect())
    }
    async fn fetch_grades_for_subject(
      &self,
      student_id: i64,
      subject_id: i64,
    ) -> Result<Vec<GradeEntry>, Unsupported> {
      *self.fetches.lock().unwrap() += 1;
      Ok(
        self
          .grades
          .iter()
          .filter(|g| g.student_id == student_id && g.subject_id == subject_id)
          .cloned()
          .collect(),
      )
    }
    async fn fetch_subjects_with_grades_for_student(
      &self,
      student_id: i64,
    ) -> Result<Vec<Subject>, Unsupported> {
      // Deliberately reverse order to exercise order independence.
      Ok(
        self
          .subjects
          .iter()
          .rev()
          .filter(|s| {
            self
              .grades
              .iter()
              .any(|g| g.student_id == student_id && g.subject_id == s.subject_id)
          })
          .cloned()
          .collect(),
      )
    }
    async fn add_user(&self, _: NewUser) -> Result<User, Unsupported> { Err(Unsupported) }
    async fn get_user_by_username<'a>(&'a self, _: &'a str) -> Result<Option<User>, Unsupported> {
      Ok(None)
    }
    async fn count_users(&self) -> Result<u64, Unsupported> { Ok(0) }
  }

  fn grade(student_id: i64, subject_id: i64, exam_id: i64, score: f64) -> GradeEntry {
    GradeEntry {
      student_id,
      subject_id,
      exam_id,
      exam_type: ExamType::Examen,
      score,
      exam_coefficient: 1.0,
      recorded_at: Utc::now(),
    }
  }

  fn fixture() -> FixtureStore {
    let student = |id| Student {
      student_id:    id,
      first_name:    "Léa".into(),
      last_name:     "Martin".into(),
      program_id:    Some(1),
      academic_year: "2024-2025".into(),
      enrolled_at:   Utc::now(),
    };
    let subject = |id, name: &str, coefficient| Subject {
      subject_id: id,
      name: name.into(),
      coefficient,
      program_id: Some(1),
    };
    FixtureStore {
      students: vec![student(1), student(2)],
      subjects: vec![
        subject(10, "Anglais", 1.0),
        subject(20, "Mathématiques", 5.0),
        subject(30, "Histoire", 2.0),
      ],
      grades: vec![grade(1, 10, 100, 20.0), grade(1, 20, 200, 8.0)],
      fetches: Mutex::new(0),
    }
  }

  #[tokio::test]
  async fn subject_average_from_store() {
    let store = fixture();
    let avg = compute_subject_average(&store, 1, 20).await.unwrap();
    assert_eq!(avg, 8.0);
  }

  #[tokio::test]
  async fn subject_without_grades_is_no_grades() {
    let store = fixture();
    let err = compute_subject_average(&store, 1, 30).await.unwrap_err();
    assert!(err.is_no_grades());
  }

  #[tokio::test]
  async fn overall_average_uses_subject_coefficients() {
    let store = fixture();
    let avg = compute_overall_average(&store, 1).await.unwrap();
    assert!((avg - 10.0).abs() < 1e-9, "got {avg}");
    assert_eq!(classify_status(avg), Status::Admis);
  }

  #[tokio::test]
  async fn overall_without_grades_is_error_but_evaluation_is_in_progress() {
    let store = fixture();
    assert!(compute_overall_average(&store, 2).await.unwrap_err().is_no_grades());

    let overall = evaluate_student(&store, 2).await.unwrap();
    assert_eq!(overall.status, Status::InProgress);
    assert_eq!(overall.overall_average, None);
  }

  #[tokio::test]
  async fn evaluate_unknown_student() {
    let store = fixture();
    let err = evaluate_student(&store, 99).await.unwrap_err();
    assert!(matches!(err, ReportError::StudentNotFound(99)));
  }

  #[tokio::test]
  async fn evaluate_subject_carries_declared_coefficient() {
    let store = fixture();
    let agg = evaluate_subject(&store, 1, 20).await.unwrap();
    assert_eq!(agg.subject_coefficient, 5.0);
    assert!(matches!(
      evaluate_subject(&store, 1, 99).await.unwrap_err(),
      ReportError::SubjectNotFound(99)
    ));
  }

  #[tokio::test]
  async fn transcript_includes_ungraded_program_subjects() {
    let store = fixture();
    let t = build_transcript(&store, 1).await.unwrap();

    let names: Vec<_> = t.rows.iter().map(|r| r.subject_name.as_str()).collect();
    assert_eq!(names, ["Anglais", "Histoire", "Mathématiques"]);
    assert_eq!(t.rows[1].outcome, SubjectOutcome::NotEvaluated);
    assert_eq!(t.overall.status, Status::Admis);
    assert_eq!(t.total_credits, 5);
  }

  #[tokio::test]
  async fn transcript_is_byte_identical_on_repeat() {
    let store = fixture();
    let first = build_transcript(&store, 1).await.unwrap().render(true);
    let second = build_transcript(&store, 1).await.unwrap().render(true);
    assert_eq!(first, second);
    assert!(*store.fetches.lock().unwrap() >= 6);
  }

  #[tokio::test]
  async fn average_and_transcript_agree_near_threshold() {
    // Ids run opposite to names, so the transcript rows come out "A", "B", "C".
    let mut store = fixture();
    store.subjects = [(1, "C"), (2, "B"), (3, "A")]
      .into_iter()
      .map(|(id, name)| Subject {
        subject_id:  id,
        name:        name.into(),
        coefficient: 1.0,
        program_id:  Some(1),
      })
      .collect();
    store.grades = vec![grade(1, 1, 100, 2.38), grade(1, 2, 200, 13.2), grade(1, 3, 300, 14.42)];

    let overall = evaluate_student(&store, 1).await.unwrap();
    let t = build_transcript(&store, 1).await.unwrap();
    assert_eq!(t.overall.overall_average, overall.overall_average);
    assert_eq!(t.overall.status, overall.status);
    assert_eq!(
      compute_overall_average(&store, 1).await.ok(),
      t.overall.overall_average
    );
  }
}
