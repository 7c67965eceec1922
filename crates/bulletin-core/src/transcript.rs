//! Transcripts: the per-student report built from subject aggregates.
//!
//! A transcript is a pure function of its inputs: rows are sorted by subject
//! name (then id) and per-exam detail by exam id, so the same data always
//! renders to the same bytes whatever order the store returned it in.
//! Numbers are rounded to two decimals in [`Transcript::render`] only.

use std::{collections::BTreeMap, fmt::Write as _};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
  Error, Result,
  aggregate::{OverallAggregate, PASS_THRESHOLD, SubjectAggregate},
  grade::GradeEntry,
  student::Student,
  subject::Subject,
};

/// Credits awarded for each subject whose average reaches the pass mark.
pub const CREDITS_PER_PASSED_SUBJECT: u32 = 5;

/// Result of one subject on the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectOutcome {
  Passed,
  Failed,
  /// The subject has no grade yet.
  NotEvaluated,
}

impl SubjectOutcome {
  fn label(self) -> &'static str {
    match self {
      Self::Passed => "PASSED",
      Self::Failed => "FAILED",
      Self::NotEvaluated => "NOT YET EVALUATED",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRow {
  pub subject_id:   i64,
  pub subject_name: String,
  pub coefficient:  f64,
  /// Unrounded weighted average; `None` when not evaluated.
  pub average:      Option<f64>,
  pub outcome:      SubjectOutcome,
  pub credits:      u32,
  /// Per-exam detail, sorted by exam id.
  pub grades:       Vec<GradeEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
  pub student:       Student,
  pub rows:          Vec<TranscriptRow>,
  pub overall:       OverallAggregate,
  pub total_credits: u32,
}

impl Transcript {
  /// Assemble a transcript from each subject and the student's grades in it.
  ///
  /// A subject listed more than once yields a single row holding the union
  /// of its grades, one per exam. A subject with an empty grade list becomes
  /// a "not yet evaluated" row and does not count towards the overall
  /// average.
  pub fn build(
    student: Student,
    subjects: Vec<(Subject, Vec<GradeEntry>)>,
  ) -> Result<Self> {
    let mut merged: BTreeMap<i64, (Subject, Vec<GradeEntry>)> = BTreeMap::new();
    for (subject, grades) in subjects {
      merged
        .entry(subject.subject_id)
        .or_insert_with(|| (subject, Vec::new()))
        .1
        .extend(grades);
    }

    let mut rows = Vec::with_capacity(merged.len());

    for (_, (subject, mut grades)) in merged {
      grades.sort_by_key(|g| g.exam_id);
      grades.dedup_by_key(|g| g.exam_id);

      let (average, outcome, credits) =
        match SubjectAggregate::compute(subject.subject_id, subject.coefficient, &grades) {
          Ok(agg) if agg.passed() => {
            (Some(agg.weighted_average), SubjectOutcome::Passed, CREDITS_PER_PASSED_SUBJECT)
          }
          Ok(agg) => (Some(agg.weighted_average), SubjectOutcome::Failed, 0),
          Err(Error::NoGrades) => (None, SubjectOutcome::NotEvaluated, 0),
          Err(e) => return Err(e),
        };

      rows.push(TranscriptRow {
        subject_id: subject.subject_id,
        subject_name: subject.name,
        coefficient: subject.coefficient,
        average,
        outcome,
        credits,
        grades,
      });
    }

    rows.sort_by(|a, b| {
      a.subject_name
        .cmp(&b.subject_name)
        .then(a.subject_id.cmp(&b.subject_id))
    });

    let aggregates: Vec<SubjectAggregate> = rows
      .iter()
      .filter_map(|row| {
        row.average.map(|avg| SubjectAggregate {
          subject_id:          row.subject_id,
          subject_coefficient: row.coefficient,
          weighted_average:    avg,
        })
      })
      .collect();

    let overall = OverallAggregate::evaluate(student.student_id, &aggregates)?;
    let total_credits = rows.iter().map(|r| r.credits).sum();

    Ok(Self { student, rows, overall, total_credits })
  }

  /// Render as fixed-width text. With `detail`, each subject is followed by
  /// one line per graded exam.
  pub fn render(&self, detail: bool) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(
      out,
      "Transcript: {} (student #{})",
      self.student.display_name(),
      self.student.student_id
    );
    let _ = writeln!(out, "Academic year: {}", self.student.academic_year);
    let _ = writeln!(out);
    let _ = writeln!(
      out,
      "{:<30} {:>6} {:>8}  {:<17} {:>7}",
      "Subject", "Coef", "Average", "Result", "Credits"
    );

    for row in &self.rows {
      let average = row
        .average
        .map(|a| format!("{a:.2}"))
        .unwrap_or_else(|| "-".to_string());
      let _ = writeln!(
        out,
        "{:<30.30} {:>6.2} {:>8}  {:<17} {:>7}",
        row.subject_name,
        row.coefficient,
        average,
        row.outcome.label(),
        row.credits
      );

      if detail {
        for g in &row.grades {
          let _ = writeln!(
            out,
            "    {:<9} exam #{:<6} coef {:>5.2}  score {:>5.2}",
            g.exam_type.as_ref(),
            g.exam_id,
            g.exam_coefficient,
            g.score
          );
        }
      }
    }

    let _ = writeln!(out);
    match self.overall.overall_average {
      Some(avg) => {
        let _ = writeln!(
          out,
          "Overall average: {avg:.2}  Status: {}  Credits: {}",
          self.overall.status.as_str(),
          self.total_credits
        );
      }
      None => {
        let _ = writeln!(
          out,
          "Overall average: not yet evaluated  Status: {}  Credits: {}",
          self.overall.status.as_str(),
          self.total_credits
        );
      }
    }

    out
  }

  /// Quoted SHA-256 of the detailed rendering, usable as an HTTP `ETag`.
  pub fn etag(&self) -> String {
    let digest = Sha256::digest(self.render(true).as_bytes());
    format!("\"{}\"", hex::encode(digest))
  }

  /// Whether the student passes the year. `None` while not evaluated.
  pub fn passed(&self) -> Option<bool> {
    self.overall.overall_average.map(|avg| avg >= PASS_THRESHOLD)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::{aggregate::Status, exam::ExamType};

  fn student() -> Student {
    Student {
      student_id:    12,
      first_name:    "Marie".into(),
      last_name:     "Dupont".into(),
      program_id:    Some(1),
      academic_year: "2024-2025".into(),
      enrolled_at:   Utc.timestamp_opt(0, 0).unwrap(),
    }
  }

  fn subject(id: i64, name: &str, coefficient: f64) -> Subject {
    Subject {
      subject_id: id,
      name: name.into(),
      coefficient,
      program_id: Some(1),
    }
  }

  fn grade(subject_id: i64, exam_id: i64, score: f64, coefficient: f64) -> GradeEntry {
    GradeEntry {
      student_id: 12,
      subject_id,
      exam_id,
      exam_type: ExamType::Examen,
      score,
      exam_coefficient: coefficient,
      recorded_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    }
  }

  fn sample() -> Vec<(Subject, Vec<GradeEntry>)> {
    vec![
      (subject(3, "Réseaux", 2.0), vec![grade(3, 31, 7.0, 1.0), grade(3, 30, 9.0, 1.0)]),
      (subject(1, "Algorithmique", 4.0), vec![grade(1, 10, 15.0, 2.0)]),
      (subject(2, "Anglais", 1.0), vec![]),
    ]
  }

  #[test]
  fn rows_are_sorted_by_subject_name() {
    let t = Transcript::build(student(), sample()).unwrap();
    let names: Vec<_> = t.rows.iter().map(|r| r.subject_name.as_str()).collect();
    assert_eq!(names, ["Algorithmique", "Anglais", "Réseaux"]);
    let exams: Vec<_> = t.rows[2].grades.iter().map(|g| g.exam_id).collect();
    assert_eq!(exams, [30, 31]);
  }

  #[test]
  fn ungraded_subject_is_not_evaluated_and_excluded() {
    let t = Transcript::build(student(), sample()).unwrap();
    let anglais = &t.rows[1];
    assert_eq!(anglais.outcome, SubjectOutcome::NotEvaluated);
    assert_eq!(anglais.average, None);
    assert_eq!(anglais.credits, 0);

    // (15 × 4 + 8 × 2) / 6
    let avg = t.overall.overall_average.unwrap();
    assert!((avg - 76.0 / 6.0).abs() < 1e-9);
    assert_eq!(t.overall.status, Status::Admis);
    assert_eq!(t.total_credits, 5);
    assert_eq!(t.passed(), Some(true));
  }

  #[test]
  fn credits_use_strict_unrounded_threshold() {
    let exact = Transcript::build(
      student(),
      vec![(subject(1, "Maths", 1.0), vec![grade(1, 1, 10.0, 1.0)])],
    )
    .unwrap();
    assert_eq!(exact.rows[0].credits, 5);
    assert_eq!(exact.rows[0].outcome, SubjectOutcome::Passed);

    let below = Transcript::build(
      student(),
      vec![(subject(1, "Maths", 1.0), vec![grade(1, 1, 9.999, 1.0)])],
    )
    .unwrap();
    assert_eq!(below.rows[0].credits, 0);
    assert_eq!(below.rows[0].outcome, SubjectOutcome::Failed);
    // Rendered as 10.00 but still failed.
    assert!(below.render(false).contains("10.00  FAILED"));
  }

  #[test]
  fn rendering_is_deterministic_across_input_order() {
    let a = Transcript::build(student(), sample()).unwrap();
    let mut shuffled = sample();
    shuffled.reverse();
    for (_, grades) in &mut shuffled {
      grades.reverse();
    }
    let b = Transcript::build(student(), shuffled).unwrap();

    assert_eq!(a.render(true), b.render(true));
    assert_eq!(a.render(true), a.render(true));
    assert_eq!(a.etag(), b.etag());
  }

  #[test]
  fn student_without_grades_renders_not_evaluated() {
    let t = Transcript::build(student(), vec![(subject(2, "Anglais", 1.0), vec![])]).unwrap();
    assert_eq!(t.overall.status, Status::InProgress);
    assert_eq!(t.passed(), None);

    let text = t.render(false);
    assert!(text.contains("NOT YET EVALUATED"));
    assert!(text.contains("Overall average: not yet evaluated  Status: IN_PROGRESS"));
    assert!(!text.contains("EXCLU"));
  }

  #[test]
  fn repeated_subject_counts_once() {
    let maths = subject(1, "Maths", 2.0);
    let t = Transcript::build(
      student(),
      vec![
        (maths.clone(), vec![grade(1, 10, 14.0, 1.0)]),
        (subject(2, "Anglais", 1.0), vec![grade(2, 20, 8.0, 1.0)]),
        (maths, vec![grade(1, 10, 14.0, 1.0), grade(1, 11, 12.0, 1.0)]),
      ],
    )
    .unwrap();

    assert_eq!(t.rows.len(), 2);
    let exams: Vec<_> = t.rows[1].grades.iter().map(|g| g.exam_id).collect();
    assert_eq!(exams, [10, 11]);
    assert_eq!(t.total_credits, 5);
    // (13 × 2 + 8 × 1) / 3
    let avg = t.overall.overall_average.unwrap();
    assert!((avg - 34.0 / 3.0).abs() < 1e-9, "got {avg}");
  }

  #[test]
  fn detail_lists_each_exam() {
    let t = Transcript::build(student(), sample()).unwrap();
    let text = t.render(true);
    assert!(text.contains("exam #30"));
    assert!(text.contains("exam #31"));
    assert!(!t.render(false).contains("exam #30"));
  }

  #[test]
  fn invalid_subject_coefficient_is_an_error() {
    let err = Transcript::build(
      student(),
      vec![(subject(1, "Maths", 0.0), vec![grade(1, 1, 12.0, 1.0)])],
    )
    .unwrap_err();
    assert_eq!(err, Error::InvalidCoefficient(0.0));
  }
}
