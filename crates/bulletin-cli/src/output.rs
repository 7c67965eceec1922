//! Plain-text tables for command output.

use std::fmt::Write as _;

use bulletin_core::{
  aggregate::OverallAggregate, grade::GradeEntry, student::Student, subject::Subject,
};
use chrono::Local;

pub fn students(students: &[Student]) -> String {
  let mut out = format!("{:>5}  {:<32} {:>7}  {}\n", "ID", "NAME", "PROGRAM", "YEAR");
  for s in students {
    let program = s.program_id.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
    let _ = writeln!(
      out,
      "{:>5}  {:<32} {:>7}  {}",
      s.student_id,
      s.display_name(),
      program,
      s.academic_year
    );
  }
  out
}

pub fn subjects(subjects: &[Subject]) -> String {
  let mut out = format!("{:>5}  {:<32} {:>6}\n", "ID", "SUBJECT", "COEF");
  for s in subjects {
    let _ = writeln!(out, "{:>5}  {:<32} {:>6.2}", s.subject_id, s.name, s.coefficient);
  }
  out
}

pub fn grades(grades: &[GradeEntry]) -> String {
  let mut out = format!(
    "{:>7} {:>6}  {:<9} {:>6} {:>6}  {}\n",
    "SUBJECT", "EXAM", "TYPE", "COEF", "SCORE", "RECORDED"
  );
  for g in grades {
    let _ = writeln!(
      out,
      "{:>7} {:>6}  {:<9} {:>6.2} {:>6.2}  {}",
      g.subject_id,
      g.exam_id,
      g.exam_type,
      g.exam_coefficient,
      g.score,
      g.recorded_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
  }
  out
}

pub fn overall(agg: &OverallAggregate) -> String {
  match agg.overall_average {
    Some(avg) => format!("Student #{}: {avg:.2} ({})", agg.student_id, agg.status.as_str()),
    None => format!(
      "Student #{}: not yet evaluated ({})",
      agg.student_id,
      agg.status.as_str()
    ),
  }
}

#[cfg(test)]
mod tests {
  use bulletin_core::aggregate::Status;

  use super::*;

  #[test]
  fn overall_rounds_only_for_display() {
    let agg = OverallAggregate {
      student_id:      3,
      overall_average: Some(9.999),
      status:          Status::Redoublant,
    };
    assert_eq!(overall(&agg), "Student #3: 10.00 (REDOUBLANT)");
    assert_eq!(
      overall(&OverallAggregate::not_evaluated(3)),
      "Student #3: not yet evaluated (IN_PROGRESS)"
    );
  }

  #[test]
  fn subjects_table_has_header_and_rows() {
    let table = subjects(&[Subject {
      subject_id:  1,
      name:        "Anglais".into(),
      coefficient: 2.0,
      program_id:  None,
    }]);
    let lines: Vec<_> = table.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("Anglais"));
    assert!(lines[1].ends_with("2.00"));
  }
}
