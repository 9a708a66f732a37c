//! Reference records and raw scores.
//!
//! Reference data (school years, terms, grades, classrooms, subjects,
//! students, teachers, exams) is read-only input to the engine. Scores are the
//! only raw data the engine reacts to.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::{
  Error, Result,
  code::{
    ClassroomCode, ExamCode, GradeCode, SchoolYearCode, StudentCode,
    SubjectCode, TeacherCode, TermCode,
  },
};

// ─── Calendar ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolYear {
  pub school_year_code: SchoolYearCode,
  pub school_year_name: String,
}

/// One half-year period. A school year has two terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
  pub term_code:        TermCode,
  pub term_name:        String,
  pub school_year_code: SchoolYearCode,
}

// ─── Cohorts ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
  pub grade_code:       GradeCode,
  pub grade_name:       String,
  pub school_year_code: SchoolYearCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classroom {
  pub classroom_code: ClassroomCode,
  pub classroom_name: String,
  pub grade_code:     GradeCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
  pub student_code:   StudentCode,
  pub name:           String,
  pub classroom_code: ClassroomCode,
}

// ─── Teaching ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_code: SubjectCode,
  pub subject_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
  pub teacher_code: TeacherCode,
  pub name:         String,
}

/// A teacher takes charge of one subject in one classroom. Only the assigned
/// teacher may enter scores for that (classroom, subject).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherAssignment {
  pub classroom_code: ClassroomCode,
  pub teacher_code:   TeacherCode,
  pub subject_code:   SubjectCode,
}

// ─── Exams ───────────────────────────────────────────────────────────────────

/// The weighting class of an exam within a subject average.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExamKind {
  Midterm,
  Final,
  Regular,
}

impl ExamKind {
  /// Guess the kind from an exam's display name. Names follow the school's
  /// convention of "Kiểm tra giữa kỳ ..." / "Thi cuối kỳ ...".
  pub fn infer(exam_name: &str) -> Self {
    let name = exam_name.to_lowercase();
    if name.contains("giữa kỳ") || name.contains("giữa kì") || name.contains("midterm") {
      Self::Midterm
    } else if name.contains("cuối kỳ") || name.contains("cuối kì") || name.contains("final") {
      Self::Final
    } else {
      Self::Regular
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
  pub exam_code:    ExamCode,
  pub exam_name:    String,
  pub subject_code: SubjectCode,
  pub term_code:    TermCode,
  pub date:         NaiveDate,
  /// Explicit kind; when absent it is inferred from `exam_name`.
  #[serde(default)]
  pub kind:         Option<ExamKind>,
}

impl Exam {
  pub fn effective_kind(&self) -> ExamKind {
    self.kind.unwrap_or_else(|| ExamKind::infer(&self.exam_name))
  }
}

// ─── Scores ──────────────────────────────────────────────────────────────────

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// One student's result on one exam. At most one score exists per
/// (student, exam); writes are upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
  pub student_code: StudentCode,
  pub exam_code:    ExamCode,
  pub score_value:  f64,
}

impl Score {
  /// Build a score, rejecting values outside `[0, 10]` (and NaN).
  pub fn new(
    student_code: StudentCode,
    exam_code: ExamCode,
    score_value: f64,
  ) -> Result<Self> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score_value) {
      return Err(Error::ScoreOutOfRange {
        student: student_code,
        value:   score_value,
      });
    }
    Ok(Self { student_code, exam_code, score_value })
  }
}

/// A score as submitted in a batch; the exam is implied by the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreInput {
  pub student_code: StudentCode,
  pub score_value:  f64,
}

/// A score joined with its exam's subject and term, for per-student listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentScore {
  pub exam_code:    ExamCode,
  pub subject_code: SubjectCode,
  pub term_code:    TermCode,
  pub score_value:  f64,
}

// ─── Seed bundle ─────────────────────────────────────────────────────────────

/// A complete set of reference data, loadable in one go by a store backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
  pub school_years: Vec<SchoolYear>,
  pub terms:        Vec<Term>,
  pub grades:       Vec<Grade>,
  pub classrooms:   Vec<Classroom>,
  pub subjects:     Vec<Subject>,
  pub students:     Vec<Student>,
  pub teachers:     Vec<Teacher>,
  pub assignments:  Vec<TeacherAssignment>,
  pub exams:        Vec<Exam>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exam_kind_is_inferred_from_vietnamese_names() {
    assert_eq!(ExamKind::infer("Kiểm tra giữa kỳ Toán"), ExamKind::Midterm);
    assert_eq!(ExamKind::infer("Thi Cuối Kỳ Văn"), ExamKind::Final);
    assert_eq!(ExamKind::infer("Kiểm tra 15 phút"), ExamKind::Regular);
  }

  #[test]
  fn explicit_kind_wins_over_name() {
    let exam = Exam {
      exam_code:    "E1".into(),
      exam_name:    "Thi cuối kỳ".into(),
      subject_code: "MATH".into(),
      term_code:    "T1".into(),
      date:         NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
      kind:         Some(ExamKind::Regular),
    };
    assert_eq!(exam.effective_kind(), ExamKind::Regular);
  }

  #[test]
  fn score_bounds_are_inclusive() {
    assert!(Score::new("S1".into(), "E1".into(), 0.0).is_ok());
    assert!(Score::new("S1".into(), "E1".into(), 10.0).is_ok());
  }

  #[test]
  fn score_out_of_range_names_the_student() {
    let err = Score::new("S7".into(), "E1".into(), 10.5).unwrap_err();
    assert!(matches!(err, Error::ScoreOutOfRange { .. }));
    assert!(err.to_string().contains("S7"));
    assert!(Score::new("S7".into(), "E1".into(), f64::NAN).is_err());
  }

  #[test]
  fn reference_data_sections_default_to_empty() {
    let data: ReferenceData =
      serde_json::from_str(r#"{"subjects":[{"subject_code":"MATH","subject_name":"Toán"}]}"#)
        .unwrap();
    assert_eq!(data.subjects.len(), 1);
    assert!(data.exams.is_empty());
  }
}
