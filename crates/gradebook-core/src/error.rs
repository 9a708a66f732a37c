//! Error types for `gradebook-core`.

use thiserror::Error;

use crate::{
  code::{
    ClassroomCode, ExamCode, GradeCode, SchoolYearCode, StudentCode,
    SubjectCode, TeacherCode, TermCode,
  },
  derived::{Cohort, Scope},
};

#[derive(Debug, Error)]
pub enum Error {
  // ── NotFound ────────────────────────────────────────────────────────────
  #[error("exam not found: {0}")]
  ExamNotFound(ExamCode),

  #[error("classroom not found: {0}")]
  ClassroomNotFound(ClassroomCode),

  #[error("grade not found: {0}")]
  GradeNotFound(GradeCode),

  #[error("term not found: {0}")]
  TermNotFound(TermCode),

  #[error("school year not found: {0}")]
  SchoolYearNotFound(SchoolYearCode),

  #[error("student not found: {0}")]
  StudentNotFound(StudentCode),

  #[error("no students found in {0}")]
  EmptyCohort(Cohort),

  #[error("no {what} found for {cohort} in {scope}")]
  NoResults {
    what:   &'static str,
    cohort: Cohort,
    scope:  Scope,
  },

  // ── Validation ──────────────────────────────────────────────────────────
  #[error("score {value} for student {student} is invalid; scores must be between 0 and 10")]
  ScoreOutOfRange { student: StudentCode, value: f64 },

  #[error("student {student} is not enrolled in classroom {classroom}")]
  StudentNotInClassroom {
    student:   StudentCode,
    classroom: ClassroomCode,
  },

  #[error("teacher {teacher} is not assigned to teach {subject} in classroom {classroom}")]
  TeacherNotAssigned {
    teacher:   TeacherCode,
    classroom: ClassroomCode,
    subject:   SubjectCode,
  },

  #[error("student {0} appears more than once in the score batch")]
  DuplicateStudent(StudentCode),

  #[error("score batch is empty")]
  EmptyBatch,

  #[error("classroom {0} has no students")]
  EmptyClassroom(ClassroomCode),

  // ── Conflict ────────────────────────────────────────────────────────────
  #[error("{cohort} belongs to school year {cohort_year}, but {scope} belongs to {scope_year}")]
  ScopeMismatch {
    cohort:      Cohort,
    cohort_year: SchoolYearCode,
    scope:       Scope,
    scope_year:  SchoolYearCode,
  },

  // ── Transient ───────────────────────────────────────────────────────────
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification callers map onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  NotFound,
  Validation,
  Conflict,
  Transient,
}

impl Error {
  pub fn class(&self) -> ErrorClass {
    match self {
      Self::ExamNotFound(_)
      | Self::ClassroomNotFound(_)
      | Self::GradeNotFound(_)
      | Self::TermNotFound(_)
      | Self::SchoolYearNotFound(_)
      | Self::StudentNotFound(_)
      | Self::EmptyCohort(_)
      | Self::NoResults { .. } => ErrorClass::NotFound,
      Self::ScoreOutOfRange { .. }
      | Self::StudentNotInClassroom { .. }
      | Self::TeacherNotAssigned { .. }
      | Self::DuplicateStudent(_)
      | Self::EmptyBatch
      | Self::EmptyClassroom(_) => ErrorClass::Validation,
      Self::ScopeMismatch { .. } => ErrorClass::Conflict,
      Self::Store(_) => ErrorClass::Transient,
    }
  }

  /// Wrap a backend error as a transient store failure.
  pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
