//! Derived rows: everything the engine computes from scores.
//!
//! Derived rows are never edited by hand. Each one is a pure function of the
//! scores that feed it and is overwritten wholesale on every recomputation of
//! its scope.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  code::{ClassroomCode, GradeCode, SchoolYearCode, StudentCode, SubjectCode, TermCode},
  performance::AcademicPerformance,
};

// ─── Scope & cohort ──────────────────────────────────────────────────────────

/// The time period a derived figure applies to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum Scope {
  Term(TermCode),
  Year(SchoolYearCode),
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Term(code) => write!(f, "term {code}"),
      Self::Year(code) => write!(f, "school year {code}"),
    }
  }
}

/// The set of students a rank is computed over.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum Cohort {
  Classroom(ClassroomCode),
  /// Every classroom belonging to the grade.
  Grade(GradeCode),
}

impl Cohort {
  pub fn rank_kind(&self) -> RankKind {
    match self {
      Self::Classroom(_) => RankKind::Classroom,
      Self::Grade(_) => RankKind::Grade,
    }
  }
}

impl fmt::Display for Cohort {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Classroom(code) => write!(f, "classroom {code}"),
      Self::Grade(code) => write!(f, "grade {code}"),
    }
  }
}

/// Which rank column a rank pass writes. Classroom and grade ranks are
/// written independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankKind {
  Classroom,
  Grade,
}

// ─── Subject level ───────────────────────────────────────────────────────────

/// A student's average in one subject over a scope. With [`Scope::Term`] this
/// is the term subject average; with [`Scope::Year`] it is the yearly subject
/// average rolled up from the term rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAverage {
  pub student_code: StudentCode,
  pub subject_code: SubjectCode,
  pub scope:        Scope,
  pub average:      f64,
}

// ─── Student level ───────────────────────────────────────────────────────────

/// An overall average paired with the band derived from it. The only way to
/// build one is [`ClassifiedAverage::new`], so the band can never drift from
/// the number it sits next to.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedAverage {
  student_code:         StudentCode,
  scope:                Scope,
  average:              f64,
  academic_performance: AcademicPerformance,
}

impl ClassifiedAverage {
  pub fn new(student_code: StudentCode, scope: Scope, average: f64) -> Self {
    Self {
      student_code,
      scope,
      average,
      academic_performance: AcademicPerformance::classify(average),
    }
  }

  pub fn student_code(&self) -> &StudentCode { &self.student_code }

  pub fn scope(&self) -> &Scope { &self.scope }

  pub fn average(&self) -> f64 { self.average }

  pub fn academic_performance(&self) -> AcademicPerformance {
    self.academic_performance
  }
}

/// A student's overall standing in a scope: the term row
/// (`StudentTermAverage`) or the year row (`StudentYearlyAverage`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAverage {
  pub student_code:         StudentCode,
  pub scope:                Scope,
  pub average:              f64,
  pub classroom_rank:       Option<u32>,
  pub grade_rank:           Option<u32>,
  pub academic_performance: AcademicPerformance,
}

impl StudentAverage {
  pub fn rank(&self, kind: RankKind) -> Option<u32> {
    match kind {
      RankKind::Classroom => self.classroom_rank,
      RankKind::Grade => self.grade_rank,
    }
  }
}

/// One student's position in a cohort ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankAssignment {
  pub student_code: StudentCode,
  pub rank:         u32,
}
