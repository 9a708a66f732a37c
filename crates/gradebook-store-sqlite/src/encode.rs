//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD`, timestamps as RFC 3339 strings, enums as
//! their lowercase or report-card labels. Scope-dependent table and column
//! names are resolved here so the SQL in `store.rs` stays scope-agnostic.

use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, Utc};
use gradebook_core::{
  code::{ClassroomCode, GradeCode, SchoolYearCode, StudentCode, SubjectCode, TermCode},
  derived::{RankKind, Scope, StudentAverage},
  performance::AcademicPerformance,
  record::{Classroom, Exam, ExamKind, Grade, Student, Term},
};

use crate::{Error, Result};

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("bad date {s:?}: {e}")))
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

// ─── ExamKind ────────────────────────────────────────────────────────────────

pub fn encode_exam_kind(k: ExamKind) -> &'static str { k.into() }

pub fn decode_exam_kind(s: &str) -> Result<ExamKind> {
  ExamKind::from_str(s).map_err(|_| Error::Decode(format!("unknown exam kind: {s:?}")))
}

// ─── AcademicPerformance ─────────────────────────────────────────────────────

pub fn encode_performance(p: AcademicPerformance) -> String { p.to_string() }

pub fn decode_performance(s: &str) -> Result<AcademicPerformance> {
  AcademicPerformance::from_str(s)
    .map_err(|_| Error::Decode(format!("unknown academic performance: {s:?}")))
}

// ─── Scope → tables ──────────────────────────────────────────────────────────

/// Where rows for a given [`Scope`] live.
pub struct ScopeColumns {
  /// Per-student overall rows (`student_term_averages` / `student_yearly_averages`).
  pub student_table:  &'static str,
  /// Per-subject rows (`subject_averages` / `subject_yearly_averages`).
  pub subject_table:  &'static str,
  /// The column holding the scope code in both tables.
  pub scope_column:   &'static str,
  /// The average column of `student_table`.
  pub average_column: &'static str,
  pub code:           String,
}

pub fn scope_columns(scope: &Scope) -> ScopeColumns {
  match scope {
    Scope::Term(code) => ScopeColumns {
      student_table:  "student_term_averages",
      subject_table:  "subject_averages",
      scope_column:   "term_code",
      average_column: "term_average",
      code:           code.to_string(),
    },
    Scope::Year(code) => ScopeColumns {
      student_table:  "student_yearly_averages",
      subject_table:  "subject_yearly_averages",
      scope_column:   "school_year_code",
      average_column: "yearly_average",
      code:           code.to_string(),
    },
  }
}

pub fn rank_column(kind: RankKind) -> &'static str {
  match kind {
    RankKind::Classroom => "classroom_rank",
    RankKind::Grade => "grade_rank",
  }
}

/// `?{first}, ?{first+1}, …` for `count` positional parameters.
pub fn placeholders(first: usize, count: usize) -> String {
  (first..first + count)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `exams` row.
pub struct RawExam {
  pub exam_code:    String,
  pub exam_name:    String,
  pub subject_code: String,
  pub term_code:    String,
  pub exam_date:    String,
  pub kind:         Option<String>,
}

impl RawExam {
  pub const COLUMNS: &'static str =
    "exam_code, exam_name, subject_code, term_code, exam_date, kind";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      exam_code:    row.get(0)?,
      exam_name:    row.get(1)?,
      subject_code: row.get(2)?,
      term_code:    row.get(3)?,
      exam_date:    row.get(4)?,
      kind:         row.get(5)?,
    })
  }

  pub fn into_exam(self) -> Result<Exam> {
    Ok(Exam {
      exam_code:    self.exam_code.into(),
      exam_name:    self.exam_name,
      subject_code: SubjectCode::from(self.subject_code),
      term_code:    TermCode::from(self.term_code),
      date:         decode_date(&self.exam_date)?,
      kind:         self.kind.as_deref().map(decode_exam_kind).transpose()?,
    })
  }
}

/// Raw values read from a `student_term_averages` / `student_yearly_averages`
/// row. The scope is re-attached by the caller.
pub struct RawStudentAverage {
  pub student_code:         String,
  pub average:              f64,
  pub classroom_rank:       Option<u32>,
  pub grade_rank:           Option<u32>,
  pub academic_performance: String,
}

impl RawStudentAverage {
  /// Column list for `cols`; keeps the SELECT in step with [`Self::from_row`].
  pub fn select_list(cols: &ScopeColumns) -> String {
    format!(
      "student_code, {}, classroom_rank, grade_rank, academic_performance",
      cols.average_column
    )
  }

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_code:         row.get(0)?,
      average:              row.get(1)?,
      classroom_rank:       row.get(2)?,
      grade_rank:           row.get(3)?,
      academic_performance: row.get(4)?,
    })
  }

  pub fn into_student_average(self, scope: &Scope) -> Result<StudentAverage> {
    Ok(StudentAverage {
      student_code:         StudentCode::from(self.student_code),
      scope:                scope.clone(),
      average:              self.average,
      classroom_rank:       self.classroom_rank,
      grade_rank:           self.grade_rank,
      academic_performance: decode_performance(&self.academic_performance)?,
    })
  }
}

// Reference rows only hold codes and names, so they decode straight from the
// row without an intermediate raw type.

pub fn term_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Term> {
  Ok(Term {
    term_code:        TermCode::from(row.get::<_, String>(0)?),
    term_name:        row.get(1)?,
    school_year_code: SchoolYearCode::from(row.get::<_, String>(2)?),
  })
}

pub fn grade_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Grade> {
  Ok(Grade {
    grade_code:       GradeCode::from(row.get::<_, String>(0)?),
    grade_name:       row.get(1)?,
    school_year_code: SchoolYearCode::from(row.get::<_, String>(2)?),
  })
}

pub fn classroom_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Classroom> {
  Ok(Classroom {
    classroom_code: ClassroomCode::from(row.get::<_, String>(0)?),
    classroom_name: row.get(1)?,
    grade_code:     GradeCode::from(row.get::<_, String>(2)?),
  })
}

pub fn student_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Student> {
  Ok(Student {
    student_code:   StudentCode::from(row.get::<_, String>(0)?),
    name:           row.get(1)?,
    classroom_code: ClassroomCode::from(row.get::<_, String>(2)?),
  })
}
