//! Read-only reports over derived rows.
//!
//! Queries never recompute anything; they read what the last recompute round
//! committed. A query without a term reports on the school year of the
//! cohort's grade.

use gradebook_core::{
  Error, Result,
  code::{StudentCode, SubjectCode, TermCode},
  derived::{Cohort, Scope, StudentAverage},
  performance::AcademicPerformance,
  record::StudentScore,
  store::GradebookStore,
};
use serde::Serialize;
use tracing::debug;

use crate::Engine;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
  pub student_code: StudentCode,
  pub average:      f64,
  pub rank:         Option<u32>,
}

/// A cohort's ranking. `total_students` is the size of the cohort, which
/// may exceed the number of ranked entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingReport {
  pub total_students: usize,
  pub rankings:       Vec<RankingEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceEntry {
  pub student_code:         StudentCode,
  pub average:              f64,
  pub academic_performance: AcademicPerformance,
}

/// Students of a cohort with their band. `total_students` counts the listed
/// students only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
  pub total_students: usize,
  pub students:       Vec<PerformanceEntry>,
}

struct CohortRows {
  cohort_size: usize,
  scope:       Scope,
  rows:        Vec<StudentAverage>,
}

impl<S: GradebookStore> Engine<S> {
  /// Ranking of a cohort over a term, or over the school year when `term`
  /// is `None`. Entries are ordered by average, best first, then by code.
  pub async fn rankings(&self, cohort: Cohort, term: Option<TermCode>) -> Result<RankingReport> {
    let CohortRows { cohort_size, scope, rows } = self.cohort_rows(&cohort, term).await?;
    if rows.is_empty() {
      return Err(Error::NoResults { what: "rankings", cohort, scope });
    }

    let kind = cohort.rank_kind();
    let rankings = rows
      .into_iter()
      .map(|row| RankingEntry {
        rank:         row.rank(kind),
        student_code: row.student_code,
        average:      row.average,
      })
      .collect();
    Ok(RankingReport { total_students: cohort_size, rankings })
  }

  /// Students of a cohort with their academic-performance band, optionally
  /// restricted to one band.
  pub async fn performance(
    &self,
    cohort: Cohort,
    term: Option<TermCode>,
    band: Option<AcademicPerformance>,
  ) -> Result<PerformanceReport> {
    let CohortRows { scope, rows, .. } = self.cohort_rows(&cohort, term).await?;

    let students: Vec<PerformanceEntry> = rows
      .into_iter()
      .filter(|row| band.is_none_or(|b| row.academic_performance == b))
      .map(|row| PerformanceEntry {
        student_code:         row.student_code,
        average:              row.average,
        academic_performance: row.academic_performance,
      })
      .collect();
    if students.is_empty() {
      return Err(Error::NoResults { what: "students", cohort, scope });
    }
    Ok(PerformanceReport { total_students: students.len(), students })
  }

  /// A student's scores, optionally narrowed to one subject and/or term.
  pub async fn student_scores(
    &self,
    student: StudentCode,
    subject: Option<SubjectCode>,
    term: Option<TermCode>,
  ) -> Result<Vec<StudentScore>> {
    self
      .store()
      .get_student(student.clone())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::StudentNotFound(student.clone()))?;
    self
      .store()
      .list_student_scores(student, subject, term)
      .await
      .map_err(Error::store)
  }

  /// Resolve the cohort and scope, then load the cohort's rows in that scope
  /// sorted best first.
  async fn cohort_rows(&self, cohort: &Cohort, term: Option<TermCode>) -> Result<CohortRows> {
    let resolved = self.resolve_cohort(cohort).await?;
    if resolved.students.is_empty() {
      return Err(Error::EmptyCohort(cohort.clone()));
    }

    let scope = match term {
      Some(term) => {
        let term = self.get_term(&term).await?;
        if term.school_year_code != resolved.grade.school_year_code {
          return Err(Error::ScopeMismatch {
            cohort:      cohort.clone(),
            cohort_year: resolved.grade.school_year_code,
            scope:       Scope::Term(term.term_code),
            scope_year:  term.school_year_code,
          });
        }
        Scope::Term(term.term_code)
      }
      None => Scope::Year(resolved.grade.school_year_code),
    };

    let cohort_size = resolved.students.len();
    let members = resolved.students.into_iter().map(|s| s.student_code).collect();
    let mut rows = self
      .store()
      .list_student_averages(scope.clone(), members)
      .await
      .map_err(Error::store)?;
    rows.sort_by(|a, b| {
      b.average
        .total_cmp(&a.average)
        .then_with(|| a.student_code.cmp(&b.student_code))
    });
    debug!(%cohort, %scope, cohort_size, rows = rows.len(), "cohort rows loaded");
    Ok(CohortRows { cohort_size, scope, rows })
  }
}
