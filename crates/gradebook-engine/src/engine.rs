//! [`Engine`]: the recompute orchestrator and its stages.

use std::{
  collections::{BTreeMap, BTreeSet, HashMap},
  sync::Arc,
};

use gradebook_core::{
  Error, Result,
  average,
  code::{
    ClassroomCode, ExamCode, GradeCode, SchoolYearCode, StudentCode, SubjectCode, TermCode,
  },
  derived::{ClassifiedAverage, Cohort, RankAssignment, Scope, SubjectAverage},
  policy::{AveragingPolicy, EmptySubjectPolicy},
  rank,
  record::{Classroom, Grade, Student, Term},
  store::GradebookStore,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::locks::KeyedLocks;

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The averaging and ranking engine over a store `S`.
///
/// The engine is the only writer of derived rows. Share it behind an `Arc`;
/// concurrent batches are safe. Each derived row is recomputed under a
/// (student, scope) lock and each rank pass under a (cohort, scope) lock, so
/// the last writer of either always reads what earlier writers committed.
pub struct Engine<S> {
  store:      Arc<S>,
  policy:     AveragingPolicy,
  row_locks:  KeyedLocks<(StudentCode, Scope)>,
  rank_locks: KeyedLocks<(Cohort, Scope)>,
}

/// Counts of derived rows touched by one recompute round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeSummary {
  pub subject_averages:        usize,
  pub term_averages:           usize,
  pub subject_yearly_averages: usize,
  pub yearly_averages:         usize,
  pub rank_passes:             usize,
}

/// Everything one round will recompute, worked out from reference data
/// before any write happens.
#[derive(Debug, Default)]
pub(crate) struct RecomputePlan {
  subjects: BTreeSet<(StudentCode, SubjectCode, TermCode)>,
  terms:    BTreeSet<(StudentCode, TermCode)>,
  years:    BTreeMap<(StudentCode, SchoolYearCode), BTreeSet<SubjectCode>>,
  ranks:    BTreeSet<(Cohort, Scope)>,
}

/// A cohort resolved against reference data.
pub(crate) struct ResolvedCohort {
  pub grade:    Grade,
  pub students: Vec<Student>,
}

impl<S: GradebookStore> Engine<S> {
  pub fn new(store: Arc<S>, policy: AveragingPolicy) -> Self {
    Self {
      store,
      policy,
      row_locks: KeyedLocks::default(),
      rank_locks: KeyedLocks::default(),
    }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn policy(&self) -> &AveragingPolicy { &self.policy }

  // ── Stage 1: subject average ──────────────────────────────────────────────

  /// Recompute one student's average in one subject for one term.
  ///
  /// Exams the student has no score for are left out. When no exam is
  /// scored the row is removed rather than written as 0.
  pub async fn recompute_subject_average(
    &self,
    student: &StudentCode,
    subject: &SubjectCode,
    term: &TermCode,
  ) -> Result<Option<f64>> {
    let _guard = self
      .row_locks
      .acquire((student.clone(), Scope::Term(term.clone())))
      .await;
    let exams = self
      .store
      .list_exams(term.clone(), Some(subject.clone()))
      .await
      .map_err(Error::store)?;
    let scores: HashMap<ExamCode, f64> = self
      .store
      .list_student_scores(student.clone(), Some(subject.clone()), Some(term.clone()))
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|s| (s.exam_code, s.score_value))
      .collect();

    let scored = exams.iter().filter_map(|exam| {
      scores
        .get(&exam.exam_code)
        .map(|value| (exam.effective_kind(), *value))
    });
    let result = average::subject_average(&self.policy, scored);

    let scope = Scope::Term(term.clone());
    match result {
      Some(average) => self
        .store
        .put_subject_average(SubjectAverage {
          student_code: student.clone(),
          subject_code: subject.clone(),
          scope,
          average,
        })
        .await
        .map_err(Error::store)?,
      None => self
        .store
        .delete_subject_average(student.clone(), subject.clone(), scope)
        .await
        .map_err(Error::store)?,
    }
    debug!(%student, %subject, %term, average = ?result, "subject average");
    Ok(result)
  }

  // ── Stage 2: term average ─────────────────────────────────────────────────

  /// Recompute a student's overall term average from the subject rows and
  /// write it together with its band. Rank columns are not touched.
  pub async fn recompute_term_average(
    &self,
    student: &StudentCode,
    term: &TermCode,
  ) -> Result<Option<f64>> {
    let scope = Scope::Term(term.clone());
    let _guard = self.row_locks.acquire((student.clone(), scope.clone())).await;
    let rows = self
      .store
      .list_subject_averages(student.clone(), scope.clone())
      .await
      .map_err(Error::store)?;

    let unscored = match self.policy.empty_subject {
      EmptySubjectPolicy::Exclude => 0,
      EmptySubjectPolicy::CountAsZero => {
        let scheduled: BTreeSet<SubjectCode> = self
          .store
          .list_exams(term.clone(), None)
          .await
          .map_err(Error::store)?
          .into_iter()
          .map(|e| e.subject_code)
          .collect();
        scheduled
          .iter()
          .filter(|subject| !rows.iter().any(|r| &r.subject_code == *subject))
          .count()
      }
    };

    let values: Vec<f64> = rows.iter().map(|r| r.average).collect();
    let result = average::term_average(&self.policy, &values, unscored);
    self.write_student_average(student, scope, result).await?;
    debug!(%student, %term, average = ?result, "term average");
    Ok(result)
  }

  // ── Stage 3: yearly averages ──────────────────────────────────────────────

  /// Roll one subject's term averages up into its yearly average.
  pub async fn recompute_subject_yearly_average(
    &self,
    student: &StudentCode,
    subject: &SubjectCode,
    year: &SchoolYearCode,
  ) -> Result<Option<f64>> {
    let _guard = self
      .row_locks
      .acquire((student.clone(), Scope::Year(year.clone())))
      .await;
    let mut values = Vec::new();
    for term in self.terms_of(year).await? {
      let rows = self
        .store
        .list_subject_averages(student.clone(), Scope::Term(term.term_code))
        .await
        .map_err(Error::store)?;
      values.extend(
        rows
          .into_iter()
          .filter(|r| &r.subject_code == subject)
          .map(|r| r.average),
      );
    }

    let result = average::yearly_average(&self.policy, &values);
    let scope = Scope::Year(year.clone());
    match result {
      Some(average) => self
        .store
        .put_subject_average(SubjectAverage {
          student_code: student.clone(),
          subject_code: subject.clone(),
          scope,
          average,
        })
        .await
        .map_err(Error::store)?,
      None => self
        .store
        .delete_subject_average(student.clone(), subject.clone(), scope)
        .await
        .map_err(Error::store)?,
    }
    Ok(result)
  }

  /// Roll a student's term averages up into the yearly average.
  pub async fn recompute_yearly_average(
    &self,
    student: &StudentCode,
    year: &SchoolYearCode,
  ) -> Result<Option<f64>> {
    let _guard = self
      .row_locks
      .acquire((student.clone(), Scope::Year(year.clone())))
      .await;
    let mut values = Vec::new();
    for term in self.terms_of(year).await? {
      if let Some(row) = self
        .store
        .get_student_average(student.clone(), Scope::Term(term.term_code))
        .await
        .map_err(Error::store)?
      {
        values.push(row.average);
      }
    }

    let result = average::yearly_average(&self.policy, &values);
    self
      .write_student_average(student, Scope::Year(year.clone()), result)
      .await?;
    debug!(%student, %year, average = ?result, "yearly average");
    Ok(result)
  }

  // ── Stage 4: ranks ────────────────────────────────────────────────────────

  /// Recompute the rank column matching `cohort` for every cohort member
  /// with an average in `scope`.
  ///
  /// Fails with NotFound for unknown codes and Conflict when the cohort and
  /// scope belong to different school years. An empty ranked set is a no-op.
  #[instrument(skip_all, fields(%cohort, %scope))]
  pub async fn assign_ranks(&self, cohort: &Cohort, scope: &Scope) -> Result<Vec<RankAssignment>> {
    let resolved = self.resolve_cohort(cohort).await?;
    self.check_same_year(cohort, &resolved.grade, scope).await?;
    let members = resolved.students.into_iter().map(|s| s.student_code).collect();
    self.rank_members(cohort, scope, members).await
  }

  async fn rank_members(
    &self,
    cohort: &Cohort,
    scope: &Scope,
    members: Vec<StudentCode>,
  ) -> Result<Vec<RankAssignment>> {
    let _guard = self.rank_locks.acquire((cohort.clone(), scope.clone())).await;

    let rows = self
      .store
      .list_student_averages(scope.clone(), members)
      .await
      .map_err(Error::store)?;
    let ranks = rank::competition_ranks(rows.into_iter().map(|r| (r.student_code, r.average)));
    if ranks.is_empty() {
      debug!(%cohort, %scope, "no ranked students; skipping rank pass");
      return Ok(ranks);
    }

    self
      .store
      .write_ranks(scope.clone(), cohort.rank_kind(), ranks.clone())
      .await
      .map_err(Error::store)?;
    debug!(%cohort, %scope, ranked = ranks.len(), "rank pass");
    Ok(ranks)
  }

  // ── Orchestration ─────────────────────────────────────────────────────────

  /// Recompute every derived row affected by the given (student, exam)
  /// score writes.
  ///
  /// All reference lookups happen first, so unknown codes and year
  /// mismatches abort before anything is written. A store failure partway
  /// through leaves earlier stages committed; rerunning the same call is
  /// safe and converges on the same rows.
  #[instrument(skip_all, fields(touched = touched.len()))]
  pub async fn recompute_scores(
    &self,
    touched: &[(StudentCode, ExamCode)],
  ) -> Result<RecomputeSummary> {
    let plan = self.plan(touched).await?;
    self.execute(plan).await
  }

  /// Rerun the full pipeline for every student of a classroom in a term.
  #[instrument(skip(self))]
  pub async fn recompute_classroom(
    &self,
    classroom: &ClassroomCode,
    term: &TermCode,
  ) -> Result<RecomputeSummary> {
    let cohort = Cohort::Classroom(classroom.clone());
    let resolved = self.resolve_cohort(&cohort).await?;
    self
      .check_same_year(&cohort, &resolved.grade, &Scope::Term(term.clone()))
      .await?;

    let exams = self
      .store
      .list_exams(term.clone(), None)
      .await
      .map_err(Error::store)?;
    let touched: Vec<(StudentCode, ExamCode)> = resolved
      .students
      .iter()
      .flat_map(|s| exams.iter().map(|e| (s.student_code.clone(), e.exam_code.clone())))
      .collect();
    self.recompute_scores(&touched).await
  }

  /// Resolve every code a round depends on and decide which rows and rank
  /// passes it covers. Performs no writes.
  pub(crate) async fn plan(&self, touched: &[(StudentCode, ExamCode)]) -> Result<RecomputePlan> {
    let mut plan = RecomputePlan::default();
    let mut terms: HashMap<ExamCode, Term> = HashMap::new();
    let mut subjects: HashMap<ExamCode, SubjectCode> = HashMap::new();
    let mut placements: HashMap<StudentCode, (Classroom, Grade)> = HashMap::new();
    let mut term_cache: HashMap<TermCode, Term> = HashMap::new();

    for (student, exam_code) in touched {
      if !terms.contains_key(exam_code) {
        let exam = self
          .store
          .get_exam(exam_code.clone())
          .await
          .map_err(Error::store)?
          .ok_or_else(|| Error::ExamNotFound(exam_code.clone()))?;
        let term = match term_cache.get(&exam.term_code) {
          Some(term) => term.clone(),
          None => {
            let term = self.get_term(&exam.term_code).await?;
            term_cache.insert(term.term_code.clone(), term.clone());
            term
          }
        };
        subjects.insert(exam_code.clone(), exam.subject_code);
        terms.insert(exam_code.clone(), term);
      }
      if !placements.contains_key(student) {
        let placement = self.place_student(student).await?;
        placements.insert(student.clone(), placement);
      }

      let term = &terms[exam_code];
      let subject = &subjects[exam_code];
      let (classroom, grade) = &placements[student];
      let classroom_cohort = Cohort::Classroom(classroom.classroom_code.clone());
      if grade.school_year_code != term.school_year_code {
        return Err(Error::ScopeMismatch {
          cohort:      classroom_cohort,
          cohort_year: grade.school_year_code.clone(),
          scope:       Scope::Term(term.term_code.clone()),
          scope_year:  term.school_year_code.clone(),
        });
      }

      let grade_cohort = Cohort::Grade(grade.grade_code.clone());
      let term_scope = Scope::Term(term.term_code.clone());
      plan
        .subjects
        .insert((student.clone(), subject.clone(), term.term_code.clone()));
      plan.terms.insert((student.clone(), term.term_code.clone()));
      plan.ranks.insert((classroom_cohort.clone(), term_scope.clone()));
      plan.ranks.insert((grade_cohort.clone(), term_scope));

      if self.policy.rollup_yearly {
        let year = term.school_year_code.clone();
        plan
          .years
          .entry((student.clone(), year.clone()))
          .or_default()
          .insert(subject.clone());
        plan.ranks.insert((classroom_cohort, Scope::Year(year.clone())));
        plan.ranks.insert((grade_cohort, Scope::Year(year)));
      }
    }
    Ok(plan)
  }

  /// Run a plan stage by stage. No stage starts until the previous one has
  /// finished for every student in the plan.
  pub(crate) async fn execute(&self, plan: RecomputePlan) -> Result<RecomputeSummary> {
    let mut summary = RecomputeSummary::default();

    for (student, subject, term) in &plan.subjects {
      self.recompute_subject_average(student, subject, term).await?;
      summary.subject_averages += 1;
    }

    for (student, term) in &plan.terms {
      self.recompute_term_average(student, term).await?;
      summary.term_averages += 1;
    }

    for ((student, year), subjects) in &plan.years {
      for subject in subjects {
        self.recompute_subject_yearly_average(student, subject, year).await?;
        summary.subject_yearly_averages += 1;
      }
      self.recompute_yearly_average(student, year).await?;
      summary.yearly_averages += 1;
    }

    for (cohort, scope) in &plan.ranks {
      let resolved = self.resolve_cohort(cohort).await?;
      let members = resolved.students.into_iter().map(|s| s.student_code).collect();
      self.rank_members(cohort, scope, members).await?;
      summary.rank_passes += 1;
    }

    info!(
      subject_averages = summary.subject_averages,
      term_averages = summary.term_averages,
      yearly_averages = summary.yearly_averages,
      rank_passes = summary.rank_passes,
      "recompute round complete"
    );
    Ok(summary)
  }

  // ── Reference lookups ─────────────────────────────────────────────────────

  async fn write_student_average(
    &self,
    student: &StudentCode,
    scope: Scope,
    average: Option<f64>,
  ) -> Result<()> {
    match average {
      Some(avg) => self
        .store
        .put_student_average(ClassifiedAverage::new(student.clone(), scope, avg))
        .await
        .map_err(Error::store),
      None => self
        .store
        .delete_student_average(student.clone(), scope)
        .await
        .map_err(Error::store),
    }
  }

  pub(crate) async fn get_term(&self, term: &TermCode) -> Result<Term> {
    self
      .store
      .get_term(term.clone())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::TermNotFound(term.clone()))
  }

  async fn terms_of(&self, year: &SchoolYearCode) -> Result<Vec<Term>> {
    self
      .store
      .list_terms(year.clone())
      .await
      .map_err(Error::store)
  }

  async fn place_student(&self, student: &StudentCode) -> Result<(Classroom, Grade)> {
    let record = self
      .store
      .get_student(student.clone())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::StudentNotFound(student.clone()))?;
    let classroom = self.get_classroom(&record.classroom_code).await?;
    let grade = self.get_grade(&classroom.grade_code).await?;
    Ok((classroom, grade))
  }

  pub(crate) async fn get_classroom(&self, code: &ClassroomCode) -> Result<Classroom> {
    self
      .store
      .get_classroom(code.clone())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ClassroomNotFound(code.clone()))
  }

  async fn get_grade(&self, code: &GradeCode) -> Result<Grade> {
    self
      .store
      .get_grade(code.clone())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::GradeNotFound(code.clone()))
  }

  /// Look up a cohort's grade and its full membership. A grade cohort spans
  /// every classroom in the grade.
  pub(crate) async fn resolve_cohort(&self, cohort: &Cohort) -> Result<ResolvedCohort> {
    match cohort {
      Cohort::Classroom(code) => {
        let classroom = self.get_classroom(code).await?;
        let grade = self.get_grade(&classroom.grade_code).await?;
        let students = self
          .store
          .list_students(code.clone())
          .await
          .map_err(Error::store)?;
        Ok(ResolvedCohort { grade, students })
      }
      Cohort::Grade(code) => {
        let grade = self.get_grade(code).await?;
        let students = self
          .store
          .list_grade_students(code.clone())
          .await
          .map_err(Error::store)?;
        Ok(ResolvedCohort { grade, students })
      }
    }
  }

  async fn check_same_year(&self, cohort: &Cohort, grade: &Grade, scope: &Scope) -> Result<()> {
    let scope_year = match scope {
      Scope::Term(code) => self.get_term(code).await?.school_year_code,
      Scope::Year(code) => {
        self
          .store
          .get_school_year(code.clone())
          .await
          .map_err(Error::store)?
          .ok_or_else(|| Error::SchoolYearNotFound(code.clone()))?
          .school_year_code
      }
    };
    if grade.school_year_code != scope_year {
      return Err(Error::ScopeMismatch {
        cohort: cohort.clone(),
        cohort_year: grade.school_year_code.clone(),
        scope: scope.clone(),
        scope_year,
      });
    }
    Ok(())
  }
}
