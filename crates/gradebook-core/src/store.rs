//! The `GradebookStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `gradebook-store-sqlite`). The engine and the HTTP layer depend on this
//! abstraction, not on any concrete backend.
//!
//! Reference data is read-only through this trait. Scores are written by
//! upsert. Derived rows are written only by the engine; every multi-row write
//! (a score batch, a rank pass) is atomic so readers never see half of it.

use std::future::Future;

use crate::{
  code::{
    ClassroomCode, ExamCode, GradeCode, SchoolYearCode, StudentCode,
    SubjectCode, TeacherCode, TermCode,
  },
  derived::{ClassifiedAverage, RankAssignment, RankKind, Scope, StudentAverage, SubjectAverage},
  record::{Classroom, Exam, Grade, SchoolYear, Score, Student, StudentScore, Term},
};

/// Abstraction over a gradebook storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait GradebookStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reference data ────────────────────────────────────────────────────

  fn get_school_year(
    &self,
    code: SchoolYearCode,
  ) -> impl Future<Output = Result<Option<SchoolYear>, Self::Error>> + Send + '_;

  fn get_term(
    &self,
    code: TermCode,
  ) -> impl Future<Output = Result<Option<Term>, Self::Error>> + Send + '_;

  /// The terms of a school year, ordered by term code.
  fn list_terms(
    &self,
    school_year: SchoolYearCode,
  ) -> impl Future<Output = Result<Vec<Term>, Self::Error>> + Send + '_;

  fn get_grade(
    &self,
    code: GradeCode,
  ) -> impl Future<Output = Result<Option<Grade>, Self::Error>> + Send + '_;

  fn get_classroom(
    &self,
    code: ClassroomCode,
  ) -> impl Future<Output = Result<Option<Classroom>, Self::Error>> + Send + '_;

  fn get_student(
    &self,
    code: StudentCode,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// Students enrolled in one classroom, ordered by student code.
  fn list_students(
    &self,
    classroom: ClassroomCode,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  /// Students enrolled in any classroom of the grade, ordered by student code.
  fn list_grade_students(
    &self,
    grade: GradeCode,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  fn get_exam(
    &self,
    code: ExamCode,
  ) -> impl Future<Output = Result<Option<Exam>, Self::Error>> + Send + '_;

  /// Exams held in a term, optionally restricted to one subject.
  fn list_exams(
    &self,
    term: TermCode,
    subject: Option<SubjectCode>,
  ) -> impl Future<Output = Result<Vec<Exam>, Self::Error>> + Send + '_;

  /// Whether `teacher` is in charge of `subject` in `classroom`.
  fn is_teacher_assigned(
    &self,
    teacher: TeacherCode,
    classroom: ClassroomCode,
    subject: SubjectCode,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Scores ────────────────────────────────────────────────────────────

  /// Insert or overwrite every score in `scores` in a single transaction,
  /// keyed by (student, exam).
  fn upsert_scores(
    &self,
    scores: Vec<Score>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Scores recorded for one exam, restricted to `students`.
  fn list_exam_scores(
    &self,
    exam: ExamCode,
    students: Vec<StudentCode>,
  ) -> impl Future<Output = Result<Vec<Score>, Self::Error>> + Send + '_;

  /// A student's scores joined with exam subject and term, optionally
  /// filtered.
  fn list_student_scores(
    &self,
    student: StudentCode,
    subject: Option<SubjectCode>,
    term: Option<TermCode>,
  ) -> impl Future<Output = Result<Vec<StudentScore>, Self::Error>> + Send + '_;

  // ── Subject averages ──────────────────────────────────────────────────

  fn put_subject_average(
    &self,
    row: SubjectAverage,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_subject_average(
    &self,
    student: StudentCode,
    subject: SubjectCode,
    scope: Scope,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All of a student's subject averages in a scope.
  fn list_subject_averages(
    &self,
    student: StudentCode,
    scope: Scope,
  ) -> impl Future<Output = Result<Vec<SubjectAverage>, Self::Error>> + Send + '_;

  // ── Student averages ──────────────────────────────────────────────────

  /// Upsert the average and band of a student row. Existing rank columns
  /// are left untouched.
  fn put_student_average(
    &self,
    row: ClassifiedAverage,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_student_average(
    &self,
    student: StudentCode,
    scope: Scope,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_student_average(
    &self,
    student: StudentCode,
    scope: Scope,
  ) -> impl Future<Output = Result<Option<StudentAverage>, Self::Error>> + Send + '_;

  /// Student rows in `scope` for the given students; students without a row
  /// are simply absent from the result.
  fn list_student_averages(
    &self,
    scope: Scope,
    students: Vec<StudentCode>,
  ) -> impl Future<Output = Result<Vec<StudentAverage>, Self::Error>> + Send + '_;

  /// Write one rank column for every assignment in a single transaction.
  /// The other rank column and all other scopes are untouched.
  fn write_ranks(
    &self,
    scope: Scope,
    kind: RankKind,
    ranks: Vec<RankAssignment>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
