//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use gradebook_core::{
  code::{StudentCode, SubjectCode, TermCode},
  derived::{ClassifiedAverage, RankAssignment, RankKind, Scope, SubjectAverage},
  performance::AcademicPerformance,
  record::{
    Classroom, Exam, ExamKind, Grade, ReferenceData, SchoolYear, Score, Student,
    Subject, Teacher, TeacherAssignment, Term,
  },
  store::GradebookStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  let s = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  s.seed(reference()).await.expect("seed");
  s
}

fn reference() -> ReferenceData {
  let date = |d| NaiveDate::from_ymd_opt(2024, 10, d).unwrap();
  ReferenceData {
    school_years: vec![SchoolYear {
      school_year_code: "Y2024".into(),
      school_year_name: "2024-2025".into(),
    }],
    terms:        vec![
      Term { term_code: "T1".into(), term_name: "Học kỳ 1".into(), school_year_code: "Y2024".into() },
      Term { term_code: "T2".into(), term_name: "Học kỳ 2".into(), school_year_code: "Y2024".into() },
    ],
    grades:       vec![Grade {
      grade_code:       "G10".into(),
      grade_name:       "Khối 10".into(),
      school_year_code: "Y2024".into(),
    }],
    classrooms:   vec![
      Classroom { classroom_code: "C1".into(), classroom_name: "10A1".into(), grade_code: "G10".into() },
      Classroom { classroom_code: "C2".into(), classroom_name: "10A2".into(), grade_code: "G10".into() },
    ],
    subjects:     vec![
      Subject { subject_code: "MATH".into(), subject_name: "Toán".into() },
      Subject { subject_code: "LIT".into(), subject_name: "Ngữ văn".into() },
    ],
    students:     vec![
      Student { student_code: "S2".into(), name: "Bình".into(), classroom_code: "C1".into() },
      Student { student_code: "S1".into(), name: "An".into(), classroom_code: "C1".into() },
      Student { student_code: "S3".into(), name: "Chi".into(), classroom_code: "C2".into() },
    ],
    teachers:     vec![Teacher { teacher_code: "GV1".into(), name: "Cô Lan".into() }],
    assignments:  vec![TeacherAssignment {
      classroom_code: "C1".into(),
      teacher_code:   "GV1".into(),
      subject_code:   "MATH".into(),
    }],
    exams:        vec![
      Exam {
        exam_code:    "MATH-MID".into(),
        exam_name:    "Kiểm tra giữa kỳ Toán".into(),
        subject_code: "MATH".into(),
        term_code:    "T1".into(),
        date:         date(15),
        kind:         None,
      },
      Exam {
        exam_code:    "MATH-FIN".into(),
        exam_name:    "Thi cuối kỳ Toán".into(),
        subject_code: "MATH".into(),
        term_code:    "T1".into(),
        date:         date(30),
        kind:         Some(ExamKind::Final),
      },
      Exam {
        exam_code:    "LIT-MID".into(),
        exam_name:    "Kiểm tra giữa kỳ Văn".into(),
        subject_code: "LIT".into(),
        term_code:    "T1".into(),
        date:         date(16),
        kind:         None,
      },
    ],
  }
}

fn score(student: &str, exam: &str, value: f64) -> Score {
  Score::new(student.into(), exam.into(), value).unwrap()
}

fn t1() -> Scope { Scope::Term(TermCode::from("T1")) }

// ─── Reference data ──────────────────────────────────────────────────────────

#[tokio::test]
async fn seeded_reference_data_is_readable() {
  let s = store().await;

  let term = s.get_term("T1".into()).await.unwrap().unwrap();
  assert_eq!(term.school_year_code.as_str(), "Y2024");
  assert!(s.get_term("T9".into()).await.unwrap().is_none());

  let terms = s.list_terms("Y2024".into()).await.unwrap();
  assert_eq!(terms.len(), 2);

  let classroom = s.get_classroom("C1".into()).await.unwrap().unwrap();
  assert_eq!(classroom.grade_code.as_str(), "G10");
  assert!(s.get_grade("G10".into()).await.unwrap().is_some());
  assert!(s.get_school_year("Y2024".into()).await.unwrap().is_some());
}

#[tokio::test]
async fn students_are_listed_by_classroom_and_grade() {
  let s = store().await;

  let c1: Vec<String> = s
    .list_students("C1".into())
    .await
    .unwrap()
    .into_iter()
    .map(|st| st.student_code.to_string())
    .collect();
  assert_eq!(c1, vec!["S1", "S2"]);

  let grade = s.list_grade_students("G10".into()).await.unwrap();
  assert_eq!(grade.len(), 3);
  assert_eq!(
    s.get_student("S3".into()).await.unwrap().unwrap().classroom_code.as_str(),
    "C2"
  );
}

#[tokio::test]
async fn exams_keep_explicit_kind_and_filter_by_subject() {
  let s = store().await;

  let mid = s.get_exam("MATH-MID".into()).await.unwrap().unwrap();
  assert_eq!(mid.kind, None);
  assert_eq!(mid.effective_kind(), ExamKind::Midterm);

  let fin = s.get_exam("MATH-FIN".into()).await.unwrap().unwrap();
  assert_eq!(fin.kind, Some(ExamKind::Final));

  let math = s
    .list_exams("T1".into(), Some(SubjectCode::from("MATH")))
    .await
    .unwrap();
  assert_eq!(math.len(), 2);
  assert_eq!(s.list_exams("T1".into(), None).await.unwrap().len(), 3);
  assert!(s.list_exams("T2".into(), None).await.unwrap().is_empty());
}

#[tokio::test]
async fn teacher_assignment_is_per_classroom_and_subject() {
  let s = store().await;
  assert!(s.is_teacher_assigned("GV1".into(), "C1".into(), "MATH".into()).await.unwrap());
  assert!(!s.is_teacher_assigned("GV1".into(), "C1".into(), "LIT".into()).await.unwrap());
  assert!(!s.is_teacher_assigned("GV1".into(), "C2".into(), "MATH".into()).await.unwrap());
}

// ─── Scores ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_overwrites_instead_of_duplicating() {
  let s = store().await;

  s.upsert_scores(vec![score("S1", "MATH-MID", 6.0), score("S2", "MATH-MID", 7.0)])
    .await
    .unwrap();
  s.upsert_scores(vec![score("S1", "MATH-MID", 8.5)]).await.unwrap();

  let scores = s
    .list_exam_scores("MATH-MID".into(), vec!["S1".into(), "S2".into()])
    .await
    .unwrap();
  assert_eq!(scores.len(), 2);
  assert_eq!(scores[0].student_code.as_str(), "S1");
  assert_eq!(scores[0].score_value, 8.5);
}

#[tokio::test]
async fn list_exam_scores_respects_student_filter() {
  let s = store().await;
  s.upsert_scores(vec![score("S1", "MATH-MID", 6.0), score("S3", "MATH-MID", 4.0)])
    .await
    .unwrap();

  let only_s3 = s
    .list_exam_scores("MATH-MID".into(), vec!["S3".into()])
    .await
    .unwrap();
  assert_eq!(only_s3.len(), 1);
  assert!(s.list_exam_scores("MATH-MID".into(), vec![]).await.unwrap().is_empty());
}

#[tokio::test]
async fn student_scores_join_exam_subject_and_term() {
  let s = store().await;
  s.upsert_scores(vec![
    score("S1", "MATH-MID", 6.0),
    score("S1", "MATH-FIN", 9.0),
    score("S1", "LIT-MID", 7.0),
  ])
  .await
  .unwrap();

  let all = s.list_student_scores("S1".into(), None, None).await.unwrap();
  assert_eq!(all.len(), 3);
  assert!(all.iter().all(|sc| sc.term_code.as_str() == "T1"));

  let math = s
    .list_student_scores("S1".into(), Some("MATH".into()), Some("T1".into()))
    .await
    .unwrap();
  assert_eq!(math.len(), 2);
  assert!(math.iter().all(|sc| sc.subject_code.as_str() == "MATH"));
}

// ─── Derived rows ────────────────────────────────────────────────────────────

#[tokio::test]
async fn subject_average_upsert_and_delete() {
  let s = store().await;
  let row = SubjectAverage {
    student_code: "S1".into(),
    subject_code: "MATH".into(),
    scope:        t1(),
    average:      7.5,
  };
  s.put_subject_average(row.clone()).await.unwrap();
  s.put_subject_average(SubjectAverage { average: 8.0, ..row }).await.unwrap();

  let rows = s.list_subject_averages("S1".into(), t1()).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].average, 8.0);

  s.delete_subject_average("S1".into(), "MATH".into(), t1()).await.unwrap();
  assert!(s.list_subject_averages("S1".into(), t1()).await.unwrap().is_empty());
}

#[tokio::test]
async fn subject_averages_are_kept_per_scope() {
  let s = store().await;
  s.put_subject_average(SubjectAverage {
    student_code: "S1".into(),
    subject_code: "MATH".into(),
    scope:        Scope::Year("Y2024".into()),
    average:      6.0,
  })
  .await
  .unwrap();

  assert!(s.list_subject_averages("S1".into(), t1()).await.unwrap().is_empty());
  assert_eq!(
    s.list_subject_averages("S1".into(), Scope::Year("Y2024".into()))
      .await
      .unwrap()
      .len(),
    1
  );
}

#[tokio::test]
async fn student_average_update_preserves_ranks() {
  let s = store().await;
  s.put_student_average(ClassifiedAverage::new("S1".into(), t1(), 8.2))
    .await
    .unwrap();
  s.write_ranks(
    t1(),
    RankKind::Classroom,
    vec![RankAssignment { student_code: "S1".into(), rank: 1 }],
  )
  .await
  .unwrap();

  s.put_student_average(ClassifiedAverage::new("S1".into(), t1(), 6.0))
    .await
    .unwrap();

  let row = s.get_student_average("S1".into(), t1()).await.unwrap().unwrap();
  assert_eq!(row.average, 6.0);
  assert_eq!(row.academic_performance, AcademicPerformance::Average);
  assert_eq!(row.classroom_rank, Some(1));
  assert_eq!(row.grade_rank, None);
}

#[tokio::test]
async fn write_ranks_touches_only_one_rank_kind() {
  let s = store().await;
  for (student, avg) in [("S1", 9.0), ("S2", 7.0)] {
    s.put_student_average(ClassifiedAverage::new(student.into(), t1(), avg))
      .await
      .unwrap();
  }
  s.write_ranks(
    t1(),
    RankKind::Grade,
    vec![
      RankAssignment { student_code: "S1".into(), rank: 1 },
      RankAssignment { student_code: "S2".into(), rank: 2 },
    ],
  )
  .await
  .unwrap();
  s.write_ranks(
    t1(),
    RankKind::Classroom,
    vec![RankAssignment { student_code: "S2".into(), rank: 5 }],
  )
  .await
  .unwrap();

  let rows = s
    .list_student_averages(t1(), vec![StudentCode::from("S1"), StudentCode::from("S2")])
    .await
    .unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!((rows[0].classroom_rank, rows[0].grade_rank), (None, Some(1)));
  assert_eq!((rows[1].classroom_rank, rows[1].grade_rank), (Some(5), Some(2)));
}

#[tokio::test]
async fn yearly_rows_are_separate_from_term_rows() {
  let s = store().await;
  let year = Scope::Year("Y2024".into());
  s.put_student_average(ClassifiedAverage::new("S1".into(), year.clone(), 8.0))
    .await
    .unwrap();

  assert!(s.get_student_average("S1".into(), t1()).await.unwrap().is_none());
  let row = s.get_student_average("S1".into(), year.clone()).await.unwrap().unwrap();
  assert_eq!(row.academic_performance, AcademicPerformance::Excellent);

  s.delete_student_average("S1".into(), year.clone()).await.unwrap();
  assert!(s.get_student_average("S1".into(), year).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_students_are_absent_from_average_listing() {
  let s = store().await;
  s.put_student_average(ClassifiedAverage::new("S1".into(), t1(), 5.0))
    .await
    .unwrap();
  let rows = s
    .list_student_averages(t1(), vec!["S1".into(), "S2".into(), "S3".into()])
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert!(s.list_student_averages(t1(), vec![]).await.unwrap().is_empty());
}
